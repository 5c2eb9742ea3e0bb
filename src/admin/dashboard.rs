use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;

use super::{FetchSeq, authed};
use crate::models::{Appointment, AppointmentStats};
use crate::session::Session;

/// How many of the newest appointments the dashboard lists.
pub const RECENT_LIMIT: u32 = 5;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    /// All zero until loaded, and when the stats call fails.
    pub stats: AppointmentStats,
    pub recent: Vec<Appointment>,
    pub loading: bool,
    pub error: Option<String>,
}

pub struct DashboardScreen {
    session: Arc<Session>,
    state: Mutex<DashboardState>,
    seq: FetchSeq,
}

impl DashboardScreen {
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            state: Mutex::new(DashboardState::default()),
            seq: FetchSeq::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DashboardState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> DashboardState {
        self.lock().clone()
    }

    pub async fn refresh(&self) {
        let ticket = self.seq.begin();
        {
            let mut st = self.lock();
            st.loading = true;
            st.error = None;
        }

        let stats = authed(&self.session, |client, token| async move {
            client.appointment_stats(&token).await
        })
        .await;
        let recent = authed(&self.session, |client, token| async move {
            client.list_appointments(1, RECENT_LIMIT, Some(&token)).await
        })
        .await;

        if !self.seq.is_current(ticket) {
            return;
        }

        let mut st = self.lock();
        match stats {
            Ok(stats) => st.stats = stats,
            Err(e) => {
                tracing::warn!(error = %e, "stats fetch failed, showing zeros");
                st.stats = AppointmentStats::default();
            }
        }
        match recent {
            Ok(page) => {
                st.recent = page.appointments.into_iter().take(RECENT_LIMIT as usize).collect();
            }
            Err(e) => {
                tracing::warn!(error = %e, "recent appointments fetch failed");
                st.error = Some("Failed to load dashboard data".into());
            }
        }
        st.loading = false;
    }

    pub fn analytics(&self) -> AnalyticsView {
        AnalyticsView::from(&self.lock().stats)
    }
}

/// Percentages of all appointments, one decimal place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AnalyticsView {
    pub total: u32,
    pub confirmation_rate: f64,
    pub completion_rate: f64,
    pub cancellation_rate: f64,
}

fn rate(part: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (f64::from(part) * 1000.0 / f64::from(total)).round() / 10.0
}

impl From<&AppointmentStats> for AnalyticsView {
    fn from(stats: &AppointmentStats) -> Self {
        Self {
            total: stats.total,
            confirmation_rate: rate(stats.confirmed, stats.total),
            completion_rate: rate(stats.completed, stats.total),
            cancellation_rate: rate(stats.cancelled, stats.total),
        }
    }
}
