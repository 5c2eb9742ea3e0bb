use std::time::Duration;

use tokio::time::Instant;

use crate::session::{Session, SessionSnapshot};

pub const LOGIN_PATH: &str = "/admin-login";

/// Where the front end currently is, and how to move it.
pub trait Navigator {
    fn current_path(&self) -> String;
    fn navigate(&self, path: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateView {
    /// Session still loading, or sitting on the login page itself.
    Waiting,
    /// A redirect to the login page is pending or has been issued.
    Redirecting,
    Render,
}

/// Stands in front of every admin screen.
///
/// A non-admin session schedules a single redirect to [`LOGIN_PATH`] that
/// fires once the debounce has elapsed; repeated checks in between do not
/// schedule more. Seeing an admin session clears the pending redirect so a
/// later login renders straight away.
#[derive(Debug)]
pub struct AdminGate {
    debounce: Duration,
    pending_since: Option<Instant>,
    fired: bool,
}

impl AdminGate {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            pending_since: None,
            fired: false,
        }
    }

    pub fn redirect_pending(&self) -> bool {
        self.pending_since.is_some()
    }

    pub fn check(&mut self, snapshot: &SessionSnapshot, nav: &dyn Navigator) -> GateView {
        if snapshot.loading {
            return GateView::Waiting;
        }

        if snapshot.authenticated && snapshot.is_admin {
            if self.pending_since.take().is_some() {
                tracing::debug!("admin session observed, pending redirect dropped");
            }
            self.fired = false;
            return GateView::Render;
        }

        if nav.current_path() == LOGIN_PATH {
            return GateView::Waiting;
        }

        let now = Instant::now();
        let since = *self.pending_since.get_or_insert(now);
        if !self.fired && now.duration_since(since) >= self.debounce {
            tracing::info!(
                authenticated = snapshot.authenticated,
                "admin access denied, redirecting to login"
            );
            nav.navigate(LOGIN_PATH);
            self.fired = true;
        }
        GateView::Redirecting
    }

    /// Check against the live session, sleeping out the debounce when a
    /// redirect is pending so the caller gets a settled answer.
    pub async fn resolve(&mut self, session: &Session, nav: &dyn Navigator) -> GateView {
        loop {
            let view = self.check(&session.snapshot(), nav);
            match (view, self.pending_since) {
                (GateView::Redirecting, Some(since)) if !self.fired => {
                    tokio::time::sleep_until(since + self.debounce).await;
                }
                _ => return view,
            }
        }
    }
}
