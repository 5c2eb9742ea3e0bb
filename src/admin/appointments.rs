use std::sync::{Arc, Mutex, MutexGuard};

use super::{Confirm, FetchSeq, authed, log_mutation_failure};
use crate::error::ApiResult;
use crate::models::{AdminAction, Appointment, AppointmentStatus, AppointmentUpdate, Pagination};
use crate::session::Session;

pub const PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentsState {
    pub appointments: Vec<Appointment>,
    pub pagination: Pagination,
    pub page: u32,
    /// `None` shows every status. Applied to the fetched page only.
    pub status_filter: Option<AppointmentStatus>,
    pub search: String,
    pub loading: bool,
    pub error: Option<String>,
    pub mutation_error: Option<String>,
}

impl Default for AppointmentsState {
    fn default() -> Self {
        Self {
            appointments: Vec::new(),
            pagination: Pagination::default(),
            page: 1,
            status_filter: None,
            search: String::new(),
            loading: false,
            error: None,
            mutation_error: None,
        }
    }
}

impl AppointmentsState {
    /// The fetched page narrowed by search term and status filter.
    pub fn visible(&self) -> Vec<Appointment> {
        self.appointments
            .iter()
            .filter(|a| a.matches_search(&self.search))
            .filter(|a| self.status_filter.is_none_or(|s| a.status == s))
            .cloned()
            .collect()
    }
}

pub struct AppointmentsScreen {
    session: Arc<Session>,
    state: Mutex<AppointmentsState>,
    seq: FetchSeq,
}

impl AppointmentsScreen {
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            state: Mutex::new(AppointmentsState::default()),
            seq: FetchSeq::new(),
        }
    }

    /// Screen opened on a given page and filter, before its first fetch.
    pub fn starting_at(session: Arc<Session>, page: u32, status_filter: Option<AppointmentStatus>) -> Self {
        let screen = Self::new(session);
        {
            let mut st = screen.lock();
            st.page = page.max(1);
            st.status_filter = status_filter;
        }
        screen
    }

    fn lock(&self) -> MutexGuard<'_, AppointmentsState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> AppointmentsState {
        self.lock().clone()
    }

    pub fn visible(&self) -> Vec<Appointment> {
        self.lock().visible()
    }

    pub async fn fetch(&self) {
        let ticket = self.seq.begin();
        let page = {
            let mut st = self.lock();
            st.loading = true;
            st.error = None;
            st.page
        };

        let result = authed(&self.session, |client, token| async move {
            client.list_appointments(page, PAGE_SIZE, Some(&token)).await
        })
        .await;

        if !self.seq.is_current(ticket) {
            tracing::debug!(page, "discarding stale appointments response");
            return;
        }

        let mut st = self.lock();
        match result {
            Ok(list) => {
                st.appointments = list.appointments;
                st.pagination = list.pagination;
            }
            Err(e) => {
                tracing::warn!(page, error = %e, "appointments fetch failed");
                st.error = Some("Failed to load appointments".into());
            }
        }
        st.loading = false;
    }

    pub async fn set_page(&self, page: u32) {
        self.lock().page = page.max(1);
        self.fetch().await;
    }

    pub async fn set_status_filter(&self, status: Option<AppointmentStatus>) {
        self.lock().status_filter = status;
        self.fetch().await;
    }

    /// Search narrows what is already loaded; no request is made.
    pub fn set_search(&self, term: impl Into<String>) {
        self.lock().search = term.into();
    }

    /// One appointment fresh from the server. Leaves the list state alone.
    pub async fn detail(&self, id: &str) -> ApiResult<Appointment> {
        authed(&self.session, |client, token| async move {
            client.appointment_detail(id, &token).await
        })
        .await
    }

    pub async fn change_status(&self, id: &str, status: AppointmentStatus) -> ApiResult<()> {
        let update = AppointmentUpdate::status(status);
        let update = &update;
        let result = authed(&self.session, |client, token| async move {
            client.update_appointment(id, update, &token).await
        })
        .await;
        self.finish_mutation("status change", id, result.map(|_| ())).await
    }

    pub async fn admin_action(&self, id: &str, action: AdminAction) -> ApiResult<()> {
        let result = authed(&self.session, |client, token| async move {
            client.admin_appointment_action(id, action, &token).await
        })
        .await;
        self.finish_mutation(action.as_path(), id, result).await
    }

    pub async fn delete(&self, id: &str, confirm: &dyn Confirm) -> ApiResult<bool> {
        if !confirm.confirm("Are you sure you want to delete this appointment?") {
            return Ok(false);
        }
        let result = authed(&self.session, |client, token| async move {
            client.delete_appointment(id, &token).await
        })
        .await;
        self.finish_mutation("delete", id, result).await.map(|()| true)
    }

    async fn finish_mutation(&self, what: &str, id: &str, result: ApiResult<()>) -> ApiResult<()> {
        match result {
            Ok(()) => {
                tracing::info!(action = what, id, "appointment updated");
                self.lock().mutation_error = None;
                self.fetch().await;
                Ok(())
            }
            Err(e) => {
                let message = log_mutation_failure(what, &e);
                self.lock().mutation_error = Some(message);
                Err(e)
            }
        }
    }
}
