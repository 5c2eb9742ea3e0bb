//! Slot listing and booking state for the public appointment page.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;

use crate::backend::PracticeBackend;
use crate::error::friendly_message;
use crate::fetch_seq::FetchSeq;
use crate::models::{Appointment, AppointmentFormData};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingState {
    pub available_slots: Vec<String>,
    pub loading: bool,
    pub error: Option<String>,
    pub booking_loading: bool,
    pub booking_error: Option<String>,
    pub booking_success: bool,
    /// Date the slot list was fetched for; `None` lets the server choose.
    pub date: Option<NaiveDate>,
    pub last_booking: Option<Appointment>,
}

pub struct BookingController {
    backend: Arc<dyn PracticeBackend>,
    state: Mutex<BookingState>,
    seq: FetchSeq,
    loaded: AtomicBool,
}

impl BookingController {
    pub fn new(backend: Arc<dyn PracticeBackend>) -> Self {
        Self {
            backend,
            state: Mutex::new(BookingState::default()),
            seq: FetchSeq::new(),
            loaded: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BookingState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> BookingState {
        self.lock().clone()
    }

    pub fn available_slots(&self) -> Vec<String> {
        self.lock().available_slots.clone()
    }

    /// First use triggers one fetch; later calls do nothing.
    pub async fn ensure_loaded(&self) {
        if !self.loaded.swap(true, Ordering::SeqCst) {
            self.fetch_available_slots().await;
        }
    }

    /// Slot availability is per date, so a new date means a new fetch.
    pub async fn set_date(&self, date: NaiveDate) {
        self.loaded.store(true, Ordering::SeqCst);
        self.lock().date = Some(date);
        self.fetch_available_slots().await;
    }

    pub async fn fetch_available_slots(&self) {
        let ticket = self.seq.begin();
        let date = {
            let mut st = self.lock();
            st.loading = true;
            st.error = None;
            st.date
        };

        let result = self.backend.get_available_slots(date).await;

        if !self.seq.is_current(ticket) {
            tracing::debug!(ticket, "discarding stale slot response");
            return;
        }

        let mut st = self.lock();
        match result {
            Ok(resp) => {
                st.available_slots = resp.open_times();
                tracing::debug!(count = st.available_slots.len(), date = %resp.date, "slots loaded");
            }
            Err(e) => {
                tracing::warn!(error = %e, "slot listing failed");
                st.error = Some(friendly_message(&e));
            }
        }
        st.loading = false;
    }

    /// Submit a booking. On success the slot list is fetched again before
    /// this returns.
    pub async fn book_appointment(&self, form: &AppointmentFormData) -> bool {
        {
            let mut st = self.lock();
            st.booking_loading = true;
            st.booking_error = None;
            st.booking_success = false;
        }

        match self.backend.book_appointment(form).await {
            Ok(appointment) => {
                tracing::info!(id = ?appointment.appointment_id, date = %form.date, time = %form.time, "appointment booked");
                {
                    let mut st = self.lock();
                    st.booking_success = true;
                    st.last_booking = Some(appointment);
                }
                self.fetch_available_slots().await;
                self.lock().booking_loading = false;
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "appointment booking failed");
                let mut st = self.lock();
                st.booking_error = Some(friendly_message(&e));
                st.booking_loading = false;
                false
            }
        }
    }

    pub fn clear_booking_state(&self) {
        let mut st = self.lock();
        st.booking_loading = false;
        st.booking_error = None;
        st.booking_success = false;
    }

    pub fn clear_error(&self) {
        let mut st = self.lock();
        st.error = None;
        st.booking_error = None;
    }
}
