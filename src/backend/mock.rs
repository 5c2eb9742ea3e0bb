use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveDate, Utc};
use uuid::Uuid;

use super::{PracticeBackend, REQUIRED_FIELDS_MESSAGE, check_contact_form, check_newsletter};
use crate::error::{ApiError, ApiResult};
use crate::models::{
    Appointment, AppointmentFormData, AppointmentPage, AppointmentStatus, AvailableSlot,
    AvailableSlotsResponse, ContactForm, Pagination,
};

pub const SLOT_CATALOG: [&str; 16] = [
    "09:00", "09:30", "10:00", "10:30", "11:00", "11:30", "14:00", "14:30", "15:00", "15:30",
    "16:00", "16:30", "17:00", "17:30", "18:00", "18:30",
];

/// Slots the mock always reports as taken. Bookings made against the mock
/// are not added here.
pub const TAKEN_SLOTS: [&str; 3] = ["10:00", "14:30", "16:00"];

pub const DATE_TIME_REQUIRED_MESSAGE: &str = "Please select an appointment date and time";
pub const SLOT_TAKEN_MESSAGE: &str = "Slot not available";

const SLOT_MINUTES: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockLatency {
    /// Sleep like a slow network so loading states are visible.
    Realistic,
    /// Answer immediately.
    None,
}

/// In-process stand-in for the REST API, used when no API URL is configured.
pub struct MockBackend {
    latency: MockLatency,
    appointments: Mutex<Vec<Appointment>>,
}

impl MockBackend {
    pub fn new(latency: MockLatency) -> Self {
        Self {
            latency,
            appointments: Mutex::new(seed_appointments()),
        }
    }

    async fn pause(&self, millis: u64) {
        if self.latency == MockLatency::Realistic {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
    }

    /// Snapshot of every appointment held by the mock.
    pub fn appointments(&self) -> Vec<Appointment> {
        self.appointments
            .lock()
            .map(|list| list.clone())
            .unwrap_or_default()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new(MockLatency::Realistic)
    }
}

#[async_trait]
impl PracticeBackend for MockBackend {
    fn mode(&self) -> &'static str {
        "mock"
    }

    async fn get_available_slots(&self, date: Option<NaiveDate>) -> ApiResult<AvailableSlotsResponse> {
        self.pause(1000).await;

        let available_slots: Vec<AvailableSlot> = SLOT_CATALOG
            .iter()
            .filter(|slot| !TAKEN_SLOTS.contains(slot))
            .map(|time| AvailableSlot {
                time: time.to_string(),
                available: true,
                slot_id: Some(format!("slot_{}", time.replace(':', ""))),
                duration: Some(SLOT_MINUTES),
            })
            .collect();

        let date = date.unwrap_or_else(|| Local::now().date_naive());
        Ok(AvailableSlotsResponse {
            success: true,
            date: date.format("%Y-%m-%d").to_string(),
            total_available: available_slots.len(),
            available_slots,
        })
    }

    async fn book_appointment(&self, form: &AppointmentFormData) -> ApiResult<Appointment> {
        self.pause(1500).await;

        if form.name.trim().is_empty() || form.email.trim().is_empty() || form.phone.trim().is_empty() {
            return Err(ApiError::rejected(REQUIRED_FIELDS_MESSAGE));
        }
        if form.date.trim().is_empty() || form.time.trim().is_empty() {
            return Err(ApiError::rejected(DATE_TIME_REQUIRED_MESSAGE));
        }
        let date = NaiveDate::parse_from_str(form.date.trim(), "%Y-%m-%d")
            .map_err(|_| ApiError::rejected(DATE_TIME_REQUIRED_MESSAGE))?;

        // Re-check against the advertised slots, as the real server does.
        let slots = self.get_available_slots(Some(date)).await?;
        let still_open = slots
            .available_slots
            .iter()
            .any(|s| s.available && s.time == form.time);
        if !still_open {
            tracing::info!(time = %form.time, "mock booking rejected, slot taken");
            return Err(ApiError::rejected(SLOT_TAKEN_MESSAGE));
        }

        let now = Utc::now().to_rfc3339();
        let appointment = Appointment {
            appointment_id: Some(format!("apt_{}", Uuid::new_v4().simple())),
            patient_name: form.name.clone(),
            patient_email: form.email.clone(),
            patient_phone: form.phone.clone(),
            appointment_date: date,
            appointment_time: form.time.clone(),
            reason: form.reason.clone(),
            status: AppointmentStatus::Pending,
            notes: form.message.clone(),
            created_at: Some(now.clone()),
            updated_at: Some(now),
        };

        self.appointments
            .lock()
            .map_err(|_| ApiError::rejected("mock store poisoned"))?
            .push(appointment.clone());

        tracing::info!(id = ?appointment.appointment_id, "mock appointment booked");
        Ok(appointment)
    }

    async fn get_appointments(
        &self,
        _page: u32,
        limit: u32,
        _bearer: Option<&str>,
    ) -> ApiResult<AppointmentPage> {
        self.pause(800).await;

        let appointments = self.appointments();
        Ok(AppointmentPage {
            pagination: Pagination {
                total: appointments.len() as u32,
                total_pages: 1,
                current_page: 1,
                limit,
                has_next_page: false,
                has_previous_page: false,
            },
            appointments,
        })
    }

    async fn submit_contact_form(&self, form: &ContactForm) -> ApiResult<()> {
        self.pause(1000).await;
        check_contact_form(form)
    }

    async fn subscribe_newsletter(&self, email: &str) -> ApiResult<()> {
        self.pause(500).await;
        check_newsletter(email)
    }
}

fn seed_appointments() -> Vec<Appointment> {
    let seed = |id: &str, name: &str, email: &str, phone: &str, day: u32, time: &str, reason: &str, status, created: &str| {
        Appointment {
            appointment_id: Some(id.to_string()),
            patient_name: name.to_string(),
            patient_email: email.to_string(),
            patient_phone: phone.to_string(),
            appointment_date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap_or_default(),
            appointment_time: time.to_string(),
            reason: Some(reason.to_string()),
            status,
            notes: None,
            created_at: Some(created.to_string()),
            updated_at: Some(created.to_string()),
        }
    };

    vec![
        seed(
            "apt_001",
            "John Doe",
            "john@example.com",
            "9886432371",
            15,
            "10:00",
            "Follow-up consultation",
            AppointmentStatus::Confirmed,
            "2024-01-10T10:00:00Z",
        ),
        seed(
            "apt_002",
            "Jane Smith",
            "jane@example.com",
            "9876543211",
            15,
            "14:30",
            "Initial consultation",
            AppointmentStatus::Pending,
            "2024-01-11T14:30:00Z",
        ),
    ]
}
