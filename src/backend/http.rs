use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{PracticeBackend, check_contact_form, check_newsletter};
use crate::api::ApiClient;
use crate::error::ApiResult;
use crate::models::{Appointment, AppointmentFormData, AppointmentPage, AvailableSlotsResponse, ContactForm};

/// Public-site capabilities served by the real REST API.
pub struct HttpBackend {
    client: Arc<ApiClient>,
}

impl HttpBackend {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }
}

#[async_trait]
impl PracticeBackend for HttpBackend {
    fn mode(&self) -> &'static str {
        "remote"
    }

    async fn get_available_slots(&self, date: Option<NaiveDate>) -> ApiResult<AvailableSlotsResponse> {
        self.client.available_slots(date).await
    }

    async fn book_appointment(&self, form: &AppointmentFormData) -> ApiResult<Appointment> {
        self.client.book_appointment(form).await
    }

    async fn get_appointments(
        &self,
        page: u32,
        limit: u32,
        bearer: Option<&str>,
    ) -> ApiResult<AppointmentPage> {
        self.client.list_appointments(page, limit, bearer).await
    }

    // The REST API exposes no contact or newsletter endpoint; submissions are
    // checked and acknowledged locally.
    async fn submit_contact_form(&self, form: &ContactForm) -> ApiResult<()> {
        check_contact_form(form)?;
        tracing::warn!("contact form accepted locally, API has no contact endpoint");
        Ok(())
    }

    async fn subscribe_newsletter(&self, email: &str) -> ApiResult<()> {
        check_newsletter(email)?;
        tracing::warn!("newsletter signup accepted locally, API has no newsletter endpoint");
        Ok(())
    }
}
