//! The capability set the public site needs, behind one interface.
//!
//! [`select_backend`] picks the implementation once from [`Config`]; callers
//! never branch on the mode afterwards. Both implementations report through
//! the same [`ApiResult`] contract.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::api::ApiClient;
use crate::config::{BackendMode, Config};
use crate::error::{ApiError, ApiResult};
use crate::models::{Appointment, AppointmentFormData, AppointmentPage, AvailableSlotsResponse, ContactForm};

pub mod http;
pub mod mock;

pub use http::HttpBackend;
pub use mock::{MockBackend, MockLatency};

pub const REQUIRED_FIELDS_MESSAGE: &str = "Please fill in all required fields";
pub const EMAIL_REQUIRED_MESSAGE: &str = "Email is required";

#[async_trait]
pub trait PracticeBackend: Send + Sync {
    /// "mock" or "remote", for logs.
    fn mode(&self) -> &'static str;

    async fn get_available_slots(&self, date: Option<NaiveDate>) -> ApiResult<AvailableSlotsResponse>;

    async fn book_appointment(&self, form: &AppointmentFormData) -> ApiResult<Appointment>;

    async fn get_appointments(
        &self,
        page: u32,
        limit: u32,
        bearer: Option<&str>,
    ) -> ApiResult<AppointmentPage>;

    async fn submit_contact_form(&self, form: &ContactForm) -> ApiResult<()>;

    async fn subscribe_newsletter(&self, email: &str) -> ApiResult<()>;
}

pub fn select_backend(cfg: &Config) -> ApiResult<Arc<dyn PracticeBackend>> {
    match cfg.backend_mode() {
        BackendMode::Mock => {
            tracing::info!("no API URL configured, using mock backend");
            Ok(Arc::new(MockBackend::new(MockLatency::Realistic)))
        }
        BackendMode::Remote(url) => {
            tracing::info!(%url, "using remote backend");
            let client = ApiClient::new(&url, cfg.http_timeout)?;
            Ok(Arc::new(HttpBackend::new(Arc::new(client))))
        }
    }
}

pub(crate) fn check_contact_form(form: &ContactForm) -> ApiResult<()> {
    if form.name.trim().is_empty() || form.email.trim().is_empty() || form.message.trim().is_empty() {
        return Err(ApiError::rejected(REQUIRED_FIELDS_MESSAGE));
    }
    Ok(())
}

pub(crate) fn check_newsletter(email: &str) -> ApiResult<()> {
    if email.trim().is_empty() {
        return Err(ApiError::rejected(EMAIL_REQUIRED_MESSAGE));
    }
    Ok(())
}
