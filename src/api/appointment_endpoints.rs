// src/api/appointment_endpoints.rs

use chrono::NaiveDate;
use reqwest::Method;
use serde::Deserialize;

use super::{
    ADMIN_APPOINTMENT_ACTION, APPOINTMENT_STATS, APPOINTMENTS, AVAILABLE_SLOTS, ApiClient,
};
use crate::error::{ApiError, ApiResult};
use crate::models::{
    AdminAction, Appointment, AppointmentFormData, AppointmentPage, AppointmentStats,
    AppointmentUpdate, AvailableSlotsResponse,
};

/* ============================================================
   Envelopes
   ============================================================ */

/// `POST /appointments/` answers with either `appointment` or `data`.
#[derive(Deserialize)]
struct BookingEnvelope {
    #[serde(default)]
    appointment: Option<Appointment>,
    #[serde(default)]
    data: Option<Appointment>,
}

#[derive(Deserialize)]
struct DetailEnvelope {
    appointment: Appointment,
}

#[derive(Deserialize)]
struct StatsEnvelope {
    stats: AppointmentStats,
}

fn detail_path(id: &str) -> String {
    format!("{APPOINTMENTS}{id}/")
}

/* ============================================================
   Endpoints
   ============================================================ */

impl ApiClient {
    /// Public; the server picks the next working day when no date is given.
    pub async fn available_slots(&self, date: Option<NaiveDate>) -> ApiResult<AvailableSlotsResponse> {
        let date = date.map(|d| d.format("%Y-%m-%d").to_string());
        let query: Vec<(&str, String)> = date.into_iter().map(|d| ("date", d)).collect();
        self.get_query(AVAILABLE_SLOTS, &query, None).await
    }

    /// Public booking submission; no bearer token.
    pub async fn book_appointment(&self, form: &AppointmentFormData) -> ApiResult<Appointment> {
        let env: BookingEnvelope = self.send(Method::POST, APPOINTMENTS, None, form).await?;
        env.appointment
            .or(env.data)
            .ok_or_else(|| ApiError::Decode("booking response carried no appointment".into()))
    }

    pub async fn list_appointments(
        &self,
        page: u32,
        limit: u32,
        bearer: Option<&str>,
    ) -> ApiResult<AppointmentPage> {
        self.get_query(APPOINTMENTS, &[("page", page), ("limit", limit)], bearer)
            .await
    }

    pub async fn appointment_detail(&self, id: &str, bearer: &str) -> ApiResult<Appointment> {
        let env: DetailEnvelope = self.get(&detail_path(id), Some(bearer)).await?;
        Ok(env.appointment)
    }

    pub async fn update_appointment(
        &self,
        id: &str,
        update: &AppointmentUpdate,
        bearer: &str,
    ) -> ApiResult<Appointment> {
        let env: DetailEnvelope = self
            .send(Method::PUT, &detail_path(id), Some(bearer), update)
            .await?;
        Ok(env.appointment)
    }

    pub async fn delete_appointment(&self, id: &str, bearer: &str) -> ApiResult<()> {
        self.call(Method::DELETE, &detail_path(id), Some(bearer)).await
    }

    pub async fn appointment_stats(&self, bearer: &str) -> ApiResult<AppointmentStats> {
        let env: StatsEnvelope = self.get(APPOINTMENT_STATS, Some(bearer)).await?;
        Ok(env.stats)
    }

    /// One-click confirm/cancel used by the admin list.
    pub async fn admin_appointment_action(
        &self,
        id: &str,
        action: AdminAction,
        bearer: &str,
    ) -> ApiResult<()> {
        let endpoint = format!("{ADMIN_APPOINTMENT_ACTION}{id}/{}/", action.as_path());
        self.call(Method::GET, &endpoint, Some(bearer)).await
    }
}
