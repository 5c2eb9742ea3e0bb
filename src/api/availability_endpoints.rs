// src/api/availability_endpoints.rs

use reqwest::Method;
use serde::Deserialize;

use super::{AVAILABILITY, ApiClient};
use crate::error::ApiResult;
use crate::models::{AvailabilityDraft, AvailabilityWindow};

#[derive(Deserialize)]
struct ListEnvelope {
    availability: Vec<AvailabilityWindow>,
}

#[derive(Deserialize)]
struct ItemEnvelope {
    availability: AvailabilityWindow,
}

impl ApiClient {
    pub async fn list_availability(&self, bearer: &str) -> ApiResult<Vec<AvailabilityWindow>> {
        let env: ListEnvelope = self.get(AVAILABILITY, Some(bearer)).await?;
        Ok(env.availability)
    }

    pub async fn create_availability(
        &self,
        draft: &AvailabilityDraft,
        bearer: &str,
    ) -> ApiResult<AvailabilityWindow> {
        let env: ItemEnvelope = self
            .send(Method::POST, AVAILABILITY, Some(bearer), draft)
            .await?;
        Ok(env.availability)
    }

    pub async fn update_availability(
        &self,
        id: i64,
        draft: &AvailabilityDraft,
        bearer: &str,
    ) -> ApiResult<AvailabilityWindow> {
        let endpoint = format!("{AVAILABILITY}{id}/");
        let env: ItemEnvelope = self.send(Method::PUT, &endpoint, Some(bearer), draft).await?;
        Ok(env.availability)
    }

    pub async fn delete_availability(&self, id: i64, bearer: &str) -> ApiResult<()> {
        self.call(Method::DELETE, &format!("{AVAILABILITY}{id}/"), Some(bearer))
            .await
    }
}
