use async_trait::async_trait;

use super::collection::{AdminResource, CollectionScreen};
use crate::api::ApiClient;
use crate::error::ApiResult;
use crate::models::{AvailabilityDraft, AvailabilityWindow};

/// Recurring weekly working hours.
pub struct Availability;

pub type AvailabilityScreen = CollectionScreen<Availability>;

#[async_trait]
impl AdminResource for Availability {
    type Row = AvailabilityWindow;
    type Draft = AvailabilityDraft;

    fn noun(&self) -> &'static str {
        "availability"
    }

    fn collection(&self) -> &'static str {
        "availability"
    }

    fn row_id(&self, row: &AvailabilityWindow) -> i64 {
        row.id
    }

    fn blank_draft(&self) -> AvailabilityDraft {
        AvailabilityDraft::default()
    }

    fn draft_from(&self, row: &AvailabilityWindow) -> AvailabilityDraft {
        AvailabilityDraft::from(row)
    }

    async fn list(&self, client: &ApiClient, bearer: &str) -> ApiResult<Vec<AvailabilityWindow>> {
        client.list_availability(bearer).await
    }

    async fn create(
        &self,
        client: &ApiClient,
        draft: &AvailabilityDraft,
        bearer: &str,
    ) -> ApiResult<AvailabilityWindow> {
        client.create_availability(draft, bearer).await
    }

    async fn update(
        &self,
        client: &ApiClient,
        id: i64,
        draft: &AvailabilityDraft,
        bearer: &str,
    ) -> ApiResult<AvailabilityWindow> {
        client.update_availability(id, draft, bearer).await
    }

    async fn delete(&self, client: &ApiClient, id: i64, bearer: &str) -> ApiResult<()> {
        client.delete_availability(id, bearer).await
    }
}
