// src/api/blocked_slot_endpoints.rs

use reqwest::Method;
use serde::Deserialize;

use super::{ApiClient, BLOCKED_SLOTS, BLOCKED_SLOTS_SUMMARY};
use crate::error::ApiResult;
use crate::models::{BlockedSlot, BlockedSlotDraft, BlockedSlotsSummary};

#[derive(Deserialize)]
struct ListEnvelope {
    blocked_slots: Vec<BlockedSlot>,
}

#[derive(Deserialize)]
struct ItemEnvelope {
    blocked_slot: BlockedSlot,
}

#[derive(Deserialize)]
struct SummaryEnvelope {
    summary: BlockedSlotsSummary,
}

impl ApiClient {
    pub async fn list_blocked_slots(&self, bearer: &str) -> ApiResult<Vec<BlockedSlot>> {
        let env: ListEnvelope = self.get(BLOCKED_SLOTS, Some(bearer)).await?;
        Ok(env.blocked_slots)
    }

    pub async fn create_blocked_slot(
        &self,
        draft: &BlockedSlotDraft,
        bearer: &str,
    ) -> ApiResult<BlockedSlot> {
        let env: ItemEnvelope = self
            .send(Method::POST, BLOCKED_SLOTS, Some(bearer), draft)
            .await?;
        Ok(env.blocked_slot)
    }

    pub async fn update_blocked_slot(
        &self,
        id: i64,
        draft: &BlockedSlotDraft,
        bearer: &str,
    ) -> ApiResult<BlockedSlot> {
        let endpoint = format!("{BLOCKED_SLOTS}{id}/");
        let env: ItemEnvelope = self.send(Method::PUT, &endpoint, Some(bearer), draft).await?;
        Ok(env.blocked_slot)
    }

    pub async fn delete_blocked_slot(&self, id: i64, bearer: &str) -> ApiResult<()> {
        self.call(Method::DELETE, &format!("{BLOCKED_SLOTS}{id}/"), Some(bearer))
            .await
    }

    pub async fn blocked_slots_summary(&self, bearer: &str) -> ApiResult<BlockedSlotsSummary> {
        let env: SummaryEnvelope = self.get(BLOCKED_SLOTS_SUMMARY, Some(bearer)).await?;
        Ok(env.summary)
    }
}
