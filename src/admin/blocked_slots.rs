use std::ops::Deref;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Local;

use super::collection::{AdminResource, CollectionScreen};
use super::{Confirm, FetchSeq, authed};
use crate::api::ApiClient;
use crate::error::ApiResult;
use crate::models::{BlockedSlot, BlockedSlotDraft, BlockedSlotsSummary};
use crate::session::Session;

/// One-off closures of bookable time.
pub struct BlockedSlots;

#[async_trait]
impl AdminResource for BlockedSlots {
    type Row = BlockedSlot;
    type Draft = BlockedSlotDraft;

    fn noun(&self) -> &'static str {
        "blocked slot"
    }

    fn collection(&self) -> &'static str {
        "blocked slots"
    }

    fn row_id(&self, row: &BlockedSlot) -> i64 {
        row.id
    }

    fn blank_draft(&self) -> BlockedSlotDraft {
        BlockedSlotDraft::for_day(Local::now().date_naive())
    }

    fn draft_from(&self, row: &BlockedSlot) -> BlockedSlotDraft {
        BlockedSlotDraft::from(row)
    }

    async fn list(&self, client: &ApiClient, bearer: &str) -> ApiResult<Vec<BlockedSlot>> {
        client.list_blocked_slots(bearer).await
    }

    async fn create(
        &self,
        client: &ApiClient,
        draft: &BlockedSlotDraft,
        bearer: &str,
    ) -> ApiResult<BlockedSlot> {
        client.create_blocked_slot(draft, bearer).await
    }

    async fn update(
        &self,
        client: &ApiClient,
        id: i64,
        draft: &BlockedSlotDraft,
        bearer: &str,
    ) -> ApiResult<BlockedSlot> {
        client.update_blocked_slot(id, draft, bearer).await
    }

    async fn delete(&self, client: &ApiClient, id: i64, bearer: &str) -> ApiResult<()> {
        client.delete_blocked_slot(id, bearer).await
    }
}

/// Blocked-slot list plus the summary counters, which are refetched after
/// every successful mutation alongside the list.
pub struct BlockedSlotsScreen {
    inner: CollectionScreen<BlockedSlots>,
    summary: Mutex<Option<BlockedSlotsSummary>>,
    summary_seq: FetchSeq,
}

impl BlockedSlotsScreen {
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            inner: CollectionScreen::new(BlockedSlots, session),
            summary: Mutex::new(None),
            summary_seq: FetchSeq::new(),
        }
    }

    pub fn summary(&self) -> Option<BlockedSlotsSummary> {
        *self.summary.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub async fn fetch_all(&self) {
        self.inner.fetch().await;
        self.fetch_summary().await;
    }

    pub async fn fetch_summary(&self) {
        let ticket = self.summary_seq.begin();
        let result = authed(self.inner.session(), |client, token| async move {
            client.blocked_slots_summary(&token).await
        })
        .await;

        if !self.summary_seq.is_current(ticket) {
            return;
        }
        match result {
            Ok(summary) => *self.summary.lock().unwrap_or_else(|p| p.into_inner()) = Some(summary),
            // counters are decorative; the list carries the error state
            Err(e) => tracing::warn!(error = %e, "blocked slot summary fetch failed"),
        }
    }

    pub async fn submit(&self) -> ApiResult<BlockedSlot> {
        let row = self.inner.submit().await?;
        self.fetch_summary().await;
        Ok(row)
    }

    pub async fn delete(&self, id: i64, confirm: &dyn Confirm) -> ApiResult<bool> {
        let deleted = self.inner.delete(id, confirm).await?;
        if deleted {
            self.fetch_summary().await;
        }
        Ok(deleted)
    }
}

impl Deref for BlockedSlotsScreen {
    type Target = CollectionScreen<BlockedSlots>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
