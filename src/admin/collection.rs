use std::fmt::Debug;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::{Confirm, FetchSeq, authed, log_mutation_failure};
use crate::api::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::session::Session;

/// One admin-managed REST collection with integer ids.
#[async_trait]
pub trait AdminResource: Send + Sync {
    type Row: Debug + Clone + Send + Sync;
    type Draft: Debug + Clone + Send + Sync;

    /// Singular, for prompts: "blocked slot".
    fn noun(&self) -> &'static str;
    /// Plural, for load errors: "blocked slots".
    fn collection(&self) -> &'static str;

    fn row_id(&self, row: &Self::Row) -> i64;
    fn blank_draft(&self) -> Self::Draft;
    fn draft_from(&self, row: &Self::Row) -> Self::Draft;

    async fn list(&self, client: &ApiClient, bearer: &str) -> ApiResult<Vec<Self::Row>>;
    async fn create(&self, client: &ApiClient, draft: &Self::Draft, bearer: &str) -> ApiResult<Self::Row>;
    async fn update(
        &self,
        client: &ApiClient,
        id: i64,
        draft: &Self::Draft,
        bearer: &str,
    ) -> ApiResult<Self::Row>;
    async fn delete(&self, client: &ApiClient, id: i64, bearer: &str) -> ApiResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorTarget {
    Create,
    Update(i64),
}

/// The create/edit form shared by a screen. Opened empty it creates, opened
/// from a row it updates that row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorModal<D> {
    pub draft: D,
    editing: Option<i64>,
    open: bool,
}

impl<D> EditorModal<D> {
    pub fn closed(blank: D) -> Self {
        Self {
            draft: blank,
            editing: None,
            open: false,
        }
    }

    pub fn open_create(&mut self, blank: D) {
        self.draft = blank;
        self.editing = None;
        self.open = true;
    }

    pub fn open_edit(&mut self, id: i64, draft: D) {
        self.draft = draft;
        self.editing = Some(id);
        self.open = true;
    }

    pub fn close(&mut self, blank: D) {
        *self = Self::closed(blank);
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn target(&self) -> EditorTarget {
        match self.editing {
            Some(id) => EditorTarget::Update(id),
            None => EditorTarget::Create,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CollectionState<R, D> {
    pub rows: Vec<R>,
    pub loading: bool,
    pub error: Option<String>,
    pub mutation_error: Option<String>,
    pub editor: EditorModal<D>,
}

pub struct CollectionScreen<R: AdminResource> {
    resource: R,
    session: Arc<Session>,
    state: Mutex<CollectionState<R::Row, R::Draft>>,
    seq: FetchSeq,
}

impl<R: AdminResource> CollectionScreen<R> {
    pub fn new(resource: R, session: Arc<Session>) -> Self {
        let editor = EditorModal::closed(resource.blank_draft());
        Self {
            resource,
            session,
            state: Mutex::new(CollectionState {
                rows: Vec::new(),
                loading: false,
                error: None,
                mutation_error: None,
                editor,
            }),
            seq: FetchSeq::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CollectionState<R::Row, R::Draft>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> CollectionState<R::Row, R::Draft> {
        self.lock().clone()
    }

    pub fn rows(&self) -> Vec<R::Row> {
        self.lock().rows.clone()
    }

    pub(crate) fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub async fn fetch(&self) {
        let ticket = self.seq.begin();
        {
            let mut st = self.lock();
            st.loading = true;
            st.error = None;
        }

        let resource = &self.resource;
        let result = authed(&self.session, |client, token| async move {
            resource.list(&client, &token).await
        })
        .await;

        if !self.seq.is_current(ticket) {
            tracing::debug!(collection = resource.collection(), "discarding stale list response");
            return;
        }

        let mut st = self.lock();
        match result {
            Ok(rows) => {
                tracing::debug!(collection = resource.collection(), count = rows.len(), "list loaded");
                st.rows = rows;
            }
            Err(e) => {
                tracing::warn!(collection = resource.collection(), error = %e, "list fetch failed");
                st.error = Some(format!("Failed to load {}", resource.collection()));
            }
        }
        st.loading = false;
    }

    pub fn open_create(&self) {
        let blank = self.resource.blank_draft();
        self.lock().editor.open_create(blank);
    }

    /// Returns false when `id` is not in the loaded rows.
    pub fn open_edit(&self, id: i64) -> bool {
        let mut st = self.lock();
        let Some(row) = st.rows.iter().find(|r| self.resource.row_id(r) == id) else {
            return false;
        };
        let draft = self.resource.draft_from(row);
        st.editor.open_edit(id, draft);
        true
    }

    pub fn edit_draft(&self, edit: impl FnOnce(&mut R::Draft)) {
        edit(&mut self.lock().editor.draft);
    }

    pub fn close_editor(&self) {
        let blank = self.resource.blank_draft();
        self.lock().editor.close(blank);
    }

    /// Create or update depending on how the editor was opened, then refetch.
    /// On failure the editor stays open with its draft.
    pub async fn submit(&self) -> ApiResult<R::Row> {
        let (target, draft) = {
            let st = self.lock();
            if !st.editor.is_open() {
                return Err(ApiError::rejected("Nothing to save"));
            }
            (st.editor.target(), st.editor.draft.clone())
        };

        let resource = &self.resource;
        let draft = &draft;
        let result = match target {
            EditorTarget::Create => {
                authed(&self.session, |client, token| async move {
                    resource.create(&client, draft, &token).await
                })
                .await
            }
            EditorTarget::Update(id) => {
                authed(&self.session, |client, token| async move {
                    resource.update(&client, id, draft, &token).await
                })
                .await
            }
        };

        match result {
            Ok(row) => {
                tracing::info!(
                    resource = resource.noun(),
                    id = resource.row_id(&row),
                    ?target,
                    "saved"
                );
                {
                    let mut st = self.lock();
                    st.mutation_error = None;
                    st.editor.close(resource.blank_draft());
                }
                self.fetch().await;
                Ok(row)
            }
            Err(e) => {
                let message = log_mutation_failure(resource.noun(), &e);
                self.lock().mutation_error = Some(message);
                Err(e)
            }
        }
    }

    /// Ok(false) when the prompt was declined and nothing was sent.
    pub async fn delete(&self, id: i64, confirm: &dyn Confirm) -> ApiResult<bool> {
        let prompt = format!("Are you sure you want to delete this {}?", self.resource.noun());
        if !confirm.confirm(&prompt) {
            return Ok(false);
        }

        let resource = &self.resource;
        let result = authed(&self.session, |client, token| async move {
            resource.delete(&client, id, &token).await
        })
        .await;

        match result {
            Ok(()) => {
                tracing::info!(resource = resource.noun(), id, "deleted");
                self.lock().mutation_error = None;
                self.fetch().await;
                Ok(true)
            }
            Err(e) => {
                let message = log_mutation_failure(resource.noun(), &e);
                self.lock().mutation_error = Some(message);
                Err(e)
            }
        }
    }
}
