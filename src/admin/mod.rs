//! Back-office screens. Each one owns its collection, refetches it after every
//! successful mutation, and reports failed mutations through `mutation_error`.

use std::future::Future;
use std::sync::Arc;

use crate::api::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::session::Session;

pub mod appointments;
pub mod availability;
pub mod blocked_slots;
pub mod collection;
pub mod dashboard;
pub mod email_templates;

pub use crate::fetch_seq::FetchSeq;
pub use appointments::{AppointmentsScreen, AppointmentsState, PAGE_SIZE};
pub use availability::{Availability, AvailabilityScreen};
pub use blocked_slots::{BlockedSlots, BlockedSlotsScreen};
pub use collection::{AdminResource, CollectionScreen, CollectionState, EditorModal, EditorTarget};
pub use dashboard::{AnalyticsView, DashboardScreen, DashboardState};
pub use email_templates::{EmailTemplatesScreen, TemplatesState};

/// Interactive yes/no gate in front of destructive calls.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Fixed answer, for `--yes` and tests.
pub struct AutoConfirm(pub bool);

impl Confirm for AutoConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}

/// Run `op` with the session's client and a bearer token, retrying once
/// after a 401.
pub(crate) async fn authed<T, F, Fut>(session: &Session, op: F) -> ApiResult<T>
where
    F: Fn(Arc<ApiClient>, String) -> Fut,
    Fut: Future<Output = ApiResult<T>>,
{
    let client = Arc::clone(session.client());
    session.authorized(|token| op(Arc::clone(&client), token)).await
}

pub(crate) fn log_mutation_failure(what: &str, err: &ApiError) -> String {
    tracing::error!(action = what, error = %err, "admin mutation failed");
    err.message()
}
