use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;

use super::{FetchSeq, authed, log_mutation_failure};
use crate::api::email_template_endpoints::TemplateTestResult;
use crate::error::{ApiError, ApiResult};
use crate::models::{EmailTemplate, EmailTemplateDraft, TemplateValidation};
use crate::session::Session;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplatesState {
    pub templates: Vec<EmailTemplate>,
    pub loading: bool,
    pub error: Option<String>,
    pub mutation_error: Option<String>,
}

/// Notification email templates, keyed by `template_type`.
pub struct EmailTemplatesScreen {
    session: Arc<Session>,
    state: Mutex<TemplatesState>,
    seq: FetchSeq,
}

impl EmailTemplatesScreen {
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            state: Mutex::new(TemplatesState::default()),
            seq: FetchSeq::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TemplatesState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> TemplatesState {
        self.lock().clone()
    }

    pub fn template(&self, template_type: &str) -> Option<EmailTemplate> {
        self.lock()
            .templates
            .iter()
            .find(|t| t.template_type == template_type)
            .cloned()
    }

    pub async fn fetch(&self) {
        let ticket = self.seq.begin();
        {
            let mut st = self.lock();
            st.loading = true;
            st.error = None;
        }

        let result = authed(&self.session, |client, token| async move {
            client.list_email_templates(&token).await
        })
        .await;

        if !self.seq.is_current(ticket) {
            return;
        }
        let mut st = self.lock();
        match result {
            Ok(templates) => st.templates = templates,
            Err(e) => {
                tracing::warn!(error = %e, "email template fetch failed");
                st.error = Some("Failed to load email templates".into());
            }
        }
        st.loading = false;
    }

    pub async fn preview(&self, template_type: &str) -> ApiResult<String> {
        authed(&self.session, |client, token| async move {
            client.preview_email_template(template_type, &token).await
        })
        .await
    }

    pub async fn send_test(&self, template_type: &str) -> ApiResult<TemplateTestResult> {
        let result = authed(&self.session, |client, token| async move {
            client.test_email_template(template_type, &token).await
        })
        .await;
        if let Ok(r) = &result {
            tracing::info!(template_type, success = r.success, "test email requested");
        }
        result
    }

    pub async fn statistics(&self) -> ApiResult<BTreeMap<String, Value>> {
        authed(&self.session, |client, token| async move {
            client.email_statistics(&token).await
        })
        .await
    }

    pub async fn validate(&self, draft: &EmailTemplateDraft) -> ApiResult<TemplateValidation> {
        authed(&self.session, |client, token| async move {
            client.validate_email_template(draft, &token).await
        })
        .await
    }

    /// Server-side validation first; only a valid draft is saved. A rejected
    /// draft reports its validation errors joined with "; ".
    pub async fn save(&self, draft: &EmailTemplateDraft) -> ApiResult<EmailTemplate> {
        let result = match self.validate(draft).await {
            Ok(v) if v.valid => {
                authed(&self.session, |client, token| async move {
                    client.update_email_template(draft, &token).await
                })
                .await
            }
            Ok(v) if v.errors.is_empty() => Err(ApiError::rejected("Template is not valid")),
            Ok(v) => Err(ApiError::rejected(v.errors.join("; "))),
            Err(e) => Err(e),
        };

        match result {
            Ok(saved) => {
                tracing::info!(template_type = %saved.template_type, "email template saved");
                self.lock().mutation_error = None;
                self.fetch().await;
                Ok(saved)
            }
            Err(e) => {
                let message = log_mutation_failure("email template", &e);
                self.lock().mutation_error = Some(message);
                Err(e)
            }
        }
    }
}
