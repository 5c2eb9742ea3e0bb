use std::collections::BTreeMap;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ApiClient, EMAIL_TEMPLATES};
use crate::error::ApiResult;
use crate::models::{EmailTemplate, EmailTemplateDraft, TemplateValidation};

const TEST: &str = "/email-templates/test/";
const VALIDATE: &str = "/email-templates/validate/";
const PREVIEW: &str = "/email-templates/preview/";
const STATISTICS: &str = "/email-templates/statistics/";

#[derive(Deserialize)]
struct ListEnvelope {
    templates: Vec<EmailTemplate>,
}

#[derive(Deserialize)]
struct ItemEnvelope {
    template: EmailTemplate,
}

#[derive(Deserialize)]
struct PreviewEnvelope {
    preview: String,
}

#[derive(Deserialize)]
struct StatisticsEnvelope {
    statistics: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateTestResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

#[derive(Serialize)]
struct TemplateTypeBody<'a> {
    template_type: &'a str,
}

impl ApiClient {
    pub async fn list_email_templates(&self, bearer: &str) -> ApiResult<Vec<EmailTemplate>> {
        let env: ListEnvelope = self.get(EMAIL_TEMPLATES, Some(bearer)).await?;
        Ok(env.templates)
    }

    pub async fn update_email_template(
        &self,
        draft: &EmailTemplateDraft,
        bearer: &str,
    ) -> ApiResult<EmailTemplate> {
        let env: ItemEnvelope = self
            .send(Method::PUT, EMAIL_TEMPLATES, Some(bearer), draft)
            .await?;
        Ok(env.template)
    }

    /// Sends a sample of `template_type` to the admin mailbox.
    pub async fn test_email_template(
        &self,
        template_type: &str,
        bearer: &str,
    ) -> ApiResult<TemplateTestResult> {
        self.send(Method::POST, TEST, Some(bearer), &TemplateTypeBody { template_type })
            .await
    }

    pub async fn validate_email_template(
        &self,
        draft: &EmailTemplateDraft,
        bearer: &str,
    ) -> ApiResult<TemplateValidation> {
        self.send(Method::POST, VALIDATE, Some(bearer), draft).await
    }

    pub async fn preview_email_template(
        &self,
        template_type: &str,
        bearer: &str,
    ) -> ApiResult<String> {
        let env: PreviewEnvelope = self
            .get_query(PREVIEW, &[("template_type", template_type)], Some(bearer))
            .await?;
        Ok(env.preview)
    }

    pub async fn email_statistics(&self, bearer: &str) -> ApiResult<BTreeMap<String, Value>> {
        let env: StatisticsEnvelope = self.get(STATISTICS, Some(bearer)).await?;
        Ok(env.statistics)
    }
}
