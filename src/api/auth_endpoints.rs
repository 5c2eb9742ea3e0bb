// src/api/auth_endpoints.rs

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::ApiClient;
use crate::error::ApiResult;
use crate::models::{TokenPair, User};

pub const LOGIN: &str = "/auth/login/";
pub const LOGOUT: &str = "/auth/logout/";
pub const REFRESH: &str = "/auth/refresh/";
pub const VERIFY: &str = "/auth/token/verify/";
pub const USER_PROFILE: &str = "/auth/profile/";
pub const CHECK_ADMIN: &str = "/auth/check-admin/";

/* ============================================================
   Request / response DTOs
   ============================================================ */

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub tokens: TokenPair,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyResponse {
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access: String,
}

#[derive(Deserialize)]
struct ProfileResponse {
    user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminCheck {
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_superuser: bool,
}

/* ============================================================
   Endpoints
   ============================================================ */

impl ApiClient {
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<LoginResponse> {
        self.send(
            Method::POST,
            LOGIN,
            None,
            &LoginRequest { username, password },
        )
        .await
    }

    /// Invalidates the refresh token server-side.
    pub async fn logout(&self, refresh: &str) -> ApiResult<()> {
        let _: serde_json::Value = self
            .send(Method::POST, LOGOUT, None, &RefreshRequest { refresh })
            .await?;
        Ok(())
    }

    pub async fn verify_token(&self, access: &str) -> ApiResult<VerifyResponse> {
        self.get(VERIFY, Some(access)).await
    }

    /// Exchanges a refresh token for a new access token.
    pub async fn refresh_token(&self, refresh: &str) -> ApiResult<String> {
        let resp: RefreshResponse = self
            .send(Method::POST, REFRESH, None, &RefreshRequest { refresh })
            .await?;
        Ok(resp.access)
    }

    pub async fn user_profile(&self, access: &str) -> ApiResult<User> {
        let resp: ProfileResponse = self.get(USER_PROFILE, Some(access)).await?;
        Ok(resp.user)
    }

    pub async fn check_admin(&self, access: &str) -> ApiResult<AdminCheck> {
        self.send(Method::POST, CHECK_ADMIN, Some(access), &serde_json::json!({}))
            .await
    }
}
