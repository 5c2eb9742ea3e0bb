//! Admin session: current user plus access/refresh tokens.
//!
//! A [`Session`] is built once at startup with [`Session::start`], handed to
//! whatever needs it, and torn down by [`Session::logout`]. It is the only
//! writer of the persisted token pair.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::api::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::models::{TokenPair, User};

pub mod token_store;

pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};

#[derive(Default)]
struct SessionState {
    user: Option<User>,
    tokens: Option<TokenPair>,
    /// Server verdict from `check-admin` at login; `None` falls back to the
    /// user's staff/superuser flags.
    admin_check: Option<bool>,
    loading: bool,
}

/// Point-in-time view handed to the admin gate and the CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub user: Option<User>,
    pub authenticated: bool,
    pub is_admin: bool,
    pub loading: bool,
}

pub struct Session {
    client: Arc<ApiClient>,
    store: Arc<dyn TokenStore>,
    state: Mutex<SessionState>,
}

impl Session {
    /// New session in the loading state; call [`Session::restore`] next.
    pub fn new(client: Arc<ApiClient>, store: Arc<dyn TokenStore>) -> Self {
        Self {
            client,
            store,
            state: Mutex::new(SessionState {
                loading: true,
                ..SessionState::default()
            }),
        }
    }

    /// Construct and rehydrate from the persisted token pair.
    pub async fn start(client: Arc<ApiClient>, store: Arc<dyn TokenStore>) -> Self {
        let session = Self::new(client, store);
        session.restore().await;
        session
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let st = self.state();
        SessionSnapshot {
            authenticated: st.user.is_some() && st.tokens.is_some(),
            is_admin: st
                .user
                .as_ref()
                .is_some_and(|u| st.admin_check == Some(true) || u.is_admin()),
            user: st.user.clone(),
            loading: st.loading,
        }
    }

    pub fn user(&self) -> Option<User> {
        self.state().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.snapshot().authenticated
    }

    pub fn is_admin(&self) -> bool {
        self.snapshot().is_admin
    }

    pub fn loading(&self) -> bool {
        self.state().loading
    }

    pub fn access_token(&self) -> Option<String> {
        self.state().tokens.as_ref().map(|t| t.access.clone())
    }

    /// Verify the stored access token; refresh it if verification fails;
    /// anything else leaves the session signed out with storage cleared.
    pub async fn restore(&self) {
        self.state().loading = true;

        let Some(stored) = self.store.load() else {
            tracing::debug!("no stored admin tokens");
            // drops a corrupt file, no-op otherwise
            self.discard_persisted();
            self.finish_loading(None, None);
            return;
        };

        match self.client.verify_token(&stored.access).await {
            Ok(v) if v.valid && v.user.is_some() => {
                tracing::info!("stored access token verified");
                self.finish_loading(v.user, Some(stored));
                return;
            }
            Ok(_) => tracing::info!("stored access token rejected, refreshing"),
            Err(e) => tracing::info!(error = %e, "token verification failed, refreshing"),
        }

        let access = match self.client.refresh_token(&stored.refresh).await {
            Ok(access) => access,
            Err(e) => {
                tracing::warn!(error = %e, "token refresh failed, clearing session");
                self.discard_persisted();
                self.finish_loading(None, None);
                return;
            }
        };

        let renewed = TokenPair {
            access,
            refresh: stored.refresh,
        };
        if let Err(e) = self.store.save(&renewed) {
            tracing::warn!(error = %e, "could not persist refreshed token");
        }

        match self.client.user_profile(&renewed.access).await {
            Ok(user) => {
                tracing::info!(username = %user.username, "session restored after refresh");
                self.finish_loading(Some(user), Some(renewed));
            }
            Err(e) => {
                tracing::warn!(error = %e, "profile fetch after refresh failed, clearing session");
                self.discard_persisted();
                self.finish_loading(None, None);
            }
        }
    }

    fn finish_loading(&self, user: Option<User>, tokens: Option<TokenPair>) {
        let mut st = self.state();
        st.user = user;
        st.tokens = tokens;
        st.admin_check = None;
        st.loading = false;
    }

    fn discard_persisted(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "could not clear stored tokens");
        }
    }

    /// Returns whether the credentials were accepted. Never errors.
    pub async fn login(&self, username: &str, password: &str) -> bool {
        self.state().loading = true;

        let result = self.client.login(username, password).await;
        let ok = match result {
            Ok(resp) => {
                if let Err(e) = self.store.save(&resp.tokens) {
                    tracing::warn!(error = %e, "could not persist tokens");
                }
                let admin_check = match self.client.check_admin(&resp.tokens.access).await {
                    Ok(check) => Some(check.is_admin),
                    Err(e) => {
                        tracing::warn!(error = %e, "admin check failed, using staff flags");
                        None
                    }
                };
                tracing::info!(
                    username = %resp.user.username,
                    admin = admin_check.unwrap_or(false) || resp.user.is_admin(),
                    "login succeeded"
                );
                let mut st = self.state();
                st.user = Some(resp.user);
                st.tokens = Some(resp.tokens);
                st.admin_check = admin_check;
                true
            }
            Err(e) => {
                tracing::info!(username, error = %e, "login failed");
                false
            }
        };

        self.state().loading = false;
        ok
    }

    /// Best-effort server-side invalidation, then unconditional local teardown.
    pub async fn logout(&self) {
        let refresh = self.state().tokens.as_ref().map(|t| t.refresh.clone());
        if let Some(refresh) = refresh {
            if let Err(e) = self.client.logout(&refresh).await {
                tracing::warn!(error = %e, "server logout failed");
            }
        }

        {
            let mut st = self.state();
            st.user = None;
            st.tokens = None;
            st.admin_check = None;
        }
        self.discard_persisted();
        tracing::info!("logged out");
    }

    /// Run an authenticated call; on a 401 refresh the access token once and retry.
    pub async fn authorized<T, F, Fut>(&self, op: F) -> ApiResult<T>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        let token = self.access_token().ok_or(ApiError::NotAuthenticated)?;
        match op(token).await {
            Err(ApiError::Http { status: 401, .. }) => {
                let token = self.refresh_access().await?;
                op(token).await
            }
            other => other,
        }
    }

    async fn refresh_access(&self) -> ApiResult<String> {
        let stored = self.state().tokens.clone().ok_or(ApiError::NotAuthenticated)?;
        match self.client.refresh_token(&stored.refresh).await {
            Ok(access) => {
                let renewed = TokenPair {
                    access: access.clone(),
                    refresh: stored.refresh,
                };
                if let Err(e) = self.store.save(&renewed) {
                    tracing::warn!(error = %e, "could not persist refreshed token");
                }
                self.state().tokens = Some(renewed);
                tracing::debug!("access token refreshed");
                Ok(access)
            }
            Err(e) => {
                tracing::warn!(error = %e, "refresh after 401 failed, clearing session");
                {
                    let mut st = self.state();
                    st.user = None;
                    st.tokens = None;
                    st.admin_check = None;
                }
                self.discard_persisted();
                Err(ApiError::NotAuthenticated)
            }
        }
    }
}
