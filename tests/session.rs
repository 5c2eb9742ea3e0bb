mod common;

use std::sync::Arc;

use clinic_portal::admin::{AppointmentsScreen, DashboardScreen};
use clinic_portal::error::ApiError;
use clinic_portal::models::TokenPair;
use clinic_portal::session::{FileTokenStore, MemoryTokenStore, Session, TokenStore};

use common::{Fixture, PASSWORD, USERNAME};

fn file_store(dir: &tempfile::TempDir) -> Arc<FileTokenStore> {
    Arc::new(FileTokenStore::new(dir.path().join("admin_tokens.json")))
}

#[tokio::test]
async fn login_persists_tokens_and_marks_admin() {
    let fx = Fixture::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let store = file_store(&dir);

    let session = Session::start(fx.client(), store.clone()).await;
    assert!(!session.loading());
    assert!(!session.is_authenticated());

    assert!(session.login(USERNAME, PASSWORD).await);
    let snap = session.snapshot();
    assert!(snap.authenticated);
    assert!(snap.is_admin);
    assert!(!snap.loading);
    assert_eq!(snap.user.unwrap().username, USERNAME);
    assert_eq!(fx.hits("POST /api/auth/check-admin/"), 1);

    let saved = store.load().unwrap();
    assert_eq!(Some(saved.access), session.access_token());
}

#[tokio::test]
async fn rejected_login_returns_false_and_stores_nothing() {
    let fx = Fixture::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let store = file_store(&dir);
    let session = Session::start(fx.client(), store.clone()).await;

    assert!(!session.login(USERNAME, "wrong").await);
    assert!(!session.is_authenticated());
    assert!(!session.loading());
    assert!(!store.path().exists());
}

#[tokio::test]
async fn non_staff_user_signs_in_without_admin_rights() {
    let fx = Fixture::spawn().await;
    fx.db().user["is_staff"] = serde_json::json!(false);
    let session = Session::start(fx.client(), Arc::new(MemoryTokenStore::new())).await;

    assert!(session.login(USERNAME, PASSWORD).await);
    assert!(session.is_authenticated());
    assert!(!session.is_admin());
}

#[tokio::test]
async fn server_admin_verdict_outranks_staff_flags() {
    let fx = Fixture::spawn().await;
    {
        let mut db = fx.db();
        db.user["is_staff"] = serde_json::json!(false);
        db.admin_verdict = Some(true);
    }
    let session = Session::start(fx.client(), Arc::new(MemoryTokenStore::new())).await;

    assert!(session.login(USERNAME, PASSWORD).await);
    assert!(session.is_admin());
    assert_eq!(fx.hits("POST /api/auth/check-admin/"), 1);

    session.logout().await;
    assert!(!session.is_admin());
}

#[tokio::test]
async fn valid_stored_token_restores_session() {
    let fx = Fixture::spawn().await;
    let (access, refresh) = fx.db().issue_tokens();
    let store = Arc::new(MemoryTokenStore::with_tokens(TokenPair { access, refresh }));

    let session = Session::start(fx.client(), store).await;
    assert!(session.is_admin());
    assert_eq!(fx.hits("POST /api/auth/refresh/"), 0);
}

#[tokio::test]
async fn expired_access_is_refreshed_on_restore() {
    let fx = Fixture::spawn().await;
    let (_, refresh) = fx.db().issue_tokens();
    let dir = tempfile::tempdir().unwrap();
    let store = file_store(&dir);
    store
        .save(&TokenPair {
            access: "expired".into(),
            refresh: refresh.clone(),
        })
        .unwrap();

    let session = Session::start(fx.client(), store.clone()).await;
    assert!(session.is_authenticated());
    assert!(session.is_admin());

    let saved = store.load().unwrap();
    assert_ne!(saved.access, "expired");
    assert_eq!(saved.refresh, refresh);
    assert_eq!(Some(saved.access), session.access_token());
    assert_eq!(fx.hits("GET /api/auth/profile/"), 1);
}

#[tokio::test]
async fn invalid_token_pair_clears_storage() {
    let fx = Fixture::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let store = file_store(&dir);
    store
        .save(&TokenPair {
            access: "expired".into(),
            refresh: "revoked".into(),
        })
        .unwrap();

    let session = Session::start(fx.client(), store.clone()).await;
    assert!(!session.is_authenticated());
    assert!(!session.loading());
    assert!(session.user().is_none());
    assert!(!store.path().exists());
}

#[tokio::test]
async fn corrupt_token_file_is_discarded() {
    let fx = Fixture::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let store = file_store(&dir);
    std::fs::write(store.path(), "not json").unwrap();

    let session = Session::start(fx.client(), store.clone()).await;
    assert!(!session.is_authenticated());
    assert!(!store.path().exists());
    assert!(fx.db().requests.is_empty());
}

#[tokio::test]
async fn logout_clears_locally_even_when_server_fails() {
    let fx = Fixture::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let store = file_store(&dir);
    let session = Session::start(fx.client(), store.clone()).await;
    assert!(session.login(USERNAME, PASSWORD).await);

    // server forgets the refresh token, so its logout call fails
    fx.db().refresh_tokens.clear();
    session.logout().await;

    assert_eq!(fx.hits("POST /api/auth/logout/"), 1);
    assert!(!session.is_authenticated());
    assert!(session.access_token().is_none());
    assert!(!store.path().exists());
}

#[tokio::test]
async fn admin_call_retries_once_after_401() {
    let fx = Fixture::spawn().await;
    let store = Arc::new(MemoryTokenStore::new());
    let session = Arc::new(Session::start(fx.client(), store.clone()).await);
    assert!(session.login(USERNAME, PASSWORD).await);
    let first = session.access_token().unwrap();

    fx.db().access_tokens.clear();
    let screen = AppointmentsScreen::new(session.clone());
    screen.fetch().await;

    let st = screen.state();
    assert_eq!(st.error, None);
    assert_eq!(st.appointments.len(), 3);
    assert_eq!(fx.hits("GET /api/appointments/"), 2);
    assert_eq!(fx.hits("POST /api/auth/refresh/"), 1);

    let renewed = session.access_token().unwrap();
    assert_ne!(renewed, first);
    assert_eq!(store.load().unwrap().access, renewed);
}

#[tokio::test]
async fn failed_refresh_after_401_signs_out() {
    let fx = Fixture::spawn().await;
    let store = Arc::new(MemoryTokenStore::new());
    let session = Arc::new(Session::start(fx.client(), store.clone()).await);
    assert!(session.login(USERNAME, PASSWORD).await);

    {
        let mut db = fx.db();
        db.access_tokens.clear();
        db.refresh_tokens.clear();
    }
    let result = session
        .authorized(|token| {
            let client = session.client().clone();
            async move { client.appointment_stats(&token).await }
        })
        .await;

    assert_eq!(result, Err(ApiError::NotAuthenticated));
    assert!(!session.is_authenticated());
    assert!(store.load().is_none());

    // later screens see no session and stay empty
    let dashboard = DashboardScreen::new(session.clone());
    dashboard.refresh().await;
    assert_eq!(
        dashboard.state().error.as_deref(),
        Some("Failed to load dashboard data")
    );
}
