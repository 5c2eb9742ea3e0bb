//! In-process stand-in for the practice's REST API.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::{get, post, put},
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use clinic_portal::api::ApiClient;

pub const USERNAME: &str = "drsmith";
pub const PASSWORD: &str = "correct-horse";

type Db = Arc<Mutex<Backend>>;
type Auth = TypedHeader<Authorization<Bearer>>;

pub struct Backend {
    pub access_tokens: HashSet<String>,
    pub refresh_tokens: HashSet<String>,
    pub issued: u32,
    pub user: Value,
    pub appointments: Vec<Value>,
    pub availability: Vec<Value>,
    pub blocked: Vec<Value>,
    pub next_id: i64,
    /// `METHOD /path` of every request, in arrival order.
    pub requests: Vec<String>,
    /// Delay before answering an appointment list request for a page.
    pub list_delays: HashMap<usize, Duration>,
    /// Requests that arrived without `Content-Type: application/json`.
    pub untyped_requests: Vec<String>,
    /// Answer for `check-admin`; `None` derives it from the user's flags.
    pub admin_verdict: Option<bool>,
    pub templates: Vec<Value>,
}

impl Backend {
    pub fn seeded() -> Self {
        Self {
            access_tokens: HashSet::new(),
            refresh_tokens: HashSet::new(),
            issued: 0,
            user: json!({
                "id": 1,
                "username": USERNAME,
                "email": "dr@example.com",
                "first_name": "Asha",
                "last_name": "Smith",
                "is_staff": true,
                "is_superuser": false
            }),
            appointments: vec![
                appointment(1, "Asha Rao", "asha@example.com", "09:00", "pending"),
                appointment(2, "Ravi Kumar", "ravi@example.com", "09:30", "confirmed"),
                appointment(3, "Meera Iyer", "meera@example.com", "11:00", "cancelled"),
            ],
            availability: vec![
                json!({"id": 1, "day_of_week": "monday", "start_time": "09:00", "end_time": "13:00", "is_active": true}),
                json!({"id": 2, "day_of_week": 2, "start_time": "14:00", "end_time": "18:00", "is_active": false}),
            ],
            blocked: vec![json!({
                "id": 1, "date": "2030-02-01", "start_time": "09:00", "end_time": "12:00", "reason": "Conference"
            })],
            next_id: 100,
            requests: Vec::new(),
            list_delays: HashMap::new(),
            untyped_requests: Vec::new(),
            admin_verdict: None,
            templates: vec![
                json!({
                    "template_type": "appointment_confirmation",
                    "subject": "Your appointment is confirmed",
                    "body": "Dear {{ name }}, see you on {{ date }}."
                }),
                json!({
                    "template_type": "appointment_cancellation",
                    "subject": "Your appointment was cancelled",
                    "body": "Dear {{ name }}, your visit on {{ date }} is cancelled."
                }),
            ],
        }
    }

    /// A fresh access/refresh pair, both accepted from now on.
    pub fn issue_tokens(&mut self) -> (String, String) {
        let access = self.issue_access();
        let refresh = format!("refresh-{}", self.issued);
        self.refresh_tokens.insert(refresh.clone());
        (access, refresh)
    }

    pub fn issue_access(&mut self) -> String {
        self.issued += 1;
        let access = format!("access-{}", self.issued);
        self.access_tokens.insert(access.clone());
        access
    }

    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

fn appointment(id: i64, name: &str, email: &str, time: &str, status: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "email": email,
        "phone": "9886432371",
        "date": "2030-01-15",
        "time": time,
        "reason": "follow_up",
        "status": status,
        "created_at": "2030-01-01T10:00:00"
    })
}

pub struct Fixture {
    pub base_url: String,
    db: Db,
}

impl Fixture {
    pub async fn spawn() -> Self {
        Self::spawn_with(Backend::seeded()).await
    }

    pub async fn spawn_with(backend: Backend) -> Self {
        let db: Db = Arc::new(Mutex::new(backend));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(db.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            base_url: format!("http://{addr}/api"),
            db,
        }
    }

    pub fn db(&self) -> MutexGuard<'_, Backend> {
        lock(&self.db)
    }

    pub fn client(&self) -> Arc<ApiClient> {
        Arc::new(ApiClient::new(&self.base_url, Duration::from_secs(5)).unwrap())
    }

    /// Requests whose `METHOD /path` line equals `line`.
    pub fn hits(&self, line: &str) -> usize {
        self.db().requests.iter().filter(|r| r.as_str() == line).count()
    }
}

fn lock(db: &Db) -> MutexGuard<'_, Backend> {
    db.lock().unwrap_or_else(|p| p.into_inner())
}

fn router(db: Db) -> Router {
    let api = Router::new()
        .route("/auth/login/", post(login))
        .route("/auth/logout/", post(logout))
        .route("/auth/token/verify/", get(verify))
        .route("/auth/refresh/", post(refresh))
        .route("/auth/profile/", get(profile))
        .route("/auth/check-admin/", post(check_admin))
        .route("/available-slots/", get(available_slots))
        .route("/appointments/", get(list_appointments).post(book))
        .route("/appointments/stats/", get(stats))
        .route(
            "/appointments/{id}/",
            get(appointment_detail).put(update_appointment).delete(delete_appointment),
        )
        .route("/admin/appointments/{id}/{action}/", get(admin_action))
        .route("/availability/", get(list_availability).post(create_availability))
        .route("/availability/{id}/", put(update_availability).delete(delete_availability))
        .route("/blocked-slots/", get(list_blocked).post(create_blocked))
        .route("/blocked-slots/summary/", get(blocked_summary))
        .route("/blocked-slots/{id}/", put(update_blocked).delete(delete_blocked))
        .route("/email-templates/", get(list_templates).put(update_template))
        .route("/email-templates/test/", post(test_template))
        .route("/email-templates/validate/", post(validate_template))
        .route("/email-templates/preview/", get(preview_template))
        .route("/email-templates/statistics/", get(template_statistics));

    Router::new()
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(db.clone(), record))
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

async fn record(State(db): State<Db>, req: Request, next: Next) -> Response {
    let line = format!("{} {}", req.method(), req.uri().path());
    let typed = req
        .headers()
        .get(axum::http::header::CONTENT_TYPE)
        .is_some_and(|v| v == "application/json");
    {
        let mut be = lock(&db);
        if !typed {
            be.untyped_requests.push(line.clone());
        }
        be.requests.push(line);
    }
    next.run(req).await
}

fn reply(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn check(db: &Db, auth: &Authorization<Bearer>) -> Result<(), Response> {
    if lock(db).access_tokens.contains(auth.token()) {
        Ok(())
    } else {
        Err(reply(
            StatusCode::UNAUTHORIZED,
            json!({"error": "Given token not valid for any token type"}),
        ))
    }
}

fn not_found(what: &str) -> Response {
    reply(StatusCode::NOT_FOUND, json!({"error": format!("{what} not found")}))
}

fn find(rows: &mut [Value], id: i64) -> Option<&mut Value> {
    rows.iter_mut().find(|r| r["id"].as_i64() == Some(id))
}

fn merge(row: &mut Value, patch: &Value) {
    if let (Some(row), Some(patch)) = (row.as_object_mut(), patch.as_object()) {
        for (k, v) in patch {
            row.insert(k.clone(), v.clone());
        }
    }
}

fn times_out_of_order(body: &Value) -> bool {
    match (body["start_time"].as_str(), body["end_time"].as_str()) {
        (Some(start), Some(end)) => start >= end,
        _ => true,
    }
}

fn bad_times() -> Response {
    reply(
        StatusCode::BAD_REQUEST,
        json!({"error": {"end_time": ["End time must be after start time"]}}),
    )
}

/* -------------------------
   Auth
--------------------------*/

#[derive(Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct RefreshBody {
    refresh: String,
}

async fn login(State(db): State<Db>, Json(body): Json<LoginBody>) -> Response {
    if body.username != USERNAME || body.password != PASSWORD {
        return reply(
            StatusCode::UNAUTHORIZED,
            json!({"error": "Invalid username or password"}),
        );
    }
    let mut be = lock(&db);
    let (access, refresh) = be.issue_tokens();
    reply(
        StatusCode::OK,
        json!({"tokens": {"access": access, "refresh": refresh}, "user": be.user.clone()}),
    )
}

async fn logout(State(db): State<Db>, Json(body): Json<RefreshBody>) -> Response {
    if lock(&db).refresh_tokens.remove(&body.refresh) {
        reply(StatusCode::OK, json!({"message": "Successfully logged out"}))
    } else {
        reply(StatusCode::INTERNAL_SERVER_ERROR, json!({"error": "Logout failed"}))
    }
}

async fn verify(State(db): State<Db>, TypedHeader(auth): Auth) -> Response {
    let be = lock(&db);
    if be.access_tokens.contains(auth.token()) {
        reply(StatusCode::OK, json!({"valid": true, "user": be.user.clone()}))
    } else {
        reply(
            StatusCode::UNAUTHORIZED,
            json!({"valid": false, "error": "Token is invalid or expired"}),
        )
    }
}

async fn refresh(State(db): State<Db>, Json(body): Json<RefreshBody>) -> Response {
    let mut be = lock(&db);
    if !be.refresh_tokens.contains(&body.refresh) {
        return reply(
            StatusCode::UNAUTHORIZED,
            json!({"error": "Token is invalid or expired"}),
        );
    }
    let access = be.issue_access();
    reply(StatusCode::OK, json!({"access": access}))
}

async fn profile(State(db): State<Db>, TypedHeader(auth): Auth) -> Result<Response, Response> {
    check(&db, &auth)?;
    Ok(reply(StatusCode::OK, json!({"user": lock(&db).user.clone()})))
}

async fn check_admin(State(db): State<Db>, TypedHeader(auth): Auth) -> Result<Response, Response> {
    check(&db, &auth)?;
    let be = lock(&db);
    let staff = be.user["is_staff"].as_bool().unwrap_or(false);
    let superuser = be.user["is_superuser"].as_bool().unwrap_or(false);
    let is_admin = be.admin_verdict.unwrap_or(staff || superuser);
    Ok(reply(
        StatusCode::OK,
        json!({"is_admin": is_admin, "is_staff": staff, "is_superuser": superuser}),
    ))
}

/* -------------------------
   Public booking
--------------------------*/

#[derive(Deserialize)]
struct SlotQuery {
    date: Option<String>,
}

/// Date that makes the slot listing fail with an empty 500.
pub const BROKEN_DATE: &str = "2031-01-01";

async fn available_slots(Query(q): Query<SlotQuery>) -> Response {
    let date = q.date.unwrap_or_else(|| "2030-01-15".to_string());
    if date == BROKEN_DATE {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    reply(
        StatusCode::OK,
        json!({
            "success": true,
            "date": date,
            "available_slots": [
                {"time": "09:00", "available": true},
                {"time": "09:30", "available": true},
                {"time": "10:00", "available": false},
                {"time": "11:00", "available": true}
            ],
            "total_available": 3
        }),
    )
}

async fn book(State(db): State<Db>, Json(body): Json<Value>) -> Response {
    if body["time"] == "10:00" {
        return reply(StatusCode::CONFLICT, json!({"error": "Slot not available"}));
    }
    let mut be = lock(&db);
    let id = be.next_id();
    let mut row = body.clone();
    merge(&mut row, &json!({"id": id, "status": "pending"}));
    be.appointments.push(row.clone());
    reply(
        StatusCode::CREATED,
        json!({"message": "Appointment booked successfully", "appointment": row}),
    )
}

/* -------------------------
   Appointments (admin)
--------------------------*/

#[derive(Deserialize)]
struct PageQuery {
    page: Option<usize>,
    limit: Option<usize>,
}

async fn list_appointments(
    State(db): State<Db>,
    TypedHeader(auth): Auth,
    Query(q): Query<PageQuery>,
) -> Result<Response, Response> {
    check(&db, &auth)?;
    let page = q.page.unwrap_or(1).max(1);
    let delay = lock(&db).list_delays.get(&page).copied();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let limit = q.limit.unwrap_or(10).max(1);
    let be = lock(&db);
    let total = be.appointments.len();
    let total_pages = total.div_ceil(limit).max(1);
    let rows: Vec<Value> = be
        .appointments
        .iter()
        .skip((page - 1) * limit)
        .take(limit)
        .cloned()
        .collect();

    Ok(reply(
        StatusCode::OK,
        json!({
            "appointments": rows,
            "pagination": {
                "total": total,
                "totalPages": total_pages,
                "currentPage": page,
                "limit": limit,
                "hasNextPage": page < total_pages,
                "hasPreviousPage": page > 1
            }
        }),
    ))
}

async fn stats(State(db): State<Db>, TypedHeader(auth): Auth) -> Result<Response, Response> {
    check(&db, &auth)?;
    let be = lock(&db);
    let count = |s: &str| be.appointments.iter().filter(|a| a["status"] == s).count();
    Ok(reply(
        StatusCode::OK,
        json!({"stats": {
            "total": be.appointments.len(),
            "pending": count("pending"),
            "confirmed": count("confirmed"),
            "completed": count("completed"),
            "cancelled": count("cancelled")
        }}),
    ))
}

async fn appointment_detail(
    State(db): State<Db>,
    TypedHeader(auth): Auth,
    Path(id): Path<i64>,
) -> Result<Response, Response> {
    check(&db, &auth)?;
    let mut be = lock(&db);
    let row = find(&mut be.appointments, id).ok_or_else(|| not_found("Appointment"))?;
    Ok(reply(StatusCode::OK, json!({"appointment": row.clone()})))
}

async fn update_appointment(
    State(db): State<Db>,
    TypedHeader(auth): Auth,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Response, Response> {
    check(&db, &auth)?;
    let mut be = lock(&db);
    let row = find(&mut be.appointments, id).ok_or_else(|| not_found("Appointment"))?;
    merge(row, &body);
    Ok(reply(StatusCode::OK, json!({"appointment": row.clone()})))
}

async fn delete_appointment(
    State(db): State<Db>,
    TypedHeader(auth): Auth,
    Path(id): Path<i64>,
) -> Result<Response, Response> {
    check(&db, &auth)?;
    let mut be = lock(&db);
    let before = be.appointments.len();
    be.appointments.retain(|a| a["id"].as_i64() != Some(id));
    if be.appointments.len() == before {
        return Err(not_found("Appointment"));
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn admin_action(
    State(db): State<Db>,
    TypedHeader(auth): Auth,
    Path((id, action)): Path<(i64, String)>,
) -> Result<Response, Response> {
    check(&db, &auth)?;
    let status = match action.as_str() {
        "confirm" => "confirmed",
        "cancel" => "cancelled",
        _ => return Err(reply(StatusCode::BAD_REQUEST, json!({"error": "Unknown action"}))),
    };
    let mut be = lock(&db);
    let row = find(&mut be.appointments, id).ok_or_else(|| not_found("Appointment"))?;
    merge(row, &json!({"status": status}));
    // the live server renders a confirmation page here, not JSON
    Ok(Html(format!("<html><body><h1>Appointment {status}</h1></body></html>")).into_response())
}

/* -------------------------
   Availability
--------------------------*/

async fn list_availability(State(db): State<Db>, TypedHeader(auth): Auth) -> Result<Response, Response> {
    check(&db, &auth)?;
    Ok(reply(StatusCode::OK, json!({"availability": lock(&db).availability.clone()})))
}

async fn create_availability(
    State(db): State<Db>,
    TypedHeader(auth): Auth,
    Json(body): Json<Value>,
) -> Result<Response, Response> {
    check(&db, &auth)?;
    if times_out_of_order(&body) {
        return Err(bad_times());
    }
    let mut be = lock(&db);
    let mut row = body;
    merge(&mut row, &json!({"id": be.next_id()}));
    be.availability.push(row.clone());
    Ok(reply(StatusCode::CREATED, json!({"availability": row})))
}

async fn update_availability(
    State(db): State<Db>,
    TypedHeader(auth): Auth,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Response, Response> {
    check(&db, &auth)?;
    if times_out_of_order(&body) {
        return Err(bad_times());
    }
    let mut be = lock(&db);
    let row = find(&mut be.availability, id).ok_or_else(|| not_found("Availability"))?;
    merge(row, &body);
    Ok(reply(StatusCode::OK, json!({"availability": row.clone()})))
}

async fn delete_availability(
    State(db): State<Db>,
    TypedHeader(auth): Auth,
    Path(id): Path<i64>,
) -> Result<Response, Response> {
    check(&db, &auth)?;
    lock(&db).availability.retain(|a| a["id"].as_i64() != Some(id));
    Ok(StatusCode::NO_CONTENT.into_response())
}

/* -------------------------
   Blocked slots
--------------------------*/

async fn list_blocked(State(db): State<Db>, TypedHeader(auth): Auth) -> Result<Response, Response> {
    check(&db, &auth)?;
    Ok(reply(StatusCode::OK, json!({"blocked_slots": lock(&db).blocked.clone()})))
}

async fn create_blocked(
    State(db): State<Db>,
    TypedHeader(auth): Auth,
    Json(body): Json<Value>,
) -> Result<Response, Response> {
    check(&db, &auth)?;
    if times_out_of_order(&body) {
        return Err(bad_times());
    }
    let mut be = lock(&db);
    let mut row = body;
    merge(&mut row, &json!({"id": be.next_id()}));
    be.blocked.push(row.clone());
    Ok(reply(StatusCode::CREATED, json!({"blocked_slot": row})))
}

async fn update_blocked(
    State(db): State<Db>,
    TypedHeader(auth): Auth,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Response, Response> {
    check(&db, &auth)?;
    let mut be = lock(&db);
    let row = find(&mut be.blocked, id).ok_or_else(|| not_found("Blocked slot"))?;
    merge(row, &body);
    Ok(reply(StatusCode::OK, json!({"blocked_slot": row.clone()})))
}

async fn delete_blocked(
    State(db): State<Db>,
    TypedHeader(auth): Auth,
    Path(id): Path<i64>,
) -> Result<Response, Response> {
    check(&db, &auth)?;
    lock(&db).blocked.retain(|b| b["id"].as_i64() != Some(id));
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn blocked_summary(State(db): State<Db>, TypedHeader(auth): Auth) -> Result<Response, Response> {
    check(&db, &auth)?;
    let n = lock(&db).blocked.len();
    Ok(reply(
        StatusCode::OK,
        json!({"summary": {"total_blocked": n, "this_week": 0, "this_month": n, "upcoming": n}}),
    ))
}

/* -------------------------
   Email templates
--------------------------*/

#[derive(Deserialize)]
struct TemplateTypeBody {
    template_type: String,
}

#[derive(Deserialize)]
struct PreviewQuery {
    template_type: String,
}

fn unknown_template(kind: &str) -> Response {
    reply(
        StatusCode::NOT_FOUND,
        json!({"error": format!("Unknown template type: {kind}")}),
    )
}

async fn list_templates(State(db): State<Db>, TypedHeader(auth): Auth) -> Result<Response, Response> {
    check(&db, &auth)?;
    Ok(reply(StatusCode::OK, json!({"templates": lock(&db).templates.clone()})))
}

async fn update_template(
    State(db): State<Db>,
    TypedHeader(auth): Auth,
    Json(body): Json<Value>,
) -> Result<Response, Response> {
    check(&db, &auth)?;
    let kind = body["template_type"].as_str().unwrap_or_default().to_string();
    let mut be = lock(&db);
    let row = be
        .templates
        .iter_mut()
        .find(|t| t["template_type"] == kind.as_str())
        .ok_or_else(|| unknown_template(&kind))?;
    merge(row, &body);
    merge(row, &json!({"updated_at": "2030-01-02T09:00:00"}));
    Ok(reply(StatusCode::OK, json!({"template": row.clone()})))
}

async fn test_template(
    State(db): State<Db>,
    TypedHeader(auth): Auth,
    Json(body): Json<TemplateTypeBody>,
) -> Result<Response, Response> {
    check(&db, &auth)?;
    let known = lock(&db)
        .templates
        .iter()
        .any(|t| t["template_type"] == body.template_type.as_str());
    if !known {
        return Err(unknown_template(&body.template_type));
    }
    Ok(reply(
        StatusCode::OK,
        json!({"success": true, "message": format!("Test email sent for {}", body.template_type)}),
    ))
}

async fn validate_template(
    State(db): State<Db>,
    TypedHeader(auth): Auth,
    Json(body): Json<Value>,
) -> Result<Response, Response> {
    check(&db, &auth)?;
    let subject = body["subject"].as_str().unwrap_or_default();
    let text = body["body"].as_str().unwrap_or_default();
    let mut errors = Vec::new();
    if subject.trim().is_empty() {
        errors.push("Subject is required");
    }
    if text.matches("{{").count() != text.matches("}}").count() {
        errors.push("Unbalanced template braces");
    }
    Ok(reply(
        StatusCode::OK,
        json!({"valid": errors.is_empty(), "errors": errors}),
    ))
}

async fn preview_template(
    State(db): State<Db>,
    TypedHeader(auth): Auth,
    Query(q): Query<PreviewQuery>,
) -> Result<Response, Response> {
    check(&db, &auth)?;
    let be = lock(&db);
    let template = be
        .templates
        .iter()
        .find(|t| t["template_type"] == q.template_type.as_str())
        .ok_or_else(|| unknown_template(&q.template_type))?;
    let preview = template["body"]
        .as_str()
        .unwrap_or_default()
        .replace("{{ name }}", "Jane Doe")
        .replace("{{ date }}", "2030-01-15");
    Ok(reply(StatusCode::OK, json!({"preview": preview})))
}

async fn template_statistics(State(db): State<Db>, TypedHeader(auth): Auth) -> Result<Response, Response> {
    check(&db, &auth)?;
    let n = lock(&db).templates.len();
    Ok(reply(
        StatusCode::OK,
        json!({"statistics": {"templates": n, "sent_today": 4, "failed_today": 0}}),
    ))
}
