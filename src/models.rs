use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/* -------------------------
   Appointments
--------------------------*/

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 4] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The live API and the public booking flow disagree on field names
/// (`id` vs `appointment_id`, `name` vs `patient_name`, ...); both are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    #[serde(alias = "id", default, deserialize_with = "flexible_id")]
    pub appointment_id: Option<String>,
    #[serde(alias = "name", default)]
    pub patient_name: String,
    #[serde(alias = "email", default)]
    pub patient_email: String,
    #[serde(alias = "phone", default)]
    pub patient_phone: String,
    #[serde(alias = "date")]
    pub appointment_date: NaiveDate,
    #[serde(alias = "time")]
    pub appointment_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub status: AppointmentStatus,
    #[serde(alias = "message", default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Appointment {
    /// Case-insensitive substring match on patient name or email.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty()
            || self.patient_name.to_lowercase().contains(&term)
            || self.patient_email.to_lowercase().contains(&term)
    }
}

/// Accepts `"apt_001"`, `42` or `null`.
fn flexible_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match Option::<RawId>::deserialize(deserializer)? {
        Some(RawId::Text(s)) => Some(s),
        Some(RawId::Number(n)) => Some(n.to_string()),
        None => None,
    })
}

/// Public booking request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentFormData {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub date: String,
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Partial update for `PUT /appointments/{id}/`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AppointmentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AppointmentUpdate {
    pub fn status(status: AppointmentStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAction {
    Confirm,
    Cancel,
}

impl AdminAction {
    pub fn as_path(&self) -> &'static str {
        match self {
            AdminAction::Confirm => "confirm",
            AdminAction::Cancel => "cancel",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub total: u32,
    #[serde(default = "one")]
    pub total_pages: u32,
    #[serde(default = "one")]
    pub current_page: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub has_next_page: bool,
    #[serde(default)]
    pub has_previous_page: bool,
}

fn one() -> u32 {
    1
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppointmentPage {
    pub appointments: Vec<Appointment>,
    #[serde(default)]
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentStats {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub pending: u32,
    #[serde(default)]
    pub confirmed: u32,
    #[serde(default)]
    pub completed: u32,
    #[serde(default)]
    pub cancelled: u32,
}

/* -------------------------
   Slots
--------------------------*/

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableSlot {
    pub time: String,
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableSlotsResponse {
    #[serde(default)]
    pub success: bool,
    pub date: String,
    pub available_slots: Vec<AvailableSlot>,
    #[serde(default)]
    pub total_available: usize,
}

impl AvailableSlotsResponse {
    /// Times of the slots still flagged available, in catalogue order.
    pub fn open_times(&self) -> Vec<String> {
        self.available_slots
            .iter()
            .filter(|s| s.available)
            .map(|s| s.time.clone())
            .collect()
    }
}

/* -------------------------
   Doctor availability
--------------------------*/

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|d| d.label().eq_ignore_ascii_case(s))
    }
}

// The backend stores Monday=0..Sunday=6; the admin UI posts lowercase names.
impl<'de> Deserialize<'de> for DayOfWeek {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawDay {
            Index(u8),
            Name(String),
        }

        match RawDay::deserialize(deserializer)? {
            RawDay::Index(i) => DayOfWeek::ALL
                .get(usize::from(i))
                .copied()
                .ok_or_else(|| serde::de::Error::custom(format!("day_of_week out of range: {i}"))),
            RawDay::Name(name) => DayOfWeek::parse(&name)
                .ok_or_else(|| serde::de::Error::custom(format!("unknown day_of_week: {name}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub id: i64,
    pub day_of_week: DayOfWeek,
    pub start_time: String,
    pub end_time: String,
    #[serde(default = "yes")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

fn yes() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityDraft {
    pub day_of_week: DayOfWeek,
    pub start_time: String,
    pub end_time: String,
    pub is_active: bool,
}

impl Default for AvailabilityDraft {
    fn default() -> Self {
        Self {
            day_of_week: DayOfWeek::Monday,
            start_time: "09:00".into(),
            end_time: "17:00".into(),
            is_active: true,
        }
    }
}

impl From<&AvailabilityWindow> for AvailabilityDraft {
    fn from(w: &AvailabilityWindow) -> Self {
        Self {
            day_of_week: w.day_of_week,
            start_time: w.start_time.clone(),
            end_time: w.end_time.clone(),
            is_active: w.is_active,
        }
    }
}

/* -------------------------
   Blocked slots
--------------------------*/

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedSlot {
    pub id: i64,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedSlotDraft {
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub reason: String,
}

impl BlockedSlotDraft {
    /// Empty form: the given day, whole working day, no reason.
    pub fn for_day(date: NaiveDate) -> Self {
        Self {
            date,
            start_time: "09:00".into(),
            end_time: "17:00".into(),
            reason: String::new(),
        }
    }
}

impl From<&BlockedSlot> for BlockedSlotDraft {
    fn from(b: &BlockedSlot) -> Self {
        Self {
            date: b.date,
            start_time: b.start_time.clone(),
            end_time: b.end_time.clone(),
            reason: b.reason.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedSlotsSummary {
    #[serde(default)]
    pub total_blocked: u32,
    #[serde(default)]
    pub this_week: u32,
    #[serde(default)]
    pub this_month: u32,
    #[serde(default)]
    pub upcoming: u32,
}

/* -------------------------
   Auth
--------------------------*/

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_superuser: bool,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.is_staff || self.is_superuser
    }

    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &"<redacted>")
            .field("refresh", &"<redacted>")
            .finish()
    }
}

/* -------------------------
   Public forms
--------------------------*/

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub subject: String,
    pub message: String,
}

/* -------------------------
   Email templates
--------------------------*/

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailTemplate {
    pub template_type: String,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailTemplateDraft {
    pub template_type: String,
    pub subject: String,
    pub body: String,
}

impl From<&EmailTemplate> for EmailTemplateDraft {
    fn from(t: &EmailTemplate) -> Self {
        Self {
            template_type: t.template_type.clone(),
            subject: t.subject.clone(),
            body: t.body.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateValidation {
    pub valid: bool,
    #[serde(default)]
    pub errors: Vec<String>,
}
