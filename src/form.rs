//! Client-side validation for the public forms.
//!
//! Nothing here touches the network until every field checks out; the
//! booking form then hands off to [`BookingController`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

use chrono::NaiveDate;
use regex::Regex;
use tokio::time::Instant;

use crate::booking::BookingController;
use crate::models::{AppointmentFormData, ContactForm};

/// Visit reasons the practice accepts, as `(value, label)`.
pub const VISIT_REASONS: [(&str, &str); 7] = [
    ("initial_consultation", "Initial Consultation"),
    ("follow_up", "Follow-up Visit"),
    ("second_opinion", "Second Opinion"),
    ("treatment_planning", "Treatment Planning"),
    ("post_surgery", "Post-Surgery Checkup"),
    ("emergency", "Emergency Consultation"),
    ("other", "Other"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormField {
    Name,
    Email,
    Phone,
    Date,
    Time,
    Reason,
    Message,
}

impl FormField {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormField::Name => "name",
            FormField::Email => "email",
            FormField::Phone => "phone",
            FormField::Date => "date",
            FormField::Time => "time",
            FormField::Reason => "reason",
            FormField::Message => "message",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type FieldErrors = BTreeMap<FormField, String>;

/* -------------------------
   Field rules
--------------------------*/

static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));

// Indian mobile numbers: ten digits, leading 6-9.
static MOBILE_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[6-9]\d{9}$").expect("mobile pattern"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_SHAPE.is_match(email.trim())
}

/// Non-digits are stripped first, so "98864 32371" passes.
pub fn is_valid_phone(phone: &str) -> bool {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    MOBILE_SHAPE.is_match(&digits)
}

pub fn is_visit_reason(value: &str) -> bool {
    VISIT_REASONS.iter().any(|(v, _)| *v == value)
}

fn check_name(name: &str, errors: &mut FieldErrors) {
    if name.trim().is_empty() {
        errors.insert(FormField::Name, "Name is required".into());
    }
}

fn check_email(email: &str, errors: &mut FieldErrors) {
    if email.trim().is_empty() {
        errors.insert(FormField::Email, "Email is required".into());
    } else if !is_valid_email(email) {
        errors.insert(FormField::Email, "Please enter a valid email address".into());
    }
}

/* -------------------------
   Appointment form
--------------------------*/

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Validation failed; see [`AppointmentForm::errors`]. No request was made.
    Invalid,
    Booked,
    /// The booking call failed with this user-facing message.
    Failed(String),
}

pub struct AppointmentForm {
    pub fields: AppointmentFormData,
    pub errors: FieldErrors,
    submitted_at: Option<Instant>,
    reset_delay: Duration,
}

impl AppointmentForm {
    pub fn new(reset_delay: Duration) -> Self {
        Self {
            fields: AppointmentFormData::default(),
            errors: FieldErrors::new(),
            submitted_at: None,
            reset_delay,
        }
    }

    /// Edit one field; its stale error goes away with the edit.
    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        let value = value.into();
        match field {
            FormField::Name => self.fields.name = value,
            FormField::Email => self.fields.email = value,
            FormField::Phone => self.fields.phone = value,
            FormField::Date => self.fields.date = value,
            FormField::Time => self.fields.time = value,
            FormField::Reason => self.fields.reason = Some(value),
            FormField::Message => self.fields.message = Some(value),
        }
        self.errors.remove(&field);
    }

    pub fn validate(&self, available: &[String], today: NaiveDate) -> Result<(), FieldErrors> {
        let f = &self.fields;
        let mut errors = FieldErrors::new();

        check_name(&f.name, &mut errors);
        check_email(&f.email, &mut errors);

        if f.phone.trim().is_empty() {
            errors.insert(FormField::Phone, "Phone number is required".into());
        } else if !is_valid_phone(&f.phone) {
            errors.insert(FormField::Phone, "Please enter a valid 10-digit phone number".into());
        }

        if f.date.trim().is_empty() {
            errors.insert(FormField::Date, "Please select a date".into());
        } else {
            match NaiveDate::parse_from_str(f.date.trim(), "%Y-%m-%d") {
                Ok(d) if d < today => {
                    errors.insert(FormField::Date, "Please select today or a later date".into());
                }
                Ok(_) => {}
                Err(_) => {
                    errors.insert(FormField::Date, "Please select a valid date".into());
                }
            }
        }

        if f.time.trim().is_empty() {
            errors.insert(FormField::Time, "Please select a time".into());
        } else if !available.iter().any(|t| *t == f.time) {
            errors.insert(FormField::Time, "Please choose one of the available times".into());
        }

        match f.reason.as_deref().map(str::trim) {
            None | Some("") => {
                errors.insert(FormField::Reason, "Please select a reason for your visit".into());
            }
            Some(r) if !is_visit_reason(r) => {
                errors.insert(FormField::Reason, "Please select a reason from the list".into());
            }
            Some(_) => {}
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    pub async fn submit(&mut self, booking: &BookingController, today: NaiveDate) -> SubmitOutcome {
        if let Err(errors) = self.validate(&booking.available_slots(), today) {
            tracing::debug!(fields = ?errors.keys().collect::<Vec<_>>(), "appointment form rejected");
            self.errors = errors;
            return SubmitOutcome::Invalid;
        }
        self.errors.clear();

        if booking.book_appointment(&self.fields).await {
            self.submitted_at = Some(Instant::now());
            SubmitOutcome::Booked
        } else {
            let message = booking
                .state()
                .booking_error
                .unwrap_or_else(|| "Booking failed".to_string());
            SubmitOutcome::Failed(message)
        }
    }

    /// Clears the form once the reset delay has passed since a successful
    /// booking. Returns whether it did.
    pub fn poll_reset(&mut self, now: Instant) -> bool {
        match self.submitted_at {
            Some(at) if now.duration_since(at) >= self.reset_delay => {
                self.reset();
                true
            }
            _ => false,
        }
    }

    pub fn reset(&mut self) {
        self.fields = AppointmentFormData::default();
        self.errors.clear();
        self.submitted_at = None;
    }

    pub fn awaiting_reset(&self) -> bool {
        self.submitted_at.is_some()
    }
}

/* -------------------------
   Contact + newsletter
--------------------------*/

pub fn validate_contact_form(form: &ContactForm) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    check_name(&form.name, &mut errors);
    check_email(&form.email, &mut errors);
    if !form.phone.trim().is_empty() && !is_valid_phone(&form.phone) {
        errors.insert(FormField::Phone, "Please enter a valid 10-digit phone number".into());
    }
    if form.message.trim().is_empty() {
        errors.insert(FormField::Message, "Message is required".into());
    }
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewsletterSignup {
    pub email: String,
}

impl NewsletterSignup {
    pub fn new(email: impl Into<String>) -> Self {
        Self { email: email.into() }
    }

    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_email(&self.email, &mut errors);
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}
