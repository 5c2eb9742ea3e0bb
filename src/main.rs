use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use clinic_portal::admin::{
    Availability, AvailabilityScreen, AnalyticsView, AppointmentsScreen, AutoConfirm,
    BlockedSlotsScreen, Confirm, DashboardScreen, EmailTemplatesScreen,
};
use clinic_portal::api::ApiClient;
use clinic_portal::backend::select_backend;
use clinic_portal::booking::BookingController;
use clinic_portal::form::{
    AppointmentForm, FieldErrors, FormField, NewsletterSignup, SubmitOutcome, validate_contact_form,
};
use clinic_portal::middleware::{AdminGate, GateView, Navigator};
use clinic_portal::models::{
    AdminAction, Appointment, AppointmentPage, AppointmentStats, AppointmentStatus, BlockedSlot,
    BlockedSlotsSummary, ContactForm, DayOfWeek, EmailTemplateDraft, User,
};
use clinic_portal::session::{FileTokenStore, Session, TokenStore};
use clinic_portal::{ApiError, ApiResponse, ApiResult, Config};

#[derive(Debug, Parser)]
#[command(name = "clinic-portal")]
#[command(about = "Appointment booking and practice back-office")]
struct Cli {
    /// Print `{success, data, error}` envelopes instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List bookable times.
    Slots {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Request an appointment.
    Book(BookArgs),
    /// Send a message to the practice.
    Contact(ContactArgs),
    /// Join the newsletter.
    Subscribe { email: String },

    /// Sign in to the back-office.
    Login {
        username: String,
        #[arg(long, env = "PORTAL_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    Whoami,

    /// List appointments (admin).
    Appointments {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, value_parser = parse_status)]
        status: Option<AppointmentStatus>,
        #[arg(long)]
        search: Option<String>,
    },
    /// Set an appointment's status (admin).
    AppointmentStatus {
        id: String,
        #[arg(value_parser = parse_status)]
        status: AppointmentStatus,
    },
    /// One-click confirm or cancel (admin).
    AppointmentAction {
        id: String,
        #[arg(value_parser = parse_action)]
        action: AdminAction,
    },
    /// Show one appointment (admin).
    AppointmentShow { id: String },
    AppointmentDelete {
        id: String,
        #[arg(long)]
        yes: bool,
    },

    #[command(subcommand)]
    Availability(AvailabilityCmd),
    #[command(subcommand)]
    Blocked(BlockedCmd),

    /// Dashboard counters and recent appointments (admin).
    Stats,

    #[command(subcommand)]
    Templates(TemplatesCmd),
}

#[derive(Debug, clap::Args)]
struct BookArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: String,
    /// YYYY-MM-DD
    #[arg(long)]
    date: String,
    /// HH:MM, one of the times `slots` lists
    #[arg(long)]
    time: String,
    /// One of: initial_consultation, follow_up, second_opinion,
    /// treatment_planning, post_surgery, emergency, other
    #[arg(long)]
    reason: String,
    #[arg(long)]
    message: Option<String>,
}

#[derive(Debug, clap::Args)]
struct ContactArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long, default_value = "")]
    phone: String,
    #[arg(long, default_value = "")]
    subject: String,
    #[arg(long)]
    message: String,
}

#[derive(Debug, Subcommand)]
enum AvailabilityCmd {
    List,
    Add {
        #[arg(value_parser = parse_day)]
        day: DayOfWeek,
        start: String,
        end: String,
        #[arg(long)]
        inactive: bool,
    },
    Edit {
        id: i64,
        #[arg(long, value_parser = parse_day)]
        day: Option<DayOfWeek>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        active: Option<bool>,
    },
    Remove {
        id: i64,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
enum BlockedCmd {
    List,
    Add {
        date: NaiveDate,
        start: String,
        end: String,
        #[arg(long, default_value = "")]
        reason: String,
    },
    Edit {
        id: i64,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        reason: Option<String>,
    },
    Remove {
        id: i64,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
enum TemplatesCmd {
    List,
    Preview { template_type: String },
    /// Send a sample to the admin mailbox.
    Test { template_type: String },
    /// Check a subject/body against the server's template rules.
    Validate(TemplateArgs),
    /// Validate, then save.
    Edit(TemplateArgs),
    Stats,
}

#[derive(Debug, clap::Args)]
struct TemplateArgs {
    template_type: String,
    /// Defaults to the current subject.
    #[arg(long)]
    subject: Option<String>,
    /// Defaults to the current body.
    #[arg(long)]
    body: Option<String>,
}

fn parse_status(s: &str) -> Result<AppointmentStatus, String> {
    AppointmentStatus::parse(s)
        .ok_or_else(|| format!("expected one of pending, confirmed, cancelled, completed; got {s}"))
}

fn parse_action(s: &str) -> Result<AdminAction, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "confirm" => Ok(AdminAction::Confirm),
        "cancel" => Ok(AdminAction::Cancel),
        other => Err(format!("expected confirm or cancel; got {other}")),
    }
}

fn parse_day(s: &str) -> Result<DayOfWeek, String> {
    DayOfWeek::parse(s).ok_or_else(|| format!("unknown day: {s}"))
}

/* -------------------------
   Output
--------------------------*/

struct Output {
    json: bool,
}

impl Output {
    fn emit<T: Serialize>(&self, result: ApiResult<T>, render: impl FnOnce(&T)) -> anyhow::Result<ExitCode> {
        if self.json {
            let ok = result.is_ok();
            println!("{}", serde_json::to_string_pretty(&ApiResponse::from(result))?);
            return Ok(exit_code(ok));
        }
        match result {
            Ok(data) => {
                render(&data);
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                eprintln!("error: {}", e.message());
                if let Some(hint) = e.status_hint() {
                    eprintln!("{hint}");
                }
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

fn exit_code(ok: bool) -> ExitCode {
    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

fn field_errors(errors: &FieldErrors) -> ApiError {
    let joined = errors
        .iter()
        .map(|(field, msg)| format!("{field}: {msg}"))
        .collect::<Vec<_>>()
        .join("; ");
    ApiError::rejected(joined)
}

fn print_appointment(a: &Appointment) {
    println!(
        "{:<14} {} {}  {:<9}  {} <{}>",
        a.appointment_id.as_deref().unwrap_or("-"),
        a.appointment_date,
        a.appointment_time,
        a.status.as_str(),
        a.patient_name,
        a.patient_email
    );
}

/* -------------------------
   Admin plumbing
--------------------------*/

/// Terminal stand-in for the browser router: a redirect becomes a hint.
struct CliNavigator {
    path: &'static str,
    redirected_to: RefCell<Option<String>>,
}

impl CliNavigator {
    fn at(path: &'static str) -> Self {
        Self {
            path,
            redirected_to: RefCell::new(None),
        }
    }
}

impl Navigator for CliNavigator {
    fn current_path(&self) -> String {
        self.path.to_string()
    }

    fn navigate(&self, path: &str) {
        *self.redirected_to.borrow_mut() = Some(path.to_string());
    }
}

struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{prompt} [y/N] ");
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line).is_err() {
            return false;
        }
        matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

fn confirmer(yes: bool) -> Box<dyn Confirm> {
    if yes { Box::new(AutoConfirm(true)) } else { Box::new(StdinConfirm) }
}

async fn open_session(cfg: &Config) -> anyhow::Result<Arc<Session>> {
    let client = Arc::new(ApiClient::new(cfg.admin_api_url(), cfg.http_timeout)?);
    let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(&cfg.token_file));
    Ok(Arc::new(Session::start(client, store).await))
}

/// Session for an admin screen, or `None` after printing where to sign in.
async fn admin_session(cfg: &Config, out: &Output, screen: &'static str) -> anyhow::Result<Option<Arc<Session>>> {
    let session = open_session(cfg).await?;
    let nav = CliNavigator::at(screen);
    let mut gate = AdminGate::new(cfg.redirect_debounce);
    if gate.resolve(&session, &nav).await == GateView::Render {
        return Ok(Some(session));
    }

    let target = nav.redirected_to.borrow().clone().unwrap_or_default();
    let denied: ApiResult<()> = Err(ApiError::NotAuthenticated);
    out.emit(denied, |_| ())?;
    if !out.json {
        eprintln!("admin sign-in required ({target}): run `clinic-portal login <username>`");
    }
    Ok(None)
}

/* -------------------------
   Commands
--------------------------*/

#[derive(Serialize)]
struct DashboardOut {
    stats: AppointmentStats,
    analytics: AnalyticsView,
    recent: Vec<Appointment>,
}

#[derive(Serialize)]
struct BlockedOut {
    blocked_slots: Vec<BlockedSlot>,
    summary: Option<BlockedSlotsSummary>,
}

async fn run(cli: Cli, cfg: Config) -> anyhow::Result<ExitCode> {
    let out = Output { json: cli.json };

    match cli.command {
        Command::Slots { date } => {
            let booking = BookingController::new(select_backend(&cfg)?);
            match date {
                Some(d) => booking.set_date(d).await,
                None => booking.ensure_loaded().await,
            }
            let st = booking.state();
            let result = match st.error {
                Some(e) => Err(ApiError::rejected(e)),
                None => Ok(st.available_slots),
            };
            out.emit(result, |slots| {
                if slots.is_empty() {
                    println!("no open times");
                }
                for s in slots {
                    println!("{s}");
                }
            })
        }

        Command::Book(args) => {
            let booking = BookingController::new(select_backend(&cfg)?);
            match NaiveDate::parse_from_str(args.date.trim(), "%Y-%m-%d") {
                Ok(d) => booking.set_date(d).await,
                Err(_) => booking.ensure_loaded().await,
            }

            let mut form = AppointmentForm::new(cfg.form_reset_delay);
            form.set(FormField::Name, args.name);
            form.set(FormField::Email, args.email);
            form.set(FormField::Phone, args.phone);
            form.set(FormField::Date, args.date);
            form.set(FormField::Time, args.time);
            form.set(FormField::Reason, args.reason);
            if let Some(message) = args.message {
                form.set(FormField::Message, message);
            }

            let result = match form.submit(&booking, Local::now().date_naive()).await {
                SubmitOutcome::Invalid => Err(field_errors(&form.errors)),
                SubmitOutcome::Failed(message) => Err(ApiError::rejected(message)),
                SubmitOutcome::Booked => booking
                    .state()
                    .last_booking
                    .ok_or_else(|| ApiError::Decode("booking returned no appointment".into())),
            };
            out.emit(result, |a| {
                println!("Appointment requested. We will confirm by email.");
                print_appointment(a);
            })
        }

        Command::Contact(args) => {
            let form = ContactForm {
                name: args.name,
                email: args.email,
                phone: args.phone,
                subject: args.subject,
                message: args.message,
            };
            let result = match validate_contact_form(&form) {
                Err(errors) => Err(field_errors(&errors)),
                Ok(()) => select_backend(&cfg)?.submit_contact_form(&form).await,
            };
            out.emit(result, |_| println!("Thanks, your message has been sent."))
        }

        Command::Subscribe { email } => {
            let signup = NewsletterSignup::new(email);
            let result = match signup.validate() {
                Err(errors) => Err(field_errors(&errors)),
                Ok(()) => select_backend(&cfg)?.subscribe_newsletter(&signup.email).await,
            };
            out.emit(result, |_| println!("Subscribed."))
        }

        Command::Login { username, password } => {
            let session = open_session(&cfg).await?;
            let result = if session.login(&username, &password).await {
                session.user().ok_or(ApiError::NotAuthenticated)
            } else {
                Err(ApiError::rejected("Invalid username or password"))
            };
            out.emit(result, |user: &User| {
                println!("Signed in as {}", user.display_name());
                if !user.is_admin() {
                    println!("This account has no back-office access.");
                }
            })
        }

        Command::Logout => {
            open_session(&cfg).await?.logout().await;
            out.emit(Ok(()), |_| println!("Signed out."))
        }

        Command::Whoami => {
            let session = open_session(&cfg).await?;
            let result: ApiResult<Option<User>> = Ok(session.user());
            out.emit(result, |user| match user {
                Some(u) => println!(
                    "{} ({}){}",
                    u.display_name(),
                    u.username,
                    if u.is_admin() { ", admin" } else { "" }
                ),
                None => println!("not signed in"),
            })
        }

        Command::Appointments { page, status, search } => {
            let Some(session) = admin_session(&cfg, &out, "/admin/appointments").await? else {
                return Ok(ExitCode::FAILURE);
            };
            let screen = AppointmentsScreen::starting_at(session, page, status);
            if let Some(term) = search {
                screen.set_search(term);
            }
            screen.fetch().await;
            let st = screen.state();
            let result = match st.error.clone() {
                Some(e) => Err(ApiError::rejected(e)),
                None => Ok(AppointmentPage {
                    appointments: st.visible(),
                    pagination: st.pagination.clone(),
                }),
            };
            out.emit(result, |list| {
                for a in &list.appointments {
                    print_appointment(a);
                }
                println!(
                    "page {}/{} ({} total)",
                    list.pagination.current_page, list.pagination.total_pages, list.pagination.total
                );
            })
        }

        Command::AppointmentStatus { id, status } => {
            let Some(session) = admin_session(&cfg, &out, "/admin/appointments").await? else {
                return Ok(ExitCode::FAILURE);
            };
            let screen = AppointmentsScreen::new(session);
            let result = screen.change_status(&id, status).await;
            out.emit(result, |_| println!("{id} is now {status}"))
        }

        Command::AppointmentAction { id, action } => {
            let Some(session) = admin_session(&cfg, &out, "/admin/appointments").await? else {
                return Ok(ExitCode::FAILURE);
            };
            let screen = AppointmentsScreen::new(session);
            let result = screen.admin_action(&id, action).await;
            out.emit(result, |_| println!("{id}: {} done", action.as_path()))
        }

        Command::AppointmentShow { id } => {
            let Some(session) = admin_session(&cfg, &out, "/admin/appointments").await? else {
                return Ok(ExitCode::FAILURE);
            };
            let screen = AppointmentsScreen::new(session);
            let result = screen.detail(&id).await;
            out.emit(result, |a| {
                print_appointment(a);
                println!("phone   {}", a.patient_phone);
                if let Some(reason) = &a.reason {
                    println!("reason  {reason}");
                }
                if let Some(notes) = &a.notes {
                    println!("notes   {notes}");
                }
            })
        }

        Command::AppointmentDelete { id, yes } => {
            let Some(session) = admin_session(&cfg, &out, "/admin/appointments").await? else {
                return Ok(ExitCode::FAILURE);
            };
            let screen = AppointmentsScreen::new(session);
            let result = screen.delete(&id, confirmer(yes).as_ref()).await;
            out.emit(result, |deleted| {
                println!("{}", if *deleted { "deleted" } else { "kept" })
            })
        }

        Command::Availability(cmd) => availability(cmd, &cfg, &out).await,
        Command::Blocked(cmd) => blocked(cmd, &cfg, &out).await,

        Command::Stats => {
            let Some(session) = admin_session(&cfg, &out, "/admin/dashboard").await? else {
                return Ok(ExitCode::FAILURE);
            };
            let screen = DashboardScreen::new(session);
            screen.refresh().await;
            let st = screen.state();
            let result = match st.error {
                Some(e) => Err(ApiError::rejected(e)),
                None => Ok(DashboardOut {
                    analytics: AnalyticsView::from(&st.stats),
                    stats: st.stats,
                    recent: st.recent,
                }),
            };
            out.emit(result, |d| {
                let s = &d.stats;
                println!(
                    "total {}  pending {}  confirmed {}  completed {}  cancelled {}",
                    s.total, s.pending, s.confirmed, s.completed, s.cancelled
                );
                println!(
                    "confirmed {:.1}%  completed {:.1}%  cancelled {:.1}%",
                    d.analytics.confirmation_rate, d.analytics.completion_rate, d.analytics.cancellation_rate
                );
                for a in &d.recent {
                    print_appointment(a);
                }
            })
        }

        Command::Templates(cmd) => templates(cmd, &cfg, &out).await,
    }
}

async fn availability(cmd: AvailabilityCmd, cfg: &Config, out: &Output) -> anyhow::Result<ExitCode> {
    let Some(session) = admin_session(cfg, out, "/admin/availability").await? else {
        return Ok(ExitCode::FAILURE);
    };
    let screen = AvailabilityScreen::new(Availability, session);
    screen.fetch().await;
    if let Some(e) = screen.state().error {
        return out.emit::<()>(Err(ApiError::rejected(e)), |_| ());
    }

    match cmd {
        AvailabilityCmd::List => out.emit(Ok(screen.rows()), |rows| {
            for w in rows {
                println!(
                    "{:>4}  {:<9} {}-{}{}",
                    w.id,
                    w.day_of_week.label(),
                    w.start_time,
                    w.end_time,
                    if w.is_active { "" } else { "  (inactive)" }
                );
            }
        }),
        AvailabilityCmd::Add { day, start, end, inactive } => {
            screen.open_create();
            screen.edit_draft(|d| {
                d.day_of_week = day;
                d.start_time = start;
                d.end_time = end;
                d.is_active = !inactive;
            });
            out.emit(screen.submit().await, |w| println!("added availability {}", w.id))
        }
        AvailabilityCmd::Edit { id, day, start, end, active } => {
            if !screen.open_edit(id) {
                return out.emit::<()>(Err(ApiError::rejected(format!("No availability with id {id}"))), |_| ());
            }
            screen.edit_draft(|d| {
                if let Some(day) = day {
                    d.day_of_week = day;
                }
                if let Some(start) = start {
                    d.start_time = start;
                }
                if let Some(end) = end {
                    d.end_time = end;
                }
                if let Some(active) = active {
                    d.is_active = active;
                }
            });
            out.emit(screen.submit().await, |w| println!("updated availability {}", w.id))
        }
        AvailabilityCmd::Remove { id, yes } => {
            let result = screen.delete(id, confirmer(yes).as_ref()).await;
            out.emit(result, |deleted| println!("{}", if *deleted { "deleted" } else { "kept" }))
        }
    }
}

async fn blocked(cmd: BlockedCmd, cfg: &Config, out: &Output) -> anyhow::Result<ExitCode> {
    let Some(session) = admin_session(cfg, out, "/admin/blocked-slots").await? else {
        return Ok(ExitCode::FAILURE);
    };
    let screen = BlockedSlotsScreen::new(session);
    screen.fetch_all().await;
    if let Some(e) = screen.state().error {
        return out.emit::<()>(Err(ApiError::rejected(e)), |_| ());
    }

    match cmd {
        BlockedCmd::List => {
            let result = Ok(BlockedOut {
                blocked_slots: screen.rows(),
                summary: screen.summary(),
            });
            out.emit(result, |b| {
                for s in &b.blocked_slots {
                    println!("{:>4}  {} {}-{}  {}", s.id, s.date, s.start_time, s.end_time, s.reason);
                }
                if let Some(sum) = b.summary {
                    println!(
                        "blocked {}  this week {}  this month {}  upcoming {}",
                        sum.total_blocked, sum.this_week, sum.this_month, sum.upcoming
                    );
                }
            })
        }
        BlockedCmd::Add { date, start, end, reason } => {
            screen.open_create();
            screen.edit_draft(|d| {
                d.date = date;
                d.start_time = start;
                d.end_time = end;
                d.reason = reason;
            });
            out.emit(screen.submit().await, |s| println!("blocked slot {} added", s.id))
        }
        BlockedCmd::Edit { id, date, start, end, reason } => {
            if !screen.open_edit(id) {
                return out.emit::<()>(Err(ApiError::rejected(format!("No blocked slot with id {id}"))), |_| ());
            }
            screen.edit_draft(|d| {
                if let Some(date) = date {
                    d.date = date;
                }
                if let Some(start) = start {
                    d.start_time = start;
                }
                if let Some(end) = end {
                    d.end_time = end;
                }
                if let Some(reason) = reason {
                    d.reason = reason;
                }
            });
            out.emit(screen.submit().await, |s| println!("blocked slot {} updated", s.id))
        }
        BlockedCmd::Remove { id, yes } => {
            let result = screen.delete(id, confirmer(yes).as_ref()).await;
            out.emit(result, |deleted| println!("{}", if *deleted { "deleted" } else { "kept" }))
        }
    }
}

async fn templates(cmd: TemplatesCmd, cfg: &Config, out: &Output) -> anyhow::Result<ExitCode> {
    let Some(session) = admin_session(cfg, out, "/admin/settings").await? else {
        return Ok(ExitCode::FAILURE);
    };
    let screen = EmailTemplatesScreen::new(session);

    match cmd {
        TemplatesCmd::List => {
            screen.fetch().await;
            let st = screen.state();
            let result = match st.error {
                Some(e) => Err(ApiError::rejected(e)),
                None => Ok(st.templates),
            };
            out.emit(result, |list| {
                for t in list {
                    println!("{:<24} {}", t.template_type, t.subject);
                }
            })
        }
        TemplatesCmd::Preview { template_type } => {
            out.emit(screen.preview(&template_type).await, |html| println!("{html}"))
        }
        TemplatesCmd::Test { template_type } => {
            out.emit(screen.send_test(&template_type).await, |r| println!("{}", r.message))
        }
        TemplatesCmd::Validate(args) => {
            let draft = match template_draft(&screen, args).await {
                Ok(draft) => draft,
                Err(e) => return out.emit::<()>(Err(e), |_| ()),
            };
            out.emit(screen.validate(&draft).await, |v| {
                if v.valid {
                    println!("valid");
                }
                for e in &v.errors {
                    println!("- {e}");
                }
            })
        }
        TemplatesCmd::Edit(args) => {
            let draft = match template_draft(&screen, args).await {
                Ok(draft) => draft,
                Err(e) => return out.emit::<()>(Err(e), |_| ()),
            };
            out.emit(screen.save(&draft).await, |t| {
                println!("saved {}", t.template_type)
            })
        }
        TemplatesCmd::Stats => out.emit(screen.statistics().await, |stats| {
            for (k, v) in stats {
                println!("{k}: {v}");
            }
        }),
    }
}

/// The stored template with any `--subject`/`--body` overrides applied.
async fn template_draft(screen: &EmailTemplatesScreen, args: TemplateArgs) -> ApiResult<EmailTemplateDraft> {
    screen.fetch().await;
    if let Some(e) = screen.state().error {
        return Err(ApiError::rejected(e));
    }
    let current = screen
        .template(&args.template_type)
        .ok_or_else(|| ApiError::rejected(format!("No email template of type {}", args.template_type)))?;
    let mut draft = EmailTemplateDraft::from(&current);
    if let Some(subject) = args.subject {
        draft.subject = subject;
    }
    if let Some(body) = args.body {
        draft.body = body;
    }
    Ok(draft)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = Config::from_env()?;
    tracing::debug!(mode = ?cfg.backend_mode(), token_file = %cfg.token_file.display(), "configured");

    run(cli, cfg).await
}
