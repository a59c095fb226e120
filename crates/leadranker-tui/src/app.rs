//! Application state management for the LeadRanker terminal client.
//!
//! This module contains the `App` struct that owns navigation, form state,
//! loaded screen data and background task coordination. Every network call
//! runs in a spawned task and reports back over an MPSC channel; results are
//! tagged with the `MountTicket` of the screen that asked for them and
//! dropped if that screen is gone.

use std::future::Future;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use leadranker_core::api::HISTORY_PAGE_SIZE;
use leadranker_core::models::{
    CheckoutSession, Connections, HistoryFilter, Lead, LeadHistory, LeadStats, LeadSummary,
    MessageResponse, PlanCatalog, Referrals, ScoreRequest, ScoreResult, SettingsUpdate, Usage,
    VerifiedSession, DEFAULT_INDUSTRY, UPGRADE_PLANS,
};
use leadranker_core::utils::query_param;
use leadranker_core::{
    ApiError, Config, Mount, MountTicket, Navigator, Registration, Route, RouteGuard, Session,
    SessionCredential, SessionError, Slot,
};

use crate::form::{Field, Form, MAX_MESSAGE_LENGTH};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background result channel.
/// A screen issues at most three calls per mount, so 32 leaves plenty of headroom.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Leads shown on the dashboard and connections screens
pub const RECENT_LEADS: u32 = 5;

/// Leads analyzed on the analytics screen (the backend's default page)
const ANALYTICS_SAMPLE: u32 = 50;

/// Source pre-filled on the score form
const DEFAULT_SCORE_SOURCE: &str = "manual";

// Form field and action indices

pub const LOGIN_EMAIL: usize = 0;
pub const LOGIN_PASSWORD: usize = 1;
pub const LOGIN_SUBMIT: usize = 0;
pub const LOGIN_GOOGLE: usize = 1;
pub const LOGIN_REGISTER: usize = 2;
pub const LOGIN_FORGOT: usize = 3;

pub const REGISTER_ORGANIZATION: usize = 0;
pub const REGISTER_EMAIL: usize = 1;
pub const REGISTER_PASSWORD: usize = 2;
pub const REGISTER_INDUSTRY: usize = 3;
pub const REGISTER_SUBMIT: usize = 0;
pub const REGISTER_BACK: usize = 1;

pub const FORGOT_EMAIL: usize = 0;
pub const FORGOT_SUBMIT: usize = 0;
pub const FORGOT_BACK: usize = 1;

pub const RESET_LINK: usize = 0;
pub const RESET_PASSWORD: usize = 1;
pub const RESET_CONFIRM: usize = 2;
pub const RESET_SUBMIT: usize = 0;
pub const RESET_BACK: usize = 1;

pub const OAUTH_CALLBACK: usize = 0;
pub const OAUTH_SUBMIT: usize = 0;
pub const OAUTH_BACK: usize = 1;

pub const SCORE_NAME: usize = 0;
pub const SCORE_EMAIL: usize = 1;
pub const SCORE_PHONE: usize = 2;
pub const SCORE_SOURCE: usize = 3;
pub const SCORE_MESSAGE: usize = 4;
pub const SCORE_SUBMIT: usize = 0;
pub const SCORE_CLEAR: usize = 1;

pub const BILLING_REFERRAL: usize = 0;
pub const BILLING_SESSION_ID: usize = 1;
pub const BILLING_INVITE: usize = 0;
pub const BILLING_VERIFY: usize = 1;

pub const SETTINGS_INDUSTRY: usize = 0;
pub const SETTINGS_SAVE: usize = 0;

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// Browsing a protected screen; keys are commands.
    Normal,
    /// Typing into the current screen's form.
    Editing,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

#[derive(Default)]
pub struct HistoryView {
    pub page: Slot<Vec<Lead>>,
    pub offset: u32,
    pub filter: HistoryFilter,
    pub selection: usize,
}

impl HistoryView {
    /// Leads on the current page that pass the category filter.
    pub fn visible(&self) -> Vec<&Lead> {
        self.page
            .ready()
            .map(|leads| leads.iter().filter(|l| self.filter.matches(l)).collect())
            .unwrap_or_default()
    }

    pub fn selected(&self) -> Option<&Lead> {
        self.visible().get(self.selection).copied()
    }

    /// A full page suggests there is another one.
    pub fn has_next_page(&self) -> bool {
        self.page
            .ready()
            .map(|leads| leads.len() as u32 >= HISTORY_PAGE_SIZE)
            .unwrap_or(false)
    }

    pub fn page_number(&self) -> u32 {
        self.offset / HISTORY_PAGE_SIZE + 1
    }
}

pub struct ScoreView {
    pub form: Form,
    pub result: Slot<ScoreResult>,
}

pub struct BillingView {
    pub plans: Slot<PlanCatalog>,
    pub referrals: Slot<Referrals>,
    pub checkout: Slot<CheckoutSession>,
    pub verified: Slot<VerifiedSession>,
    pub plan_selection: usize,
    pub form: Form,
}

impl BillingView {
    pub fn selected_plan(&self) -> &'static str {
        UPGRADE_PLANS[self.plan_selection.min(UPGRADE_PLANS.len() - 1)]
    }
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent from background tasks back to the UI loop.
///
/// Protected calls are already wrapped in `Session::protected`, so by the
/// time an authentication failure arrives here the session is gone.
enum Payload {
    Stats(Result<LeadStats, ApiError>),
    Usage(Result<Usage, ApiError>),
    RecentLeads(Result<LeadHistory, ApiError>),
    HistoryPage(Result<LeadHistory, ApiError>),
    Analytics(Result<LeadHistory, ApiError>),
    Scored(Result<ScoreResult, ApiError>),
    Plans(Result<PlanCatalog, ApiError>),
    Referrals(Result<Referrals, ApiError>),
    Checkout(Result<CheckoutSession, ApiError>),
    Verified(Result<VerifiedSession, ApiError>),
    ReferralSent(Result<MessageResponse, ApiError>),
    Connections(Result<Connections, ApiError>),
    SettingsSaved(Result<MessageResponse, ApiError>),
    SignedIn(Result<SessionCredential, SessionError>),
    Registered(Result<Registration, SessionError>),
    OAuthUrl(Result<String, SessionError>),
    ResetLinkSent(Result<String, SessionError>),
    PasswordReset(Result<String, SessionError>),
}

struct Loaded {
    ticket: MountTicket,
    payload: Payload,
}

/// Handle a background task uses to report back to the screen that spawned it.
struct Reporter {
    tx: mpsc::Sender<Loaded>,
    ticket: MountTicket,
}

impl Reporter {
    async fn send(&self, payload: Payload) {
        let loaded = Loaded {
            ticket: self.ticket.clone(),
            payload,
        };
        if let Err(e) = self.tx.send(loaded).await {
            error!(error = %e, "Failed to send load result - channel closed");
        }
    }
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    pub session: Session,
    pub guard: RouteGuard,
    pub nav: Navigator,

    // UI state
    pub state: AppState,
    pub status_message: Option<String>,
    /// Write preference changes back to the config file
    pub save_config: bool,
    mount: Mount,
    mounted: Option<Route>,
    session_rx: watch::Receiver<Option<SessionCredential>>,

    // Public screen forms
    pub login: Form,
    pub register: Form,
    pub forgot: Form,
    pub reset: Form,
    pub oauth: Form,
    pub oauth_url: Option<String>,

    // Screen data
    pub stats: Slot<LeadStats>,
    pub usage: Slot<Usage>,
    pub recent: Slot<Vec<Lead>>,
    pub connections: Slot<Connections>,
    pub history: HistoryView,
    pub analytics: Slot<LeadSummary>,
    pub score: ScoreView,
    pub billing: BillingView,
    pub settings: Form,

    // Background task channel
    tx: mpsc::Sender<Loaded>,
    rx: mpsc::Receiver<Loaded>,
}

impl App {
    pub fn new(config: Config, session: Session) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let session_rx = session.store().subscribe();
        let guard = RouteGuard::new(session.store().clone());

        let last_email = config.last_email.clone().unwrap_or_default();
        let plan_selection = config
            .selected_plan
            .as_deref()
            .and_then(|p| UPGRADE_PLANS.iter().position(|u| *u == p))
            .unwrap_or(0);

        let mut login = Form::new(
            vec![Field::text("Email").with_value(last_email), Field::secret("Password")],
            vec!["Sign In", "Continue with Google", "Create an account", "Forgot password?"],
        );
        if !login.value(LOGIN_EMAIL).is_empty() {
            login.focus_field(LOGIN_PASSWORD);
        }

        Self {
            config,
            session,
            guard,
            nav: Navigator::new(Route::Dashboard),
            state: AppState::Normal,
            status_message: None,
            save_config: true,
            mount: Mount::new(),
            mounted: None,
            session_rx,
            login,
            register: Form::new(
                vec![
                    Field::text("Organization"),
                    Field::text("Email"),
                    Field::secret("Password"),
                    Field::text("Industry").with_value(DEFAULT_INDUSTRY),
                ],
                vec!["Create Account", "Back to sign in"],
            ),
            forgot: Form::new(
                vec![Field::text("Email")],
                vec!["Send reset link", "Back to sign in"],
            ),
            reset: Form::new(
                vec![
                    Field::text("Reset link"),
                    Field::secret("New password"),
                    Field::secret("Confirm password"),
                ],
                vec!["Reset password", "Back to sign in"],
            ),
            oauth: Form::new(
                vec![Field::text("Callback URL")],
                vec!["Complete sign-in", "Back to sign in"],
            ),
            oauth_url: None,
            stats: Slot::Idle,
            usage: Slot::Idle,
            recent: Slot::Idle,
            connections: Slot::Idle,
            history: HistoryView::default(),
            analytics: Slot::Idle,
            score: ScoreView {
                form: Self::score_form(),
                result: Slot::Idle,
            },
            billing: BillingView {
                plans: Slot::Idle,
                referrals: Slot::Idle,
                checkout: Slot::Idle,
                verified: Slot::Idle,
                plan_selection,
                form: Form::new(
                    vec![Field::text("Invite by email"), Field::text("Checkout session id")],
                    vec!["Send invite", "Verify payment"],
                ),
            },
            settings: Form::new(
                vec![Field::text("Industry").with_value(DEFAULT_INDUSTRY)],
                vec!["Save"],
            ),
            tx,
            rx,
        }
    }

    fn score_form() -> Form {
        Form::new(
            vec![
                Field::text("Name"),
                Field::text("Email"),
                Field::text("Phone"),
                Field::text("Source").with_value(DEFAULT_SCORE_SOURCE),
                Field::text("Message").with_max_len(MAX_MESSAGE_LENGTH),
            ],
            vec!["Score lead", "Clear"],
        )
    }

    /// Show the first screen: `start` if the guard allows it, login otherwise.
    pub fn start(&mut self, start: Route) {
        let route = self.guard.reset(&mut self.nav, start);
        self.show(route);
    }

    /// Open a deep link such as a password-reset or OAuth callback URL.
    pub fn open_location(&mut self, location: &str) {
        let route = Route::parse(location);
        match route {
            Route::ResetPassword => self.reset.set_value(RESET_LINK, location.trim()),
            Route::OAuthCallback => self.oauth.set_value(OAUTH_CALLBACK, location.trim()),
            _ => {}
        }
        self.navigate(route);
    }

    pub fn current_route(&self) -> Route {
        self.nav.current()
    }

    pub fn signed_in_as(&self) -> Option<String> {
        self.session
            .current()
            .map(|c| c.display_name().to_string())
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn navigate(&mut self, route: Route) {
        let rendered = self.guard.navigate(&mut self.nav, route);
        self.show(rendered);
    }

    pub fn back(&mut self) {
        let rendered = self.guard.back(&mut self.nav);
        self.show(rendered);
    }

    pub fn next_tab(&mut self) {
        self.step_tab(1);
    }

    pub fn prev_tab(&mut self) {
        self.step_tab(Route::PROTECTED.len() - 1);
    }

    fn step_tab(&mut self, step: usize) {
        let tabs = Route::PROTECTED;
        let idx = tabs
            .iter()
            .position(|r| *r == self.current_route())
            .unwrap_or(0);
        self.navigate(tabs[(idx + step) % tabs.len()]);
    }

    /// Reload the current screen. In-flight results from before are dropped.
    pub fn refresh(&mut self) {
        if let Some(route) = self.mounted {
            self.mount.unmount();
            self.mount.mount();
            self.abandon_submissions();
            self.load(route);
        }
    }

    /// Mount `route` if it is not already the mounted screen.
    fn show(&mut self, route: Route) {
        if self.mounted == Some(route) && self.mount.is_mounted() {
            return;
        }
        debug!(route = route.path(), "Mounting screen");
        self.mount.unmount();
        self.mount.mount();
        self.abandon_submissions();
        self.mounted = Some(route);
        self.state = if route.is_protected() {
            AppState::Normal
        } else {
            AppState::Editing
        };
        self.load(route);
    }

    /// Remounting kills every outstanding ticket, so nothing in flight can
    /// settle its form any more.
    fn abandon_submissions(&mut self) {
        for form in [
            &mut self.login,
            &mut self.register,
            &mut self.forgot,
            &mut self.reset,
            &mut self.oauth,
            &mut self.score.form,
            &mut self.billing.form,
            &mut self.settings,
        ] {
            form.abandon();
        }
        if self.score.result.is_loading() {
            self.score.result.reset();
        }
        if self.billing.checkout.is_loading() {
            self.billing.checkout.reset();
        }
        if self.billing.verified.is_loading() {
            self.billing.verified.reset();
        }
    }

    // =========================================================================
    // Session
    // =========================================================================

    pub fn logout(&mut self) {
        match self.session.logout() {
            Ok(()) => self.status_message = Some("Signed out".to_string()),
            Err(e) => {
                error!(error = %e, "Logout failed");
                self.status_message = Some(format!("Logout failed: {}", e));
            }
        }
        self.sync_session();
    }

    /// React to credential changes made anywhere: sign-in moves off the
    /// auth screens, sign-out drops account data and re-runs the guard.
    fn sync_session(&mut self) {
        if !matches!(self.session_rx.has_changed(), Ok(true)) {
            return;
        }
        let signed_in = self.session_rx.borrow_and_update().is_some();

        if signed_in {
            if matches!(
                self.current_route(),
                Route::Login | Route::Register | Route::OAuthCallback
            ) {
                let route = self.guard.reset(&mut self.nav, Route::Dashboard);
                self.show(route);
            }
            return;
        }

        self.clear_account_data();
        let route = self.guard.enforce(&mut self.nav);
        if route == Route::Login && self.status_message.is_none() {
            self.status_message = Some("Your session has ended. Please sign in again.".to_string());
        }
        self.show(route);
    }

    fn clear_account_data(&mut self) {
        self.stats.reset();
        self.usage.reset();
        self.recent.reset();
        self.connections.reset();
        self.history = HistoryView::default();
        self.analytics.reset();
        self.score = ScoreView {
            form: Self::score_form(),
            result: Slot::Idle,
        };
        self.billing.plans.reset();
        self.billing.referrals.reset();
        self.billing.checkout.reset();
        self.billing.verified.reset();
        self.billing.form.clear();
        self.settings.succeed(None);
    }

    fn remember_email(&mut self, email: Option<String>) {
        if email.is_none() || self.config.last_email == email {
            return;
        }
        self.config.last_email = email;
        self.persist_config();
    }

    fn persist_config(&self) {
        if !self.save_config {
            return;
        }
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
    }

    // =========================================================================
    // Background Loading
    // =========================================================================

    fn spawn<F, Fut>(&self, task: F)
    where
        F: FnOnce(Session, Reporter) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let reporter = Reporter {
            tx: self.tx.clone(),
            ticket: self.mount.ticket(),
        };
        tokio::spawn(task(self.session.clone(), reporter));
    }

    /// Kick off the loads a screen needs when it mounts.
    fn load(&mut self, route: Route) {
        match route {
            Route::Dashboard => {
                self.stats.start();
                self.usage.start();
                self.recent.start();
                self.spawn(|session, report| async move {
                    let api = session.api();
                    let (stats, usage, recent) = futures::join!(
                        session.protected(api.lead_stats()),
                        session.protected(api.billing_usage()),
                        session.protected(api.lead_history(RECENT_LEADS, 0)),
                    );
                    report.send(Payload::Stats(stats)).await;
                    report.send(Payload::Usage(usage)).await;
                    report.send(Payload::RecentLeads(recent)).await;
                });
            }
            Route::History => self.load_history_page(),
            Route::Score => {
                self.spawn(|session, report| async move {
                    let usage = session.protected(session.api().billing_usage()).await;
                    report.send(Payload::Usage(usage)).await;
                });
            }
            Route::Analytics => {
                self.analytics.start();
                self.spawn(|session, report| async move {
                    let history = session
                        .protected(session.api().lead_history(ANALYTICS_SAMPLE, 0))
                        .await;
                    report.send(Payload::Analytics(history)).await;
                });
            }
            Route::Billing => {
                self.usage.start();
                self.billing.plans.start();
                self.billing.referrals.start();
                self.spawn(|session, report| async move {
                    let api = session.api();
                    let (usage, plans, referrals) = futures::join!(
                        session.protected(api.billing_usage()),
                        session.protected(api.billing_plans()),
                        session.protected(api.referrals()),
                    );
                    report.send(Payload::Usage(usage)).await;
                    report.send(Payload::Plans(plans)).await;
                    report.send(Payload::Referrals(referrals)).await;
                });
            }
            Route::Settings => {
                self.connections.start();
                self.spawn(|session, report| async move {
                    let connections = session.protected(session.api().connections()).await;
                    report.send(Payload::Connections(connections)).await;
                });
            }
            Route::Connections => {
                self.connections.start();
                self.recent.start();
                self.spawn(|session, report| async move {
                    let api = session.api();
                    let (connections, recent) = futures::join!(
                        session.protected(api.connections()),
                        session.protected(api.lead_history(RECENT_LEADS, 0)),
                    );
                    report.send(Payload::Connections(connections)).await;
                    report.send(Payload::RecentLeads(recent)).await;
                });
            }
            Route::Login
            | Route::Register
            | Route::ForgotPassword
            | Route::ResetPassword
            | Route::OAuthCallback => {}
        }
    }

    fn load_history_page(&mut self) {
        self.history.page.start();
        let offset = self.history.offset;
        self.spawn(move |session, report| async move {
            let page = session
                .protected(session.api().lead_history(HISTORY_PAGE_SIZE, offset))
                .await;
            report.send(Payload::HistoryPage(page)).await;
        });
    }

    /// Drain finished background tasks and apply their results.
    pub async fn check_background_tasks(&mut self) {
        let mut results = Vec::new();
        while let Ok(loaded) = self.rx.try_recv() {
            results.push(loaded);
        }
        for loaded in results {
            self.process_result(loaded);
        }
        self.sync_session();
    }

    fn process_result(&mut self, loaded: Loaded) {
        if !loaded.ticket.is_live() {
            debug!("Dropping result for a screen that is no longer mounted");
            return;
        }

        match loaded.payload {
            Payload::Stats(result) => self.stats.apply(result),
            Payload::Usage(result) => self.usage.apply(result),
            Payload::RecentLeads(result) => self.recent.apply(result.map(|h| h.leads)),
            Payload::HistoryPage(result) => {
                self.history.page.apply(result.map(|h| h.leads));
                self.history.selection = 0;
            }
            Payload::Analytics(result) => self
                .analytics
                .apply(result.map(|h| LeadSummary::from_leads(&h.leads))),
            Payload::Scored(result) => {
                match &result {
                    Ok(scored) => {
                        info!(score = scored.score, bucket = ?scored.bucket, "Lead scored");
                        if let Some(billing) = &scored.billing {
                            self.usage = Slot::Ready(billing.clone());
                        }
                        self.score.form.succeed(None);
                    }
                    Err(e) => self.score.form.fail(e.message()),
                }
                self.score.result.apply(result);
            }
            Payload::Plans(result) => self.billing.plans.apply(result),
            Payload::Referrals(result) => self.billing.referrals.apply(result),
            Payload::Checkout(result) => {
                if let Err(e) = &result {
                    self.status_message = Some(e.message());
                }
                self.billing.checkout.apply(result);
            }
            Payload::Verified(result) => {
                match &result {
                    Ok(verified) => {
                        self.billing.form.succeed(Some(format!("Payment {}", verified.status)));
                        self.billing.form.set_value(BILLING_SESSION_ID, "");
                        self.spawn(|session, report| async move {
                            let usage = session.protected(session.api().billing_usage()).await;
                            report.send(Payload::Usage(usage)).await;
                        });
                    }
                    Err(e) => self.billing.form.fail(e.message()),
                }
                self.billing.verified.apply(result);
            }
            Payload::ReferralSent(result) => match result {
                Ok(response) => {
                    self.billing
                        .form
                        .succeed(Some(response.message_or("Referral submitted")));
                    self.billing.form.set_value(BILLING_REFERRAL, "");
                    self.spawn(|session, report| async move {
                        let referrals = session.protected(session.api().referrals()).await;
                        report.send(Payload::Referrals(referrals)).await;
                    });
                }
                Err(e) => self.billing.form.fail(e.message()),
            },
            Payload::Connections(result) => self.connections.apply(result),
            Payload::SettingsSaved(result) => match result {
                Ok(response) => self.settings.succeed(Some(response.message_or("Settings saved"))),
                Err(e) => self.settings.fail(e.message()),
            },
            Payload::SignedIn(result) => match result {
                Ok(credential) => {
                    self.login.succeed(None);
                    self.login.clear_secrets();
                    self.status_message = None;
                    self.remember_email(credential.email);
                }
                Err(e) => {
                    warn!(error = %e, "Login failed");
                    self.login.clear_secrets();
                    self.login.fail(e.message());
                }
            },
            Payload::Registered(result) => match result {
                Ok(Registration::SignedIn(credential)) => {
                    self.register.clear();
                    self.remember_email(credential.email);
                }
                Ok(Registration::VerificationSent(message)) => {
                    let email = self.register.value(REGISTER_EMAIL).to_string();
                    self.register.clear();
                    self.register.set_value(REGISTER_INDUSTRY, DEFAULT_INDUSTRY);
                    self.login.set_value(LOGIN_EMAIL, email);
                    self.login.focus_field(LOGIN_PASSWORD);
                    self.login.succeed(Some(message));
                    self.navigate(Route::Login);
                }
                Err(e) => {
                    self.register.clear_secrets();
                    self.register.fail(e.message());
                }
            },
            Payload::OAuthUrl(result) => match result {
                Ok(url) => {
                    self.login.succeed(None);
                    self.oauth_url = Some(url);
                    self.navigate(Route::OAuthCallback);
                }
                Err(e) => self.login.fail(e.message()),
            },
            Payload::ResetLinkSent(result) => match result {
                Ok(message) => self.forgot.succeed(Some(message)),
                Err(e) => self.forgot.fail(e.message()),
            },
            Payload::PasswordReset(result) => match result {
                Ok(message) => {
                    self.reset.clear();
                    self.login.succeed(Some(message));
                    self.navigate(Route::Login);
                }
                Err(e) => {
                    self.reset.clear_secrets();
                    self.reset.fail(e.message());
                }
            },
        }
    }

    // =========================================================================
    // Form Submissions
    // =========================================================================

    pub fn submit_login(&mut self) {
        if self.login.busy {
            return;
        }
        let email = self.login.value(LOGIN_EMAIL).to_string();
        let password = self.login.value(LOGIN_PASSWORD).to_string();
        self.login.begin();
        self.spawn(move |session, report| async move {
            let result = session.login(&email, &password).await;
            report.send(Payload::SignedIn(result)).await;
        });
    }

    pub fn start_google_login(&mut self) {
        if self.login.busy {
            return;
        }
        self.login.begin();
        self.spawn(|session, report| async move {
            let result = session.oauth_start().await;
            report.send(Payload::OAuthUrl(result)).await;
        });
    }

    /// Finish Google sign-in from a pasted callback URL or bare token.
    /// Without a token the user is sent back to login.
    pub fn complete_oauth(&mut self) {
        let pasted = self.oauth.value(OAUTH_CALLBACK).trim().to_string();
        let callback = if is_bare_token(&pasted) {
            format!("token={}", pasted)
        } else {
            pasted
        };

        self.oauth.clear();
        self.oauth_url = None;
        match self.session.complete_oauth(&callback) {
            Ok(credential) => {
                self.remember_email(credential.email);
                self.sync_session();
            }
            Err(e) => {
                warn!(error = %e, "Google sign-in callback rejected");
                self.login.fail(e.message());
                let route = self.guard.reset(&mut self.nav, Route::Login);
                self.show(route);
            }
        }
    }

    pub fn submit_register(&mut self) {
        if self.register.busy {
            return;
        }
        let email = self.register.value(REGISTER_EMAIL).to_string();
        let password = self.register.value(REGISTER_PASSWORD).to_string();
        let organization = self.register.value(REGISTER_ORGANIZATION).to_string();
        let industry = self.register.value(REGISTER_INDUSTRY).to_string();
        self.register.begin();
        self.spawn(move |session, report| async move {
            let result = session
                .register(&email, &password, &organization, Some(&industry))
                .await;
            report.send(Payload::Registered(result)).await;
        });
    }

    pub fn submit_forgot_password(&mut self) {
        if self.forgot.busy {
            return;
        }
        let email = self.forgot.value(FORGOT_EMAIL).to_string();
        self.forgot.begin();
        self.spawn(move |session, report| async move {
            let result = session.forgot_password(&email).await;
            report.send(Payload::ResetLinkSent(result)).await;
        });
    }

    pub fn submit_reset_password(&mut self) {
        if self.reset.busy {
            return;
        }
        let link = self.reset.value(RESET_LINK).to_string();
        let token = query_param(&link, "token");
        let password = self.reset.value(RESET_PASSWORD).to_string();
        let confirm = self.reset.value(RESET_CONFIRM).to_string();
        self.reset.begin();
        self.spawn(move |session, report| async move {
            let result = session
                .reset_password(token.as_deref(), &password, &confirm)
                .await;
            report.send(Payload::PasswordReset(result)).await;
        });
    }

    pub fn submit_score(&mut self) {
        if self.score.form.busy {
            return;
        }
        let form = &self.score.form;
        let optional = |idx: usize| {
            let v = form.value(idx).trim();
            (!v.is_empty()).then(|| v.to_string())
        };
        let mut request = ScoreRequest::new(form.value(SCORE_MESSAGE).trim());
        request.name = optional(SCORE_NAME);
        request.email = optional(SCORE_EMAIL);
        request.phone = optional(SCORE_PHONE);
        if let Some(source) = optional(SCORE_SOURCE) {
            request.source = source;
        }

        self.score.form.begin();
        self.score.result.start();
        self.spawn(move |session, report| async move {
            let result = session.protected(session.api().score_lead(&request)).await;
            report.send(Payload::Scored(result)).await;
        });
    }

    pub fn clear_score_form(&mut self) {
        self.score.form = Self::score_form();
        self.score.result.reset();
    }

    pub fn start_checkout(&mut self) {
        let plan = self.billing.selected_plan();
        if self.config.selected_plan.as_deref() != Some(plan) {
            self.config.selected_plan = Some(plan.to_string());
            self.persist_config();
        }
        self.billing.checkout.start();
        self.spawn(move |session, report| async move {
            let result = session.protected(session.api().create_checkout(plan)).await;
            report.send(Payload::Checkout(result)).await;
        });
    }

    pub fn submit_referral(&mut self) {
        if self.billing.form.busy {
            return;
        }
        let email = self.billing.form.value(BILLING_REFERRAL).to_string();
        self.billing.form.begin();
        self.spawn(move |session, report| async move {
            let result = session.protected(session.api().submit_referral(&email)).await;
            report.send(Payload::ReferralSent(result)).await;
        });
    }

    pub fn verify_checkout(&mut self) {
        if self.billing.form.busy {
            return;
        }
        let session_id = self.billing.form.value(BILLING_SESSION_ID).to_string();
        self.billing.form.begin();
        self.billing.verified.start();
        self.spawn(move |session, report| async move {
            let result = session
                .protected(session.api().verify_checkout(&session_id))
                .await;
            report.send(Payload::Verified(result)).await;
        });
    }

    pub fn save_settings(&mut self) {
        if self.settings.busy {
            return;
        }
        let industry = self.settings.value(SETTINGS_INDUSTRY).trim().to_string();
        let update = SettingsUpdate {
            industry: (!industry.is_empty()).then_some(industry),
            ..Default::default()
        };
        self.settings.begin();
        self.spawn(move |session, report| async move {
            let result = session.protected(session.api().update_settings(&update)).await;
            report.send(Payload::SettingsSaved(result)).await;
        });
    }

    // =========================================================================
    // Screen Controls
    // =========================================================================

    /// The form that receives typing on the current screen, if any.
    pub fn current_form_mut(&mut self) -> Option<&mut Form> {
        match self.current_route() {
            Route::Login => Some(&mut self.login),
            Route::Register => Some(&mut self.register),
            Route::ForgotPassword => Some(&mut self.forgot),
            Route::ResetPassword => Some(&mut self.reset),
            Route::OAuthCallback => Some(&mut self.oauth),
            Route::Score => Some(&mut self.score.form),
            Route::Billing => Some(&mut self.billing.form),
            Route::Settings => Some(&mut self.settings),
            Route::Dashboard | Route::History | Route::Analytics | Route::Connections => None,
        }
    }

    /// Trigger action `idx` of the current screen's form.
    pub fn activate(&mut self, idx: usize) {
        match (self.current_route(), idx) {
            (Route::Login, LOGIN_SUBMIT) => self.submit_login(),
            (Route::Login, LOGIN_GOOGLE) => self.start_google_login(),
            (Route::Login, LOGIN_REGISTER) => self.navigate(Route::Register),
            (Route::Login, LOGIN_FORGOT) => self.navigate(Route::ForgotPassword),
            (Route::Register, REGISTER_SUBMIT) => self.submit_register(),
            (Route::ForgotPassword, FORGOT_SUBMIT) => self.submit_forgot_password(),
            (Route::ResetPassword, RESET_SUBMIT) => self.submit_reset_password(),
            (Route::OAuthCallback, OAUTH_SUBMIT) => self.complete_oauth(),
            (Route::Register, REGISTER_BACK)
            | (Route::ForgotPassword, FORGOT_BACK)
            | (Route::ResetPassword, RESET_BACK)
            | (Route::OAuthCallback, OAUTH_BACK) => self.navigate(Route::Login),
            (Route::Score, SCORE_SUBMIT) => self.submit_score(),
            (Route::Score, SCORE_CLEAR) => self.clear_score_form(),
            (Route::Billing, BILLING_INVITE) => self.submit_referral(),
            (Route::Billing, BILLING_VERIFY) => self.verify_checkout(),
            (Route::Settings, SETTINGS_SAVE) => self.save_settings(),
            (route, idx) => debug!(route = route.path(), idx, "No action bound"),
        }
    }

    pub fn cycle_history_filter(&mut self, forward: bool) {
        self.history.filter = if forward {
            self.history.filter.next()
        } else {
            self.history.filter.prev()
        };
        self.history.selection = 0;
    }

    pub fn history_next_page(&mut self) {
        if self.history.has_next_page() {
            self.history.offset += HISTORY_PAGE_SIZE;
            self.load_history_page();
        }
    }

    pub fn history_prev_page(&mut self) {
        if self.history.offset > 0 {
            self.history.offset = self.history.offset.saturating_sub(HISTORY_PAGE_SIZE);
            self.load_history_page();
        }
    }

    pub fn move_selection(&mut self, down: bool) {
        match self.current_route() {
            Route::History => {
                let len = self.history.visible().len();
                self.history.selection = step(self.history.selection, len, down);
            }
            Route::Billing => {
                self.billing.plan_selection =
                    step(self.billing.plan_selection, UPGRADE_PLANS.len(), down);
            }
            _ => {}
        }
    }

    /// Await `n` background results and apply them.
    #[cfg(test)]
    pub async fn wait_for_results(&mut self, n: usize) {
        for _ in 0..n {
            if let Some(loaded) = self.rx.recv().await {
                self.process_result(loaded);
            }
        }
        self.sync_session();
    }
}

/// Something pasted that is a token rather than a link or query string.
fn is_bare_token(s: &str) -> bool {
    !s.is_empty() && !s.contains(['/', '?', '=', '&', ' '])
}

/// Move a list selection one step, clamped to the list.
fn step(current: usize, len: usize, down: bool) -> usize {
    if len == 0 {
        0
    } else if down {
        (current + 1).min(len - 1)
    } else {
        current.saturating_sub(1)
    }
}

// ============================================================================
// Tests
// ============================================================================
