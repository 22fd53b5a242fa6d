use std::rc::Rc;

use crate::backend::{AuthProvider, DocumentStore};
use crate::session::SessionStore;

use super::budget_form::SubmitOutcome;
use super::dashboard::{DashboardView, Navigation};
use super::login::LoginForm;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Login,
    Dashboard,
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Login => write!(f, "Login"),
            Self::Dashboard => write!(f, "Dashboard"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InputMode {
    Normal,
    Command,
    Form,
}

impl std::fmt::Display for InputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "NORMAL"),
            Self::Command => write!(f, "COMMAND"),
            Self::Form => write!(f, "FORM"),
        }
    }
}

/// Root shell: owns the session and routes between the login screen and
/// the dashboard.
pub(crate) struct App {
    pub(crate) running: bool,
    pub(crate) screen: Screen,
    pub(crate) command_input: String,
    pub(crate) command_active: bool,
    pub(crate) status_message: String,
    pub(crate) show_help: bool,

    auth: Rc<dyn AuthProvider>,
    store: Rc<dyn DocumentStore>,
    pub(crate) session: SessionStore,
    pub(crate) dashboard: DashboardView,
    pub(crate) login: LoginForm,

    // Layout (updated each render frame)
    pub(crate) visible_rows: usize,
}

impl App {
    pub(crate) fn new(auth: Rc<dyn AuthProvider>, store: Rc<dyn DocumentStore>) -> Self {
        let session = SessionStore::new(&*auth, Rc::clone(&store));
        Self {
            running: true,
            screen: Screen::Dashboard,
            command_input: String::new(),
            command_active: false,
            status_message: String::new(),
            show_help: false,

            auth,
            session,
            dashboard: DashboardView::new(Rc::clone(&store)),
            store,
            login: LoginForm::new(),

            visible_rows: 20,
        }
    }

    pub(crate) fn input_mode(&self) -> InputMode {
        if self.command_active {
            InputMode::Command
        } else if self.screen == Screen::Login || self.dashboard.form.is_open() {
            InputMode::Form
        } else {
            InputMode::Normal
        }
    }

    /// Pick up writes from other clients, then drain the session and budget
    /// streams. Returns whether anything the screen shows has changed.
    pub(crate) fn tick(&mut self) -> bool {
        self.auth.poll_session();
        self.store.poll_changes();

        let mut changed = self.session.pump();

        match self.dashboard.sync_session(self.session.state()) {
            Navigation::ToLogin if self.screen != Screen::Login => {
                self.screen = Screen::Login;
                changed = true;
            }
            Navigation::Stay
                if self.screen == Screen::Login && self.session.state().user().is_some() =>
            {
                self.screen = Screen::Dashboard;
                changed = true;
            }
            _ => {}
        }

        self.dashboard.pump() || changed
    }

    pub(crate) fn submit_login(&mut self) {
        if self.login.submit(&*self.auth) {
            self.set_status("Signed in");
        }
    }

    pub(crate) fn sign_out(&mut self) {
        match self.auth.sign_out() {
            Ok(()) => self.set_status("Signed out"),
            Err(e) => self.set_status(format!("Sign out failed: {e}")),
        }
    }

    pub(crate) fn open_budget_form(&mut self) {
        if self.screen == Screen::Dashboard && self.session.state().user().is_some() {
            self.dashboard.form.open();
        }
    }

    pub(crate) fn submit_budget_form(&mut self) -> SubmitOutcome {
        let outcome = self.dashboard.submit_form(self.session.state());
        if let SubmitOutcome::Created(_) = outcome {
            self.set_status("Budget added");
        }
        outcome
    }

    pub(crate) fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }
}
