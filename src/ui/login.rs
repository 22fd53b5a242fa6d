use crate::backend::AuthProvider;

pub(crate) const EMAIL_REQUIRED: &str = "Email is required";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoginField {
    Email,
    DisplayName,
}

#[derive(Debug)]
pub(crate) struct LoginForm {
    pub(crate) email: String,
    pub(crate) display_name: String,
    pub(crate) focus: LoginField,
    error: Option<String>,
}

impl LoginForm {
    pub(crate) fn new() -> Self {
        Self {
            email: String::new(),
            display_name: String::new(),
            focus: LoginField::Email,
            error: None,
        }
    }

    pub(crate) fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub(crate) fn next_field(&mut self) {
        self.focus = match self.focus {
            LoginField::Email => LoginField::DisplayName,
            LoginField::DisplayName => LoginField::Email,
        };
    }

    pub(crate) fn push_char(&mut self, c: char) {
        match self.focus {
            LoginField::Email => self.email.push(c),
            LoginField::DisplayName => self.display_name.push(c),
        }
    }

    pub(crate) fn pop_char(&mut self) {
        match self.focus {
            LoginField::Email => self.email.pop(),
            LoginField::DisplayName => self.display_name.pop(),
        };
    }

    /// Sign in with the entered credentials. The resulting transition
    /// arrives through the auth stream, not through this call.
    pub(crate) fn submit(&mut self, auth: &dyn AuthProvider) -> bool {
        if self.email.trim().is_empty() {
            self.error = Some(EMAIL_REQUIRED.to_string());
            return false;
        }

        let display_name = Some(self.display_name.trim()).filter(|n| !n.is_empty());
        match auth.sign_in(&self.email, display_name) {
            Ok(_) => {
                self.email.clear();
                self.display_name.clear();
                self.focus = LoginField::Email;
                self.error = None;
                true
            }
            Err(e) => {
                self.error = Some(e.to_string());
                false
            }
        }
    }
}
