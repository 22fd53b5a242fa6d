//! Mirror of the auth provider's session.
//!
//! [`SessionStore`] owns the auth subscription for as long as it lives and
//! folds every transition into a [`SessionState`]. Consumers receive the
//! state explicitly instead of reaching for a global.

use std::rc::Rc;

use crate::backend::{AuthEvent, AuthProvider, AuthStream, AuthUser, DocumentStore};
use crate::models::{UserProfile, USERS};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SessionState {
    /// No auth state has been delivered yet.
    Loading,
    SignedOut,
    SignedIn {
        user: AuthUser,
        profile: Option<UserProfile>,
    },
}

impl SessionState {
    pub(crate) fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub(crate) fn user(&self) -> Option<&AuthUser> {
        match self {
            Self::SignedIn { user, .. } => Some(user),
            _ => None,
        }
    }

    pub(crate) fn profile(&self) -> Option<&UserProfile> {
        match self {
            Self::SignedIn { profile, .. } => profile.as_ref(),
            _ => None,
        }
    }

    /// Name to greet the user by: profile display name, then email.
    pub(crate) fn greeting_name(&self) -> Option<&str> {
        let user = self.user()?;
        Some(
            self.profile()
                .and_then(UserProfile::display_name)
                .unwrap_or(user.email.as_str()),
        )
    }
}

pub(crate) struct SessionStore {
    store: Rc<dyn DocumentStore>,
    stream: AuthStream,
    state: SessionState,
}

impl SessionStore {
    pub(crate) fn new(auth: &dyn AuthProvider, store: Rc<dyn DocumentStore>) -> Self {
        Self {
            store,
            stream: auth.subscribe(),
            state: SessionState::Loading,
        }
    }

    pub(crate) fn state(&self) -> &SessionState {
        &self.state
    }

    /// Apply every transition delivered since the last call. Returns
    /// whether the state moved.
    pub(crate) fn pump(&mut self) -> bool {
        let mut changed = false;
        while let Some(event) = self.stream.try_next() {
            self.apply(event);
            changed = true;
        }
        changed
    }

    fn apply(&mut self, event: AuthEvent) {
        self.state = match event {
            AuthEvent::SignedIn(user) => {
                tracing::info!(uid = %user.uid, "session signed in");
                let profile = self.read_profile(&user);
                SessionState::SignedIn { user, profile }
            }
            AuthEvent::SignedOut => {
                tracing::info!("session signed out");
                SessionState::SignedOut
            }
        };
    }

    fn read_profile(&self, user: &AuthUser) -> Option<UserProfile> {
        let doc = match self.store.get(USERS, &user.uid) {
            Ok(doc) => doc?,
            Err(e) => {
                tracing::warn!(uid = %user.uid, error = %e, "profile read failed");
                return None;
            }
        };
        match UserProfile::from_document(&doc) {
            Ok(profile) => Some(profile),
            Err(e) => {
                tracing::warn!(uid = %user.uid, error = %e, "profile record unreadable");
                None
            }
        }
    }
}
