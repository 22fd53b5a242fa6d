use serde::Deserialize;
use serde_json::Value;

use crate::backend::{BackendError, Document};

pub(crate) const USERS: &str = "users";

/// The `users/{uid}` record mirrored by the session.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserProfile {
    #[serde(default)]
    pub(crate) display_name: Option<String>,
    #[serde(default)]
    pub(crate) email: Option<String>,
}

impl UserProfile {
    pub(crate) fn from_document(doc: &Document) -> Result<Self, BackendError> {
        serde_json::from_value(Value::Object(doc.data.clone()))
            .map_err(|e| BackendError::malformed(USERS, &doc.id, e))
    }

    /// Display name, if one is set and not blank.
    pub(crate) fn display_name(&self) -> Option<&str> {
        self.display_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}
