//! Collaborator interfaces for the hosted backend.
//!
//! Everything the app knows about authentication and persistence goes
//! through [`AuthProvider`] and [`DocumentStore`]. Streams handed out by
//! either trait carry a [`Subscription`] guard, so dropping the stream
//! releases the registration.

mod error;
mod local;
mod subscription;

pub(crate) use error::BackendError;
pub(crate) use local::LocalBackend;
pub(crate) use subscription::{Registry, Subscription};

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::mpsc::Receiver;

/// Identity as reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AuthUser {
    pub(crate) uid: String,
    pub(crate) email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AuthEvent {
    SignedIn(AuthUser),
    SignedOut,
}

impl AuthEvent {
    pub(crate) fn from_user(user: Option<AuthUser>) -> Self {
        match user {
            Some(user) => Self::SignedIn(user),
            None => Self::SignedOut,
        }
    }
}

/// Stream of auth transitions. The first event is the state at subscribe time.
pub(crate) struct AuthStream {
    events: Receiver<AuthEvent>,
    _subscription: Subscription,
}

impl AuthStream {
    pub(crate) fn new(events: Receiver<AuthEvent>, subscription: Subscription) -> Self {
        Self {
            events,
            _subscription: subscription,
        }
    }

    /// Next pending transition, if one has been delivered.
    pub(crate) fn try_next(&self) -> Option<AuthEvent> {
        self.events.try_recv().ok()
    }
}

pub(crate) trait AuthProvider {
    fn subscribe(&self) -> AuthStream;

    fn current_user(&self) -> Option<AuthUser>;

    /// Signs in, creating the account on first use. A display name, when
    /// given, is written to the user's profile record.
    fn sign_in(&self, email: &str, display_name: Option<&str>) -> Result<AuthUser, BackendError>;

    fn sign_out(&self) -> Result<(), BackendError>;

    /// Deliver sign-in state changed by another client since the last call.
    fn poll_session(&self);
}

// ── Documents ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Document {
    pub(crate) id: String,
    pub(crate) data: Map<String, Value>,
}

/// A field in a write. `ServerTimestamp` is replaced by the commit time.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FieldValue {
    Value(Value),
    ServerTimestamp,
}

/// Field set for a document write.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Fields {
    entries: BTreeMap<String, FieldValue>,
}

impl Fields {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.entries
            .insert(name.to_string(), FieldValue::Value(value.into()));
        self
    }

    pub(crate) fn with_server_timestamp(mut self, name: &str) -> Self {
        self.entries
            .insert(name.to_string(), FieldValue::ServerTimestamp);
        self
    }

    /// Materialize the fields, stamping every server timestamp with `now`.
    pub(crate) fn resolve(self, now: &str) -> Map<String, Value> {
        self.entries
            .into_iter()
            .map(|(name, value)| {
                let value = match value {
                    FieldValue::Value(v) => v,
                    FieldValue::ServerTimestamp => Value::String(now.to_string()),
                };
                (name, value)
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Filter {
    // Equality is part of the store's query surface; the app's own queries
    // only filter by membership.
    #[cfg_attr(not(test), allow(dead_code))]
    Equals { field: String, value: Value },
    ArrayContains { field: String, value: Value },
}

impl Filter {
    pub(crate) fn matches(&self, data: &Map<String, Value>) -> bool {
        match self {
            Self::Equals { field, value } => data.get(field) == Some(value),
            Self::ArrayContains { field, value } => data
                .get(field)
                .and_then(Value::as_array)
                .is_some_and(|items| items.contains(value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Query {
    pub(crate) collection: String,
    pub(crate) filter: Option<Filter>,
}

impl Query {
    pub(crate) fn collection(name: &str) -> Self {
        Self {
            collection: name.to_string(),
            filter: None,
        }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub(crate) fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filter = Some(Filter::Equals {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    pub(crate) fn where_array_contains(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filter = Some(Filter::ArrayContains {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    pub(crate) fn matches(&self, doc: &Document) -> bool {
        self.filter.as_ref().map_or(true, |f| f.matches(&doc.data))
    }
}

/// Complete result set of a live query at one point in time.
pub(crate) type Snapshot = Vec<Document>;

/// Handle to a running live query. Dropping it unsubscribes.
pub(crate) struct LiveQuery {
    snapshots: Receiver<Snapshot>,
    _subscription: Subscription,
}

impl LiveQuery {
    pub(crate) fn new(snapshots: Receiver<Snapshot>, subscription: Subscription) -> Self {
        Self {
            snapshots,
            _subscription: subscription,
        }
    }

    /// Drain pending deliveries and return the most recent one.
    pub(crate) fn latest(&self) -> Option<Snapshot> {
        self.snapshots.try_iter().last()
    }
}

pub(crate) trait DocumentStore {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, BackendError>;

    /// Create a document under a store-assigned id and return the id.
    fn add(&self, collection: &str, fields: Fields) -> Result<String, BackendError>;

    /// Create or replace the document at `collection/id`.
    fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), BackendError>;

    fn watch(&self, query: Query) -> Result<LiveQuery, BackendError>;

    /// Redeliver live queries if another client has written since the last
    /// call.
    fn poll_changes(&self);
}
