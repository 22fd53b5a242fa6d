//! SQLite-backed stand-in for the hosted backend.
//!
//! Documents live in one table keyed by `(collection, id)` with their
//! fields stored as JSON. Live queries are re-run after every committed
//! write to their collection and the full result set is pushed to each
//! watcher. Commits made by other processes on the same file are noticed
//! through `PRAGMA data_version` when the owner polls.

mod schema;

use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};
use std::cell::{Cell, RefCell};
use std::path::Path;
use std::sync::mpsc::{self, Sender};
use std::sync::LazyLock;

use super::{
    AuthEvent, AuthProvider, AuthStream, AuthUser, BackendError, Document, DocumentStore, Fields,
    LiveQuery, Query, Registry, Snapshot,
};

const USERS: &str = "users";

static EMAIL_RE: LazyLock<Option<regex::Regex>> =
    LazyLock::new(|| regex::Regex::new(r"^[^@ \t\r\n]+@[^@ \t\r\n]+\.[^@ \t\r\n]+$").ok());

struct Watcher {
    query: Query,
    sender: Sender<Snapshot>,
}

pub(crate) struct LocalBackend {
    conn: Connection,
    auth_listeners: Registry<Sender<AuthEvent>>,
    watchers: Registry<Watcher>,

    // `data_version` last seen by each poll, and the session uid auth
    // listeners last heard about.
    docs_version: Cell<i64>,
    auth_version: Cell<i64>,
    delivered_uid: RefCell<Option<String>>,
}

impl LocalBackend {
    pub(crate) fn open(path: &Path) -> Result<Self, BackendError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        Self::with_connection(conn)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self, BackendError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, BackendError> {
        let backend = Self {
            conn,
            auth_listeners: Registry::new(),
            watchers: Registry::new(),
            docs_version: Cell::new(0),
            auth_version: Cell::new(0),
            delivered_uid: RefCell::new(None),
        };
        backend.migrate()?;

        let version = backend.data_version()?;
        backend.docs_version.set(version);
        backend.auth_version.set(version);
        *backend.delivered_uid.borrow_mut() = backend.session_user()?.map(|u| u.uid);
        Ok(backend)
    }

    fn migrate(&self) -> Result<(), BackendError> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            self.conn.execute_batch(schema::SCHEMA_V1)?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            tracing::info!(version = schema::CURRENT_VERSION, "created database schema");
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
            tracing::info!(
                from = current,
                to = schema::CURRENT_VERSION,
                "migrated database schema"
            );
        }

        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn watcher_count(&self) -> usize {
        self.watchers.len()
    }

    #[cfg(test)]
    pub(crate) fn auth_listener_count(&self) -> usize {
        self.auth_listeners.len()
    }

    /// Reject every subsequent write, the way a store does when it loses
    /// write access.
    #[cfg(test)]
    pub(crate) fn make_read_only(&self) -> Result<(), BackendError> {
        self.conn.execute_batch("PRAGMA query_only = ON;")?;
        Ok(())
    }

    fn data_version(&self) -> Result<i64, BackendError> {
        Ok(self
            .conn
            .query_row("PRAGMA data_version", [], |row| row.get(0))?)
    }

    /// Whether another connection has committed since `seen` was recorded.
    /// Commits on this connection never change `data_version`.
    fn external_commit(&self, seen: &Cell<i64>) -> bool {
        match self.data_version() {
            Ok(version) if version != seen.get() => {
                seen.set(version);
                true
            }
            Ok(_) => false,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read data version");
                false
            }
        }
    }

    // ── Documents ─────────────────────────────────────────────

    fn upsert(&self, collection: &str, id: &str, fields: Fields) -> Result<(), BackendError> {
        check_path(collection, id)?;
        let now = server_now();
        let data = serde_json::to_string(&fields.resolve(&now))
            .map_err(|e| BackendError::malformed(collection, id, e))?;
        self.conn.execute(
            "INSERT INTO documents (collection, id, data, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT(collection, id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
            params![collection, id, data, now],
        )?;
        tracing::debug!(collection, id, "document committed");
        self.publish(collection);
        Ok(())
    }

    fn run_query(&self, query: &Query) -> Result<Snapshot, BackendError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, data FROM documents WHERE collection = ?1 ORDER BY rowid")?;
        let rows = stmt.query_map(params![query.collection], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut snapshot = Vec::new();
        for row in rows {
            let (id, raw) = row?;
            let doc = decode(&query.collection, id, &raw)?;
            if query.matches(&doc) {
                snapshot.push(doc);
            }
        }
        Ok(snapshot)
    }

    /// Redeliver every live query on `collection`.
    fn publish(&self, collection: &str) {
        self.publish_where(|query| query.collection == collection);
    }

    fn publish_where(&self, wanted: impl Fn(&Query) -> bool) {
        self.watchers.for_each(|watcher| {
            if !wanted(&watcher.query) {
                return;
            }
            match self.run_query(&watcher.query) {
                Ok(snapshot) => {
                    let _ = watcher.sender.send(snapshot);
                }
                Err(e) => tracing::warn!(
                    collection = %watcher.query.collection,
                    error = %e,
                    "live query evaluation failed"
                ),
            }
        });
    }

    // ── Auth ──────────────────────────────────────────────────

    fn session_user(&self) -> Result<Option<AuthUser>, BackendError> {
        let user = self
            .conn
            .query_row(
                "SELECT u.uid, u.email FROM auth_session s JOIN auth_users u ON u.uid = s.uid
                 WHERE s.slot = 0",
                [],
                |row| {
                    Ok(AuthUser {
                        uid: row.get(0)?,
                        email: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    fn find_or_create_account(&self, email: &str) -> Result<AuthUser, BackendError> {
        let existing: Option<String> = self
            .conn
            .query_row(
                "SELECT uid FROM auth_users WHERE email = ?1",
                params![email],
                |row| row.get(0),
            )
            .optional()?;

        let uid = match existing {
            Some(uid) => uid,
            None => {
                let uid = uuid::Uuid::new_v4().simple().to_string();
                self.conn.execute(
                    "INSERT INTO auth_users (uid, email, created_at) VALUES (?1, ?2, ?3)",
                    params![uid, email, server_now()],
                )?;
                tracing::info!(uid = %uid, "created account");
                uid
            }
        };

        Ok(AuthUser {
            uid,
            email: email.to_string(),
        })
    }

    /// Keep `users/{uid}` in step with the account, preserving `createdAt`
    /// and any earlier display name.
    fn write_profile(&self, user: &AuthUser, display_name: Option<&str>) -> Result<(), BackendError> {
        let existing = self.get(USERS, &user.uid)?;
        let previous = |field: &str| {
            existing
                .as_ref()
                .and_then(|doc| doc.data.get(field))
                .cloned()
        };

        let mut fields = Fields::new()
            .with("email", user.email.clone())
            .with_server_timestamp("updatedAt");
        fields = match previous("createdAt") {
            Some(created) => fields.with("createdAt", created),
            None => fields.with_server_timestamp("createdAt"),
        };

        let display_name = display_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| Value::String(name.to_string()))
            .or_else(|| previous("displayName"));
        if let Some(name) = display_name {
            fields = fields.with("displayName", name);
        }

        self.set(USERS, &user.uid, fields)
    }

    /// Tell auth listeners about `user` unless it is the session they last
    /// heard about. Returns whether anything was sent.
    fn deliver_session(&self, user: Option<AuthUser>) -> bool {
        let uid = user.as_ref().map(|u| u.uid.clone());
        if *self.delivered_uid.borrow() == uid {
            return false;
        }
        *self.delivered_uid.borrow_mut() = uid;

        let event = AuthEvent::from_user(user);
        self.auth_listeners.for_each(|listener| {
            let _ = listener.send(event.clone());
        });
        true
    }
}

impl DocumentStore for LocalBackend {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, BackendError> {
        check_path(collection, id)?;
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT data FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |row| row.get(0),
            )
            .optional()?;
        raw.map(|raw| decode(collection, id.to_string(), &raw))
            .transpose()
    }

    fn add(&self, collection: &str, fields: Fields) -> Result<String, BackendError> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.upsert(collection, &id, fields)?;
        Ok(id)
    }

    fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), BackendError> {
        self.upsert(collection, id, fields)
    }

    fn watch(&self, query: Query) -> Result<LiveQuery, BackendError> {
        let initial = self.run_query(&query)?;
        let (sender, receiver) = mpsc::channel();
        let _ = sender.send(initial);

        let collection = query.collection.clone();
        let subscription = self.watchers.register(Watcher { query, sender });
        tracing::debug!(collection = %collection, active = self.watchers.len(), "live query opened");
        Ok(LiveQuery::new(receiver, subscription))
    }

    fn poll_changes(&self) {
        if self.external_commit(&self.docs_version) {
            tracing::debug!(
                active = self.watchers.len(),
                "external commit, redelivering live queries"
            );
            self.publish_where(|_| true);
        }
    }
}

impl AuthProvider for LocalBackend {
    fn subscribe(&self) -> AuthStream {
        // Listeners already registered must not lag behind the newcomer.
        let user = self.current_user();
        self.deliver_session(user.clone());

        let (sender, receiver) = mpsc::channel();
        let _ = sender.send(AuthEvent::from_user(user));
        let subscription = self.auth_listeners.register(sender);
        AuthStream::new(receiver, subscription)
    }

    fn current_user(&self) -> Option<AuthUser> {
        match self.session_user() {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read persisted session");
                None
            }
        }
    }

    fn sign_in(&self, email: &str, display_name: Option<&str>) -> Result<AuthUser, BackendError> {
        let email = email.trim().to_lowercase();
        let valid = EMAIL_RE.as_ref().is_some_and(|re| re.is_match(&email));
        if !valid {
            return Err(BackendError::InvalidEmail(email));
        }

        let tx = self.conn.unchecked_transaction()?;
        let user = self.find_or_create_account(&email)?;
        self.conn.execute(
            "INSERT INTO auth_session (slot, uid, signed_in_at) VALUES (0, ?1, ?2)
             ON CONFLICT(slot) DO UPDATE SET uid = excluded.uid, signed_in_at = excluded.signed_in_at",
            params![user.uid, server_now()],
        )?;
        tx.commit()?;

        self.write_profile(&user, display_name)?;

        if self.deliver_session(Some(user.clone())) {
            tracing::info!(uid = %user.uid, "signed in");
        }
        Ok(user)
    }

    fn sign_out(&self) -> Result<(), BackendError> {
        let removed = self
            .conn
            .execute("DELETE FROM auth_session WHERE slot = 0", [])?;
        if self.deliver_session(None) || removed > 0 {
            tracing::info!("signed out");
        }
        Ok(())
    }

    fn poll_session(&self) {
        if !self.external_commit(&self.auth_version) {
            return;
        }
        match self.session_user() {
            Ok(user) => {
                if self.deliver_session(user) {
                    tracing::info!("session changed by another client");
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to read persisted session"),
        }
    }
}

fn server_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn check_path(collection: &str, id: &str) -> Result<(), BackendError> {
    let invalid = |s: &str| s.is_empty() || s.contains('/');
    if invalid(collection) || invalid(id) {
        return Err(BackendError::InvalidPath(format!("{collection}/{id}")));
    }
    Ok(())
}

fn decode(collection: &str, id: String, raw: &str) -> Result<Document, BackendError> {
    let data: Map<String, Value> =
        serde_json::from_str(raw).map_err(|e| BackendError::malformed(collection, &id, e))?;
    Ok(Document { id, data })
}
