#![allow(clippy::unwrap_used)]

use std::rc::Rc;

use rust_decimal_macros::dec;

use super::budget_form::SubmitOutcome;
use super::dashboard::*;
use crate::backend::{AuthUser, DocumentStore, LocalBackend};
use crate::models::{NewBudget, BUDGETS};
use crate::session::SessionState;

fn setup() -> (Rc<LocalBackend>, DashboardView) {
    let backend = Rc::new(LocalBackend::open_in_memory().unwrap());
    let view = DashboardView::new(backend.clone());
    (backend, view)
}

fn signed_in(uid: &str) -> SessionState {
    SessionState::SignedIn {
        user: AuthUser {
            uid: uid.to_string(),
            email: format!("{uid}@example.com"),
        },
        profile: None,
    }
}

fn seed(backend: &LocalBackend, owner: &str, name: &str) {
    let budget = NewBudget {
        name: name.to_string(),
        amount: dec!(25),
        created_by: owner.to_string(),
    };
    backend.add(BUDGETS, budget.to_fields()).unwrap();
}

fn names(view: &DashboardView) -> Vec<&str> {
    view.budgets().iter().map(|b| b.name.as_str()).collect()
}

// ── Session routing ───────────────────────────────────────────

#[test]
fn test_signed_out_redirects_to_login() {
    let (backend, mut view) = setup();
    assert_eq!(view.sync_session(&SessionState::SignedOut), Navigation::ToLogin);
    assert_eq!(backend.watcher_count(), 0);
    assert!(!view.is_loading(&SessionState::SignedOut));
}

#[test]
fn test_pending_session_stays_and_loads() {
    let (backend, mut view) = setup();
    assert_eq!(view.sync_session(&SessionState::Loading), Navigation::Stay);
    assert!(view.is_loading(&SessionState::Loading));
    assert_eq!(backend.watcher_count(), 0);
}

#[test]
fn test_loading_until_first_snapshot() {
    let (backend, mut view) = setup();
    let session = signed_in("u1");

    assert_eq!(view.sync_session(&session), Navigation::Stay);
    assert_eq!(backend.watcher_count(), 1);
    assert!(view.is_loading(&session));

    assert!(view.pump());
    assert!(!view.is_loading(&session));
    assert!(view.budgets().is_empty());
    assert!(!view.pump());
}

#[test]
fn test_repeated_sync_keeps_one_subscription() {
    let (backend, mut view) = setup();
    let session = signed_in("u1");
    view.sync_session(&session);
    view.sync_session(&session);
    view.sync_session(&session);
    assert_eq!(backend.watcher_count(), 1);
}

// ── Live list ─────────────────────────────────────────────────

#[test]
fn test_groceries_appears_in_live_list() {
    let (_backend, mut view) = setup();
    let session = signed_in("u1");
    view.sync_session(&session);
    view.pump();

    view.form.open();
    view.form.set_values("Groceries", "150.5");
    assert!(matches!(
        view.submit_form(&session),
        SubmitOutcome::Created(_)
    ));

    assert!(view.pump());
    let budgets = view.budgets();
    assert_eq!(budgets.len(), 1);
    assert_eq!(budgets[0].name, "Groceries");
    assert_eq!(budgets[0].amount, dec!(150.5));
    assert_eq!(budgets[0].created_by, "u1");
    assert_eq!(budgets[0].members, vec!["u1".to_string()]);
    assert!(!view.form.is_open());
}

#[test]
fn test_only_member_budgets_are_listed() {
    let (backend, mut view) = setup();
    seed(&backend, "u1", "Rent");
    seed(&backend, "u2", "Travel");
    seed(&backend, "u1", "Fuel");

    view.sync_session(&signed_in("u1"));
    view.pump();
    assert_eq!(names(&view), vec!["Rent", "Fuel"]);
}

#[test]
fn test_each_snapshot_replaces_the_list() {
    let (backend, mut view) = setup();
    view.sync_session(&signed_in("u1"));
    view.pump();

    seed(&backend, "u1", "Rent");
    seed(&backend, "u1", "Fuel");
    assert!(view.pump());
    assert_eq!(names(&view), vec!["Rent", "Fuel"]);

    // A write elsewhere in the collection redelivers the same set
    seed(&backend, "u2", "Travel");
    assert!(view.pump());
    assert_eq!(names(&view), vec!["Rent", "Fuel"]);
}

#[test]
fn test_unreadable_budget_is_skipped() {
    let (backend, mut view) = setup();
    seed(&backend, "u1", "Rent");
    backend
        .set(
            BUDGETS,
            "broken",
            crate::backend::Fields::new()
                .with("name", "Broken")
                .with("amount", "lots")
                .with("createdBy", "u1")
                .with("members", serde_json::json!(["u1"])),
        )
        .unwrap();

    view.sync_session(&signed_in("u1"));
    view.pump();
    assert_eq!(names(&view), vec!["Rent"]);
}

// ── Identity changes ──────────────────────────────────────────

#[test]
fn test_identity_change_swaps_subscription() {
    let (backend, mut view) = setup();
    seed(&backend, "u1", "Rent");
    seed(&backend, "u2", "Travel");

    view.sync_session(&signed_in("u1"));
    view.pump();
    assert_eq!(names(&view), vec!["Rent"]);

    view.sync_session(&signed_in("u2"));
    assert_eq!(backend.watcher_count(), 1);
    assert!(view.budgets().is_empty());
    assert!(view.is_loading(&signed_in("u2")));

    view.pump();
    assert_eq!(names(&view), vec!["Travel"]);

    // Old identity's writes no longer reach the view
    seed(&backend, "u1", "Fuel");
    view.pump();
    assert_eq!(names(&view), vec!["Travel"]);
}

#[test]
fn test_sign_out_releases_subscription() {
    let (backend, mut view) = setup();
    seed(&backend, "u1", "Rent");
    view.sync_session(&signed_in("u1"));
    view.pump();

    assert_eq!(view.sync_session(&SessionState::SignedOut), Navigation::ToLogin);
    assert_eq!(backend.watcher_count(), 0);
    assert!(view.budgets().is_empty());
    assert!(!view.pump());
}

#[test]
fn test_drop_releases_subscription() {
    let (backend, mut view) = setup();
    view.sync_session(&signed_in("u1"));
    assert_eq!(backend.watcher_count(), 1);

    drop(view);
    assert_eq!(backend.watcher_count(), 0);
}

// ── Form hosting ──────────────────────────────────────────────

#[test]
fn test_failed_write_leaves_list_untouched() {
    let (backend, mut view) = setup();
    seed(&backend, "u1", "Rent");
    let session = signed_in("u1");
    view.sync_session(&session);
    view.pump();

    backend.make_read_only().unwrap();
    view.form.open();
    view.form.set_values("Groceries", "150.5");
    assert_eq!(view.submit_form(&session), SubmitOutcome::Failed);

    assert!(view.form.is_open());
    assert!(view.form.error().unwrap().starts_with("Database error:"));
    assert!(!view.pump());
    assert_eq!(names(&view), vec!["Rent"]);
}

// ── Navigation ────────────────────────────────────────────────

#[test]
fn test_cursor_moves_within_list() {
    let (backend, mut view) = setup();
    for name in ["A", "B", "C", "D"] {
        seed(&backend, "u1", name);
    }
    view.sync_session(&signed_in("u1"));
    view.pump();

    view.move_down(2);
    view.move_down(2);
    assert_eq!((view.index, view.scroll), (2, 1));

    view.goto_bottom(2);
    assert_eq!((view.index, view.scroll), (3, 2));
    view.move_down(2);
    assert_eq!(view.index, 3);

    view.move_up();
    view.goto_top();
    assert_eq!((view.index, view.scroll), (0, 0));
}

#[test]
fn test_cursor_clamps_when_list_shrinks() {
    let (backend, mut view) = setup();
    seed(&backend, "u1", "A");
    seed(&backend, "u1", "B");
    seed(&backend, "u2", "C");

    view.sync_session(&signed_in("u1"));
    view.pump();
    view.goto_bottom(10);
    assert_eq!(view.index, 1);

    view.sync_session(&signed_in("u2"));
    view.pump();
    assert_eq!(view.index, 0);
}
