#![allow(clippy::unwrap_used, clippy::panic)]

use rust_decimal_macros::dec;

use super::budget_form::*;
use crate::backend::{AuthUser, DocumentStore, LocalBackend, Query};
use crate::models::{Budget, BUDGETS};
use crate::session::SessionState;

fn signed_in(uid: &str) -> SessionState {
    SessionState::SignedIn {
        user: AuthUser {
            uid: uid.to_string(),
            email: format!("{uid}@example.com"),
        },
        profile: None,
    }
}

fn stored_budgets(backend: &LocalBackend) -> Vec<Budget> {
    backend
        .watch(Query::collection(BUDGETS))
        .unwrap()
        .latest()
        .unwrap()
        .iter()
        .map(|doc| Budget::from_document(doc).unwrap())
        .collect()
}

fn filled(name: &str, amount: &str) -> BudgetForm {
    let mut form = BudgetForm::new();
    form.open();
    form.set_values(name, amount);
    form
}

// ── Validation ────────────────────────────────────────────────

#[test]
fn test_empty_name_is_rejected_without_write() {
    let backend = LocalBackend::open_in_memory().unwrap();
    let mut form = filled("   ", "20");

    let outcome = form.submit(&signed_in("u1"), &backend);

    assert_eq!(outcome, SubmitOutcome::Invalid);
    assert_eq!(form.name_error(), Some(NAME_REQUIRED));
    assert_eq!(form.amount_error(), None);
    assert!(form.is_open());
    assert!(stored_budgets(&backend).is_empty());
}

#[test]
fn test_missing_or_unparsable_amount_is_required() {
    let backend = LocalBackend::open_in_memory().unwrap();
    for amount in ["", "  ", "abc", "twelve"] {
        let mut form = filled("Rent", amount);
        assert_eq!(
            form.submit(&signed_in("u1"), &backend),
            SubmitOutcome::Invalid
        );
        assert_eq!(form.amount_error(), Some(AMOUNT_REQUIRED), "input {amount:?}");
    }
    assert!(stored_budgets(&backend).is_empty());
}

#[test]
fn test_amount_below_one_cent_is_rejected() {
    let backend = LocalBackend::open_in_memory().unwrap();
    for amount in ["0", "-5", "0.001", "0.00"] {
        let mut form = filled("Rent", amount);
        assert_eq!(
            form.submit(&signed_in("u1"), &backend),
            SubmitOutcome::Invalid
        );
        assert_eq!(form.amount_error(), Some(AMOUNT_TOO_SMALL), "input {amount:?}");
    }
    assert!(stored_budgets(&backend).is_empty());
}

#[test]
fn test_both_fields_report_at_once() {
    let backend = LocalBackend::open_in_memory().unwrap();
    let mut form = filled("", "0");
    form.submit(&signed_in("u1"), &backend);
    assert_eq!(form.name_error(), Some(NAME_REQUIRED));
    assert_eq!(form.amount_error(), Some(AMOUNT_TOO_SMALL));
}

#[test]
fn test_one_cent_is_the_minimum() {
    let backend = LocalBackend::open_in_memory().unwrap();
    let mut form = filled("Coffee jar", "0.01");
    assert!(matches!(
        form.submit(&signed_in("u1"), &backend),
        SubmitOutcome::Created(_)
    ));
    assert_eq!(stored_budgets(&backend)[0].amount, dec!(0.01));
}

// ── Submission ────────────────────────────────────────────────

#[test]
fn test_unauthenticated_submit_writes_nothing() {
    let backend = LocalBackend::open_in_memory().unwrap();
    for session in [SessionState::Loading, SessionState::SignedOut] {
        let mut form = filled("Groceries", "150.5");
        assert_eq!(form.submit(&session, &backend), SubmitOutcome::NotSignedIn);
        assert_eq!(form.error(), Some(LOGIN_REQUIRED));
        assert!(form.is_open());
        assert!(!form.is_submitting());
    }
    assert!(stored_budgets(&backend).is_empty());
}

#[test]
fn test_submit_creates_owned_budget_and_closes() {
    let backend = LocalBackend::open_in_memory().unwrap();
    let mut form = filled("  Groceries ", "150.5");

    let SubmitOutcome::Created(id) = form.submit(&signed_in("u1"), &backend) else {
        panic!("expected a created budget");
    };

    let budgets = stored_budgets(&backend);
    assert_eq!(budgets.len(), 1);
    let budget = &budgets[0];
    assert_eq!(budget.id, id);
    assert_eq!(budget.name, "Groceries");
    assert_eq!(budget.amount, dec!(150.5));
    assert_eq!(budget.created_by, "u1");
    assert_eq!(budget.members, vec!["u1".to_string()]);
    assert!(budget.created_at.is_some());
    assert_eq!(budget.created_at, budget.updated_at);

    assert!(!form.is_open());
    assert!(form.name.is_empty());
    assert!(form.amount.is_empty());
    assert_eq!(form.error(), None);
}

#[test]
fn test_second_submit_while_in_flight_is_busy() {
    let backend = LocalBackend::open_in_memory().unwrap();
    let session = signed_in("u1");
    let mut form = filled("Groceries", "150.5");

    let pending = form.begin_submit(&session).unwrap();
    assert!(form.is_submitting());
    assert_eq!(form.submit_label(), "Adding...");

    // Second press before the first write lands
    assert_eq!(form.submit(&session, &backend), SubmitOutcome::Busy);
    assert!(!form.cancel());
    assert!(stored_budgets(&backend).is_empty());

    let result = backend.add(BUDGETS, pending.to_fields());
    assert!(matches!(form.finish_submit(result), SubmitOutcome::Created(_)));
    assert!(!form.is_submitting());
    assert_eq!(form.submit_label(), "Add Budget");
    assert_eq!(stored_budgets(&backend).len(), 1);
}

#[test]
fn test_write_failure_keeps_form_populated() {
    let backend = LocalBackend::open_in_memory().unwrap();
    backend.make_read_only().unwrap();
    let mut form = filled("Groceries", "150.5");

    assert_eq!(
        form.submit(&signed_in("u1"), &backend),
        SubmitOutcome::Failed
    );
    assert!(form.is_open());
    assert!(!form.is_submitting());
    assert_eq!(form.name, "Groceries");
    assert_eq!(form.amount, "150.5");
    assert!(form.error().unwrap().starts_with("Database error:"));
}

// ── Editing ───────────────────────────────────────────────────

#[test]
fn test_cancel_keeps_values_and_clears_messages() {
    let backend = LocalBackend::open_in_memory().unwrap();
    let mut form = filled("", "7");
    form.submit(&signed_in("u1"), &backend);
    assert!(form.name_error().is_some());

    assert!(form.cancel());
    assert!(!form.is_open());
    assert_eq!(form.name_error(), None);
    assert_eq!(form.amount, "7");
}

#[test]
fn test_typing_follows_focus() {
    let mut form = BudgetForm::new();
    form.open();
    for c in "Gas".chars() {
        form.push_char(c);
    }
    form.next_field();
    for c in "401".chars() {
        form.push_char(c);
    }
    form.pop_char();
    form.next_field();
    form.push_char('!');

    assert_eq!(form.name, "Gas!");
    assert_eq!(form.amount, "40");
    assert_eq!(form.focus, FormField::Name);
}
