#![allow(clippy::unwrap_used)]

use rust_decimal_macros::dec;
use serde_json::json;

use super::*;
use crate::backend::Document;

fn document(id: &str, data: serde_json::Value) -> Document {
    Document {
        id: id.into(),
        data: data.as_object().cloned().unwrap(),
    }
}

// ── Budget ────────────────────────────────────────────────────

#[test]
fn test_new_budget_fields() {
    let budget = NewBudget {
        name: "Groceries".into(),
        amount: dec!(150.5),
        created_by: "u1".into(),
    };
    let data = budget.to_fields().resolve("2024-01-15T10:00:00.000Z");

    assert_eq!(data["name"], json!("Groceries"));
    assert_eq!(data["amount"], json!(150.5));
    assert_eq!(data["createdBy"], json!("u1"));
    assert_eq!(data["members"], json!(["u1"]));
    assert_eq!(data["createdAt"], json!("2024-01-15T10:00:00.000Z"));
    assert_eq!(data["updatedAt"], json!("2024-01-15T10:00:00.000Z"));
    assert_eq!(data.len(), 6);
}

#[test]
fn test_budget_from_document() {
    let doc = document(
        "b1",
        json!({
            "name": "Rent",
            "amount": 1200.0,
            "createdBy": "u1",
            "members": ["u1", "u2"],
            "createdAt": "2024-01-15T10:00:00.000Z",
            "updatedAt": "2024-01-16T10:00:00.000Z",
        }),
    );
    let budget = Budget::from_document(&doc).unwrap();
    assert_eq!(budget.id, "b1");
    assert_eq!(budget.name, "Rent");
    assert_eq!(budget.amount, dec!(1200));
    assert_eq!(budget.members, vec!["u1", "u2"]);
    assert!(budget.created_at.unwrap() < budget.updated_at.unwrap());
}

#[test]
fn test_budget_fractional_amount() {
    let doc = document(
        "b1",
        json!({"name": "Coffee", "amount": 0.01, "createdBy": "u1", "members": ["u1"]}),
    );
    let budget = Budget::from_document(&doc).unwrap();
    assert_eq!(budget.amount, dec!(0.01));
    assert!(budget.created_at.is_none());
}

#[test]
fn test_budget_missing_name_is_malformed() {
    let doc = document("b1", json!({"amount": 5, "createdBy": "u1"}));
    let err = Budget::from_document(&doc).unwrap_err();
    assert!(err.to_string().starts_with("Malformed document budgets/b1"));
}

#[test]
fn test_visible_to_filters_on_members() {
    let query = Budget::visible_to("u1");
    assert_eq!(query.collection, BUDGETS);
    assert!(query.matches(&document("a", json!({"members": ["u1"]}))));
    assert!(!query.matches(&document("b", json!({"members": ["u2"], "createdBy": "u1"}))));
}

// ── Profile ───────────────────────────────────────────────────

#[test]
fn test_profile_display_name() {
    let doc = document("u1", json!({"displayName": "Ada", "email": "ada@example.com"}));
    let profile = UserProfile::from_document(&doc).unwrap();
    assert_eq!(profile.display_name(), Some("Ada"));
    assert_eq!(profile.email.as_deref(), Some("ada@example.com"));
}

#[test]
fn test_profile_blank_display_name_is_absent() {
    let doc = document("u1", json!({"displayName": "   "}));
    let profile = UserProfile::from_document(&doc).unwrap();
    assert_eq!(profile.display_name(), None);
}

#[test]
fn test_profile_ignores_unknown_fields() {
    let doc = document("u1", json!({"theme": "dark", "createdAt": "2024-01-15T10:00:00.000Z"}));
    let profile = UserProfile::from_document(&doc).unwrap();
    assert_eq!(profile, UserProfile::default());
}

#[test]
fn test_profile_wrong_type_is_malformed() {
    let doc = document("u1", json!({"displayName": 42}));
    assert!(UserProfile::from_document(&doc).is_err());
}
