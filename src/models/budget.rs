use chrono::{DateTime, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Number, Value};

use crate::backend::{BackendError, Document, Fields, Query};

pub(crate) const BUDGETS: &str = "budgets";

/// A budget as stored under `budgets/{id}`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Budget {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) amount: Decimal,
    pub(crate) created_by: String,
    pub(crate) members: Vec<String>,
    pub(crate) created_at: Option<DateTime<Utc>>,
    pub(crate) updated_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BudgetRecord {
    name: String,
    amount: f64,
    created_by: String,
    #[serde(default)]
    members: Vec<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl Budget {
    pub(crate) fn from_document(doc: &Document) -> Result<Self, BackendError> {
        let record: BudgetRecord = serde_json::from_value(Value::Object(doc.data.clone()))
            .map_err(|e| BackendError::malformed(BUDGETS, &doc.id, e))?;
        let amount = Decimal::from_f64(record.amount)
            .ok_or_else(|| BackendError::malformed(BUDGETS, &doc.id, "amount is not finite"))?;

        Ok(Self {
            id: doc.id.clone(),
            name: record.name,
            amount,
            created_by: record.created_by,
            members: record.members,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    /// Live query for every budget `uid` is a member of.
    pub(crate) fn visible_to(uid: &str) -> Query {
        Query::collection(BUDGETS).where_array_contains("members", uid)
    }
}

/// A validated budget waiting to be written.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NewBudget {
    pub(crate) name: String,
    pub(crate) amount: Decimal,
    pub(crate) created_by: String,
}

impl NewBudget {
    /// Initial record: the creator is the only member and both timestamps
    /// come from the store.
    pub(crate) fn to_fields(&self) -> Fields {
        Fields::new()
            .with("name", self.name.clone())
            .with("amount", amount_value(self.amount))
            .with("createdBy", self.created_by.clone())
            .with("members", json!([self.created_by]))
            .with_server_timestamp("createdAt")
            .with_server_timestamp("updatedAt")
    }
}

fn amount_value(amount: Decimal) -> Value {
    amount
        .to_f64()
        .and_then(Number::from_f64)
        .map_or(Value::Null, Value::Number)
}
