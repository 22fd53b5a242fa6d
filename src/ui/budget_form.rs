use rust_decimal::Decimal;
use std::str::FromStr;

use crate::backend::{BackendError, DocumentStore};
use crate::models::{NewBudget, BUDGETS};
use crate::session::SessionState;

pub(crate) const NAME_REQUIRED: &str = "Budget name is required";
pub(crate) const AMOUNT_REQUIRED: &str = "Budget amount is required";
pub(crate) const AMOUNT_TOO_SMALL: &str = "Amount must be greater than 0";
pub(crate) const LOGIN_REQUIRED: &str = "You must be logged in to create a budget.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FormField {
    Name,
    Amount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SubmitOutcome {
    /// A field failed validation; nothing was written.
    Invalid,
    NotSignedIn,
    /// A write is already in flight; nothing was written.
    Busy,
    Created(String),
    Failed,
}

/// Modal form that creates one budget.
#[derive(Debug)]
pub(crate) struct BudgetForm {
    open: bool,
    pub(crate) name: String,
    pub(crate) amount: String,
    pub(crate) focus: FormField,
    name_error: Option<&'static str>,
    amount_error: Option<&'static str>,
    error: Option<String>,
    in_flight: bool,
}

impl BudgetForm {
    pub(crate) fn new() -> Self {
        Self {
            open: false,
            name: String::new(),
            amount: String::new(),
            focus: FormField::Name,
            name_error: None,
            amount_error: None,
            error: None,
            in_flight: false,
        }
    }

    pub(crate) fn open(&mut self) {
        self.open = true;
        self.focus = FormField::Name;
    }

    /// Close without submitting. Ignored while a write is in flight.
    pub(crate) fn cancel(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.open = false;
        self.clear_messages();
        true
    }

    pub(crate) fn is_open(&self) -> bool {
        self.open
    }

    pub(crate) fn is_submitting(&self) -> bool {
        self.in_flight
    }

    pub(crate) fn submit_label(&self) -> &'static str {
        if self.in_flight {
            "Adding..."
        } else {
            "Add Budget"
        }
    }

    pub(crate) fn name_error(&self) -> Option<&'static str> {
        self.name_error
    }

    pub(crate) fn amount_error(&self) -> Option<&'static str> {
        self.amount_error
    }

    pub(crate) fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub(crate) fn set_values(&mut self, name: &str, amount: &str) {
        self.name = name.to_string();
        self.amount = amount.to_string();
    }

    pub(crate) fn next_field(&mut self) {
        self.focus = match self.focus {
            FormField::Name => FormField::Amount,
            FormField::Amount => FormField::Name,
        };
    }

    pub(crate) fn push_char(&mut self, c: char) {
        match self.focus {
            FormField::Name => self.name.push(c),
            FormField::Amount => self.amount.push(c),
        }
    }

    pub(crate) fn pop_char(&mut self) {
        match self.focus {
            FormField::Name => self.name.pop(),
            FormField::Amount => self.amount.pop(),
        };
    }

    /// Validate and claim the in-flight slot. On success the caller must
    /// issue the write and report back through [`Self::finish_submit`].
    pub(crate) fn begin_submit(&mut self, session: &SessionState) -> Result<NewBudget, SubmitOutcome> {
        if self.in_flight {
            return Err(SubmitOutcome::Busy);
        }

        let (name, amount) = self.validate().ok_or(SubmitOutcome::Invalid)?;

        let Some(user) = session.user() else {
            self.error = Some(LOGIN_REQUIRED.to_string());
            return Err(SubmitOutcome::NotSignedIn);
        };

        self.in_flight = true;
        self.error = None;
        Ok(NewBudget {
            name,
            amount,
            created_by: user.uid.clone(),
        })
    }

    pub(crate) fn finish_submit(&mut self, result: Result<String, BackendError>) -> SubmitOutcome {
        self.in_flight = false;
        match result {
            Ok(id) => {
                self.reset();
                self.open = false;
                SubmitOutcome::Created(id)
            }
            Err(e) => {
                tracing::warn!(error = %e, "budget write failed");
                self.error = Some(e.to_string());
                SubmitOutcome::Failed
            }
        }
    }

    pub(crate) fn submit(&mut self, session: &SessionState, store: &dyn DocumentStore) -> SubmitOutcome {
        match self.begin_submit(session) {
            Ok(budget) => {
                let result = store.add(BUDGETS, budget.to_fields());
                self.finish_submit(result)
            }
            Err(outcome) => outcome,
        }
    }

    fn validate(&mut self) -> Option<(String, Decimal)> {
        let name = self.name.trim();
        self.name_error = name.is_empty().then_some(NAME_REQUIRED);

        let amount = Decimal::from_str(self.amount.trim()).ok();
        self.amount_error = match amount {
            None => Some(AMOUNT_REQUIRED),
            Some(a) if a < Decimal::new(1, 2) => Some(AMOUNT_TOO_SMALL),
            Some(_) => None,
        };

        if self.name_error.is_some() || self.amount_error.is_some() {
            return None;
        }
        Some((name.to_string(), amount?))
    }

    fn clear_messages(&mut self) {
        self.name_error = None;
        self.amount_error = None;
        self.error = None;
    }

    fn reset(&mut self) {
        self.name.clear();
        self.amount.clear();
        self.focus = FormField::Name;
        self.clear_messages();
    }
}
