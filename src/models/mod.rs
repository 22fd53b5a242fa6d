mod budget;
mod profile;

pub(crate) use budget::{Budget, NewBudget, BUDGETS};
pub(crate) use profile::{UserProfile, USERS};

#[cfg(test)]
mod tests;
