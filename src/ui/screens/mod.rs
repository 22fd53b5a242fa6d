pub(crate) mod budget_form;
pub(crate) mod dashboard;
pub(crate) mod login;
