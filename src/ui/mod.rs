pub(crate) mod app;
pub(crate) mod budget_form;
pub(crate) mod commands;
pub(crate) mod dashboard;
pub(crate) mod login;
pub(crate) mod render;
pub(crate) mod screens;
pub(crate) mod theme;
pub(crate) mod util;


#[cfg(test)]
#[path = "budget_form_tests.rs"]
mod budget_form_tests;

#[cfg(test)]
#[path = "dashboard_tests.rs"]
mod dashboard_tests;
