use anyhow::{Context, Result};
use std::io::Write;
use std::rc::Rc;

use crate::backend::{AuthProvider, DocumentStore, LocalBackend};
use crate::models::Budget;
use crate::session::{SessionState, SessionStore};
use crate::ui::budget_form::{BudgetForm, SubmitOutcome};

pub(crate) fn as_cli(args: &[String], backend: Rc<LocalBackend>) -> Result<()> {
    match args[1].as_str() {
        "signin" | "login" => cli_sign_in(&args[2..], &backend),
        "signout" | "logout" => cli_sign_out(&backend),
        "whoami" => cli_whoami(backend),
        "budgets" | "ls" => cli_budgets(&backend),
        "add" => cli_add(&args[2..], backend),
        "export" => cli_export(&args[2..], &backend),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("fiscella {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

fn print_usage() {
    println!("Fiscella - Finance Tracker");
    println!();
    println!("Usage: fiscella [command]");
    println!();
    println!("Commands:");
    println!("  (none)                        Launch interactive TUI");
    println!("  signin <email>                Sign in, creating the account on first use");
    println!("    --name <display name>       Name to greet you by");
    println!("  signout                       Sign out");
    println!("  whoami                        Show the signed-in user");
    println!("  budgets                       List your budgets");
    println!("  add <name> <amount>           Create a budget");
    println!("  export [path]                 Export your budgets to CSV (default: stdout)");
    println!("  --help, -h                    Show this help");
    println!("  --version, -V                 Show version");
}

/// Session as the dashboard would see it right after startup.
fn load_session(backend: Rc<LocalBackend>) -> SessionStore {
    let mut session = SessionStore::new(&*backend, backend.clone());
    session.pump();
    session
}

fn require_user(backend: &LocalBackend) -> Result<crate::backend::AuthUser> {
    backend
        .current_user()
        .ok_or_else(|| anyhow::anyhow!("Not signed in. Run: fiscella signin <email>"))
}

fn cli_sign_in(args: &[String], backend: &LocalBackend) -> Result<()> {
    let email = args
        .first()
        .filter(|a| !a.starts_with('-'))
        .ok_or_else(|| anyhow::anyhow!("Usage: fiscella signin <email> [--name <display name>]"))?;

    let name = args
        .windows(2)
        .find(|w| w[0] == "--name")
        .map(|w| w[1].as_str());

    let user = backend.sign_in(email, name)?;
    println!("Signed in as {}", user.email);
    Ok(())
}

fn cli_sign_out(backend: &LocalBackend) -> Result<()> {
    match backend.current_user() {
        Some(user) => {
            backend.sign_out()?;
            println!("Signed out {}", user.email);
        }
        None => println!("Not signed in"),
    }
    Ok(())
}

fn cli_whoami(backend: Rc<LocalBackend>) -> Result<()> {
    let session = load_session(backend);
    match session.state() {
        SessionState::SignedIn { user, .. } => {
            let name = session.state().greeting_name().unwrap_or(user.email.as_str());
            println!("{name} <{}>", user.email);
            println!("uid: {}", user.uid);
        }
        _ => println!("Not signed in"),
    }
    Ok(())
}

fn current_budgets(backend: &LocalBackend, uid: &str) -> Result<Vec<Budget>> {
    let live = backend.watch(Budget::visible_to(uid))?;
    let snapshot = live.latest().unwrap_or_default();
    let mut budgets = Vec::with_capacity(snapshot.len());
    for doc in &snapshot {
        match Budget::from_document(doc) {
            Ok(budget) => budgets.push(budget),
            Err(e) => eprintln!("Warning: {e}"),
        }
    }
    Ok(budgets)
}

fn cli_budgets(backend: &LocalBackend) -> Result<()> {
    let user = require_user(backend)?;
    let budgets = current_budgets(backend, &user.uid)?;
    if budgets.is_empty() {
        println!("No budgets found. Add one to get started!");
        return Ok(());
    }

    println!("{:<28} {:>14}  Created", "Name", "Amount");
    println!("{}", "─".repeat(60));
    for budget in &budgets {
        let created = budget
            .created_at
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        println!(
            "{:<28} {:>14}  {created}",
            budget.name,
            format!("${:.2}", budget.amount),
        );
    }
    Ok(())
}

/// Goes through the same form the TUI uses, so validation and the
/// resulting record are identical.
fn cli_add(args: &[String], backend: Rc<LocalBackend>) -> Result<()> {
    let (amount, name) = args
        .split_last()
        .ok_or_else(|| anyhow::anyhow!("Usage: fiscella add <name> <amount>"))?;

    let session = load_session(backend.clone());
    let mut form = BudgetForm::new();
    form.open();
    form.set_values(&name.join(" "), amount);

    match form.submit(session.state(), &*backend) {
        SubmitOutcome::Created(id) => {
            println!("Added budget {} ({id})", name.join(" ").trim());
            Ok(())
        }
        _ => {
            let messages: Vec<&str> = [form.name_error(), form.amount_error()]
                .into_iter()
                .flatten()
                .chain(form.error())
                .collect();
            anyhow::bail!("{}", messages.join("; "))
        }
    }
}

fn cli_export(args: &[String], backend: &LocalBackend) -> Result<()> {
    let user = require_user(backend)?;
    let budgets = current_budgets(backend, &user.uid)?;

    let output_path = args
        .first()
        .filter(|a| !a.starts_with('-'))
        .map(|a| shellexpand(a));

    let sink: Box<dyn Write> = match &output_path {
        Some(path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("Failed to create export file: {path}"))?,
        ),
        None => Box::new(std::io::stdout()),
    };
    let count = write_csv(sink, &budgets)?;

    if let Some(path) = output_path {
        println!("Exported {count} budgets to {path}");
    }
    Ok(())
}

fn write_csv<W: Write>(sink: W, budgets: &[Budget]) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(sink);
    wtr.write_record(["id", "name", "amount", "created_by", "members", "created_at"])?;
    for budget in budgets {
        let amount = format!("{:.2}", budget.amount);
        let members = budget.members.join(";");
        let created = budget
            .created_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();
        wtr.write_record([
            budget.id.as_str(),
            budget.name.as_str(),
            amount.as_str(),
            budget.created_by.as_str(),
            members.as_str(),
            created.as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(budgets.len())
}

fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/{rest}")
    } else {
        path.to_string()
    }
}
