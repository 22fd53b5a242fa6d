use std::collections::HashMap;
use std::sync::LazyLock;

use super::app::{App, Screen};
use super::budget_form::SubmitOutcome;

pub(crate) struct Command {
    pub(crate) description: &'static str,
    pub(crate) run: fn(&str, &mut App) -> anyhow::Result<()>,
}

macro_rules! register_command {
    ($name:expr, $desc:expr, $func:expr, $registry:expr) => {{
        $registry.insert(
            $name,
            Command {
                description: $desc,
                run: $func,
            },
        );
    }};
}

pub(crate) static COMMANDS: LazyLock<HashMap<&str, Command>> = LazyLock::new(|| {
    let mut r: HashMap<&str, Command> = HashMap::new();

    register_command!("q", "Quit Fiscella", cmd_quit, r);
    register_command!("quit", "Quit Fiscella", cmd_quit, r);
    register_command!("a", "Open the Add Budget form", cmd_add, r);
    register_command!("add", "Open the Add Budget form", cmd_add, r);
    register_command!(
        "budget",
        "Create a budget (e.g. :budget Groceries 150.50)",
        cmd_budget,
        r
    );
    register_command!("signout", "Sign out", cmd_sign_out, r);
    register_command!("logout", "Sign out", cmd_sign_out, r);
    register_command!("help", "Show available commands", cmd_help, r);
    register_command!("h", "Show available commands", cmd_help, r);

    r
});

pub(crate) fn handle_command(input: &str, app: &mut App) -> anyhow::Result<()> {
    let trimmed = input.trim();
    let mut parts = trimmed.splitn(2, ' ');
    let cmd_name = parts.next().unwrap_or("");
    let args = parts.next().unwrap_or("").trim();

    if let Some(cmd) = COMMANDS.get(cmd_name) {
        (cmd.run)(args, app)?;
    } else {
        let suggestion = find_closest(cmd_name);
        app.set_status(format!(
            "Unknown command: :{cmd_name}. Did you mean :{suggestion}?"
        ));
    }

    Ok(())
}

fn find_closest(input: &str) -> String {
    COMMANDS
        .keys()
        .filter(|k| k.len() > 1) // skip single-letter aliases for suggestions
        .min_by_key(|k| levenshtein(input, k))
        .unwrap_or(&"help")
        .to_string()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

// ── Command implementations ──────────────────────────────────

fn cmd_quit(_args: &str, app: &mut App) -> anyhow::Result<()> {
    app.running = false;
    Ok(())
}

fn cmd_help(_args: &str, app: &mut App) -> anyhow::Result<()> {
    app.show_help = true;
    Ok(())
}

fn cmd_add(_args: &str, app: &mut App) -> anyhow::Result<()> {
    if app.screen != Screen::Dashboard {
        app.set_status("Sign in before adding budgets");
        return Ok(());
    }
    app.open_budget_form();
    Ok(())
}

fn cmd_sign_out(_args: &str, app: &mut App) -> anyhow::Result<()> {
    app.sign_out();
    Ok(())
}

/// Fill the form from the arguments and submit it. Anything short of a
/// successful write leaves the form open with its messages.
fn cmd_budget(args: &str, app: &mut App) -> anyhow::Result<()> {
    if app.screen != Screen::Dashboard {
        app.set_status("Sign in before adding budgets");
        return Ok(());
    }

    // Last token is the amount, everything before is the name
    let (name, amount) = args.rsplit_once(' ').unwrap_or((args, ""));
    app.dashboard.form.set_values(name.trim(), amount.trim());

    match app.submit_budget_form() {
        SubmitOutcome::Created(_) => {}
        SubmitOutcome::Busy => app.set_status("A budget is already being added"),
        _ => app.open_budget_form(),
    }
    Ok(())
}
