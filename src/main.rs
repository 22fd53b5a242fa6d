mod backend;
mod config;
mod logging;
mod models;
mod run;
mod session;
mod ui;

use anyhow::{Context, Result};
use std::rc::Rc;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    let paths = config::Paths::discover()?;
    let config = config::Config::load(&paths.config_file)?;
    paths.ensure_data_dir()?;
    logging::init(&config.logging, &config.log_path(&paths))?;

    let db_path = config.database_path(&paths);
    let backend = backend::LocalBackend::open(&db_path)
        .with_context(|| format!("Failed to open database: {}", db_path.display()))?;
    let backend = Rc::new(backend);

    match args.len() {
        1 => run::as_tui(backend, config.tick_rate()),
        _ => run::as_cli(&args, backend),
    }
}
