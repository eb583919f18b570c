use std::io::Write;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use log::error;
use potdesk::{commands, host, logging, AppConfig, AppError};

#[derive(Parser, Debug)]
#[command(name = "potdesk", version, about = "Esquema local y puente de procesos de potdesk")]
struct Cli {
    /// Ruta del archivo SQLite (sobrescribe DATABASE_URL).
    #[arg(long, global = true)]
    database: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Aplica los pasos pendientes.
    Migrate,
    /// Lista pasos aplicados y pendientes.
    Status,
    /// Intenta revertir el último paso (todos son irreversibles).
    Rollback,
    /// Compara el esquema vivo con las definiciones.
    Verify,
    /// Migra y sirve el puente del anfitrión sobre stdio.
    Serve,
}

fn run(cli: Cli) -> Result<(), AppError> {
    let config = AppConfig::from_env()?.with_database_url(cli.database);
    logging::init(&config.log_filter);
    let url = config.database.url.clone();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Command::Migrate => commands::migrate(&mut pot_schema::establish(&url)?, &mut out)?,
        Command::Status => commands::status(&mut pot_schema::establish(&url)?, &mut out)?,
        Command::Rollback => commands::rollback(&mut pot_schema::establish(&url)?, &mut out)?,
        Command::Verify => commands::verify(&mut pot_schema::establish(&url)?, &mut out)?,
        Command::Serve => {
            drop(out);
            let pool = pot_schema::build_pool(&url, config.database.min_connections, config.database.max_connections)?;
            let provider = Arc::new(pot_schema::PoolProvider { pool });
            let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
            runtime.block_on(host::serve_stdio(provider))?;
            return Ok(());
        }
    }
    out.flush()?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!("{e}");
        eprintln!("potdesk: {e}");
        std::process::exit(e.exit_code());
    }
}
