mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tenantsql_core::TenantId;
use tracing_subscriber::EnvFilter;

use crate::commands::Session;

#[derive(Parser, Debug)]
#[command(
    name = "tenantsql",
    version,
    about = "Confine SQL statements to a tenant's namespace"
)]
struct Cli {
    /// Path to tenantsql.yaml. Defaults apply when omitted.
    #[arg(long, short, global = true, env = "TENANTSQL_CONFIG")]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rewrite one SQL statement into the tenant's namespace.
    Rewrite {
        /// Tenant the statement runs for
        #[arg(long)]
        tenant: TenantId,

        /// Statement text. Read from stdin when omitted.
        #[arg(long)]
        sql: Option<String>,

        /// Positional parameter as JSON (repeatable). Non-JSON values are
        /// passed as strings.
        #[arg(long = "param")]
        params: Vec<String>,
    },

    /// Render CREATE TABLE from a JSON table definition.
    CreateTable {
        #[arg(long)]
        tenant: TenantId,

        /// Path to the definition, e.g. {"table_name": "orders", "columns": [...]}
        #[arg(long)]
        definition: PathBuf,
    },

    /// Render DROP TABLE for one of the tenant's tables.
    DropTable {
        #[arg(long)]
        tenant: TenantId,

        table: String,
    },

    /// Render a row preview query for one of the tenant's tables.
    Preview {
        #[arg(long)]
        tenant: TenantId,

        table: String,
    },

    /// Render catalog queries: the table list, or one table's columns.
    Catalog {
        #[arg(long)]
        tenant: TenantId,

        /// Describe this table instead of listing tables
        #[arg(long)]
        table: Option<String>,
    },

    /// Validate a configuration file.
    CheckConfig {
        /// Path to the configuration file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = commands::load_config(cli.config.as_deref())?;

    // RUST_LOG wins over the configured level. Logs go to stderr so stdout
    // carries only statement output.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let session = Session::from_config(&config)?;
    let json = cli.json;

    let outcome = match cli.cmd {
        Command::Rewrite {
            tenant,
            sql,
            params,
        } => commands::rewrite::run(&session, &tenant, sql, &params, json).await?,
        Command::CreateTable { tenant, definition } => {
            commands::table::create(&session, &tenant, &definition, json).await?
        }
        Command::DropTable { tenant, table } => {
            commands::table::drop(&session, &tenant, &table, json).await?
        }
        Command::Preview { tenant, table } => {
            commands::table::preview(&session, &tenant, &table, json).await?
        }
        Command::Catalog { tenant, table } => {
            commands::catalog::run(&session, &tenant, table.as_deref(), json).await?
        }
        Command::CheckConfig { file } => commands::check::run(&file, json)?,
    };

    Ok(outcome.exit_code())
}
