//! `scimbridge` -- run one provisioning call from the command line.
//!
//! Loads a SCIM user from a JSON file and pushes it through the same
//! connector the SCIM host uses, so provisioning scripts can be exercised
//! without the host.
//!
//! # Environment variables
//!
//! | Variable                  | Default                    | Description                      |
//! |---------------------------|----------------------------|----------------------------------|
//! | `SCRIPT_INTERPRETER`      | `powershell`               | Program hosting the script       |
//! | `SCRIPT_INTERPRETER_ARGS` | `-nologo -noprofile -file` | Arguments before the script path |
//! | `SCRIPT_TIMEOUT_SECS`     | unset                      | Kill scripts running longer      |
//! | `MAX_CONCURRENT_SCRIPTS`  | `16`                       | Scripts allowed at once          |
//! | `LOG_FORMAT`              | text                       | `json` for JSON log lines        |
//! | `RUST_LOG`                | see `logging.rs`           | Log filter                       |

mod logging;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use scimbridge_connector::{ConnectorConfig, ScimService, ScimUser, ScriptConnector, ServiceError};

#[derive(Debug, Parser)]
#[command(name = "scimbridge", version, about = "Drive SCIM provisioning scripts")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Provision a new user.
    Create {
        /// JSON file holding the SCIM user.
        #[arg(long)]
        user: PathBuf,
    },
    /// Update an existing user, or deactivate it when `active` is false.
    Update {
        /// Id the host knows the user by.
        #[arg(long)]
        id: String,
        /// JSON file holding the SCIM user.
        #[arg(long)]
        user: PathBuf,
    },
    /// Print the capabilities the connector advertises.
    Capabilities,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();

    let config = ConnectorConfig::from_env().context("invalid connector configuration")?;
    tracing::info!(
        interpreter = %config.interpreter,
        args = ?config.interpreter_args,
        timeout = ?config.script_timeout,
        max_concurrent_scripts = config.max_concurrent_scripts,
        "Loaded connector configuration",
    );
    let connector = ScriptConnector::from_config(&config);

    let outcome = match cli.command {
        Command::Create { user } => connector
            .create_user(load_user(&user)?)
            .await
            .map(serde_json::to_value),
        Command::Update { id, user } => connector
            .update_user(&id, load_user(&user)?)
            .await
            .map(serde_json::to_value),
        Command::Capabilities => Ok(serde_json::to_value(connector.implemented_capabilities())),
    };

    match outcome {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value?)?);
            Ok(())
        }
        Err(err) => report(err),
    }
}

fn load_user(path: &Path) -> anyhow::Result<ScimUser> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))
}

fn report(err: ServiceError) -> ! {
    tracing::error!(code = %err.code(), error = %err, "Provisioning call failed");
    eprintln!("[{}] {}", err.code(), err.message());
    std::process::exit(1);
}
