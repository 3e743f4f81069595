use std::path::{Path, PathBuf};

use brimley_cli::commands::{build, invoke, mcp_serve, repl, schema_convert, validate};
use brimley_core::diagnostic::Severity;
use brimley_core::error::BrimleyError;
use brimley_core::BrimleyConfig;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "brimley", version, about = "Brimley — discover, dispatch, and reload SQL/template/native functions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve arguments and dispatch one function call
    Invoke {
        /// Function name
        name: String,
        /// Project root directory
        #[arg(long, default_value = ".")]
        root: PathBuf,
        /// JSON object of caller-supplied arguments
        #[arg(long, default_value = "{}")]
        input: String,
    },
    /// Interactive REPL over the same dispatch path as `invoke`
    Repl {
        #[arg(long, default_value = ".")]
        root: PathBuf,
        /// Disable serving tool-exports alongside the interactive loop
        #[arg(long)]
        no_mcp: bool,
        /// Disable the background auto-reload watcher for this session
        #[arg(long)]
        no_watch: bool,
    },
    /// Serve the project's tool-exports over stdio
    McpServe {
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
    /// Discovery-only diagnostics check
    Validate {
        #[arg(long, default_value = ".")]
        root: PathBuf,
        #[arg(long, default_value = "error")]
        fail_on: String,
    },
    /// Print the advertised tool-export schemas
    SchemaConvert {
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
    /// One-shot discover + reload CI check
    Build {
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
}

fn init_tracing(root: &Path) {
    let log_level = BrimleyConfig::load(root).map(|cfg| cfg.brimley.log_level).unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn root_of(command: &Commands) -> &Path {
    match command {
        Commands::Invoke { root, .. }
        | Commands::Repl { root, .. }
        | Commands::McpServe { root, .. }
        | Commands::Validate { root, .. }
        | Commands::SchemaConvert { root, .. }
        | Commands::Build { root, .. } => root,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(root_of(&cli.command));

    let result = dispatch(cli.command).await;

    match result {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("{}", colored::Colorize::red(format!("error [{}]: {err}", err.code()).as_str()));
            std::process::exit(1);
        }
    }
}

async fn dispatch(command: Commands) -> Result<bool, BrimleyError> {
    match command {
        Commands::Invoke { name, root, input } => {
            invoke::run(&root, &name, &input).await?;
            Ok(true)
        }
        Commands::Repl { root, no_mcp, no_watch } => {
            repl::run(&root, !no_mcp, !no_watch).await?;
            Ok(true)
        }
        Commands::McpServe { root } => {
            mcp_serve::run(&root).await?;
            Ok(true)
        }
        Commands::Validate { root, fail_on } => {
            let severity = validate::parse_severity(&fail_on).map_err(BrimleyError::Config)?;
            validate::run(&root, severity)
        }
        Commands::SchemaConvert { root } => {
            schema_convert::run(&root)?;
            Ok(true)
        }
        Commands::Build { root } => build::run(&root),
    }
}
