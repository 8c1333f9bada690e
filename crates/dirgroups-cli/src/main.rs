//! dirgroups - LDAP group membership lookup
//!
//! Resolves a user in an LDAP directory and lists the groups it belongs to.

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use commands::CommandContext;
use dirgroups_core::{DirgroupsConfig, DEFAULT_SERVICE_ID};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "dirgroups")]
#[command(version = dirgroups_core::VERSION)]
#[command(about = "Look up LDAP group membership", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, env = "DIRGROUPS_CONFIG")]
    config: Option<String>,

    /// LDAP server URL
    #[arg(long, global = true)]
    url: Option<String>,

    /// Service account bind DN
    #[arg(long, global = true)]
    bind_dn: Option<String>,

    /// Service account password
    #[arg(long, global = true)]
    bind_password: Option<String>,

    /// Service identifier attached to log output
    #[arg(long, global = true, default_value = DEFAULT_SERVICE_ID)]
    service: String,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    output: OutputFormat,

    /// Shorthand for `--output json`
    #[arg(long, global = true)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "DIRGROUPS_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.output
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List the groups a user belongs to
    Groups {
        /// Username to look up
        username: String,
    },

    /// Show the DN a username resolves to
    Whoami {
        /// Username to look up
        username: String,
    },

    /// Print the group filter used for a DN, without connecting
    Filter {
        /// Distinguished name of the user
        dn: String,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let output_format = cli.output_format();

    // Load or create config
    let mut config = if let Some(config_path) = &cli.config {
        let mut config = DirgroupsConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path))?;
        config.apply_env();
        config
    } else {
        DirgroupsConfig::from_env()
    };

    // Override with CLI args
    if let Some(url) = cli.url {
        config.ldap.server_url = url;
    }
    if let Some(bind_dn) = cli.bind_dn {
        config.ldap.bind_dn = bind_dn;
    }
    if let Some(bind_password) = cli.bind_password {
        config.ldap.bind_password = bind_password;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    init_logging(&config.logging.level, &config.logging.format);

    let ctx = CommandContext {
        config,
        output_format,
        service_id: cli.service,
    };

    match cli.command {
        Commands::Groups { username } => commands::groups::execute(&ctx, &username).await,
        Commands::Whoami { username } => commands::whoami::execute(&ctx, &username).await,
        Commands::Filter { dn } => commands::filter::execute(&ctx, &dn),
        Commands::Version => {
            println!("dirgroups {}", dirgroups_core::VERSION);
            Ok(())
        }
    }
}

fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Logs go to stderr so command output stays parseable
    let registry = tracing_subscriber::registry().with(filter);
    if format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
