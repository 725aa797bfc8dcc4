mod banner;
mod doctor;

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use jdcode_core::{StatusResolver, WelcomeConfig};

#[derive(Parser)]
#[command(name = "jdcode-welcome", version, about = "Welcome banner for JDCode sessions")]
struct Cli {
    /// Path to config file (defaults to /usr/local/share/jdcode/welcome.toml if present)
    #[arg(short, long, env = "JDCODE_WELCOME_CONFIG")]
    config: Option<PathBuf>,

    /// Override the local version file
    #[arg(long)]
    version_file: Option<PathBuf>,

    /// Override the version-check script
    #[arg(long)]
    check_script: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Subcommand)]
enum Commands {
    /// Show the welcome banner (default)
    Show,
    /// Print the resolved status values
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check each status source and report problems
    Doctor,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let color = !cli.no_color && std::env::var_os("NO_COLOR").is_none();

    // Logs go to stderr so the banner on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("jdcode=warn,error")),
        )
        .with_target(false)
        .with_ansi(color && std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();

    match cli.command.clone().unwrap_or(Commands::Show) {
        Commands::Show => {
            let (config, resolver) = load(&cli)?;
            let status = resolver.resolve().await;
            banner::print_banner(&status, &config.banner, color && std::io::stdout().is_terminal())?;
        }
        Commands::Status { json } => {
            let (_, resolver) = load(&cli)?;
            let status = resolver.resolve().await;
            if json {
                println!("{}", status.to_json_pretty()?);
            } else {
                println!("Local version:   {}", status.local_version);
                println!("Version check:   {}", status.version_check_text);
                println!("Notifications:   {}", status.notification_badge().label);
                if !status.notification_missing_vars.is_empty() {
                    println!(
                        "  missing:       {}",
                        status.notification_missing_vars.join(", ")
                    );
                }
                println!("Listening port:  {}", status.listening_port);
            }
        }
        Commands::Doctor => {
            let (_, resolver) = load(&cli)?;
            doctor::run_doctor(&resolver).await;
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "jdcode-welcome", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// Load config and apply command-line path overrides.
fn load(cli: &Cli) -> anyhow::Result<(WelcomeConfig, StatusResolver)> {
    let mut config = WelcomeConfig::load_or_default(cli.config.as_deref())?;
    if let Some(path) = &cli.version_file {
        config.paths.local_version_file = path.clone();
    }
    if let Some(path) = &cli.check_script {
        config.paths.version_check_script = path.clone();
    }
    debug!(?config, "Loaded config");

    let resolver = StatusResolver::new(&config);
    Ok((config, resolver))
}
