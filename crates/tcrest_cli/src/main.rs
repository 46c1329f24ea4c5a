//! tcrest CLI - command-line queries against a TeamCity server.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use console::Term;
use tracing_subscriber::EnvFilter;

use crate::commands::build_types::BuildTypesArgs;
use crate::commands::builds::BuildsArgs;
use crate::commands::output::OutputFormat;
use crate::commands::projects::ProjectsArgs;
use crate::commands::queue::QueueArgs;
use crate::commands::test_occurrences::TestsArgs;

#[derive(Parser)]
#[command(name = "tcrest")]
#[command(version)]
#[command(about = "Query a TeamCity server over its REST API")]
#[command(
    long_about = "tcrest lists and fetches TeamCity projects, build configurations, builds, \
queued builds and test occurrences. List queries follow every result page and print the \
merged result; --id or --get fetches a single record."
)]
#[command(after_long_help = r#"EXAMPLES
    List the build configurations of a project:
        $ tcrest build-types --project Foo

    Show the last five builds of a configuration on master:
        $ tcrest builds --build-type Foo_Package --branch master --count 5

    Fetch one build by id:
        $ tcrest builds --id 1234

    Fetch one build by its filters, failing if they match more than one:
        $ tcrest builds --build-type Foo_Package --number 42 --get --strict

    Print the request URL instead of fetching:
        $ tcrest tests --build 1234 --status FAILURE --url-only

    Generate shell completions:
        $ tcrest completions bash > ~/.local/share/bash-completion/completions/tcrest

CONFIGURATION
    tcrest reads configuration from:
      1. ~/.config/tcrest/config.toml (or $XDG_CONFIG_HOME/tcrest/config.toml)
      2. ./tcrest.toml
      3. Environment variables (TCREST_* prefix, e.g., TCREST_SERVER_URL)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    TCREST_SERVER_URL       TeamCity server URL
    TCREST_SERVER_PREFIX    Path prefix before /app/rest, e.g. /guestAuth
    TCREST_SERVER_TIMEOUT   Request timeout in seconds (default: 30)
    TCREST_OUTPUT_FORMAT    Default output format: table or json
"#)]
struct Cli {
    /// TeamCity server URL (overrides config)
    #[arg(short = 's', long, global = true)]
    server: Option<String>,

    /// Path prefix before /app/rest, e.g. /guestAuth (overrides config)
    #[arg(short = 'P', long, global = true)]
    path_prefix: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List or fetch projects
    Projects(ProjectsArgs),
    /// List or fetch build configurations
    BuildTypes(BuildTypesArgs),
    /// List or fetch builds
    Builds(BuildsArgs),
    /// List or fetch queued builds
    Queue(QueueArgs),
    /// List or fetch test occurrences
    Tests(TestsArgs),
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Structured logging only when not attached to a TTY
    if !Term::stdout().is_term() {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new("tcrest=info,tcrest_cli=info"),
        };

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    let mut config = config::Config::load();

    let cli = Cli::parse();

    if let Commands::Completions { shell } = &cli.command {
        commands::meta::handle_completions(*shell)?;
        return Ok(());
    }

    if let Some(server) = cli.server {
        config.server.url = Some(server);
    }
    if let Some(prefix) = cli.path_prefix {
        config.server.prefix = Some(prefix);
    }

    let session = config.session()?;
    let default_format: OutputFormat = config.output.format;

    match cli.command {
        Commands::Projects(args) => {
            commands::projects::handle_projects(args, &session, default_format).await?;
        }
        Commands::BuildTypes(args) => {
            commands::build_types::handle_build_types(args, &session, default_format).await?;
        }
        Commands::Builds(args) => {
            commands::builds::handle_builds(args, &session, default_format).await?;
        }
        Commands::Queue(args) => {
            commands::queue::handle_queue(args, &session, default_format).await?;
        }
        Commands::Tests(args) => {
            commands::test_occurrences::handle_tests(args, &session, default_format).await?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
