//! cypherlats: answer questions over a Neo4j knowledge graph with Cypher tree search
//!
//! Usage:
//!   cypherlats ask "Which services depend on auth?"    -> print the best answer
//!   cypherlats ask --details ...                        -> answer with run summary and trajectory
//!   cypherlats ask --json ...                           -> full outcome as JSON
//!   cypherlats config                                   -> print the effective config as TOML
//!   cypherlats version                                  -> show version

use clap::{Parser, Subcommand, ValueEnum};
use cypherlats::{format_outcome, logging, resolve, OutputFormat, Overrides};
use cypherlats_core::ProviderKind;
use cypherlats_search::{build_search, SearchStatus};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "cypherlats",
    about = "Natural-language questions to Cypher via Language-Agent Tree Search",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file (TOML). Default: ./cypherlats.toml if present
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Write JSON logs to a file (in addition to stderr)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a question
    Ask {
        /// The question, in natural language
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,

        #[command(flatten)]
        search: SearchArgs,

        /// Print the run summary and best trajectory before the answer
        #[arg(long, conflicts_with = "json")]
        details: bool,

        /// Print the full outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the effective config (file plus overrides) as TOML
    Config {
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Show version
    Version,
}

#[derive(clap::Args)]
struct SearchArgs {
    /// Maximum expansion rounds
    #[arg(long)]
    search_depth: Option<usize>,

    /// Candidates generated per round
    #[arg(long)]
    expand_num: Option<usize>,

    /// Stop expanding once the tree is taller than this
    #[arg(long)]
    max_height: Option<usize>,

    /// UCT exploration weight
    #[arg(long)]
    exploration_weight: Option<f64>,

    /// Per-call oracle timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// LLM backend
    #[arg(long, value_enum)]
    provider: Option<ProviderArg>,

    /// Override the provider base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Model for candidate generation
    #[arg(long)]
    generator_model: Option<String>,

    /// Model for reflection
    #[arg(long)]
    reflector_model: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ProviderArg {
    Anthropic,
    Openai,
}

impl From<ProviderArg> for ProviderKind {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Anthropic => ProviderKind::Anthropic,
            ProviderArg::Openai => ProviderKind::Openai,
        }
    }
}

impl From<SearchArgs> for Overrides {
    fn from(args: SearchArgs) -> Self {
        Self {
            search_depth: args.search_depth,
            expand_num: args.expand_num,
            max_height: args.max_height,
            exploration_weight: args.exploration_weight,
            timeout_secs: args.timeout,
            provider: args.provider.map(Into::into),
            base_url: args.base_url,
            generator_model: args.generator_model,
            reflector_model: args.reflector_model,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ask {
            question,
            search,
            details,
            json,
        } => {
            let guard = logging::init_tracing(cli.log_file.as_deref(), cli.verbose)?;
            let question = question.join(" ");
            let question = question.trim();
            if question.is_empty() {
                anyhow::bail!("question must not be empty");
            }

            let config = resolve(cli.config.as_deref(), &search.into())?;
            tracing::debug!(
                provider = ?config.model.provider,
                generator = %config.model.generator_model,
                reflector = %config.model.reflector_model,
                "config resolved"
            );
            let lats = build_search(&config)?;
            let outcome = lats
                .run(question, config.search.search_depth, config.search.expand_num)
                .await;

            let format = if json {
                OutputFormat::Json
            } else if details {
                OutputFormat::Detailed
            } else {
                OutputFormat::Plain
            };
            println!("{}", format_outcome(&outcome, format)?);

            if outcome.status == SearchStatus::Failed {
                drop(guard);
                std::process::exit(2);
            }
        }

        Commands::Config { search } => {
            let _guard = logging::init_tracing(cli.log_file.as_deref(), cli.verbose)?;
            let config = resolve(cli.config.as_deref(), &search.into())?;
            print!("{}", config.to_toml());
        }

        Commands::Version => {
            println!("cypherlats v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
