//! quizforge CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

use commands::PlanArgs;

#[derive(Parser)]
#[command(
    name = "quizforge",
    version,
    about = "Diagnostic quiz builder: plans, generates and scores exam diagnostics"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter quizforge.toml
    Init,

    /// Show how questions would be allocated across topics and tiers
    Plan {
        #[command(flatten)]
        plan: PlanArgs,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Generate a diagnostic session
    Generate {
        #[command(flatten)]
        plan: PlanArgs,

        /// Provider name from the config (default: default_provider)
        #[arg(long)]
        provider: Option<String>,

        /// Model to generate with (default: default_model)
        #[arg(long)]
        model: Option<String>,

        /// Max concurrent slot requests
        #[arg(long)]
        parallelism: Option<usize>,

        /// Skip the provider and use placeholder questions
        #[arg(long)]
        offline: bool,

        /// Session JSON output path
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Check the questions of a session file
    Validate {
        /// Session JSON file
        #[arg(long)]
        session: PathBuf,
    },

    /// Score answers against a session
    Analyze {
        /// Session JSON file
        #[arg(long)]
        session: PathBuf,

        /// Answers JSON file (array of answer records, or an answer sheet)
        #[arg(long)]
        answers: PathBuf,

        /// Self-reported strong topics (comma-separated)
        #[arg(long)]
        strong: Option<String>,

        /// Self-reported weak topics (comma-separated)
        #[arg(long)]
        weak: Option<String>,

        /// Self-assessment of learning ability, passed to the feedback
        #[arg(long)]
        self_rating: Option<String>,

        /// Ask the provider for narrative feedback
        #[arg(long)]
        feedback: bool,

        /// Learning style mentioned in the feedback
        #[arg(long, default_value = "visual")]
        learning_style: String,

        /// Use templated feedback instead of calling the provider
        #[arg(long)]
        offline: bool,

        /// Provider name from the config (default: default_provider)
        #[arg(long)]
        provider: Option<String>,

        /// Scorecard JSON output path
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List available models
    ListModels {
        /// Filter to specific provider
        #[arg(long)]
        provider: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "quizforge=info".parse::<tracing_subscriber::filter::Directive>() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Plan { plan, config } => commands::plan::execute(plan, config),
        Commands::Generate {
            plan,
            provider,
            model,
            parallelism,
            offline,
            output,
            config,
        } => {
            commands::generate::execute(commands::generate::GenerateOptions {
                plan,
                provider,
                model,
                parallelism,
                offline,
                output,
                config,
            })
            .await
        }
        Commands::Validate { session } => commands::validate::execute(session),
        Commands::Analyze {
            session,
            answers,
            strong,
            weak,
            self_rating,
            feedback,
            learning_style,
            offline,
            provider,
            output,
            config,
        } => {
            commands::analyze::execute(commands::analyze::AnalyzeOptions {
                session,
                answers,
                strong,
                weak,
                self_rating,
                feedback,
                learning_style,
                offline,
                provider,
                output,
                config,
            })
            .await
        }
        Commands::ListModels { provider, config } => {
            commands::list_models::execute(provider, config)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
