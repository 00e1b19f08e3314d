use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod ask;
pub mod chat;
pub mod diet;
pub mod profile;
pub mod scan;

use crate::coach::{Backend, CoachClient, CoachSession, Message, TurnOutcome, UserProfile, Workout};
use crate::core::AppConfig;
use crate::diet::DietPlanRequest;

#[derive(Subcommand)]
enum Command {
    /// Start a chat session with the coach
    Chat {},
    /// Send a single message to the coach and print the reply
    Ask {
        #[arg(long)]
        message: String,
    },
    /// Generate a diet plan
    Diet {
        #[arg(long)]
        age: u32,
        /// Weight in kg
        #[arg(long)]
        weight: u32,
        /// Height in cm
        #[arg(long)]
        height: u32,
        /// e.g. "weight loss" or "muscle gain"
        #[arg(long)]
        goal: String,
        #[arg(long)]
        diet_type: Option<String>,
        #[arg(long)]
        budget: Option<String>,
        #[arg(long, default_value = "3")]
        meals: u32,
    },
    /// Estimate the nutrition of a meal from a photo
    Scan {
        #[arg(long)]
        image: PathBuf,
    },
    /// Show stats, points and rank
    Profile {},
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Use canned replies instead of the coach endpoint
    #[arg(long, global = true, action, default_value = "false")]
    offline: bool,

    /// Base URL of the serverless functions
    #[arg(long, global = true)]
    functions_url: Option<String>,

    /// Name the coach calls you by
    #[arg(long, global = true, default_value = "Athlete")]
    name: String,

    /// JSON file with an array of logged workouts
    #[arg(long, global = true)]
    workouts: Option<PathBuf>,
}

fn init_tracing() {
    // Logs go to stderr so streamed replies on stdout stay readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_workouts(path: &Path) -> Result<Vec<Workout>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read workouts from {}", path.display()))?;
    let workouts = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid workouts file {}", path.display()))?;
    Ok(workouts)
}

/// Cancels the returned token on Ctrl-C. Abort the handle once the
/// turn is over.
pub(crate) fn cancel_on_ctrl_c() -> (CancellationToken, JoinHandle<()>) {
    let cancel = CancellationToken::new();
    let guard = cancel.clone();
    let handle = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            guard.cancel();
        }
    });
    (cancel, handle)
}

/// Prints only the text each update adds to the message being streamed.
pub(crate) fn print_updates() -> impl FnMut(&Message) {
    let mut current: Option<String> = None;
    let mut printed = 0;
    move |msg: &Message| {
        if current.as_deref() != Some(msg.id()) {
            current = Some(msg.id().to_string());
            printed = 0;
        }
        let content = msg.content();
        print!("{}", &content[printed..]);
        printed = content.len();
        let _ = std::io::stdout().flush();
    }
}

pub(crate) fn finish_turn(outcome: &TurnOutcome) {
    match outcome {
        TurnOutcome::Replied(_) | TurnOutcome::Fallback(_) => println!(),
        TurnOutcome::Notice(err) => println!("{}", err.user_notice()),
        TurnOutcome::Abandoned => println!("(cancelled)"),
    }
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();
    init_tracing();

    let mut config = AppConfig::default();
    if let Some(url) = args.functions_url {
        config.functions_url = url;
    }

    let workouts = match &args.workouts {
        Some(path) => load_workouts(path)?,
        None => Vec::new(),
    };
    let profile = UserProfile::from_workouts(&args.name, &workouts);
    let backend = if args.offline {
        Backend::Offline
    } else {
        Backend::Remote(CoachClient::new(&config))
    };
    let session = CoachSession::new(backend, profile, workouts, config.history_window);

    // Handle each sub command
    match args.command {
        Some(Command::Chat {}) => {
            chat::run(session).await?;
        }
        Some(Command::Ask { message }) => {
            ask::run(session, &message).await?;
        }
        Some(Command::Diet {
            age,
            weight,
            height,
            goal,
            diet_type,
            budget,
            meals,
        }) => {
            let request = DietPlanRequest {
                age,
                weight,
                height,
                goal,
                diet_type,
                budget,
                meals,
            };
            diet::run(&config, request).await?;
        }
        Some(Command::Scan { image }) => {
            scan::run(&config, &image).await?;
        }
        Some(Command::Profile {}) => {
            profile::run(session.profile());
        }
        None => {}
    }

    Ok(())
}
