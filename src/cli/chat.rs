use anyhow::{Context, Result, bail};
use chrono::Utc;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use serde_json::Value;

use super::{cancel_on_ctrl_c, finish_turn, print_updates};
use crate::coach::{CoachSession, Intensity, Workout, WorkoutType};

const LOG_USAGE: &str = "Usage: /log <type> <minutes> [low|medium|high]";

/// Parse the arguments of `/log`, e.g. `running 30 high`. Intensity
/// defaults to medium.
fn parse_log_command(args: &str) -> Result<Workout> {
    let mut parts = args.split_whitespace();
    let (Some(kind), Some(minutes)) = (parts.next(), parts.next()) else {
        bail!(LOG_USAGE);
    };
    let kind: WorkoutType = serde_json::from_value(Value::from(kind.to_lowercase()))
        .with_context(|| format!("Unknown workout type '{}'", kind))?;
    let duration: u32 = minutes
        .parse()
        .with_context(|| format!("Invalid minutes '{}'", minutes))?;
    let intensity: Intensity = match parts.next() {
        Some(level) => serde_json::from_value(Value::from(level.to_lowercase()))
            .with_context(|| format!("Unknown intensity '{}'", level))?,
        None => Intensity::Medium,
    };

    Ok(Workout {
        id: uuid::Uuid::new_v4().to_string(),
        kind,
        duration,
        intensity,
        calories: None,
        notes: None,
        date: Utc::now(),
    })
}

pub async fn run(mut session: CoachSession) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    println!(
        "FitBuddy here! Ask for a quick workout, some motivation, or a progress check, {}.",
        session.profile().name
    );
    println!("{}", LOG_USAGE);

    loop {
        let readline = rl.readline(">>> ");
        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                if let Some(args) = line.strip_prefix("/log") {
                    match parse_log_command(args) {
                        Ok(workout) => {
                            session.log_workout(workout);
                            let profile = session.profile();
                            println!(
                                "Logged! {} workouts, {} points, {} {}",
                                profile.total_workouts,
                                profile.points(),
                                profile.rank().icon,
                                profile.rank().name
                            );
                        }
                        Err(e) => println!("{:#}", e),
                    }
                    continue;
                }

                let (cancel, ctrl_c) = cancel_on_ctrl_c();
                let outcome = session.send(line, cancel, print_updates()).await;
                ctrl_c.abort();
                finish_turn(&outcome);
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}
