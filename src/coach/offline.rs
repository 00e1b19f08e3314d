//! Canned replies for when no coach backend is available.
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;

use super::models::{UserProfile, Workout, workouts_this_week};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Topic {
    Motivation,
    Progress,
    QuickWorkout,
    Comeback,
    Greeting,
}

fn topic(input: &str) -> Topic {
    let input = input.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| input.contains(w));

    if has(&["motivate", "motivation"]) {
        Topic::Motivation
    } else if has(&["how am i", "progress", "doing"]) {
        Topic::Progress
    } else if has(&["quick workout", "short workout"]) {
        Topic::QuickWorkout
    } else if has(&["haven't", "been lazy", "skip"]) {
        Topic::Comeback
    } else {
        Topic::Greeting
    }
}

fn pick<R: Rng + ?Sized>(rng: &mut R, options: Vec<String>) -> String {
    options.choose(rng).cloned().unwrap_or_default()
}

/// Pick a reply to `input` based on simple keywords, personalized with
/// the profile and the workouts logged in the last week.
pub fn motivational_reply<R: Rng + ?Sized>(
    input: &str,
    profile: &UserProfile,
    workouts: &[Workout],
    now: DateTime<Utc>,
    rng: &mut R,
) -> String {
    let name = &profile.name;
    let this_week = workouts_this_week(workouts, now);

    match topic(input) {
        Topic::Motivation => pick(
            rng,
            vec![
                format!(
                    "{name}, you've got this! Every rep counts. {} days into your streak is real dedication! 🔥",
                    profile.streak
                ),
                format!(
                    "Hey {name}! The only bad workout is the one that didn't happen. {} workouts done already, what's one more? 💪",
                    profile.total_workouts
                ),
                format!(
                    "{name}, your future self is cheering you on. {this_week} workouts this week, you're building something great!"
                ),
            ],
        ),
        Topic::Progress if profile.total_workouts == 0 => format!(
            "Hey {name}! Looks like you're just getting started, and that's the best part. Ready to log your first workout? 🌟"
        ),
        Topic::Progress => {
            let target = if this_week >= 3 {
                "You're crushing it!"
            } else {
                "Let's aim for 3+ this week!"
            };
            format!(
                "{name}, you're doing amazing! 🎉\n\nYour stats:\n• {} day streak\n• {} total workouts\n• {} active minutes\n\nYou've worked out {this_week} times this week. {target}",
                profile.streak, profile.total_workouts, profile.total_minutes
            )
        }
        Topic::QuickWorkout => pick(
            rng,
            vec![
                "Here's a 15 minute burner:\n\n• 30 sec jumping jacks\n• 30 sec squats\n• 30 sec push-ups\n• 30 sec rest\n\nRepeat 4 times! 💪".to_string(),
                "Got 10 minutes? Try this:\n\n• 1 min high knees\n• 1 min burpees\n• 1 min mountain climbers\n• 30 sec rest\n\nRepeat twice! 🚀".to_string(),
                format!(
                    "Quick strength circuit:\n\n• 15 squats\n• 10 push-ups\n• 20 lunges\n• 30 sec plank\n\nNo rest between moves. You've got this, {name}! 🔥"
                ),
            ],
        ),
        Topic::Comeback => format!(
            "Hey {name}, no guilt here, life happens! 🤗 Thinking about it already shows you care.\n\nLet's start small: even a 10 minute walk counts. What feels doable today?"
        ),
        Topic::Greeting => pick(
            rng,
            vec![
                format!(
                    "Great to hear from you, {name}! Want a workout idea, some motivation, or a progress check? 💪"
                ),
                format!(
                    "Hey {name}! Ready to make today count? Tell me what's on your mind. 🌟"
                ),
                format!(
                    "{name}! Every conversation is a step toward your goals. What would help most right now? 🎯"
                ),
            ],
        ),
    }
}
