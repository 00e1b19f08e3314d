use chrono::Utc;
use futures_util::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use super::client::CoachClient;
use super::error::{CoachError, FALLBACK_REPLY};
use super::models::{
    CoachRequest, Message, Role, Transcript, UserProfile, Workout, recent_workouts,
};
use super::offline;

/// Where replies come from.
pub enum Backend {
    Remote(CoachClient),
    Offline,
}

/// What the user sees at the end of a turn.
#[derive(Debug)]
pub enum TurnOutcome {
    /// The coach replied. Holds the text received during this turn.
    Replied(String),
    /// A rate limit, quota, or server message to show instead of a
    /// reply. Nothing was added to the transcript.
    Notice(CoachError),
    /// Nothing came back, so the apology message was added to the
    /// transcript. Holds the cause, if there was one.
    Fallback(Option<CoachError>),
    /// Cancelled before any reply text arrived.
    Abandoned,
}

/// Apply every delta to the transcript using the upsert-latest rule,
/// calling `on_update` after each one. Stops at the first error.
/// Returns the text applied and the error, if any.
pub async fn apply_deltas<S, F>(
    transcript: &mut Transcript,
    deltas: S,
    mut on_update: F,
) -> (String, Option<CoachError>)
where
    S: Stream<Item = Result<String, CoachError>>,
    F: FnMut(&Message),
{
    let mut deltas = std::pin::pin!(deltas);
    let mut applied = String::new();

    while let Some(delta) = deltas.next().await {
        match delta {
            Ok(text) => {
                applied.push_str(&text);
                on_update(transcript.upsert_assistant(&text));
            }
            Err(e) => return (applied, Some(e)),
        }
    }

    (applied, None)
}

/// A chat with the coach. Owns the transcript and the context sent
/// along with every message.
pub struct CoachSession {
    backend: Backend,
    transcript: Transcript,
    profile: UserProfile,
    workouts: Vec<Workout>,
    history_window: usize,
}

impl CoachSession {
    pub fn new(
        backend: Backend,
        profile: UserProfile,
        workouts: Vec<Workout>,
        history_window: usize,
    ) -> Self {
        Self {
            backend,
            transcript: Transcript::new(),
            profile,
            workouts,
            history_window,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// Log a workout and refresh the profile stats.
    pub fn log_workout(&mut self, workout: Workout) {
        self.workouts.push(workout);
        self.profile = UserProfile::from_workouts(&self.profile.name, &self.workouts);
    }

    /// The request for `text`, carrying the profile and only the most
    /// recent workouts.
    pub fn build_request(&self, text: &str) -> Result<CoachRequest, CoachError> {
        let recent = recent_workouts(&self.workouts, self.history_window);
        CoachRequest::new(text)
            .with_profile(&self.profile)?
            .with_workouts(&recent)
    }

    /// Send `text` and stream the reply into the transcript.
    /// `on_update` sees the reply message every time it grows, and the
    /// apology message if the turn falls back.
    pub async fn send<F>(
        &mut self,
        text: &str,
        cancel: CancellationToken,
        mut on_update: F,
    ) -> TurnOutcome
    where
        F: FnMut(&Message),
    {
        self.transcript.push(Message::new(Role::User, text));

        let client = match &self.backend {
            Backend::Remote(client) => client,
            Backend::Offline => {
                let reply = {
                    let mut rng = rand::thread_rng();
                    offline::motivational_reply(
                        text,
                        &self.profile,
                        &self.workouts,
                        Utc::now(),
                        &mut rng,
                    )
                };
                on_update(self.transcript.upsert_assistant(&reply));
                return TurnOutcome::Replied(reply);
            }
        };

        let result = match self.build_request(text) {
            Ok(request) => match client.consume(&request, cancel.clone()).await {
                Ok(deltas) => {
                    apply_deltas(&mut self.transcript, deltas, &mut on_update).await
                }
                Err(e) => (String::new(), Some(e)),
            },
            Err(e) => (String::new(), Some(e)),
        };

        match result {
            (applied, _) if !applied.is_empty() => TurnOutcome::Replied(applied),
            (_, Some(e)) if e.is_notice() => {
                tracing::warn!("Coach turn ended with notice: {}", e);
                TurnOutcome::Notice(e)
            }
            (_, None) if cancel.is_cancelled() => TurnOutcome::Abandoned,
            (_, cause) => {
                match &cause {
                    Some(e) => tracing::error!("Coach turn failed: {}", e),
                    None => tracing::warn!("Coach replied with no content"),
                }
                let apology = Message::new(Role::Assistant, FALLBACK_REPLY);
                self.transcript.push(apology);
                if let Some(msg) = self.transcript.last() {
                    on_update(msg);
                }
                TurnOutcome::Fallback(cause)
            }
        }
    }
}
