//! Messages, the caller-owned transcript, and the request sent to the
//! coach endpoint.
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::error::CoachError;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant")]
    Assistant,
}

/// A chat message. Assistant messages are built up delta by delta so
/// `content` only ever grows; `id` and `timestamp` are fixed at
/// creation.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Message {
    id: String,
    role: Role,
    content: String,
    timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: &str) -> Self {
        Message {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn append(&mut self, delta: &str) {
        self.content.push_str(delta);
    }
}

/// The message list. Streaming only ever touches the last entry.
#[derive(Clone, Debug, Default)]
pub struct Transcript(Vec<Message>);

impl Transcript {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn new_with_messages(messages: Vec<Message>) -> Self {
        Self(messages)
    }

    pub fn messages(&self) -> &[Message] {
        &self.0
    }

    pub fn last(&self) -> Option<&Message> {
        self.0.last()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, msg: Message) {
        self.0.push(msg)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.0.iter()
    }

    /// Apply a text delta: extend the last message when it is from the
    /// assistant, otherwise start a new assistant message. Returns the
    /// message that received the text.
    pub fn upsert_assistant(&mut self, delta: &str) -> &Message {
        match self.0.last_mut() {
            Some(last) if last.role == Role::Assistant => last.append(delta),
            _ => self.0.push(Message::new(Role::Assistant, delta)),
        }
        &self.0[self.0.len() - 1]
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutType {
    Running,
    Cycling,
    Swimming,
    Strength,
    Yoga,
    Hiit,
    Walking,
    Other,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Low,
    Medium,
    High,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Workout {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: WorkoutType,
    /// Minutes
    pub duration: u32,
    pub intensity: Intensity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub date: DateTime<Utc>,
}

/// Sort newest first and keep at most `window` workouts.
pub fn recent_workouts(workouts: &[Workout], window: usize) -> Vec<Workout> {
    let mut recent = workouts.to_vec();
    recent.sort_by(|a, b| b.date.cmp(&a.date));
    recent.truncate(window);
    recent
}

/// Number of workouts logged in the seven days before `now`.
pub fn workouts_this_week(workouts: &[Workout], now: DateTime<Utc>) -> usize {
    let week_ago = now - Duration::days(7);
    workouts.iter().filter(|w| w.date >= week_ago).count()
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub streak: u32,
    pub total_workouts: u32,
    pub total_minutes: u32,
}

impl UserProfile {
    /// Derive the profile stats from the logged workouts. The streak is
    /// capped at a week.
    pub fn from_workouts(name: &str, workouts: &[Workout]) -> Self {
        let total_workouts = workouts.len() as u32;
        Self {
            name: name.to_string(),
            streak: total_workouts.min(7),
            total_workouts,
            total_minutes: workouts.iter().map(|w| w.duration).sum(),
        }
    }
}

/// Body of a coach request. Profile and history are passed through to
/// the endpoint untouched.
#[derive(Clone, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CoachRequest {
    pub message: String,
    pub user_profile: Value,
    pub workout_history: Vec<Value>,
}

impl CoachRequest {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            user_profile: Value::Null,
            workout_history: Vec::new(),
        }
    }

    pub fn with_profile<P: Serialize>(mut self, profile: &P) -> Result<Self, CoachError> {
        self.user_profile = serde_json::to_value(profile)
            .map_err(|e| CoachError::InvalidRequest(e.to_string()))?;
        Ok(self)
    }

    pub fn with_workouts<W: Serialize>(mut self, workouts: &[W]) -> Result<Self, CoachError> {
        self.workout_history = workouts
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CoachError::InvalidRequest(e.to_string()))?;
        Ok(self)
    }
}
