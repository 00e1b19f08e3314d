//! Test utilities for integration tests
use std::time::Duration;

use fitbuddy::coach::{
    Backend, CoachClient, CoachSession, Intensity, UserProfile, Workout, WorkoutType,
};
use fitbuddy::core::AppConfig;

/// Config pointing at a mock server
pub fn test_config(url: &str) -> AppConfig {
    AppConfig {
        functions_url: url.to_string(),
        api_key: String::from("test-api-key"),
        request_timeout: Duration::from_secs(10),
        idle_timeout: Some(Duration::from_secs(5)),
        history_window: 2,
    }
}

pub fn test_workouts() -> Vec<Workout> {
    (1..=4)
        .map(|i| Workout {
            id: format!("w{}", i),
            kind: WorkoutType::Running,
            duration: 10 * i,
            intensity: Intensity::Medium,
            calories: Some(100 * i),
            notes: None,
            date: chrono::Utc::now() - chrono::Duration::days(i as i64),
        })
        .collect()
}

/// A session with a remote backend and a few logged workouts
pub fn test_session(url: &str) -> CoachSession {
    let config = test_config(url);
    let workouts = test_workouts();
    let profile = UserProfile::from_workouts("Sam", &workouts);
    CoachSession::new(
        Backend::Remote(CoachClient::new(&config)),
        profile,
        workouts,
        config.history_window,
    )
}

/// Formats a chat completion chunk carrying `content` as an SSE frame
pub fn delta_frame(content: &str) -> String {
    format!(
        "data: {}\n\n",
        serde_json::json!({
            "id": "chatcmpl-test",
            "object": "chat.completion.chunk",
            "choices": [{"index": 0, "delta": {"content": content}, "finish_reason": null}]
        })
    )
}
