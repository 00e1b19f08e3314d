use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Base URL of the serverless functions, e.g.
    /// `https://<project>.supabase.co/functions/v1`
    pub functions_url: String,
    /// Bearer token sent with every request
    pub api_key: String,
    pub request_timeout: Duration,
    /// Longest wait for the next chunk of a streamed reply. `None`
    /// waits forever.
    pub idle_timeout: Option<Duration>,
    /// How many recent workouts are sent along with a chat message
    pub history_window: usize,
}

fn env_secs(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn coach_url(&self) -> String {
        format!("{}/fitness-coach", self.functions_url.trim_end_matches('/'))
    }

    pub fn diet_plan_url(&self) -> String {
        format!("{}/diet-plan", self.functions_url.trim_end_matches('/'))
    }

    pub fn food_scanner_url(&self) -> String {
        format!("{}/food-scanner", self.functions_url.trim_end_matches('/'))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let functions_url = env::var("FITBUDDY_FUNCTIONS_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:54321/functions/v1".to_string());
        let api_key =
            env::var("FITBUDDY_API_KEY").unwrap_or_else(|_| "thiswontworkwithoutakey".to_string());
        let request_timeout =
            Duration::from_secs(env_secs("FITBUDDY_REQUEST_TIMEOUT_SECS", 60 * 5));
        // Zero disables the idle timeout
        let idle_timeout = match env_secs("FITBUDDY_IDLE_TIMEOUT_SECS", 30) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        let history_window = env::var("FITBUDDY_HISTORY_WINDOW")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);

        Self {
            functions_url,
            api_key,
            request_timeout,
            idle_timeout,
            history_window,
        }
    }
}
