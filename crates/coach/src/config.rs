use std::env;
use std::time::Duration;

pub const DEFAULT_LICHESS_BASE_URL: &str = "https://lichess.org";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

#[derive(Clone, Debug)]
pub struct Config {
    pub lichess_base_url: String,
    pub gemini_base_url: String,
    /// Empty when unset; AI calls then fail with a missing-key error.
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub http_timeout: Duration,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lichess_base_url: DEFAULT_LICHESS_BASE_URL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            gemini_api_key: String::new(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            http_timeout: Duration::from_secs(60),
            user_agent: "ChessCoach/1.0".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            lichess_base_url: env::var("LICHESS_BASE_URL")
                .unwrap_or(defaults.lichess_base_url),
            gemini_base_url: env::var("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            gemini_api_key: env::var("GEMINI_API_KEY").unwrap_or_default(),
            gemini_model: env::var("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            http_timeout: env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.http_timeout),
            user_agent: env::var("USER_AGENT").unwrap_or(defaults.user_agent),
        }
    }
}
