//! Error types for the game-server client, the AI client and the session.

use reqwest::StatusCode;
use thiserror::Error;

use chess_core::ReplayError;

#[derive(Debug, Error)]
pub enum LichessError {
    #[error("User not found or their games are private")]
    NotFoundOrPrivate,

    #[error("Failed to fetch game PGN: HTTP {0}")]
    FetchFailed(StatusCode),

    #[error("Malformed game summary: {0}")]
    MalformedGame(#[from] serde_json::Error),

    #[error("Invalid Lichess base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Request error: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum CoachError {
    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,

    #[error("AI API error: HTTP {status}: {body}")]
    Api { status: StatusCode, body: String },

    #[error("Unreadable AI response: {0}")]
    InvalidResponse(String),

    #[error("Invalid analysis format: {0}")]
    InvalidAnalysisFormat(String),

    #[error("Request error: {0}")]
    Http(#[from] reqwest::Error),
}

/// What went wrong in the session, kept as a kind so the front-end can pick
/// the wording and tests can match on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("User not found or their games are private")]
    NotFoundOrPrivate,

    #[error("Failed to fetch game: {0}")]
    FetchFailed(String),

    #[error("Game server error: {0}")]
    GameServer(String),

    #[error("{0}")]
    InvalidPgn(String),

    #[error("The AI returned an analysis in an unexpected format: {0}")]
    InvalidAnalysisFormat(String),

    #[error("Analysis request failed: {0}")]
    AnalysisFailed(String),

    #[error("Load a game or play some moves before requesting an analysis")]
    Validation,

    #[error("Chat request failed: {0}")]
    ChatFailure(String),
}

impl SessionError {
    /// Text shown to the user. Game-server failures are passed through;
    /// AI failures get a generic message.
    pub fn user_message(&self) -> String {
        match self {
            SessionError::InvalidPgn(_) => "Invalid PGN. Please check the move text.".to_string(),
            SessionError::InvalidAnalysisFormat(_) | SessionError::AnalysisFailed(_) => {
                "Failed to analyze the game. Please try again.".to_string()
            }
            SessionError::ChatFailure(_) => {
                "The coach could not reply. Please try again.".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn from_analysis(err: &CoachError) -> Self {
        match err {
            CoachError::InvalidAnalysisFormat(msg) => {
                SessionError::InvalidAnalysisFormat(msg.clone())
            }
            other => SessionError::AnalysisFailed(other.to_string()),
        }
    }
}

impl From<&LichessError> for SessionError {
    fn from(err: &LichessError) -> Self {
        match err {
            LichessError::NotFoundOrPrivate => SessionError::NotFoundOrPrivate,
            LichessError::FetchFailed(status) => SessionError::FetchFailed(format!("HTTP {status}")),
            other => SessionError::GameServer(other.to_string()),
        }
    }
}

impl From<ReplayError> for SessionError {
    fn from(err: ReplayError) -> Self {
        match err {
            ReplayError::InvalidPgn(msg) => SessionError::InvalidPgn(msg),
        }
    }
}
