//! Clients for the two external services: the Lichess game server and the
//! Gemini coach. The session controller only sees the traits below.

pub mod gemini;
pub mod lichess;

use async_trait::async_trait;

use crate::coaching::{ChatContext, FullAnalysis};
use crate::error::{CoachError, LichessError};
use lichess::GameSummary;

#[async_trait]
pub trait GameSource: Send + Sync {
    async fn list_recent_games(&self, username: &str) -> Result<Vec<GameSummary>, LichessError>;

    async fn fetch_game_pgn(&self, game_id: &str) -> Result<String, LichessError>;
}

#[async_trait]
pub trait CoachService: Send + Sync {
    async fn analyze_game(&self, pgn: &str) -> Result<FullAnalysis, CoachError>;

    async fn chat_reply(&self, ctx: &ChatContext) -> Result<String, CoachError>;
}
