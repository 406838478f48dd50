use std::sync::Arc;

use tracing::{info, warn};

use crate::clients::{CoachService, GameSource};
use crate::error::SessionError;
use crate::session::reducer::{reduce, Effect, Event, Transition};
use crate::session::state::SessionState;

/// Owns the session state and runs the effects the reducer asks for, one at
/// a time, feeding each outcome back in as an event.
pub struct SessionController {
    state: SessionState,
    games: Arc<dyn GameSource>,
    coach: Arc<dyn CoachService>,
}

impl SessionController {
    pub fn new(games: Arc<dyn GameSource>, coach: Arc<dyn CoachService>) -> Self {
        Self {
            state: SessionState::default(),
            games,
            coach,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub async fn dispatch(&mut self, event: Event) -> &SessionState {
        let mut pending = Some(event);
        while let Some(event) = pending.take() {
            let Transition { state, effect } = reduce(std::mem::take(&mut self.state), event);
            self.state = state;
            if let Some(effect) = effect {
                pending = Some(self.run(effect).await);
            }
        }
        &self.state
    }

    async fn run(&self, effect: Effect) -> Event {
        match effect {
            Effect::ListGames(username) => {
                info!(username = %username, "Listing recent games");
                let result = self.games.list_recent_games(&username).await.map_err(|e| {
                    warn!(username = %username, error = %e, "Game list failed");
                    SessionError::from(&e)
                });
                Event::GamesListed(result)
            }
            Effect::FetchGame(game_id) => {
                info!(game_id = %game_id, "Fetching game PGN");
                let result = self.games.fetch_game_pgn(&game_id).await.map_err(|e| {
                    warn!(game_id = %game_id, error = %e, "Game fetch failed");
                    SessionError::from(&e)
                });
                Event::GameFetched(result)
            }
            Effect::Analyze(pgn) => {
                info!(pgn_len = pgn.len(), "Requesting analysis");
                let result = self.coach.analyze_game(&pgn).await.map_err(|e| {
                    warn!(error = %e, "Analysis failed");
                    SessionError::from_analysis(&e)
                });
                Event::AnalysisFinished(result)
            }
            Effect::Chat(ctx) => {
                info!(history = ctx.history.len(), "Asking the coach");
                let result = self.coach.chat_reply(&ctx).await.map_err(|e| {
                    warn!(error = %e, "Chat reply failed");
                    SessionError::ChatFailure(e.to_string())
                });
                Event::ChatReplied(result)
            }
        }
    }
}
