//! Session transitions as a pure function of (state, event).
//!
//! Network work is never done here: a transition may ask for one effect,
//! which the controller runs and answers with a follow-up event.

use chess_core::pgn::parse_headers;
use chess_core::shakmaty::{Role, Square};
use chess_core::{GameHeaders, Replay};

use crate::clients::lichess::GameSummary;
use crate::coaching::{ChatContext, ChatMessage, FullAnalysis};
use crate::error::SessionError;
use crate::session::state::{InputMode, Notice, SessionState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameSelector {
    /// Position in the listed games.
    Index(usize),
    Id(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavTarget {
    Start,
    Back,
    Forward,
    End,
    /// Half-moves from the initial position; 0 is the initial position.
    Ply(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    SetMode(InputMode),
    SetUsername(String),
    SubmitPgn(String),
    SearchUser(String),
    GamesListed(Result<Vec<GameSummary>, SessionError>),
    SelectGame(GameSelector),
    GameFetched(Result<String, SessionError>),
    RequestAnalysis,
    AnalysisFinished(Result<FullAnalysis, SessionError>),
    SendChat(String),
    ChatReplied(Result<String, SessionError>),
    UserMove {
        from: Square,
        to: Square,
        promotion: Option<Role>,
    },
    Navigate(NavTarget),
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ListGames(String),
    FetchGame(String),
    Analyze(String),
    Chat(ChatContext),
}

#[derive(Debug)]
pub struct Transition {
    pub state: SessionState,
    pub effect: Option<Effect>,
}

impl Transition {
    fn stay(state: SessionState) -> Self {
        Self { state, effect: None }
    }

    fn run(state: SessionState, effect: Effect) -> Self {
        Self { state, effect: Some(effect) }
    }
}

pub fn reduce(mut state: SessionState, event: Event) -> Transition {
    match event {
        Event::SetMode(mode) => {
            state.mode = mode;
            Transition::stay(state)
        }
        Event::SetUsername(name) => {
            state.username = name;
            Transition::stay(state)
        }
        Event::SubmitPgn(text) => Transition::stay(load_pgn(state, text)),

        Event::SearchUser(name) => {
            let name = name.trim().to_string();
            if name.is_empty() || state.loading.searching {
                return Transition::stay(state);
            }
            state.username = name.clone();
            state.loading.searching = true;
            state.error = None;
            Transition::run(state, Effect::ListGames(name))
        }
        Event::GamesListed(result) => {
            state.loading.searching = false;
            match result {
                Ok(games) => state.games = games,
                Err(e) => {
                    state.games.clear();
                    state.error = Some(e);
                }
            }
            Transition::stay(state)
        }

        Event::SelectGame(selector) => {
            if state.loading.fetching_game {
                return Transition::stay(state);
            }
            let id = match selector {
                GameSelector::Index(i) => match state.games.get(i) {
                    Some(game) => game.id.clone(),
                    None => return Transition::stay(state),
                },
                GameSelector::Id(id) => id.trim().to_string(),
            };
            if id.is_empty() {
                return Transition::stay(state);
            }
            state.loading.fetching_game = true;
            state.error = None;
            Transition::run(state, Effect::FetchGame(id))
        }
        Event::GameFetched(result) => {
            state.loading.fetching_game = false;
            match result {
                Ok(pgn) => Transition::stay(load_pgn(state, pgn)),
                Err(e) => {
                    state.error = Some(e);
                    Transition::stay(state)
                }
            }
        }

        Event::RequestAnalysis => {
            if state.loading.analyzing {
                return Transition::stay(state);
            }
            match state.game_text() {
                Some(text) => {
                    state.loading.analyzing = true;
                    state.error = None;
                    Transition::run(state, Effect::Analyze(text))
                }
                None => {
                    state.error = Some(SessionError::Validation);
                    Transition::stay(state)
                }
            }
        }
        Event::AnalysisFinished(result) => {
            state.loading.analyzing = false;
            match result {
                Ok(analysis) => state.analysis = Some(analysis),
                Err(e) => state.error = Some(e),
            }
            Transition::stay(state)
        }

        Event::SendChat(text) => {
            let query = text.trim().to_string();
            if query.is_empty() || state.loading.thinking {
                return Transition::stay(state);
            }
            let ctx = ChatContext {
                query: query.clone(),
                pgn: state.game_text().unwrap_or_default(),
                fen: state.replay.fen(),
                history: state.chat.clone(),
                analysis: state.analysis.clone(),
            };
            // Shown right away and kept even if the reply fails
            state.chat.push(ChatMessage::user(query));
            state.loading.thinking = true;
            state.error = None;
            Transition::run(state, Effect::Chat(ctx))
        }
        Event::ChatReplied(result) => {
            state.loading.thinking = false;
            match result {
                Ok(reply) => state.chat.push(ChatMessage::assistant(reply)),
                Err(e) => state.error = Some(e),
            }
            Transition::stay(state)
        }

        Event::UserMove { from, to, promotion } => {
            let Some(applied) = state.replay.apply_user_move(from, to, promotion) else {
                return Transition::stay(state);
            };
            let ply = state.replay.moves().len();
            state.pgn.clear();
            state.error = None;
            state.notice = if applied.discarded.is_empty() {
                None
            } else {
                // The loaded game's tags no longer describe this line
                state.headers = GameHeaders::default();
                Some(Notice::ContinuationDiscarded {
                    from_ply: ply,
                    moves: applied.discarded.into_iter().map(|m| m.san).collect(),
                })
            };
            Transition::stay(state)
        }

        Event::Navigate(target) => {
            state.notice = None;
            state.error = None;
            match target {
                NavTarget::Start => state.replay.go_to_start(),
                NavTarget::Back => state.replay.step_back(),
                NavTarget::Forward => state.replay.step_forward(),
                NavTarget::End => state.replay.go_to_end(),
                NavTarget::Ply(0) => state.replay.go_to_start(),
                NavTarget::Ply(n) => state.replay.navigate_to(Some(n - 1)),
            }
            Transition::stay(state)
        }

        Event::Reset => Transition::stay(SessionState::default()),
    }
}

/// Replace the game with `text`, or record why it could not be read and
/// leave the current game alone.
fn load_pgn(mut state: SessionState, text: String) -> SessionState {
    match Replay::from_pgn(&text) {
        Ok(replay) => {
            state.headers = parse_headers(&text);
            state.replay = replay;
            state.pgn = text;
            state.error = None;
            state.notice = None;
        }
        Err(e) => state.error = Some(e.into()),
    }
    state
}
