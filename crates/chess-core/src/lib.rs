pub use shakmaty;

pub mod game_data;
pub mod pgn;
pub mod replay;

pub use game_data::{GameHeaders, PlayedMove};
pub use replay::{MoveApplied, Replay, ReplayError};
