//! Session layer: the state record, its reducer and the controller that runs
//! the reducer's effects against the external clients.

pub mod controller;
pub mod reducer;
pub mod state;

pub use controller::SessionController;
pub use reducer::{reduce, Effect, Event, GameSelector, NavTarget, Transition};
pub use state::{InputMode, Loading, Notice, SessionState};
