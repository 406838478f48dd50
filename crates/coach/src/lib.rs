pub mod cli;
pub mod clients;
pub mod coaching;
pub mod config;
pub mod error;
pub mod render;
pub mod session;
