pub mod config;
pub mod game;

pub use config::*;
pub use game::*;
