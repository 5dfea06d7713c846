pub mod canvas;
pub mod cli;
pub mod load_config;
pub mod state;
pub mod vault;

pub use cli::{run, Cli, Commands};
