pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod storyline;

pub use error::{Error, Result};
