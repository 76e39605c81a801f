pub mod config;
pub mod echo;
pub mod error;
pub mod gateway;
pub mod inference;
pub mod logging;
pub mod server;

pub use error::{Error, Result};
