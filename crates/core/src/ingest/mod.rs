//! Turns a Telegram update into catalog entries.

mod processor;
mod types;

pub use processor::*;
pub use types::*;
