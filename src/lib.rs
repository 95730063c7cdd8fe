pub mod candy_machine;
pub mod config;
pub mod error;
pub mod interrupt;
pub mod logging;
pub mod project;
pub mod purge;
pub mod rarible;
pub mod report;
pub mod schema;
pub mod spl_token;
pub mod tool;
pub mod transfer;
pub mod verify;

pub use error::{HerbsError, Result};
