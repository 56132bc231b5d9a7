//! RefVault - A single-session in-memory key-value store
//!
//! Commands are line-oriented tokens such as `PUT=A,1` or `GETREF=A`. All
//! mutations within one session are committed together, or rolled back
//! together when the session hits a fault:
//! - `Store` trait with a `HashMap` backed implementation
//! - `nom` based token parser
//! - One-hop key references via PUTREF / GETREF
//! - Undo journal for session rollback
//! - Async interactive loop over any reader and writer

pub mod config;
pub mod error;
pub mod executor;
pub mod journal;
pub mod protocol;
pub mod repl;
pub mod session;
pub mod store;

pub use config::Config;
pub use error::{RefVaultError, Result};
pub use executor::execute;
pub use protocol::{parse_command, tokenize, Command, Response, Verb};
pub use repl::{Exit, Repl, ShutdownHandle, USAGE};
pub use session::{Session, SessionState};
pub use store::{MemoryStore, Store};
