//! Session: the unit of atomicity
//!
//! Every mutation made through a session is journaled. A store fault aborts
//! the session and rolls the store back to its state at [`Session::begin`];
//! QUIT or [`Session::commit`] keeps the current state and drops the journal.

use crate::error::{RefVaultError, Result};
use crate::executor::execute;
use crate::journal::{Journal, JournaledStore};
use crate::protocol::{parse_command, Command, Response};
use crate::store::{MemoryStore, Store};
use std::fmt;
use tracing::{debug, error, info, warn};

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Committed,
    Aborted,
    /// A rollback failed partway; only `abort` is accepted
    Faulted,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Open => "open",
            SessionState::Committed => "committed",
            SessionState::Aborted => "aborted",
            SessionState::Faulted => "faulted",
        };
        f.write_str(name)
    }
}

/// A transaction over an owned store
pub struct Session<S: Store = MemoryStore> {
    store: S,
    journal: Journal,
    log: Vec<Command>,
    state: SessionState,
}

impl<S: Store> Session<S> {
    /// Open a session over `store`, capturing its current state for rollback
    pub fn begin(store: S) -> Self {
        debug!("session opened");
        Self {
            store,
            journal: Journal::new(),
            log: Vec::new(),
            state: SessionState::Open,
        }
    }

    /// Execute one command.
    ///
    /// QUIT commits the session. On `Err` the session has been rolled back
    /// and aborted, or left `Faulted` if the rollback itself failed.
    pub fn apply(&mut self, command: Command) -> Result<Response> {
        self.ensure_open()?;

        let result = {
            let mut journaled = JournaledStore::new(&mut self.store, &mut self.journal);
            execute(&mut journaled, &command)
        };

        match result {
            Ok(response) => {
                debug!(verb = ?command.verb, key = %command.key, "applied");
                self.log.push(command);
                if response == Response::Quit {
                    if let Err(err) = self.commit() {
                        return Err(self.fail(err));
                    }
                }
                Ok(response)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Parse and apply a batch of tokens in order.
    ///
    /// Processing stops at QUIT; tokens after it are never parsed.
    pub fn run_batch<'a, I>(&mut self, tokens: I) -> Result<Vec<Response>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut responses = Vec::new();

        for token in tokens {
            let response = self.apply(parse_command(token))?;
            let quit = response == Response::Quit;
            responses.push(response);
            if quit {
                break;
            }
        }

        Ok(responses)
    }

    /// Keep the current store state and end the session
    pub fn commit(&mut self) -> Result<()> {
        self.ensure_open()?;

        let entries = self.store.len()?;
        self.journal.clear();
        self.state = SessionState::Committed;

        info!(entries, operations = self.log.len(), "session committed");
        Ok(())
    }

    /// Undo every mutation made since `begin` and end the session.
    ///
    /// If the store fails mid-rollback the session is left `Faulted` with the
    /// unrestored keys still journaled, and `abort` may be called again.
    pub fn abort(&mut self) -> Result<()> {
        if !matches!(self.state, SessionState::Open | SessionState::Faulted) {
            return Err(RefVaultError::SessionClosed(self.state.to_string()));
        }

        match self.journal.rollback(&mut self.store) {
            Ok(restored) => {
                self.state = SessionState::Aborted;
                self.log.clear();
                info!(restored, "session aborted");
                Ok(())
            }
            Err(err) => {
                self.state = SessionState::Faulted;
                warn!(error = %err, pending = self.journal.len(), "rollback incomplete");
                Err(err)
            }
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Commands applied so far; empty after an abort
    pub fn log(&self) -> &[Command] {
        &self.log
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state {
            SessionState::Open => Ok(()),
            state => Err(RefVaultError::SessionClosed(state.to_string())),
        }
    }

    /// Abort after a fault, returning the error to report
    fn fail(&mut self, err: RefVaultError) -> RefVaultError {
        error!(error = %err, "session fault, rolling back");
        match self.abort() {
            Ok(()) => err,
            Err(cause) => RefVaultError::FaultRollback {
                fault: Box::new(err),
                cause: Box::new(cause),
            },
        }
    }
}
