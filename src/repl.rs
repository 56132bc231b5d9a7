//! Interactive command loop
//!
//! Drives one session from an initial batch of tokens and then from input
//! lines, one batch per line. Responses, the prompt and the usage text are
//! written to the output stream; logging goes through `tracing`.

use crate::{
    config::Config,
    error::{RefVaultError, Result},
    protocol::{parse_command, tokenize, Response},
    session::Session,
    store::{MemoryStore, Store},
};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt},
    sync::broadcast,
};
use tracing::{debug, info, warn};

/// Usage text shown when there is nothing (more) to run
pub const USAGE: &str = "\
Creates and maintains an in-memory table with transaction support.

EXAMPLE: PUT=A,1 PUT=B,2
PUT=<key>,<value>
DELETE=<key>
PUTREF=<key>,<value>
GET=<key>
GETREF=<key>
QUIT
";

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// QUIT was issued; the session committed
    Quit,
    /// Input ran out; the session committed
    EndOfInput,
    /// Shutdown was requested; the session rolled back
    Interrupted,
}

/// Handle for interrupting a running [`Repl`] from another task
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: broadcast::Sender<()>,
}

impl ShutdownHandle {
    /// Interrupt the loop. The session is aborted, not committed.
    pub fn shutdown(&self) -> Result<()> {
        self.tx.send(()).map_err(|_| {
            RefVaultError::Shutdown("Failed to send shutdown signal".to_string())
        })?;
        Ok(())
    }
}

/// Interactive interpreter over a single session
pub struct Repl<S: Store = MemoryStore> {
    config: Config,
    session: Session<S>,
    shutdown_tx: broadcast::Sender<()>,
    // Held from construction so a shutdown sent before `run` is not lost
    shutdown_rx: broadcast::Receiver<()>,
}

impl Repl<MemoryStore> {
    /// Create an interpreter over a fresh in-memory store
    pub fn new(config: Config) -> Self {
        Self::with_store(config, MemoryStore::new())
    }
}

impl<S: Store> Repl<S> {
    pub fn with_store(config: Config, store: S) -> Self {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        Self {
            config,
            session: Session::begin(store),
            shutdown_tx,
            shutdown_rx,
        }
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: self.shutdown_tx.clone(),
        }
    }

    pub fn session(&self) -> &Session<S> {
        &self.session
    }

    pub fn into_session(self) -> Session<S> {
        self.session
    }

    /// Run `initial` tokens, then one batch per input line until QUIT, end of
    /// input, or shutdown.
    ///
    /// On a fault, `ERROR` and the error are written to `writer`, the session
    /// is rolled back, and the error is returned.
    pub async fn run<R, W>(&mut self, initial: &[String], reader: R, writer: &mut W) -> Result<Exit>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        match self.drive(initial, reader, writer).await {
            Ok(exit) => Ok(exit),
            Err(err) => {
                if self.session.is_open() {
                    if let Err(abort_err) = self.session.abort() {
                        warn!(error = %abort_err, "rollback after fault failed");
                    }
                }
                let report = format!("ERROR\n{}\n", err);
                if let Err(e) = writer.write_all(report.as_bytes()).await {
                    warn!(error = %e, "failed to write error report");
                }
                let _ = writer.flush().await;
                Err(err)
            }
        }
    }

    async fn drive<R, W>(&mut self, initial: &[String], mut reader: R, writer: &mut W) -> Result<Exit>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut batch = initial.to_vec();
        let mut line = String::new();

        loop {
            if self.process_batch(&batch, writer).await? {
                info!("quit requested");
                return Ok(Exit::Quit);
            }

            writer.write_all(format!("{}\n", self.config.prompt).as_bytes()).await?;
            writer.flush().await?;

            line.clear();
            tokio::select! {
                result = reader.read_line(&mut line) => {
                    if result? == 0 {
                        if self.config.usage_on_exit {
                            writer.write_all(USAGE.as_bytes()).await?;
                            writer.flush().await?;
                        }
                        self.session.commit()?;
                        info!("end of input");
                        return Ok(Exit::EndOfInput);
                    }
                    batch = tokenize(&line).map(str::to_string).collect();
                }

                _ = self.shutdown_rx.recv() => {
                    info!("shutdown requested, discarding session");
                    self.session.abort()?;
                    return Ok(Exit::Interrupted);
                }
            }
        }
    }

    /// Apply one batch, writing each response as it is produced.
    ///
    /// Returns `true` on QUIT; tokens after it are not applied.
    async fn process_batch<W>(&mut self, batch: &[String], writer: &mut W) -> Result<bool>
    where
        W: AsyncWrite + Unpin,
    {
        debug!(tokens = batch.len(), "processing batch");

        for token in batch {
            let response = self.session.apply(parse_command(token))?;
            let bytes = response.to_bytes();
            if !bytes.is_empty() {
                writer.write_all(&bytes).await?;
            }
            if response == Response::Quit {
                writer.flush().await?;
                return Ok(true);
            }
        }
        writer.flush().await?;

        Ok(false)
    }
}
