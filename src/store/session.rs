use rusqlite::{Connection, Transaction};
use tracing::{debug, warn};

use crate::config::DatabaseSettings;
use crate::error::ImportError;
use crate::store::schema::{configure_connection, open_connection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Idle,
    Started,
    Committed,
    RolledBack,
}

/// One storage connection for the length of an import run. Every document
/// goes through its own `in_transaction` call.
#[derive(Debug)]
pub struct Session {
    connection: Connection,
    state: TransactionState,
}

impl Session {
    pub fn open(settings: &DatabaseSettings) -> Result<Self, ImportError> {
        let connection = open_connection(settings)?;
        debug!(path = %settings.path.display(), "database session opened");
        Ok(Self::with_connection(connection))
    }

    pub fn from_connection(connection: Connection) -> Result<Self, ImportError> {
        configure_connection(&connection, "WAL")?;
        Ok(Self::with_connection(connection))
    }

    fn with_connection(connection: Connection) -> Self {
        Self {
            connection,
            state: TransactionState::Idle,
        }
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Runs `work` between BEGIN and COMMIT. Any error rolls the transaction
    /// back and is returned unchanged; a failing ROLLBACK is only logged.
    pub fn in_transaction<T, F>(&mut self, label: &str, work: F) -> Result<T, ImportError>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, ImportError>,
    {
        let tx = self.connection.transaction()?;
        self.state = TransactionState::Started;
        debug!(item = label, "transaction started");

        match work(&tx) {
            Ok(value) => match tx.commit() {
                Ok(()) => {
                    self.state = TransactionState::Committed;
                    debug!(item = label, "transaction committed");
                    Ok(value)
                }
                Err(err) => {
                    self.state = TransactionState::RolledBack;
                    Err(err.into())
                }
            },
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(item = label, error = %rollback_err, "rollback failed");
                }
                self.state = TransactionState::RolledBack;
                debug!(item = label, "transaction rolled back");
                Err(err)
            }
        }
    }

    pub fn close(self) {
        if let Err((_connection, err)) = self.connection.close() {
            warn!(error = %err, "failed to close database connection");
        }
    }
}
