pub mod models;
pub mod schema;
pub mod types;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use tracing::{error, info, warn};

use crate::error::Result;

// Embeds migrations from migrations folder
embed_migrations!();

pub const IN_MEMORY: &str = ":memory:";

/// Opens a connection, switches on foreign keys (the cascades depend on it) and
/// makes sure the schema is up-to-date.
pub fn establish_connection(database_url: &str) -> Result<SqliteConnection> {
    let connection = SqliteConnection::establish(database_url)?;
    connection.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")?;
    embedded_migrations::run(&connection)?;
    Ok(connection)
}

/// Connection handle owned by the service layer.
pub struct Database {
    url: String,
    connection: SqliteConnection,
}

impl Database {
    pub fn open(database_url: &str) -> Result<Database> {
        let connection = establish_connection(database_url)?;
        info!(url = database_url, "connected to database");
        Ok(Database { url: database_url.to_string(), connection })
    }

    pub fn in_memory() -> Result<Database> {
        Database::open(IN_MEMORY)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn connection(&self) -> &SqliteConnection {
        &self.connection
    }

    /// Runs `op` on the connection. A storage failure triggers exactly one reconnect
    /// so the next call starts fresh; the failing call itself is not re-run.
    pub fn run<T, F>(&mut self, op: F) -> Result<T>
    where
        F: FnOnce(&SqliteConnection) -> Result<T>,
    {
        let result = op(&self.connection);
        if let Err(err) = &result {
            if err.is_storage() {
                error!(%err, "storage failure");
                self.reconnect();
            }
        }
        result
    }

    fn reconnect(&mut self) {
        if self.url == IN_MEMORY {
            // A new in-memory connection would be an empty database
            warn!("not reconnecting an in-memory database");
            return;
        }

        match establish_connection(&self.url) {
            Ok(connection) => {
                self.connection = connection;
                info!(url = %self.url, "reconnected to database");
            }
            Err(err) => error!(%err, "reconnect failed"),
        }
    }

    pub fn close(self) {
        info!(url = %self.url, "database connection closed");
    }
}
