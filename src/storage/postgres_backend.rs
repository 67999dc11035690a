// PostgreSQL storage backend implementation
//
// Each session wraps one blocking `postgres::Client`. The pool hands a
// session to exactly one worker at a time, so the `&mut self` methods never
// contend. The connection parameters are retained so a dead session can be
// re-established in place.

use crate::config::Config;
use crate::error::Result;
use crate::storage::KvBackend;
use postgres::{Client, NoTls};
use std::time::Duration;
use tracing::debug;

const UPSERT_SQL: &str =
    "INSERT INTO kv_store (key, value) VALUES ($1, $2) \
     ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value";
const SELECT_SQL: &str = "SELECT value FROM kv_store WHERE key = $1";
const DELETE_SQL: &str = "DELETE FROM kv_store WHERE key = $1";
const SCHEMA_SQL: &str =
    "CREATE TABLE IF NOT EXISTS kv_store (key TEXT PRIMARY KEY, value TEXT NOT NULL)";

/// How long the liveness probe may wait before the session is declared dead
const PING_TIMEOUT: Duration = Duration::from_secs(2);

/// One pooled PostgreSQL session
pub struct PostgresSession {
    client: Client,
    params: postgres::Config,
}

impl PostgresSession {
    /// Connect a new session using the server configuration
    pub fn connect(config: &Config) -> Result<Self> {
        let params = connection_params(config);
        let client = params.connect(NoTls)?;
        Ok(Self { client, params })
    }

    /// Create the backing table if it does not exist yet
    ///
    /// Run once at startup on a single acquired session.
    pub fn ensure_schema(&mut self) -> Result<()> {
        self.client.batch_execute(SCHEMA_SQL)?;
        Ok(())
    }
}

impl KvBackend for PostgresSession {
    fn upsert(&mut self, key: &str, value: &str) -> Result<()> {
        self.client.execute(UPSERT_SQL, &[&key, &value])?;
        Ok(())
    }

    fn fetch(&mut self, key: &str) -> Result<Option<String>> {
        match self.client.query_opt(SELECT_SQL, &[&key])? {
            Some(row) => Ok(Some(row.try_get(0)?)),
            None => Ok(None),
        }
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.client.execute(DELETE_SQL, &[&key])?;
        Ok(())
    }

    fn ping(&mut self) -> bool {
        !self.client.is_closed() && self.client.is_valid(PING_TIMEOUT).is_ok()
    }

    fn reset(&mut self) -> Result<()> {
        debug!("re-establishing backend session");
        self.client = self.params.connect(NoTls)?;
        Ok(())
    }
}

fn connection_params(config: &Config) -> postgres::Config {
    let mut params = postgres::Config::new();
    params
        .host(&config.db_host)
        .port(config.db_port)
        .dbname(&config.db_name)
        .user(&config.db_user)
        .password(&config.db_password)
        .connect_timeout(Duration::from_secs(5));
    params
}
