//! Redis Store Module
//!
//! Networked backend forwarding each store operation to a Redis server.
//! Redis provides its own atomicity and expiry, so this module only
//! translates calls. Compiled only with the `redis` feature.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::error::{KvsError, Result};
use crate::iter::{KeyIter, KEY_BUFFER};
use crate::options::{ReadOptions, WriteOptions};
use crate::store::{ensure_live, Store};

/// DSN scheme served by this backend.
pub const SCHEME: &str = "redis";

// == Redis Config ==
/// Connection settings for a Redis server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisConfig {
    /// `host:port`
    pub addr: String,
    pub password: Option<String>,
    pub database: i64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:6379".to_string(),
            password: None,
            database: 0,
        }
    }
}

impl RedisConfig {
    pub fn with_addr(mut self, addr: impl Into<String>) -> Self {
        self.addr = addr.into();
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_database(mut self, database: i64) -> Self {
        self.database = database;
        self
    }

    /// Parses `redis://[:password@]host[:port][/db]`.
    pub fn from_dsn(dsn: &str) -> Result<Self> {
        let url = Url::parse(dsn).map_err(|e| KvsError::InvalidDsn(format!("{dsn}: {e}")))?;
        if url.scheme() != SCHEME {
            return Err(KvsError::InvalidDsn(format!(
                "expected scheme: {SCHEME} (got: '{}' in '{dsn}')",
                url.scheme()
            )));
        }

        let host = url
            .host_str()
            .ok_or_else(|| KvsError::InvalidDsn(format!("{dsn}: missing host")))?;
        let port = url.port().unwrap_or(6379);

        let database = match url.path().trim_matches('/') {
            "" => 0,
            db => db
                .parse()
                .map_err(|e| KvsError::InvalidDsn(format!("Invalid database {db:?}: {e}")))?,
        };

        Ok(Self {
            addr: format!("{host}:{port}"),
            password: url.password().map(str::to_string),
            database,
        })
    }

    fn connection_url(&self) -> String {
        match &self.password {
            Some(password) => format!("redis://:{password}@{}/{}", self.addr, self.database),
            None => format!("redis://{}/{}", self.addr, self.database),
        }
    }
}

// == Redis Store ==
/// [`Store`] backed by a Redis server.
#[derive(Clone)]
pub struct RedisStore {
    config: RedisConfig,
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connects using `config`.
    pub async fn connect(config: RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.connection_url())?;
        let conn = client.get_connection_manager().await?;
        debug!(addr = %config.addr, db = config.database, "connected to redis");
        Ok(Self { config, conn })
    }

    /// Connects using a `redis://` connection descriptor.
    pub async fn open(dsn: &str) -> Result<Self> {
        Self::connect(RedisConfig::from_dsn(dsn)?).await
    }

    pub fn config(&self) -> &RedisConfig {
        &self.config
    }
}

/// Escapes glob metacharacters so a prefix matches literally in `SCAN MATCH`.
fn glob_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('*');
    pattern
}

fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

impl fmt::Display for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Redis @ {}/{}", self.config.addr, self.config.database)
    }
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore")
            .field("addr", &self.config.addr)
            .field("database", &self.config.database)
            .finish()
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn keys(&self, cx: &CancellationToken, opts: ReadOptions) -> Result<KeyIter> {
        ensure_live(cx)?;
        let pattern = opts.prefix.as_deref().map(glob_prefix);
        let mut conn = self.conn.clone();
        let (sink, iter) = KeyIter::channel(cx.clone());

        tokio::spawn(async move {
            let mut cursor: u64 = 0;
            loop {
                let mut cmd = redis::cmd("SCAN");
                cmd.arg(cursor);
                if let Some(pattern) = &pattern {
                    cmd.arg("MATCH").arg(pattern);
                }
                cmd.arg("COUNT").arg(KEY_BUFFER);

                let page: redis::RedisResult<(u64, Vec<String>)> =
                    cmd.query_async(&mut conn).await;
                let (next, keys) = match page {
                    Ok(page) => page,
                    Err(err) => {
                        warn!(error = %err, "redis scan failed");
                        sink.send(Err(err.into())).await;
                        return;
                    }
                };
                for key in keys {
                    if !sink.send(Ok(key)).await {
                        return;
                    }
                }
                if next == 0 {
                    return;
                }
                cursor = next;
            }
        });

        Ok(iter)
    }

    async fn get(&self, cx: &CancellationToken, key: &str, _opts: ReadOptions) -> Result<Vec<u8>> {
        ensure_live(cx)?;
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        value.ok_or_else(|| KvsError::NotFound(key.to_string()))
    }

    async fn set(
        &self,
        cx: &CancellationToken,
        key: &str,
        value: Vec<u8>,
        opts: WriteOptions,
    ) -> Result<()> {
        ensure_live(cx)?;
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = opts.ttl {
            cmd.arg("PX").arg(ttl_millis(ttl));
        }
        let _: () = cmd.query_async(&mut conn).await?;
        Ok(())
    }

    async fn inc(
        &self,
        cx: &CancellationToken,
        key: &str,
        delta: i64,
        opts: WriteOptions,
    ) -> Result<i64> {
        ensure_live(cx)?;
        let mut conn = self.conn.clone();
        let sum: i64 = redis::cmd("INCRBY")
            .arg(key)
            .arg(delta)
            .query_async(&mut conn)
            .await
            .map_err(|err| match err.kind() {
                redis::ErrorKind::ResponseError => KvsError::InvalidValue {
                    key: key.to_string(),
                    reason: err.to_string(),
                },
                _ => err.into(),
            })?;

        if let Some(ttl) = opts.ttl {
            let _: i64 = redis::cmd("PEXPIRE")
                .arg(key)
                .arg(ttl_millis(ttl))
                .query_async(&mut conn)
                .await?;
        }
        Ok(sum)
    }

    async fn delete(&self, cx: &CancellationToken, key: &str, _opts: WriteOptions) -> Result<()> {
        ensure_live(cx)?;
        let mut conn = self.conn.clone();
        let _: i64 = redis::cmd("DEL").arg(key).query_async(&mut conn).await?;
        Ok(())
    }
}
