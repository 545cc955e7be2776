//! Redis-backed cache.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::info;

use crate::error::{CacheError, CacheResult};
use crate::store::CacheStore;

/// Cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Redis host
    pub host: String,
    /// Redis port
    pub port: u16,
    /// Logical database number
    pub db: u8,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            host: "redis".to_string(),
            port: 6379,
            db: 0,
        }
    }
}

impl CacheConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("REDIS_HOST").unwrap_or_else(|_| "redis".to_string()),
            port: std::env::var("REDIS_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(6379),
            db: std::env::var("REDIS_DB")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
        }
    }

    /// Connection URL for this config.
    pub fn url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }
}

/// Redis cache client.
///
/// Each operation opens its own connection, so a restarted or unreachable
/// server only fails the calls made while it is down.
pub struct RedisCache {
    client: redis::Client,
}

impl RedisCache {
    /// Create a new cache client. Does not connect yet.
    pub fn new(config: &CacheConfig) -> CacheResult<Self> {
        let client = redis::Client::open(config.url())?;
        info!("Redis cache configured at {}:{} db {}", config.host, config.port, config.db);
        Ok(Self { client })
    }

    /// Create from environment variables.
    pub fn from_env() -> CacheResult<Self> {
        Self::new(&CacheConfig::from_env())
    }

    async fn connection(&self) -> CacheResult<MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        let reply: String = redis::cmd("PING").query_async(&mut conn).await?;
        if reply == "PONG" {
            Ok(())
        } else {
            Err(CacheError::unhealthy(format!("unexpected PING reply: {}", reply)))
        }
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        match ttl {
            Some(ttl) => conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1)).await?,
            None => conn.set::<_, _, ()>(key, value).await?,
        }
        Ok(())
    }

    async fn hget(&self, key: &str, field: &str) -> CacheResult<Option<String>> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.hget(key, field).await?;
        Ok(value)
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        conn.hset::<_, _, _, ()>(key, field, value).await?;
        Ok(())
    }

    async fn push_capped(&self, key: &str, value: &str, max_len: usize) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        if max_len == 0 {
            conn.del::<_, ()>(key).await?;
            return Ok(());
        }
        let stop = max_len.saturating_sub(1) as isize;
        redis::pipe()
            .atomic()
            .lpush(key, value)
            .ignore()
            .ltrim(key, 0, stop)
            .ignore()
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn list_head(&self, key: &str, count: usize) -> CacheResult<Vec<String>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.connection().await?;
        let values: Vec<String> = conn.lrange(key, 0, (count - 1) as isize).await?;
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
    use tokio::net::{TcpListener, TcpStream};

    /// Read one RESP command array, returning its upper-cased name.
    async fn read_command(reader: &mut BufReader<TcpStream>) -> Option<String> {
        let mut line = String::new();
        if reader.read_line(&mut line).await.ok()? == 0 {
            return None;
        }
        let argc: usize = line.trim().strip_prefix('*')?.parse().ok()?;
        let mut name = None;
        for _ in 0..argc {
            line.clear();
            reader.read_line(&mut line).await.ok()?;
            let len: usize = line.trim().strip_prefix('$')?.parse().ok()?;
            let mut arg = vec![0u8; len + 2];
            reader.read_exact(&mut arg).await.ok()?;
            if name.is_none() {
                name = Some(String::from_utf8_lossy(&arg[..len]).to_uppercase());
            }
        }
        name
    }

    /// Answers handshake commands with +OK and closes each socket right
    /// after its first PONG.
    async fn one_ping_per_socket_server() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut reader = BufReader::new(socket);
                    while let Some(command) = read_command(&mut reader).await {
                        let reply: &[u8] = if command == "PING" { b"+PONG\r\n" } else { b"+OK\r\n" };
                        if reader.get_mut().write_all(reply).await.is_err() || command == "PING" {
                            break;
                        }
                    }
                });
            }
        });
        port
    }

    #[tokio::test]
    async fn recovers_after_server_drops_connection() {
        let port = one_ping_per_socket_server().await;
        let cache = RedisCache::new(&CacheConfig {
            host: "127.0.0.1".to_string(),
            port,
            db: 0,
        })
        .unwrap();

        for attempt in 0..4 {
            assert!(cache.ping().await.is_ok(), "ping {} failed", attempt);
        }
    }

    #[test]
    #[serial]
    fn config_from_env_defaults() {
        std::env::remove_var("REDIS_HOST");
        std::env::remove_var("REDIS_PORT");
        std::env::remove_var("REDIS_DB");
        let config = CacheConfig::from_env();
        assert_eq!(config.url(), "redis://redis:6379/0");
    }

    #[test]
    #[serial]
    fn config_from_env_overrides() {
        std::env::set_var("REDIS_HOST", "cache.local");
        std::env::set_var("REDIS_PORT", "6380");
        std::env::set_var("REDIS_DB", "2");
        let config = CacheConfig::from_env();
        assert_eq!(config.url(), "redis://cache.local:6380/2");
        std::env::remove_var("REDIS_HOST");
        std::env::remove_var("REDIS_PORT");
        std::env::remove_var("REDIS_DB");
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn ping_live_redis() {
        let cache = RedisCache::new(&CacheConfig {
            host: "localhost".to_string(),
            ..CacheConfig::default()
        })
        .expect("client");
        cache.ping().await.expect("ping");
    }
}
