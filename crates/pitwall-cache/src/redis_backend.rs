// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Redis cache backend.
//!
//! The connection is established lazily on first use and shared by every
//! caller through a `ConnectionManager`, which reconnects on its own after
//! a dropped socket. Each [`Pipeline`] becomes one `redis::pipe()` round-trip.

use async_trait::async_trait;
use pitwall_core::{
    AdapterType, CacheCommand, CacheReply, CacheStore, HealthStatus, PitwallError, Pipeline,
    PluginAdapter,
};
use redis::aio::ConnectionManager;
use tokio::sync::OnceCell;
use tracing::debug;

/// How a raw Redis reply is decoded.
#[derive(Debug, Clone, Copy)]
enum ReplyShape {
    Status,
    Int,
    Text,
    List,
    /// The command was not sent; answer with `Int(0)`.
    Skipped,
}

fn redis_err(e: redis::RedisError) -> PitwallError {
    PitwallError::Cache {
        message: e.to_string(),
        source: Some(Box::new(e)),
    }
}

fn millis(d: std::time::Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX).max(1)
}

/// Translates one command into its Redis form.
fn to_redis(command: CacheCommand) -> (Option<redis::Cmd>, ReplyShape) {
    match command {
        CacheCommand::Get { key } => (Some(redis::cmd("GET").arg(key).clone()), ReplyShape::Text),
        CacheCommand::Set { key, value, ttl } => {
            let mut cmd = redis::cmd("SET");
            cmd.arg(key).arg(value);
            if let Some(ttl) = ttl {
                cmd.arg("PX").arg(millis(ttl));
            }
            (Some(cmd), ReplyShape::Status)
        }
        CacheCommand::Del { key } => (Some(redis::cmd("DEL").arg(key).clone()), ReplyShape::Int),
        CacheCommand::Exists { key } => {
            (Some(redis::cmd("EXISTS").arg(key).clone()), ReplyShape::Int)
        }
        CacheCommand::Expire { key, ttl } => (
            Some(redis::cmd("PEXPIRE").arg(key).arg(millis(ttl)).clone()),
            ReplyShape::Int,
        ),
        CacheCommand::ZAdd { key, members } => {
            // ZADD with no members is a syntax error on the server.
            if members.is_empty() {
                return (None, ReplyShape::Skipped);
            }
            let mut cmd = redis::cmd("ZADD");
            cmd.arg(key);
            for (member, score) in members {
                cmd.arg(score).arg(member);
            }
            (Some(cmd), ReplyShape::Int)
        }
        CacheCommand::ZRem { key, member } => (
            Some(redis::cmd("ZREM").arg(key).arg(member).clone()),
            ReplyShape::Int,
        ),
        CacheCommand::ZRemRangeByScore { key, min, max } => (
            Some(
                redis::cmd("ZREMRANGEBYSCORE")
                    .arg(key)
                    .arg(min.to_redis_arg())
                    .arg(max.to_redis_arg())
                    .clone(),
            ),
            ReplyShape::Int,
        ),
        CacheCommand::ZCount { key, min, max } => (
            Some(
                redis::cmd("ZCOUNT")
                    .arg(key)
                    .arg(min.to_redis_arg())
                    .arg(max.to_redis_arg())
                    .clone(),
            ),
            ReplyShape::Int,
        ),
        CacheCommand::ZRevRange { key, start, stop } => (
            Some(redis::cmd("ZREVRANGE").arg(key).arg(start).arg(stop).clone()),
            ReplyShape::List,
        ),
        CacheCommand::SAdd { key, member } => (
            Some(redis::cmd("SADD").arg(key).arg(member).clone()),
            ReplyShape::Int,
        ),
        CacheCommand::SRem { key, member } => (
            Some(redis::cmd("SREM").arg(key).arg(member).clone()),
            ReplyShape::Int,
        ),
        CacheCommand::SMembers { key } => {
            (Some(redis::cmd("SMEMBERS").arg(key).clone()), ReplyShape::List)
        }
        CacheCommand::SCard { key } => (Some(redis::cmd("SCARD").arg(key).clone()), ReplyShape::Int),
    }
}

fn decode(shape: ReplyShape, value: &redis::Value) -> Result<CacheReply, PitwallError> {
    match shape {
        ReplyShape::Status | ReplyShape::Skipped => Ok(CacheReply::Ok),
        ReplyShape::Int => redis::from_redis_value::<i64>(value)
            .map(CacheReply::Int)
            .map_err(redis_err),
        ReplyShape::Text => redis::from_redis_value::<Option<String>>(value)
            .map(|v| v.map_or(CacheReply::Nil, CacheReply::Text))
            .map_err(redis_err),
        ReplyShape::List => redis::from_redis_value::<Vec<String>>(value)
            .map(CacheReply::List)
            .map_err(redis_err),
    }
}

/// Cache backed by a Redis server.
pub struct RedisCache {
    client: redis::Client,
    conn: OnceCell<ConnectionManager>,
}

impl RedisCache {
    /// Validates the URL; no connection is attempted until first use.
    pub fn new(url: &str) -> Result<Self, PitwallError> {
        let client = redis::Client::open(url)
            .map_err(|e| PitwallError::Config(format!("invalid cache url {url}: {e}")))?;
        Ok(Self {
            client,
            conn: OnceCell::new(),
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, PitwallError> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                debug!("opening redis connection");
                ConnectionManager::new(self.client.clone())
                    .await
                    .map_err(redis_err)
            })
            .await?;
        Ok(conn.clone())
    }
}

#[async_trait]
impl PluginAdapter for RedisCache {
    fn name(&self) -> &str {
        "redis-cache"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Cache
    }

    async fn health_check(&self) -> Result<HealthStatus, PitwallError> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(e) => return Ok(HealthStatus::Unhealthy(e.to_string())),
        };
        let pong: Result<String, _> = redis::cmd("PING").query_async(&mut conn).await;
        match pong {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), PitwallError> {
        Ok(())
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn execute(&self, pipeline: Pipeline) -> Result<Vec<CacheReply>, PitwallError> {
        let mut pipe = redis::pipe();
        let mut shapes = Vec::with_capacity(pipeline.len());
        for command in pipeline.into_commands() {
            let (cmd, shape) = to_redis(command);
            if let Some(cmd) = cmd {
                pipe.add_command(cmd);
            }
            shapes.push(shape);
        }

        let values: Vec<redis::Value> = if shapes.iter().all(|s| matches!(s, ReplyShape::Skipped)) {
            Vec::new()
        } else {
            let mut conn = self.connection().await?;
            pipe.query_async(&mut conn).await.map_err(redis_err)?
        };

        let mut values = values.into_iter();
        shapes
            .into_iter()
            .map(|shape| match shape {
                ReplyShape::Skipped => Ok(CacheReply::Int(0)),
                _ => {
                    let value = values
                        .next()
                        .ok_or_else(|| PitwallError::cache("redis pipeline returned too few replies"))?;
                    decode(shape, &value)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pitwall_core::ScoreBound;

    use super::*;

    fn packed(cmd: &redis::Cmd) -> String {
        String::from_utf8_lossy(&cmd.get_packed_command()).into_owned()
    }

    #[test]
    fn set_with_ttl_uses_px() {
        let (cmd, _) = to_redis(CacheCommand::Set {
            key: "k".into(),
            value: "v".into(),
            ttl: Some(Duration::from_secs(2)),
        });
        let wire = packed(&cmd.unwrap());
        assert!(wire.contains("PX"));
        assert!(wire.contains("2000"));
    }

    #[test]
    fn score_ranges_use_redis_syntax() {
        let (cmd, _) = to_redis(CacheCommand::ZCount {
            key: "u1:A".into(),
            min: ScoreBound::Exclusive(1000.0),
            max: ScoreBound::PosInf,
        });
        let wire = packed(&cmd.unwrap());
        assert!(wire.contains("(1000"));
        assert!(wire.contains("+inf"));
    }

    #[test]
    fn empty_zadd_is_skipped() {
        let (cmd, shape) = to_redis(CacheCommand::ZAdd {
            key: "z".into(),
            members: vec![],
        });
        assert!(cmd.is_none());
        assert!(matches!(shape, ReplyShape::Skipped));
    }

    #[test]
    fn decodes_nil_as_missing_text() {
        let reply = decode(ReplyShape::Text, &redis::Value::Nil).unwrap();
        assert_eq!(reply, CacheReply::Nil);
    }

    #[test]
    fn invalid_url_rejected_without_connecting() {
        let err = RedisCache::new("not-a-url").err().unwrap();
        assert!(matches!(err, PitwallError::Config(_)), "{err}");
        assert!(RedisCache::new("redis://127.0.0.1:6379/0").is_ok());
    }
}
