// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command model for the low-latency cache.
//!
//! Callers describe work as a [`Pipeline`] of [`CacheCommand`]s; a
//! [`CacheStore`](crate::traits::CacheStore) backend executes the whole
//! batch in one round-trip and answers with one [`CacheReply`] per command,
//! in order. Only single-key primitives are modelled, so every command is
//! atomic on the backend.

use std::time::Duration;

use crate::error::PitwallError;

/// One end of a sorted-set score range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreBound {
    NegInf,
    PosInf,
    Inclusive(f64),
    Exclusive(f64),
}

impl ScoreBound {
    /// Whether `score` satisfies this bound used as a range minimum.
    pub fn admits_as_min(&self, score: f64) -> bool {
        match *self {
            ScoreBound::NegInf => true,
            ScoreBound::PosInf => false,
            ScoreBound::Inclusive(b) => score >= b,
            ScoreBound::Exclusive(b) => score > b,
        }
    }

    /// Whether `score` satisfies this bound used as a range maximum.
    pub fn admits_as_max(&self, score: f64) -> bool {
        match *self {
            ScoreBound::NegInf => false,
            ScoreBound::PosInf => true,
            ScoreBound::Inclusive(b) => score <= b,
            ScoreBound::Exclusive(b) => score < b,
        }
    }

    /// Renders the bound in Redis range syntax (`-inf`, `+inf`, `5`, `(5`).
    pub fn to_redis_arg(&self) -> String {
        match *self {
            ScoreBound::NegInf => "-inf".to_string(),
            ScoreBound::PosInf => "+inf".to_string(),
            ScoreBound::Inclusive(b) => format!("{b}"),
            ScoreBound::Exclusive(b) => format!("({b}"),
        }
    }
}

/// A single cache operation.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheCommand {
    Get { key: String },
    /// Set a string value, optionally with a time-to-live.
    Set {
        key: String,
        value: String,
        ttl: Option<Duration>,
    },
    Del { key: String },
    Exists { key: String },
    /// Set a key's time-to-live. Replies `Int(1)` if the key exists, `Int(0)` otherwise.
    Expire { key: String, ttl: Duration },
    /// Add scored members; re-adding a member updates its score. Replies with the number added.
    ZAdd {
        key: String,
        members: Vec<(String, f64)>,
    },
    ZRem { key: String, member: String },
    /// Remove members scored within `[min, max]` (bounds as given). Replies with the number removed.
    ZRemRangeByScore {
        key: String,
        min: ScoreBound,
        max: ScoreBound,
    },
    ZCount {
        key: String,
        min: ScoreBound,
        max: ScoreBound,
    },
    /// Members by descending score, rank range inclusive (negative ranks count from the end).
    ZRevRange { key: String, start: i64, stop: i64 },
    SAdd { key: String, member: String },
    SRem { key: String, member: String },
    SMembers { key: String },
    SCard { key: String },
}

/// The backend's answer to one [`CacheCommand`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheReply {
    Nil,
    Ok,
    Int(i64),
    Text(String),
    List(Vec<String>),
}

impl CacheReply {
    /// Interprets the reply as an integer.
    pub fn into_int(self) -> Result<i64, PitwallError> {
        match self {
            CacheReply::Int(n) => Ok(n),
            other => Err(PitwallError::cache(format!(
                "expected integer reply, got {other:?}"
            ))),
        }
    }

    /// Interprets the reply as an optional string value.
    pub fn into_text(self) -> Result<Option<String>, PitwallError> {
        match self {
            CacheReply::Nil => Ok(None),
            CacheReply::Text(s) => Ok(Some(s)),
            other => Err(PitwallError::cache(format!(
                "expected string reply, got {other:?}"
            ))),
        }
    }

    /// Interprets the reply as a list of strings.
    pub fn into_list(self) -> Result<Vec<String>, PitwallError> {
        match self {
            CacheReply::List(items) => Ok(items),
            CacheReply::Nil => Ok(Vec::new()),
            other => Err(PitwallError::cache(format!(
                "expected list reply, got {other:?}"
            ))),
        }
    }
}

/// An ordered batch of cache commands executed in one round-trip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    commands: Vec<CacheCommand>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[CacheCommand] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<CacheCommand> {
        self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn push(mut self, command: CacheCommand) -> Self {
        self.commands.push(command);
        self
    }

    pub fn get(self, key: impl Into<String>) -> Self {
        self.push(CacheCommand::Get { key: key.into() })
    }

    pub fn set(self, key: impl Into<String>, value: impl Into<String>, ttl: Option<Duration>) -> Self {
        self.push(CacheCommand::Set {
            key: key.into(),
            value: value.into(),
            ttl,
        })
    }

    pub fn del(self, key: impl Into<String>) -> Self {
        self.push(CacheCommand::Del { key: key.into() })
    }

    pub fn exists(self, key: impl Into<String>) -> Self {
        self.push(CacheCommand::Exists { key: key.into() })
    }

    pub fn expire(self, key: impl Into<String>, ttl: Duration) -> Self {
        self.push(CacheCommand::Expire {
            key: key.into(),
            ttl,
        })
    }

    pub fn zadd(self, key: impl Into<String>, members: Vec<(String, f64)>) -> Self {
        self.push(CacheCommand::ZAdd {
            key: key.into(),
            members,
        })
    }

    pub fn zrem(self, key: impl Into<String>, member: impl Into<String>) -> Self {
        self.push(CacheCommand::ZRem {
            key: key.into(),
            member: member.into(),
        })
    }

    pub fn zrem_range_by_score(self, key: impl Into<String>, min: ScoreBound, max: ScoreBound) -> Self {
        self.push(CacheCommand::ZRemRangeByScore {
            key: key.into(),
            min,
            max,
        })
    }

    pub fn zcount(self, key: impl Into<String>, min: ScoreBound, max: ScoreBound) -> Self {
        self.push(CacheCommand::ZCount {
            key: key.into(),
            min,
            max,
        })
    }

    pub fn zrevrange(self, key: impl Into<String>, start: i64, stop: i64) -> Self {
        self.push(CacheCommand::ZRevRange {
            key: key.into(),
            start,
            stop,
        })
    }

    pub fn sadd(self, key: impl Into<String>, member: impl Into<String>) -> Self {
        self.push(CacheCommand::SAdd {
            key: key.into(),
            member: member.into(),
        })
    }

    pub fn srem(self, key: impl Into<String>, member: impl Into<String>) -> Self {
        self.push(CacheCommand::SRem {
            key: key.into(),
            member: member.into(),
        })
    }

    pub fn smembers(self, key: impl Into<String>) -> Self {
        self.push(CacheCommand::SMembers { key: key.into() })
    }

    pub fn scard(self, key: impl Into<String>) -> Self {
        self.push(CacheCommand::SCard { key: key.into() })
    }
}
