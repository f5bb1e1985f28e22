// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-local cache backend.
//!
//! Sorted sets are kept as a member→score map plus a `(score, member)`
//! B-tree, so range counts and range deletes walk only the matching slice.
//! Expiry is lazy: a key past its deadline is dropped the next time any
//! command touches it. Time comes from the injected [`SharedClock`].

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use pitwall_core::{
    AdapterType, CacheCommand, CacheReply, CacheStore, HealthStatus, PitwallError, Pipeline,
    PluginAdapter, ScoreBound, SharedClock,
};

/// Sorted-set score with a total order.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Score(f64);

impl Eq for Score {}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug, Default)]
struct SortedSet {
    scores: HashMap<String, f64>,
    ordered: BTreeSet<(Score, String)>,
}

impl SortedSet {
    /// Returns true when the member is new.
    fn insert(&mut self, member: String, score: f64) -> bool {
        match self.scores.insert(member.clone(), score) {
            Some(old) => {
                self.ordered.remove(&(Score(old), member.clone()));
                self.ordered.insert((Score(score), member));
                false
            }
            None => {
                self.ordered.insert((Score(score), member));
                true
            }
        }
    }

    fn remove(&mut self, member: &str) -> bool {
        match self.scores.remove(member) {
            Some(score) => {
                self.ordered.remove(&(Score(score), member.to_string()));
                true
            }
            None => false,
        }
    }

    fn in_range(&self, min: ScoreBound, max: ScoreBound) -> impl Iterator<Item = &(Score, String)> {
        self.ordered
            .iter()
            .skip_while(move |(s, _)| !min.admits_as_min(s.0))
            .take_while(move |(s, _)| max.admits_as_max(s.0))
    }

    fn len(&self) -> usize {
        self.scores.len()
    }
}

#[derive(Debug)]
enum Value {
    Text(String),
    Sorted(SortedSet),
    Set(BTreeSet<String>),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Value::Text(_) => "string",
            Value::Sorted(_) => "zset",
            Value::Set(_) => "set",
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Value::Text(_) => false,
            Value::Sorted(z) => z.len() == 0,
            Value::Set(s) => s.is_empty(),
        }
    }
}

#[derive(Debug)]
struct Entry {
    value: Value,
    /// Epoch milliseconds; `None` means persistent.
    expires_at: Option<i64>,
}

fn wrong_type(key: &str, found: &Value) -> PitwallError {
    PitwallError::cache(format!(
        "WRONGTYPE operation against key `{key}` holding a {}",
        found.kind()
    ))
}

fn ttl_deadline(now: i64, ttl: Duration) -> i64 {
    now.saturating_add(i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX))
}

/// Resolves a Redis-style inclusive rank range against `len` items.
fn rank_range(start: i64, stop: i64, len: usize) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if len == 0 || start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop as usize))
}

/// Single-node cache with sorted sets, sets, strings and TTLs.
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
    clock: SharedClock,
}

impl InMemoryCache {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        let now = self.clock.now_ms();
        self.entries
            .lock()
            .map(|map| {
                map.values()
                    .filter(|e| e.expires_at.is_none_or(|t| t > now))
                    .count()
            })
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn apply(
        map: &mut HashMap<String, Entry>,
        now: i64,
        command: CacheCommand,
    ) -> Result<CacheReply, PitwallError> {
        let key = command_key(&command).to_string();
        if map
            .get(&key)
            .and_then(|e| e.expires_at)
            .is_some_and(|t| t <= now)
        {
            map.remove(&key);
        }

        let reply = match command {
            CacheCommand::Get { key } => match map.get(&key) {
                None => CacheReply::Nil,
                Some(Entry {
                    value: Value::Text(s),
                    ..
                }) => CacheReply::Text(s.clone()),
                Some(other) => return Err(wrong_type(&key, &other.value)),
            },
            CacheCommand::Set { key, value, ttl } => {
                map.insert(
                    key,
                    Entry {
                        value: Value::Text(value),
                        expires_at: ttl.map(|t| ttl_deadline(now, t)),
                    },
                );
                CacheReply::Ok
            }
            CacheCommand::Del { key } => CacheReply::Int(i64::from(map.remove(&key).is_some())),
            CacheCommand::Exists { key } => CacheReply::Int(i64::from(map.contains_key(&key))),
            CacheCommand::Expire { key, ttl } => match map.get_mut(&key) {
                Some(entry) => {
                    entry.expires_at = Some(ttl_deadline(now, ttl));
                    CacheReply::Int(1)
                }
                None => CacheReply::Int(0),
            },
            CacheCommand::ZAdd { key, members } => {
                if members.is_empty() {
                    return Ok(CacheReply::Int(0));
                }
                let entry = map.entry(key.clone()).or_insert_with(|| Entry {
                    value: Value::Sorted(SortedSet::default()),
                    expires_at: None,
                });
                let zset = match &mut entry.value {
                    Value::Sorted(z) => z,
                    other => return Err(wrong_type(&key, other)),
                };
                let added = members
                    .into_iter()
                    .filter(|(member, score)| zset.insert(member.clone(), *score))
                    .count();
                CacheReply::Int(added as i64)
            }
            CacheCommand::ZRem { key, member } => {
                let removed = with_zset(map, &key, |z| z.remove(&member))?.unwrap_or(false);
                CacheReply::Int(i64::from(removed))
            }
            CacheCommand::ZRemRangeByScore { key, min, max } => {
                let removed = with_zset(map, &key, |z| {
                    let doomed: Vec<String> =
                        z.in_range(min, max).map(|(_, m)| m.clone()).collect();
                    doomed.iter().filter(|m| z.remove(m)).count()
                })?
                .unwrap_or(0);
                CacheReply::Int(removed as i64)
            }
            CacheCommand::ZCount { key, min, max } => {
                let count = with_zset(map, &key, |z| z.in_range(min, max).count())?.unwrap_or(0);
                CacheReply::Int(count as i64)
            }
            CacheCommand::ZRevRange { key, start, stop } => {
                let members = with_zset(map, &key, |z| {
                    rank_range(start, stop, z.len())
                        .map(|(from, to)| {
                            z.ordered
                                .iter()
                                .rev()
                                .skip(from)
                                .take(to - from + 1)
                                .map(|(_, m)| m.clone())
                                .collect::<Vec<String>>()
                        })
                        .unwrap_or_default()
                })?
                .unwrap_or_default();
                CacheReply::List(members)
            }
            CacheCommand::SAdd { key, member } => {
                let entry = map.entry(key.clone()).or_insert_with(|| Entry {
                    value: Value::Set(BTreeSet::new()),
                    expires_at: None,
                });
                let set = match &mut entry.value {
                    Value::Set(s) => s,
                    other => return Err(wrong_type(&key, other)),
                };
                CacheReply::Int(i64::from(set.insert(member)))
            }
            CacheCommand::SRem { key, member } => {
                let removed = with_set(map, &key, |s| s.remove(&member))?.unwrap_or(false);
                CacheReply::Int(i64::from(removed))
            }
            CacheCommand::SMembers { key } => {
                let members = with_set(map, &key, |s| s.iter().cloned().collect())?
                    .unwrap_or_default();
                CacheReply::List(members)
            }
            CacheCommand::SCard { key } => {
                let n = with_set(map, &key, |s| s.len())?.unwrap_or(0);
                CacheReply::Int(n as i64)
            }
        };

        // Collections that become empty cease to exist.
        if map.get(&key).is_some_and(|e| e.value.is_empty()) {
            map.remove(&key);
        }

        Ok(reply)
    }
}

fn command_key(command: &CacheCommand) -> &str {
    match command {
        CacheCommand::Get { key }
        | CacheCommand::Set { key, .. }
        | CacheCommand::Del { key }
        | CacheCommand::Exists { key }
        | CacheCommand::Expire { key, .. }
        | CacheCommand::ZAdd { key, .. }
        | CacheCommand::ZRem { key, .. }
        | CacheCommand::ZRemRangeByScore { key, .. }
        | CacheCommand::ZCount { key, .. }
        | CacheCommand::ZRevRange { key, .. }
        | CacheCommand::SAdd { key, .. }
        | CacheCommand::SRem { key, .. }
        | CacheCommand::SMembers { key }
        | CacheCommand::SCard { key } => key,
    }
}

fn with_zset<T>(
    map: &mut HashMap<String, Entry>,
    key: &str,
    f: impl FnOnce(&mut SortedSet) -> T,
) -> Result<Option<T>, PitwallError> {
    match map.get_mut(key) {
        None => Ok(None),
        Some(Entry {
            value: Value::Sorted(z),
            ..
        }) => Ok(Some(f(z))),
        Some(other) => Err(wrong_type(key, &other.value)),
    }
}

fn with_set<T>(
    map: &mut HashMap<String, Entry>,
    key: &str,
    f: impl FnOnce(&mut BTreeSet<String>) -> T,
) -> Result<Option<T>, PitwallError> {
    match map.get_mut(key) {
        None => Ok(None),
        Some(Entry {
            value: Value::Set(s),
            ..
        }) => Ok(Some(f(s))),
        Some(other) => Err(wrong_type(key, &other.value)),
    }
}

#[async_trait]
impl PluginAdapter for InMemoryCache {
    fn name(&self) -> &str {
        "memory-cache"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Cache
    }

    async fn health_check(&self) -> Result<HealthStatus, PitwallError> {
        match self.entries.lock() {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(_) => Ok(HealthStatus::Unhealthy("cache lock poisoned".into())),
        }
    }

    async fn shutdown(&self) -> Result<(), PitwallError> {
        Ok(())
    }
}

#[async_trait]
impl CacheStore for InMemoryCache {
    async fn execute(&self, pipeline: Pipeline) -> Result<Vec<CacheReply>, PitwallError> {
        let now = self.clock.now_ms();
        let mut map = self
            .entries
            .lock()
            .map_err(|_| PitwallError::cache("cache lock poisoned"))?;
        pipeline
            .into_commands()
            .into_iter()
            .map(|command| Self::apply(&mut map, now, command))
            .collect()
    }
}
