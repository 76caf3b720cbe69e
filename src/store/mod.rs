// src/store/mod.rs
//! Channel store
//!
//! Ordered collection of typed channels plus session metadata (duration,
//! provenance history) for one data file. Channels are kept in an arena:
//! each carries a stable internal handle that is never reused, while the
//! externally visible id is the 1-based position in current order, recomputed
//! per query. Ids are only valid for a single read-modify-write transaction;
//! callers must re-resolve them after any mutation.

pub mod persistence;

use crate::channel::{Channel, ChannelType};
use crate::error::{Error, Result, Warning};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Externally visible 1-based channel position
pub type ChannelId = usize;

/// Stable internal channel handle, never reused within a store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelHandle(u64);

/// Which matches of a kind-based query to act on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    First,
    Last,
    All,
}

/// Target of a replace or delete
#[derive(Debug, Clone, PartialEq)]
pub enum WriteTarget {
    Id(ChannelId),
    Kind(ChannelType),
}

impl std::fmt::Display for WriteTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteTarget::Id(id) => write!(f, "channel {}", id),
            WriteTarget::Kind(kind) => write!(f, "channel type '{}'", kind),
        }
    }
}

/// How a preprocessing result is written back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    Add,
    Replace,
}

/// Action verb recorded in history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteAction {
    Added,
    Replaced,
    Deleted,
}

impl std::fmt::Display for WriteAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteAction::Added => write!(f, "added"),
            WriteAction::Replaced => write!(f, "replaced"),
            WriteAction::Deleted => write!(f, "deleted"),
        }
    }
}

/// One provenance record; the verb and timestamp are always attached, the
/// message text may come from the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub action: WriteAction,
    pub channel_tag: String,
    pub channel_id: ChannelId,
    pub message: String,
}

/// Outcome of a mutating write
#[derive(Debug, Clone, PartialEq)]
pub struct WriteReport {
    pub id: ChannelId,
    pub action: WriteAction,
    pub warnings: Vec<Warning>,
}

struct StoredChannel {
    handle: ChannelHandle,
    channel: Channel,
}

/// Ordered channel collection with provenance history
#[derive(Default)]
pub struct ChannelStore {
    slots: Vec<StoredChannel>,
    next_handle: u64,
    history: Vec<HistoryEntry>,
    duration_s: f64,
}

impl ChannelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from persisted parts (handles are process-local and
    /// assigned fresh)
    pub(crate) fn from_parts(
        channels: Vec<Channel>,
        history: Vec<HistoryEntry>,
        duration_s: f64,
    ) -> Self {
        let mut store = Self {
            slots: Vec::with_capacity(channels.len()),
            next_handle: 0,
            history,
            duration_s,
        };
        for channel in channels {
            let handle = store.fresh_handle();
            store.slots.push(StoredChannel { handle, channel });
        }
        store
    }

    pub fn channel_count(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Total session duration in seconds, the maximum span over all channels
    /// ever written
    pub fn duration_s(&self) -> f64 {
        self.duration_s
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Channels in id order
    pub fn channels(&self) -> impl Iterator<Item = (ChannelId, &Channel)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .map(|(idx, slot)| (idx + 1, &slot.channel))
    }

    /// Channel by 1-based id
    pub fn channel(&self, id: ChannelId) -> Result<&Channel> {
        self.slot_index(id).map(|idx| &self.slots[idx].channel)
    }

    /// Stable handle of the channel currently at `id`
    pub fn handle(&self, id: ChannelId) -> Result<ChannelHandle> {
        self.slot_index(id).map(|idx| self.slots[idx].handle)
    }

    /// Current id of a handle, if the channel still exists
    pub fn resolve_handle(&self, handle: ChannelHandle) -> Option<ChannelId> {
        self.slots
            .iter()
            .position(|slot| slot.handle == handle)
            .map(|idx| idx + 1)
    }

    /// All channels of a kind, in id order, narrowed by `policy`
    ///
    /// Fails with `NotFound` when nothing matches.
    pub fn select_by_kind(
        &self,
        kind: &ChannelType,
        policy: MatchPolicy,
    ) -> Result<Vec<(ChannelId, &Channel)>> {
        let matches: Vec<_> = self
            .channels()
            .filter(|(_, c)| &c.kind == kind)
            .collect();
        if matches.is_empty() {
            return Err(Error::NotFound(format!("channel type '{}'", kind)));
        }
        Ok(apply_policy(matches, policy))
    }

    /// Channels satisfying a predicate, in id order
    pub fn select_where<F>(&self, predicate: F) -> Result<Vec<(ChannelId, &Channel)>>
    where
        F: Fn(&Channel) -> bool,
    {
        let matches: Vec<_> = self.channels().filter(|&(_, c)| predicate(c)).collect();
        if matches.is_empty() {
            return Err(Error::NotFound("no channel matches predicate".to_string()));
        }
        Ok(matches)
    }

    /// Append one channel; the new id is the next available position
    pub fn add(&mut self, channel: Channel, message: Option<&str>) -> ChannelId {
        let id = self.push_channel(channel);
        let tag = self.slots[id - 1].channel.kind.tag().to_string();
        self.log_history(WriteAction::Added, &tag, id, message);
        debug!(channel = %tag, id, "channel added");
        id
    }

    /// Append several channels as one operation
    pub fn add_all(&mut self, channels: Vec<Channel>, message: Option<&str>) -> Vec<ChannelId> {
        let mut ids = Vec::with_capacity(channels.len());
        for channel in channels {
            ids.push(self.push_channel(channel));
        }
        if let (Some(&first), Some(&last)) = (ids.first(), ids.last()) {
            let tag = self.slots[first - 1].channel.kind.tag().to_string();
            let default = format!("added channels {}..={}", first, last);
            self.log_history(WriteAction::Added, &tag, first, message.or(Some(default.as_str())));
        }
        ids
    }

    /// Substitute the full payload of the targeted channel
    ///
    /// Zero matches degrade to an `add` with a warning; more than one match
    /// fails with `AmbiguousTarget` (replace never acts on multiple ids).
    pub fn replace(
        &mut self,
        target: &WriteTarget,
        channel: Channel,
        message: Option<&str>,
    ) -> Result<WriteReport> {
        let matched = self.resolve_target(target);
        match matched.len() {
            0 => {
                let id = self.push_channel(channel);
                let tag = self.slots[id - 1].channel.kind.tag().to_string();
                let warning = Warning::ReplaceDegradedToAdd {
                    tag: tag.clone(),
                    id,
                };
                warn!(%target, id, "nothing to replace; degraded to add");
                self.log_history(WriteAction::Added, &tag, id, message);
                Ok(WriteReport {
                    id,
                    action: WriteAction::Added,
                    warnings: vec![warning],
                })
            }
            1 => {
                let id = matched[0];
                let tag = channel.kind.tag().to_string();
                self.slots[id - 1].channel = channel;
                self.duration_s = self.duration_s.max(self.slots[id - 1].channel.duration_s());
                self.log_history(WriteAction::Replaced, &tag, id, message);
                debug!(channel = %tag, id, "channel replaced");
                Ok(WriteReport {
                    id,
                    action: WriteAction::Replaced,
                    warnings: Vec::new(),
                })
            }
            n => Err(Error::AmbiguousTarget {
                query: target.to_string(),
                matched: n,
            }),
        }
    }

    /// Write back under the given mode; `Add` appends, `Replace` targets the
    /// channel kind
    pub fn write(
        &mut self,
        channel: Channel,
        mode: WriteMode,
        message: Option<&str>,
    ) -> Result<WriteReport> {
        match mode {
            WriteMode::Add => {
                let id = self.add(channel, message);
                Ok(WriteReport {
                    id,
                    action: WriteAction::Added,
                    warnings: Vec::new(),
                })
            }
            WriteMode::Replace => {
                let target = WriteTarget::Kind(channel.kind.clone());
                self.replace(&target, channel, message)
            }
        }
    }

    /// Remove matching channels; removal reindexes subsequent ids
    ///
    /// `First`/`Last` fail with `NotFound` on an empty match; `All` treats an
    /// empty match as a no-op and returns the empty list.
    pub fn delete(
        &mut self,
        target: &WriteTarget,
        policy: MatchPolicy,
        message: Option<&str>,
    ) -> Result<Vec<ChannelId>> {
        let matched = self.resolve_target(target);
        if matched.is_empty() {
            if policy == MatchPolicy::All {
                return Ok(Vec::new());
            }
            return Err(Error::NotFound(target.to_string()));
        }

        let selected: Vec<ChannelId> = match policy {
            MatchPolicy::First => vec![matched[0]],
            MatchPolicy::Last => vec![matched[matched.len() - 1]],
            MatchPolicy::All => matched,
        };

        let tag = self.slots[selected[0] - 1].channel.kind.tag().to_string();
        // Remove from the back so earlier indices stay valid
        for &id in selected.iter().rev() {
            self.slots.remove(id - 1);
        }
        let default = if selected.len() == 1 {
            format!("deleted {} channel {}", tag, selected[0])
        } else {
            format!("deleted {} {} channels", selected.len(), tag)
        };
        self.log_history(
            WriteAction::Deleted,
            &tag,
            selected[0],
            message.or(Some(default.as_str())),
        );
        debug!(channel = %tag, count = selected.len(), "channels deleted");
        Ok(selected)
    }

    fn fresh_handle(&mut self) -> ChannelHandle {
        let handle = ChannelHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }

    fn push_channel(&mut self, channel: Channel) -> ChannelId {
        self.duration_s = self.duration_s.max(channel.duration_s());
        let handle = self.fresh_handle();
        self.slots.push(StoredChannel { handle, channel });
        self.slots.len()
    }

    fn slot_index(&self, id: ChannelId) -> Result<usize> {
        if id == 0 || id > self.slots.len() {
            return Err(Error::NotFound(format!(
                "channel {} (store holds {})",
                id,
                self.slots.len()
            )));
        }
        Ok(id - 1)
    }

    fn resolve_target(&self, target: &WriteTarget) -> Vec<ChannelId> {
        match target {
            WriteTarget::Id(id) => {
                if *id >= 1 && *id <= self.slots.len() {
                    vec![*id]
                } else {
                    Vec::new()
                }
            }
            WriteTarget::Kind(kind) => self
                .channels()
                .filter(|(_, c)| &c.kind == kind)
                .map(|(id, _)| id)
                .collect(),
        }
    }

    fn log_history(
        &mut self,
        action: WriteAction,
        tag: &str,
        id: ChannelId,
        message: Option<&str>,
    ) {
        let message = message
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} {} channel {}", action, tag, id));
        self.history.push(HistoryEntry {
            timestamp: Utc::now(),
            action,
            channel_tag: tag.to_string(),
            channel_id: id,
            message,
        });
    }

    pub(crate) fn into_parts(self) -> (Vec<Channel>, Vec<HistoryEntry>, f64) {
        let channels = self.slots.into_iter().map(|slot| slot.channel).collect();
        (channels, self.history, self.duration_s)
    }

    pub(crate) fn parts_ref(&self) -> (Vec<&Channel>, &[HistoryEntry], f64) {
        let channels = self.slots.iter().map(|slot| &slot.channel).collect();
        (channels, self.history.as_slice(), self.duration_s)
    }
}

fn apply_policy(matches: Vec<(ChannelId, &Channel)>, policy: MatchPolicy) -> Vec<(ChannelId, &Channel)> {
    match policy {
        MatchPolicy::First => matches.into_iter().take(1).collect(),
        MatchPolicy::Last => {
            let n = matches.len();
            matches.into_iter().skip(n - 1).collect()
        }
        MatchPolicy::All => matches,
    }
}
