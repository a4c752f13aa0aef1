//! Snapshot data model.
//!
//! A [`Snapshot`] is one complete poll of the broker: cluster identity,
//! per-node resource usage, per-queue depths and the aggregate counters.
//! It is produced by a [`SnapshotSource`](crate::source::SnapshotSource)
//! and replaced wholesale on every poll.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Queue state reported by the broker for queues with no recent activity.
pub const IDLE_STATE: &str = "idle";

/// A message count paired with its instantaneous rate (msg/s).
///
/// The rate is `None` when the broker did not report one.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CountRate {
    pub count: u64,
    pub rate: Option<f64>,
}

impl CountRate {
    pub fn new(count: u64, rate: Option<f64>) -> Self {
        Self { count, rate }
    }
}

/// A used/limit resource pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Usage {
    pub used: u64,
    pub limit: u64,
}

impl Usage {
    pub fn new(used: u64, limit: u64) -> Self {
        Self { used, limit }
    }
}

/// Resource statistics for one broker node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeStats {
    pub name: String,
    pub node_type: String,
    pub pid: String,
    pub running: bool,
    pub uptime: Duration,
    pub file_descriptors: Usage,
    pub sockets: Usage,
    pub memory: Usage,
    pub processes: Usage,
    /// Free disk space in bytes.
    pub disk_free: u64,
    /// Free-space level at which the broker raises the disk alarm.
    pub disk_free_limit: u64,
    pub mem_alarm: bool,
    pub disk_free_alarm: bool,
}

/// Depth and rate statistics for one queue.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueStats {
    pub name: String,
    pub vhost: String,
    pub state: String,
    pub exclusive: bool,
    pub policy: String,
    /// Queue argument keys, e.g. `x-message-ttl`.
    pub params: Vec<String>,
    pub ready: CountRate,
    pub unacked: CountRate,
    pub total: CountRate,
}

impl QueueStats {
    /// Returns true when the broker reports the queue as idle.
    pub fn is_idle(&self) -> bool {
        self.state == IDLE_STATE
    }
}

/// Cluster-wide message totals, in a fixed display order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MessageTotals {
    pub total: CountRate,
    pub ready: CountRate,
    pub unacknowledged: CountRate,
}

impl MessageTotals {
    /// Entries in display order: total, ready, unacknowledged.
    pub fn entries(&self) -> [(&'static str, CountRate); 3] {
        [
            ("total", self.total),
            ("ready", self.ready),
            ("unacknowledged", self.unacknowledged),
        ]
    }
}

/// Cluster-wide delivery rates (msg/s).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DeliveryRates {
    pub publish: Option<f64>,
    pub ack: Option<f64>,
    pub confirm: Option<f64>,
}

impl DeliveryRates {
    /// Entries in display order: Publish, Ack, Confirm.
    pub fn entries(&self) -> [(&'static str, Option<f64>); 3] {
        [
            ("Publish", self.publish),
            ("Ack", self.ack),
            ("Confirm", self.confirm),
        ]
    }
}

/// Cluster-wide object counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObjectTotals {
    pub connections: u64,
    pub channels: u64,
    pub exchanges: u64,
    pub queues: u64,
    pub consumers: u64,
}

impl ObjectTotals {
    /// Entries in display order.
    pub fn entries(&self) -> [(&'static str, u64); 5] {
        [
            ("connections", self.connections),
            ("channels", self.channels),
            ("exchanges", self.exchanges),
            ("queues", self.queues),
            ("consumers", self.consumers),
        ]
    }
}

/// One complete, immutable set of cluster metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub rabbitmq_version: String,
    pub erlang_version: String,
    pub cluster_name: Option<String>,
    pub nodes: Vec<NodeStats>,
    pub queues: Vec<QueueStats>,
    pub messages: MessageTotals,
    pub delivery: DeliveryRates,
    pub objects: ObjectTotals,
    pub fetched_at: DateTime<Utc>,
}

impl Snapshot {
    /// Queues in snapshot order, excluding idle queues when `active_only`.
    pub fn visible_queues(&self, active_only: bool) -> Vec<&QueueStats> {
        self.queues
            .iter()
            .filter(|q| !active_only || !q.is_idle())
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn node(name: &str) -> NodeStats {
        NodeStats {
            name: name.to_string(),
            node_type: "disc".to_string(),
            pid: "4242".to_string(),
            running: true,
            uptime: Duration::from_secs(3_600),
            file_descriptors: Usage::new(40, 1024),
            sockets: Usage::new(10, 100),
            memory: Usage::new(10, 100),
            processes: Usage::new(300, 1_048_576),
            disk_free: 50 * 1024 * 1024 * 1024,
            disk_free_limit: 50 * 1024 * 1024,
            mem_alarm: false,
            disk_free_alarm: false,
        }
    }

    pub fn queue(name: &str, state: &str) -> QueueStats {
        QueueStats {
            name: name.to_string(),
            vhost: "/".to_string(),
            state: state.to_string(),
            exclusive: false,
            policy: String::new(),
            params: Vec::new(),
            ready: CountRate::new(1, Some(0.0)),
            unacked: CountRate::new(0, Some(0.0)),
            total: CountRate::new(1, Some(0.0)),
        }
    }

    pub fn snapshot(nodes: Vec<NodeStats>, queues: Vec<QueueStats>) -> Snapshot {
        Snapshot {
            rabbitmq_version: "3.12.4".to_string(),
            erlang_version: "26.0".to_string(),
            cluster_name: Some("rabbit@test".to_string()),
            nodes,
            queues,
            messages: MessageTotals::default(),
            delivery: DeliveryRates::default(),
            objects: ObjectTotals::default(),
            fetched_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    /// `count` running queues named `q00`, `q01`, ...
    pub fn queues(count: usize) -> Vec<QueueStats> {
        (0..count).map(|i| queue(&format!("q{i:02}"), "running")).collect()
    }
}
