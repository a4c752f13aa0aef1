//! RabbitMQ management HTTP API client.
//!
//! Builds a [`Snapshot`] from three endpoints of the management plugin
//! (typically on port 15672):
//!
//! - `/api/overview` for versions, cluster name and aggregate counters
//! - `/api/nodes` for per-node resource usage
//! - `/api/queues[/<vhost>]` for queue depths and rates
//!
//! The client is async (`reqwest`) but the dashboard loop is synchronous, so
//! each fetch is driven to completion on a private current-thread runtime.
//!
//! ## Example
//!
//! ```rust,no_run
//! use rabbit_top::source::{ManagementClient, SnapshotSource};
//!
//! let mut client = ManagementClient::builder()
//!     .host("rabbit.local")
//!     .port(15672)
//!     .credentials("guest", "guest")
//!     .build()?;
//!
//! let snapshot = client.fetch()?;
//! println!("{} queues", snapshot.queues.len());
//! # Ok::<(), rabbit_top::source::FetchError>(())
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::runtime::Runtime;
use tracing::debug;

use super::{FetchError, SnapshotSource};
use crate::data::{
    CountRate, DeliveryRates, MessageTotals, NodeStats, ObjectTotals, QueueStats, Snapshot, Usage,
};

/// Snapshot source backed by the RabbitMQ management API.
pub struct ManagementClient {
    client: Client,
    runtime: Runtime,
    base_url: String,
    username: String,
    password: String,
    vhost: Option<String>,
    description: String,
}

impl fmt::Debug for ManagementClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagementClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("vhost", &self.vhost)
            .finish_non_exhaustive()
    }
}

impl ManagementClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> ManagementClientBuilder {
        ManagementClientBuilder::default()
    }

    /// Returns the base URL of the management API.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn queues_path(&self) -> String {
        match self.vhost.as_deref() {
            Some(vhost) if !vhost.is_empty() => format!("queues/{}", urlencoded(vhost)),
            _ => "queues".to_string(),
        }
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = format!("{}/api/{}", self.base_url, path);
        debug!(%url, "management API request");

        self.runtime.block_on(async {
            let response = self
                .client
                .get(&url)
                .basic_auth(&self.username, Some(&self.password))
                .send()
                .await?;

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(FetchError::Authentication(format!(
                    "{} rejected user '{}'",
                    status, self.username
                )));
            }
            if !status.is_success() {
                return Err(FetchError::Network(format!("API returned status {}", status)));
            }

            let body = response.text().await?;
            Ok::<T, FetchError>(serde_json::from_str(&body)?)
        })
    }
}

impl SnapshotSource for ManagementClient {
    fn fetch(&mut self) -> Result<Snapshot, FetchError> {
        let overview: OverviewInfo = self.get_json("overview")?;
        let nodes: Vec<NodeInfo> = self.get_json("nodes")?;
        let queues: Vec<QueueInfo> = self.get_json(&self.queues_path())?;
        Ok(build_snapshot(overview, nodes, queues, Utc::now()))
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Builder for [`ManagementClient`].
#[derive(Debug, Default)]
pub struct ManagementClientBuilder {
    host: Option<String>,
    port: Option<u16>,
    https: bool,
    username: Option<String>,
    password: Option<String>,
    vhost: Option<String>,
    timeout: Option<Duration>,
}

impl ManagementClientBuilder {
    /// Set the broker host (default: "localhost").
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the management API port (default: 15672).
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Use `https` instead of `http`.
    pub fn https(mut self, https: bool) -> Self {
        self.https = https;
        self
    }

    /// Set the username and password for authentication.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Restrict the queue listing to one vhost (default: all vhosts).
    pub fn vhost(mut self, vhost: Option<String>) -> Self {
        self.vhost = vhost;
        self
    }

    /// Set the per-request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<ManagementClient, FetchError> {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(10));

        let client = Client::builder().timeout(timeout).build()?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| FetchError::Network(format!("failed to start runtime: {}", e)))?;

        let scheme = if self.https { "https" } else { "http" };
        let host = self.host.unwrap_or_else(|| "localhost".to_string());
        let port = self.port.unwrap_or(15672);
        let base_url = format!("{}://{}:{}", scheme, host, port);
        let vhost = self.vhost.filter(|v| !v.is_empty());
        let description = match &vhost {
            Some(v) => format!("{} vhost {}", base_url, v),
            None => base_url.clone(),
        };

        Ok(ManagementClient {
            client,
            runtime,
            base_url,
            username: self.username.unwrap_or_else(|| "guest".to_string()),
            password: self.password.unwrap_or_else(|| "guest".to_string()),
            vhost,
            description,
        })
    }
}

// URL encode a vhost for use in a path segment
fn urlencoded(s: &str) -> String {
    s.replace('%', "%25").replace('/', "%2F").replace(' ', "%20")
}

/// Convert raw management API payloads into a [`Snapshot`].
fn build_snapshot(
    overview: OverviewInfo,
    nodes: Vec<NodeInfo>,
    queues: Vec<QueueInfo>,
    fetched_at: DateTime<Utc>,
) -> Snapshot {
    let totals = &overview.queue_totals;
    let messages = MessageTotals {
        total: CountRate::new(totals.messages, rate_of(&totals.messages_details)),
        ready: CountRate::new(totals.messages_ready, rate_of(&totals.messages_ready_details)),
        unacknowledged: CountRate::new(
            totals.messages_unacknowledged,
            rate_of(&totals.messages_unacknowledged_details),
        ),
    };

    let stats = &overview.message_stats;
    let delivery = DeliveryRates {
        publish: rate_of(&stats.publish_details),
        ack: rate_of(&stats.ack_details),
        confirm: rate_of(&stats.confirm_details),
    };

    let objects = ObjectTotals {
        connections: overview.object_totals.connections,
        channels: overview.object_totals.channels,
        exchanges: overview.object_totals.exchanges,
        queues: overview.object_totals.queues,
        consumers: overview.object_totals.consumers,
    };

    Snapshot {
        rabbitmq_version: overview.rabbitmq_version,
        erlang_version: overview.erlang_version,
        cluster_name: overview.cluster_name,
        nodes: nodes.into_iter().map(NodeInfo::into_stats).collect(),
        queues: queues.into_iter().map(QueueInfo::into_stats).collect(),
        messages,
        delivery,
        objects,
        fetched_at,
    }
}

fn rate_of(details: &Option<RateDetails>) -> Option<f64> {
    details.as_ref().map(|d| d.rate)
}

/// `/api/overview` response.
#[derive(Debug, Deserialize)]
struct OverviewInfo {
    rabbitmq_version: String,
    erlang_version: String,
    #[serde(default)]
    cluster_name: Option<String>,
    #[serde(default)]
    queue_totals: QueueTotals,
    #[serde(default)]
    object_totals: ObjectTotalsInfo,
    #[serde(default)]
    message_stats: MessageStats,
}

#[derive(Debug, Default, Deserialize)]
struct QueueTotals {
    #[serde(default)]
    messages: u64,
    #[serde(default)]
    messages_details: Option<RateDetails>,
    #[serde(default)]
    messages_ready: u64,
    #[serde(default)]
    messages_ready_details: Option<RateDetails>,
    #[serde(default)]
    messages_unacknowledged: u64,
    #[serde(default)]
    messages_unacknowledged_details: Option<RateDetails>,
}

#[derive(Debug, Default, Deserialize)]
struct ObjectTotalsInfo {
    #[serde(default)]
    connections: u64,
    #[serde(default)]
    channels: u64,
    #[serde(default)]
    exchanges: u64,
    #[serde(default)]
    queues: u64,
    #[serde(default)]
    consumers: u64,
}

#[derive(Debug, Default, Deserialize)]
struct MessageStats {
    #[serde(default)]
    publish_details: Option<RateDetails>,
    #[serde(default)]
    ack_details: Option<RateDetails>,
    #[serde(default)]
    confirm_details: Option<RateDetails>,
}

#[derive(Debug, Deserialize)]
struct RateDetails {
    rate: f64,
}

/// One entry of the `/api/nodes` response.
#[derive(Debug, Deserialize)]
struct NodeInfo {
    name: String,
    #[serde(rename = "type")]
    node_type: String,
    #[serde(default = "default_running")]
    running: bool,
    // Stopped members report little beyond name, type and running.
    #[serde(default)]
    os_pid: serde_json::Value,
    #[serde(default)]
    uptime: u64,
    #[serde(default)]
    fd_used: u64,
    #[serde(default)]
    fd_total: u64,
    // Newer brokers no longer report socket counts.
    #[serde(default)]
    sockets_used: u64,
    #[serde(default)]
    sockets_total: u64,
    #[serde(default)]
    mem_used: u64,
    #[serde(default)]
    mem_limit: u64,
    #[serde(default)]
    mem_alarm: bool,
    #[serde(default)]
    disk_free: u64,
    #[serde(default)]
    disk_free_limit: u64,
    #[serde(default)]
    disk_free_alarm: bool,
    #[serde(default)]
    proc_used: u64,
    #[serde(default)]
    proc_total: u64,
}

fn default_running() -> bool {
    true
}

impl NodeInfo {
    fn into_stats(self) -> NodeStats {
        let pid = match self.os_pid {
            serde_json::Value::String(s) => s,
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        };
        NodeStats {
            name: self.name,
            node_type: self.node_type,
            pid,
            running: self.running,
            uptime: Duration::from_millis(self.uptime),
            file_descriptors: Usage::new(self.fd_used, self.fd_total),
            sockets: Usage::new(self.sockets_used, self.sockets_total),
            memory: Usage::new(self.mem_used, self.mem_limit),
            processes: Usage::new(self.proc_used, self.proc_total),
            disk_free: self.disk_free,
            disk_free_limit: self.disk_free_limit,
            mem_alarm: self.mem_alarm,
            disk_free_alarm: self.disk_free_alarm,
        }
    }
}

/// One entry of the `/api/queues` response.
#[derive(Debug, Deserialize)]
struct QueueInfo {
    name: String,
    #[serde(default)]
    vhost: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    exclusive: bool,
    #[serde(default)]
    policy: Option<String>,
    #[serde(default)]
    arguments: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    messages: u64,
    #[serde(default)]
    messages_details: Option<RateDetails>,
    #[serde(default)]
    messages_ready: u64,
    #[serde(default)]
    messages_ready_details: Option<RateDetails>,
    #[serde(default)]
    messages_unacknowledged: u64,
    #[serde(default)]
    messages_unacknowledged_details: Option<RateDetails>,
}

impl QueueInfo {
    fn into_stats(self) -> QueueStats {
        QueueStats {
            ready: CountRate::new(self.messages_ready, rate_of(&self.messages_ready_details)),
            unacked: CountRate::new(
                self.messages_unacknowledged,
                rate_of(&self.messages_unacknowledged_details),
            ),
            total: CountRate::new(self.messages, rate_of(&self.messages_details)),
            name: self.name,
            vhost: self.vhost,
            state: self.state,
            exclusive: self.exclusive,
            policy: self.policy.unwrap_or_default(),
            params: self.arguments.into_keys().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OVERVIEW: &str = r#"{
        "rabbitmq_version": "3.12.4",
        "erlang_version": "26.0.2",
        "cluster_name": "rabbit@prod",
        "queue_totals": {
            "messages": 42, "messages_details": {"rate": 1.5},
            "messages_ready": 40, "messages_ready_details": {"rate": 1.0},
            "messages_unacknowledged": 2, "messages_unacknowledged_details": {"rate": 0.5}
        },
        "object_totals": {
            "connections": 3, "channels": 6, "exchanges": 9, "queues": 2, "consumers": 4
        },
        "message_stats": {"publish_details": {"rate": 12.0}, "ack_details": {"rate": 11.0}}
    }"#;

    const NODES: &str = r#"[{
        "name": "rabbit@node1", "type": "disc", "running": true, "os_pid": "123",
        "uptime": 90061000,
        "fd_used": 50, "fd_total": 1024,
        "sockets_used": 10, "sockets_total": 829,
        "mem_used": 80, "mem_limit": 100, "mem_alarm": false,
        "disk_free": 1000, "disk_free_limit": 50, "disk_free_alarm": false,
        "proc_used": 400, "proc_total": 1048576
    }]"#;

    const QUEUES: &str = r#"[
        {"name": "orders", "vhost": "/", "state": "running", "exclusive": false,
         "policy": "ha-all", "arguments": {"x-message-ttl": 60000, "x-dead-letter-exchange": "dlx"},
         "messages": 12, "messages_details": {"rate": 0.2},
         "messages_ready": 10, "messages_ready_details": {"rate": 0.1},
         "messages_unacknowledged": 2, "messages_unacknowledged_details": {"rate": 0.1}},
        {"name": "audit", "vhost": "/", "state": "idle", "policy": null}
    ]"#;

    fn parse(overview: &str, nodes: &str, queues: &str) -> Result<Snapshot, FetchError> {
        let overview: OverviewInfo = serde_json::from_str(overview)?;
        let nodes: Vec<NodeInfo> = serde_json::from_str(nodes)?;
        let queues: Vec<QueueInfo> = serde_json::from_str(queues)?;
        Ok(build_snapshot(overview, nodes, queues, DateTime::<Utc>::UNIX_EPOCH))
    }

    #[test]
    fn test_builder_defaults() {
        let client = ManagementClient::builder().build().unwrap();
        assert_eq!(client.base_url(), "http://localhost:15672");
        assert_eq!(client.username, "guest");
        assert_eq!(client.password, "guest");
        assert_eq!(client.vhost, None);
        assert_eq!(client.queues_path(), "queues");
    }

    #[test]
    fn test_builder_custom() {
        let client = ManagementClient::builder()
            .host("rabbit.local")
            .port(8443)
            .https(true)
            .credentials("admin", "secret")
            .vhost(Some("/".to_string()))
            .build()
            .unwrap();

        assert_eq!(client.base_url(), "https://rabbit.local:8443");
        assert_eq!(client.username, "admin");
        assert_eq!(client.queues_path(), "queues/%2F");
        assert_eq!(client.description(), "https://rabbit.local:8443 vhost /");
    }

    #[test]
    fn test_empty_vhost_means_all() {
        let client = ManagementClient::builder().vhost(Some(String::new())).build().unwrap();
        assert_eq!(client.queues_path(), "queues");
    }

    #[test]
    fn test_urlencoded() {
        assert_eq!(urlencoded("/"), "%2F");
        assert_eq!(urlencoded("my/vhost"), "my%2Fvhost");
        assert_eq!(urlencoded("50%"), "50%25");
        assert_eq!(urlencoded("simple"), "simple");
    }

    #[test]
    fn test_build_snapshot() {
        let snap = parse(OVERVIEW, NODES, QUEUES).unwrap();

        assert_eq!(snap.rabbitmq_version, "3.12.4");
        assert_eq!(snap.cluster_name.as_deref(), Some("rabbit@prod"));
        assert_eq!(snap.messages.total, CountRate::new(42, Some(1.5)));
        assert_eq!(snap.messages.unacknowledged, CountRate::new(2, Some(0.5)));
        assert_eq!(snap.delivery.publish, Some(12.0));
        assert_eq!(snap.delivery.confirm, None);
        assert_eq!(snap.objects.consumers, 4);

        let node = &snap.nodes[0];
        assert_eq!(node.pid, "123");
        assert_eq!(node.memory, Usage::new(80, 100));
        assert_eq!(node.uptime, Duration::from_secs(90_061));

        assert_eq!(snap.queues.len(), 2);
        let orders = &snap.queues[0];
        assert_eq!(orders.policy, "ha-all");
        assert_eq!(orders.params, vec!["x-dead-letter-exchange", "x-message-ttl"]);
        assert_eq!(orders.ready, CountRate::new(10, Some(0.1)));

        let audit = &snap.queues[1];
        assert!(audit.is_idle());
        assert_eq!(audit.policy, "");
        assert_eq!(audit.total, CountRate::new(0, None));
    }

    #[test]
    fn test_numeric_pid_and_missing_sockets() {
        let nodes = r#"[{
            "name": "rabbit@n", "type": "ram", "os_pid": 77, "uptime": 1000,
            "mem_used": 1, "mem_limit": 2, "disk_free": 3, "disk_free_limit": 1,
            "proc_used": 1, "proc_total": 10
        }]"#;
        let snap = parse(OVERVIEW, nodes, "[]").unwrap();
        assert_eq!(snap.nodes[0].pid, "77");
        assert_eq!(snap.nodes[0].sockets, Usage::new(0, 0));
        assert!(snap.nodes[0].running);
    }

    #[test]
    fn test_stopped_node_keeps_snapshot() {
        let nodes = r#"[
            {"name": "rabbit@up", "type": "disc", "running": true, "uptime": 1000,
             "mem_used": 1, "mem_limit": 2, "disk_free": 3, "disk_free_limit": 1,
             "proc_used": 1, "proc_total": 10},
            {"name": "rabbit@down", "type": "disc", "running": false}
        ]"#;
        let snap = parse(OVERVIEW, nodes, QUEUES).unwrap();
        assert_eq!(snap.nodes.len(), 2);
        assert_eq!(snap.queues.len(), 2);

        let down = &snap.nodes[1];
        assert_eq!(down.name, "rabbit@down");
        assert!(!down.running);
        assert_eq!(down.uptime, Duration::ZERO);
        assert_eq!(down.memory, Usage::new(0, 0));
        assert_eq!(down.disk_free_limit, 0);
    }

    #[test]
    fn test_missing_required_field_is_malformed() {
        let nodes = r#"[{"type": "disc", "running": true}]"#;
        let err = parse(OVERVIEW, nodes, "[]").unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));

        let err = parse(r#"{"erlang_version": "26"}"#, NODES, "[]").unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }
}
