//! Snapshot source abstraction.
//!
//! The dashboard consumes broker metrics through the [`SnapshotSource`]
//! trait. The production implementation is [`ManagementClient`], which
//! talks to the RabbitMQ management HTTP API; tests substitute scripted
//! sources.

mod error;
mod management;

pub use error::FetchError;
pub use management::{ManagementClient, ManagementClientBuilder};

use std::fmt::Debug;

use crate::data::Snapshot;

/// Trait for obtaining broker snapshots.
///
/// # Example
///
/// ```no_run
/// use rabbit_top::source::{ManagementClient, SnapshotSource};
///
/// let mut source = ManagementClient::builder().host("localhost").build()?;
/// match source.fetch() {
///     Ok(snapshot) => println!("Got {} nodes", snapshot.nodes.len()),
///     Err(e) => eprintln!("{}", e),
/// }
/// # Ok::<(), rabbit_top::source::FetchError>(())
/// ```
pub trait SnapshotSource: Send + Debug {
    /// Fetch a complete snapshot.
    ///
    /// Blocks until the snapshot is fetched or the request fails. Partial
    /// results are never returned.
    fn fetch(&mut self) -> Result<Snapshot, FetchError>;

    /// Returns a human-readable description of the source.
    ///
    /// Shown in the error banner and in log records.
    fn description(&self) -> &str;
}
