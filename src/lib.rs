//! Ephemeral MongoDB replica-set harness.
//!
//! Launches `num_instances` local `mongod` processes on consecutive loopback
//! ports, bootstraps them into a replica set (or leaves a single host alone),
//! and tears everything down again, data directories included.
//!
//! ```ignore
//! let config = ClusterConfig {
//!     num_instances: 3,
//!     ..Default::default()
//! };
//! let mut cluster = ClusterManager::new(config)?;
//! cluster.start().await?;
//! println!("{:?}", cluster.get_hosts());
//! cluster.stop().await;
//! ```
mod admin;
mod cluster;
mod config;
mod errors;
mod namer;
mod probe;
mod provisioner;
mod status;
mod supervisor;
mod topology;
pub(crate) mod utils;

pub mod constants;

pub use admin::*;
pub use cluster::*;
pub use config::*;
pub use errors::*;
pub use namer::*;
pub use probe::*;
pub use provisioner::*;
pub use status::*;
pub use supervisor::*;
pub use topology::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
mod test_utils;
