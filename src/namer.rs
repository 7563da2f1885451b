//! Cluster identifiers that do not collide between clusters running
//! concurrently on the same host.

use rand::Rng;

use crate::constants::CLUSTER_NAME_PREFIX;
use crate::constants::CLUSTER_NAME_RANDOM_BOUND;
use crate::utils::time::get_now_as_nanos;

pub struct ClusterNamer;

impl ClusterNamer {
    /// Produces `rs_<0..999>_<nanosecond timestamp>`.
    ///
    /// The name doubles as the replica set id and the default base folder
    /// name, so it only contains `[a-z0-9_]`.
    pub fn generate() -> String {
        let salt = rand::thread_rng().gen_range(0..CLUSTER_NAME_RANDOM_BOUND);
        format!("{}_{}_{}", CLUSTER_NAME_PREFIX, salt, get_now_as_nanos())
    }
}
