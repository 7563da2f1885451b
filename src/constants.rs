// -
// Network

/// Every node binds and is addressed on the loopback interface
pub const LOOPBACK_IP: &str = "127.0.0.1";

/// Replica member id assigned to node 0 in the initiate command
pub(crate) const INITIAL_MEMBER_ID: u32 = 1;

// -
// On-disk layout under the base folder

/// Per-node data directory prefix: `data0`, `data1`, ...
pub(crate) const DATA_DIR_PREFIX: &str = "data";

/// Bootstrap script written when scripts are the delivery mechanism
pub const SETUP_SCRIPT_FILE: &str = "setup.js";

/// Captured output of the bootstrap commands
pub const SETUP_OUTPUT_FILE: &str = "setup-output.txt";

/// Captured output of the status query
pub const STATUS_OUTPUT_FILE: &str = "status-output.txt";

// -
// Naming

pub(crate) const CLUSTER_NAME_PREFIX: &str = "rs";

/// Upper bound (exclusive) of the random component of a cluster name
pub(crate) const CLUSTER_NAME_RANDOM_BOUND: u32 = 1000;

// -
// Admin client expressions

pub(crate) const REPLICA_STATUS_EXPR: &str = "JSON.stringify(rs.status());";
pub(crate) const HOST_STATUS_EXPR: &str = "JSON.stringify(db.adminCommand({ ping: 1 }));";

/// Environment variable prefix for configuration overrides: `REPLSET__NUM_INSTANCES=5`
pub(crate) const CONFIG_ENV_PREFIX: &str = "REPLSET";
