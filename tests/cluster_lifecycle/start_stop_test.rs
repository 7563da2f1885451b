use std::sync::Arc;

use replset_harness::constants::SETUP_OUTPUT_FILE;
use replset_harness::constants::STATUS_OUTPUT_FILE;
use replset_harness::BootstrapMode;
use replset_harness::ClusterEvent;
use replset_harness::ClusterManager;
use replset_harness::Phase;
use tempfile::tempdir;

use crate::common::base_folder_in;
use crate::common::cluster_config;
use crate::common::AlwaysLive;
use crate::common::RecordingAdmin;
use crate::common::CLUSTER_PORT_BASE;

/// Three nodes: hosts in port order, bootstrap through the shell client,
/// then a full teardown.
#[tokio::test]
async fn test_replica_set_start_and_stop() {
    let temp_dir = tempdir().unwrap();
    let base = base_folder_in(&temp_dir);
    let port = CLUSTER_PORT_BASE;

    let mut config = cluster_config(3, port, &base);
    config.client.bootstrap = BootstrapMode::Eval;
    let mut cluster = ClusterManager::new(config)
        .unwrap()
        .with_liveness_probe(Arc::new(AlwaysLive));
    let mut events = cluster.subscribe();

    cluster.start().await.unwrap();

    assert_eq!(
        cluster.get_hosts(),
        [
            format!("127.0.0.1:{}", port),
            format!("127.0.0.1:{}", port + 1),
            format!("127.0.0.1:{}", port + 2),
        ]
    );
    assert_eq!(events.recv().await.unwrap(), ClusterEvent::InstancesLaunched);
    assert_eq!(events.recv().await.unwrap(), ClusterEvent::Ready);

    // the echo client prints its own arguments, so captured output mirrors the commands
    let setup = std::fs::read_to_string(base.join(SETUP_OUTPUT_FILE)).unwrap();
    assert!(setup.contains("rs.initiate("));
    assert!(setup.contains(&format!("rs.add(\"127.0.0.1:{}\");", port + 2)));
    let status = std::fs::read_to_string(base.join(STATUS_OUTPUT_FILE)).unwrap();
    assert!(status.contains("rs.status()"));

    cluster.stop().await;

    assert_eq!(events.recv().await.unwrap(), ClusterEvent::Stopped);
    assert_eq!(cluster.phase(), Phase::Stopped);
    assert!(!base.exists());
    assert!(cluster.nodes().iter().all(|n| n.has_exited()));
}

#[tokio::test]
async fn test_single_host_skips_bootstrap() {
    let temp_dir = tempdir().unwrap();
    let base = base_folder_in(&temp_dir);
    let port = CLUSTER_PORT_BASE + 10;

    let admin = Arc::new(RecordingAdmin::default());
    let mut cluster = ClusterManager::new(cluster_config(1, port, &base))
        .unwrap()
        .with_admin_client(admin.clone())
        .with_liveness_probe(Arc::new(AlwaysLive));

    cluster.start().await.unwrap();

    assert_eq!(cluster.get_hosts(), [format!("127.0.0.1:{}", port)]);
    let calls = admin.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].contains("ping"));

    cluster.stop().await;
    assert!(!base.exists());
}

#[tokio::test]
async fn test_script_bootstrap_runs_once() {
    let temp_dir = tempdir().unwrap();
    let base = base_folder_in(&temp_dir);
    let port = CLUSTER_PORT_BASE + 20;

    let admin = Arc::new(RecordingAdmin::default());
    let mut cluster = ClusterManager::new(cluster_config(2, port, &base))
        .unwrap()
        .with_admin_client(admin.clone())
        .with_liveness_probe(Arc::new(AlwaysLive));

    cluster.start().await.unwrap();

    let calls = admin.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].ends_with("setup.js"));
    assert!(calls[1].contains("rs.status()"));

    cluster.stop().await;
}

#[tokio::test]
async fn test_double_stop_is_harmless() {
    let temp_dir = tempdir().unwrap();
    let base = base_folder_in(&temp_dir);

    let mut cluster = ClusterManager::new(cluster_config(2, CLUSTER_PORT_BASE + 30, &base))
        .unwrap()
        .with_admin_client(Arc::new(RecordingAdmin::default()))
        .with_liveness_probe(Arc::new(AlwaysLive));
    let mut phases = cluster.watch_phase();

    cluster.start().await.unwrap();
    cluster.stop().await;
    cluster.stop().await;

    assert_eq!(*phases.borrow_and_update(), Phase::Stopped);
    assert!(!base.exists());
}
