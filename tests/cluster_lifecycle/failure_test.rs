use std::sync::Arc;

use replset_harness::ClusterManager;
use replset_harness::Error;
use replset_harness::LaunchFailure;
use replset_harness::Phase;
use tempfile::tempdir;

use crate::common::base_folder_in;
use crate::common::cluster_config;
use crate::common::stand_in_server;
use crate::common::AlwaysLive;
use crate::common::RecordingAdmin;
use crate::common::CLUSTER_PORT_BASE;

/// A server that exits right away surfaces pid and exit code in the error.
#[tokio::test]
async fn test_launch_failure_reports_exit_details() {
    let temp_dir = tempdir().unwrap();
    let base = base_folder_in(&temp_dir);

    let mut config = cluster_config(2, CLUSTER_PORT_BASE + 40, &base);
    config.server = stand_in_server("echo 'bad option' >&2; exit 2");
    let admin = Arc::new(RecordingAdmin::default());
    let mut cluster = ClusterManager::new(config)
        .unwrap()
        .with_admin_client(admin.clone())
        .with_liveness_probe(Arc::new(AlwaysLive));

    let err = cluster.start().await.unwrap_err();

    let records = match &err {
        Error::Launch(LaunchFailure::Exited(records)) => records.clone(),
        other => panic!("expected LaunchFailure::Exited, got {other:?}"),
    };
    assert_eq!(records.len(), 2);
    let message = err.to_string();
    for node in cluster.nodes() {
        assert!(message.contains(&format!("{} exited with code 2", node.pid())));
    }
    assert!(admin.calls().is_empty());
    assert_eq!(cluster.phase(), Phase::Failed);

    cluster.stop().await;
    assert!(!base.exists());
}

#[tokio::test]
async fn test_missing_server_binary_fails_launch() {
    let temp_dir = tempdir().unwrap();
    let base = base_folder_in(&temp_dir);

    let mut config = cluster_config(3, CLUSTER_PORT_BASE + 50, &base);
    config.server.program = "/nonexistent/replset-harness/mongod".to_string();
    let mut cluster = ClusterManager::new(config)
        .unwrap()
        .with_admin_client(Arc::new(RecordingAdmin::default()))
        .with_liveness_probe(Arc::new(AlwaysLive));

    let result = cluster.start().await;

    assert!(matches!(
        result,
        Err(Error::Launch(LaunchFailure::Spawn { index: 0, .. }))
    ));
    assert!(cluster.nodes().is_empty());

    cluster.stop().await;
}

/// Bootstrap errors carry the failing command output; nodes stay up until stop().
#[tokio::test]
async fn test_initiation_failure_surfaces_command_output() {
    let temp_dir = tempdir().unwrap();
    let base = base_folder_in(&temp_dir);

    let mut config = cluster_config(2, CLUSTER_PORT_BASE + 60, &base);
    config.client.bootstrap = replset_harness::BootstrapMode::Eval;
    let admin = Arc::new(RecordingAdmin::failing_on("rs.add"));
    let mut cluster = ClusterManager::new(config)
        .unwrap()
        .with_admin_client(admin.clone())
        .with_liveness_probe(Arc::new(AlwaysLive));

    let err = cluster.start().await.unwrap_err();

    match &err {
        Error::Initiation(failure) => {
            assert!(failure.command().contains("rs.add"));
            assert!(failure.output().unwrap().contains("not reachable"));
        }
        other => panic!("expected InitiationFailure, got {other:?}"),
    }
    // initiate, then the failing add; no status query
    assert_eq!(admin.calls().len(), 2);
    assert_eq!(cluster.phase(), Phase::Failed);
    assert!(cluster.nodes().iter().all(|n| !n.has_exited()));

    cluster.stop().await;
    assert!(cluster.nodes().iter().all(|n| n.has_exited()));
}
