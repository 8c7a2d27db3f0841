//! Upload, download and direct membership queries across a loopback ring.

mod common;

use common::{name_in_slots, Cluster};
use ringshare::ring::natural_slot;
use ringshare::{Error, NodeEvent};

#[tokio::test]
async fn test_upload_then_download_by_slot_roundtrips() {
    let cluster = Cluster::start(&[1, 5, 9]).await;
    let name = name_in_slots(6..=9);
    let payload = b"the quick brown fox".to_vec();

    let receipt = cluster.node(1).upload_bytes(&name, payload.clone()).await.unwrap();
    assert_eq!(receipt.stored_at, 9);
    assert_eq!(receipt.slot, natural_slot(&name));
    assert!(!receipt.fallback);
    assert!(cluster.node(9).has_file(&name).await);
    assert!(!cluster.node(1).has_file(&name).await);

    let downloaded = cluster.node(5).download(receipt.slot).await.unwrap();
    assert_eq!(downloaded.filename, name);
    assert_eq!(downloaded.from, 9);
    assert_eq!(tokio::fs::read(&downloaded.path).await.unwrap(), payload);

    // Fetched copies are not served by the downloading node
    assert!(!cluster.node(5).has_file(&name).await);
}

#[tokio::test]
async fn test_upload_from_disk_uses_base_name() {
    let cluster = Cluster::start(&[1, 5, 9]).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("holiday.jpg");
    tokio::fs::write(&path, vec![7u8; 4096]).await.unwrap();

    let receipt = cluster.node(5).upload(&path).await.unwrap();
    assert_eq!(receipt.filename, "holiday.jpg");
    let owner = cluster.node(receipt.stored_at);
    assert_eq!(owner.local_files().await[0].filename, "holiday.jpg");

    let file = cluster.node(1).download_from(receipt.stored_at, "holiday.jpg").await.unwrap();
    assert_eq!(file.bytes, 4096);
}

#[tokio::test]
async fn test_wraparound_slot_goes_to_smallest_id() {
    let cluster = Cluster::start(&[1, 5, 9]).await;
    let name = name_in_slots(10..=31);

    let receipt = cluster.node(5).upload_bytes(&name, b"wrapped".to_vec()).await.unwrap();
    assert_eq!(receipt.stored_at, 1);
}

#[tokio::test]
async fn test_collision_relocates_to_next_free_slot() {
    let cluster = Cluster::start(&[1, 5, 9]).await;
    let mut events = cluster.node(1).subscribe();

    // "Aa" and "BB" share a hash and land on slot 0, owned by node 1
    let first = cluster.node(1).upload_bytes("Aa", b"first".to_vec()).await.unwrap();
    let second = cluster.node(1).upload_bytes("BB", b"second".to_vec()).await.unwrap();

    assert_eq!(first.slot, 0);
    assert!(!first.is_relocated());
    assert_eq!(second.natural_slot, 0);
    assert_eq!(second.slot, 1);
    assert!(second.is_relocated());

    let stored = events.recv().await.unwrap();
    assert!(matches!(stored, NodeEvent::StoredLocally { ref filename, slot: 0, .. } if filename == "Aa"));

    let outcome = cluster.node(5).search(1).await.unwrap();
    assert_eq!(outcome.filename(), Some("BB"));
    assert_eq!(outcome.resolved_by, Some(1));
}

#[tokio::test]
async fn test_reupload_keeps_slot_and_replaces_content() {
    let cluster = Cluster::start(&[1, 5, 9]).await;
    let name = name_in_slots(2..=5);

    let first = cluster.node(9).upload_bytes(&name, b"v1".to_vec()).await.unwrap();
    let second = cluster.node(9).upload_bytes(&name, b"v2".to_vec()).await.unwrap();
    assert_eq!(first.slot, second.slot);
    assert_eq!(cluster.node(5).local_files().await.len(), 1);

    let file = cluster.node(1).download_from(5, &name).await.unwrap();
    assert_eq!(tokio::fs::read(file.path).await.unwrap(), b"v2");
}

#[tokio::test]
async fn test_receiving_node_emits_file_received() {
    let cluster = Cluster::start(&[1, 5, 9]).await;
    let mut events = cluster.node(5).subscribe();
    let name = name_in_slots(2..=5);

    cluster.node(1).upload_bytes(&name, b"hello".to_vec()).await.unwrap();

    match events.recv().await.unwrap() {
        NodeEvent::FileReceived { filename, from, .. } => {
            assert_eq!(filename, name);
            assert_eq!(from, 1);
        },
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn test_direct_search_reports_membership() {
    let cluster = Cluster::start(&[1, 5, 9]).await;
    let name = name_in_slots(2..=5);
    cluster.node(1).upload_bytes(&name, b"x".to_vec()).await.unwrap();

    assert!(cluster.node(1).query_peer(5, &name).await.unwrap());
    assert!(!cluster.node(1).query_peer(9, &name).await.unwrap());
    assert!(!cluster.node(1).query_peer(1, &name).await.unwrap());
    assert!(matches!(cluster.node(1).query_peer(42, &name).await, Err(Error::UnknownPeer(42))));
}

#[tokio::test]
async fn test_download_missing_file_is_not_found() {
    let cluster = Cluster::start(&[1, 5, 9]).await;

    let err = cluster.node(1).download_from(5, "nothing.bin").await.unwrap_err();
    assert!(matches!(err, Error::FileNotFound(name) if name == "nothing.bin"));

    let err = cluster.node(1).download(3).await.unwrap_err();
    match err {
        Error::SearchFailed(outcome) => {
            assert!(!outcome.is_found());
            assert_eq!(outcome.resolved_by, Some(5));
        },
        other => panic!("unexpected error {other}"),
    }
}

#[tokio::test]
async fn test_delete_removes_entry_and_file() {
    let cluster = Cluster::start(&[1, 5, 9]).await;
    let name = name_in_slots(0..=1);

    let receipt = cluster.node(1).upload_bytes(&name, b"gone soon".to_vec()).await.unwrap();
    assert_eq!(receipt.stored_at, 1);
    let path = cluster.node(1).store().shared_path(&name).unwrap();
    assert!(path.exists());

    assert_eq!(cluster.node(1).delete(&name).await.unwrap(), receipt.slot);
    assert!(!path.exists());
    assert!(!cluster.node(1).has_file(&name).await);
    assert!(matches!(cluster.node(1).delete(&name).await, Err(Error::FileNotFound(_))));
}

#[tokio::test]
async fn test_failed_delete_keeps_catalog_entry() {
    let cluster = Cluster::start(&[1, 5, 9]).await;
    assert_eq!(natural_slot("Aa"), 0);

    let receipt = cluster.node(1).upload_bytes("Aa", b"stuck".to_vec()).await.unwrap();
    assert_eq!(receipt.stored_at, 1);

    // A non-empty directory where the file was makes the removal fail
    let path = cluster.node(1).store().shared_path("Aa").unwrap();
    tokio::fs::remove_file(&path).await.unwrap();
    tokio::fs::create_dir(&path).await.unwrap();
    tokio::fs::write(path.join("inner"), b"x").await.unwrap();

    assert!(matches!(cluster.node(1).delete("Aa").await, Err(Error::Io(_))));
    assert!(cluster.node(1).has_file("Aa").await);
    assert_eq!(cluster.node(1).local_files().await.len(), 1);
}

#[tokio::test]
async fn test_invalid_names_never_leave_the_node() {
    let cluster = Cluster::start(&[1, 5, 9]).await;
    for name in ["", "../escape", "a/b"] {
        let err = cluster.node(1).upload_bytes(name, b"x".to_vec()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidFilename { .. }), "{name:?}: {err}");
    }
}
