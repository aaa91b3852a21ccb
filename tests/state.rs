//! State store and broadcaster integration tests

use std::time::Duration;

use printfarm_gateway::broadcast::INITIAL_MESSAGE;
use printfarm_gateway::{DeviceState, StateBroadcaster};

mod common;
use common::StateFiles;

#[tokio::test]
async fn test_snapshot_reads_state_file() {
    let files = StateFiles::new(&[("a", "Printing"), ("b", "Operational")]);
    let snapshot = files.store().snapshot().await.unwrap();

    assert_eq!(snapshot.state_of("a"), DeviceState::Printing);
    assert_eq!(snapshot.state_of("b"), DeviceState::Idle);
    assert_eq!(snapshot.state_of("c"), DeviceState::Unknown);
}

#[tokio::test]
async fn test_clear_active_without_store_file() {
    let files = StateFiles::new(&[]);
    let store = files.store();

    let cleared = store.clear_active(&["a"]).await.unwrap();

    assert_eq!(cleared, 0);
    assert!(!files.active_path().exists());
}

#[tokio::test]
async fn test_clear_active_does_not_add_unknown_ids() {
    let files = StateFiles::new(&[]);
    files.write_active(&[("a", true), ("b", false)]);
    let store = files.store();

    let cleared = store.clear_active(&["a", "b", "zzz"]).await.unwrap();

    assert_eq!(cleared, 1);
    let flags = store.active_flags().await.unwrap();
    assert_eq!(flags.len(), 2);
    assert!(!flags["a"]);
    assert!(!flags.contains_key("zzz"));
}

#[tokio::test]
async fn test_concurrent_clears_do_not_lose_updates() {
    let files = StateFiles::new(&[]);
    files.write_active(&[("a", true), ("b", true), ("c", true), ("d", true)]);
    let store = files.store();

    let (x, y) = tokio::join!(store.clear_active(&["a", "b"]), store.clear_active(&["c"]));
    assert_eq!(x.unwrap() + y.unwrap(), 3);

    let flags = store.active_flags().await.unwrap();
    assert!(!flags["a"] && !flags["b"] && !flags["c"]);
    assert!(flags["d"]);
}

#[tokio::test]
async fn test_broadcaster_publishes_snapshot_text() {
    let files = StateFiles::new(&[("a", "Printing")]);
    let mut broadcaster = StateBroadcaster::new(files.store(), Duration::from_millis(20));
    let mut rx = broadcaster.subscribe();

    assert_eq!(&*rx.borrow_and_update().clone(), INITIAL_MESSAGE);

    assert!(broadcaster.tick().await);
    assert!(rx.has_changed().unwrap());
    let message = rx.borrow_and_update().clone();
    assert!(message.contains("Printing"));
}

#[tokio::test]
async fn test_broadcaster_throttles_and_keeps_last_message() {
    let files = StateFiles::new(&[("a", "Printing")]);
    let mut broadcaster = StateBroadcaster::new(files.store(), Duration::from_millis(50));
    let rx = broadcaster.subscribe();

    assert!(broadcaster.tick().await);

    // within the interval: no reload, previous message republished
    files.write_states(&[("a", "Paused")]);
    assert!(!broadcaster.tick().await);
    assert!(rx.borrow().contains("Printing"));

    // file gone after the interval: reload fails, message kept
    std::fs::remove_file(files.state_path()).unwrap();
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(!broadcaster.tick().await);
    assert!(rx.borrow().contains("Printing"));
}
