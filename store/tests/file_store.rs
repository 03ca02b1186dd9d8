#![allow(clippy::unwrap_used, clippy::expect_used)]

use change_tracker_store::FileStore;
use change_tracker_store::KeyValueStore;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

#[test]
fn separate_instances_share_directory_state() {
    let temp_dir = TempDir::new().unwrap();

    let writer = FileStore::new(temp_dir.path());
    writer.set("changeTracker", b"{\"records\":[],\"cursor\":-1}").unwrap();
    writer.set("other", b"{}").unwrap();

    let reader = FileStore::new(temp_dir.path());
    assert_eq!(
        reader.get("changeTracker").unwrap().as_deref(),
        Some(&b"{\"records\":[],\"cursor\":-1}"[..])
    );
    assert_eq!(reader.get("other").unwrap().as_deref(), Some(&b"{}"[..]));
    assert_eq!(reader.dir(), temp_dir.path());
}

#[test]
fn stores_are_usable_as_trait_objects() {
    let temp_dir = TempDir::new().unwrap();
    let stores: Vec<Box<dyn KeyValueStore>> = vec![
        Box::new(FileStore::new(temp_dir.path())),
        Box::new(change_tracker_store::MemoryStore::new()),
    ];

    for store in &stores {
        assert_eq!(store.get("history").unwrap(), None);
        store.set("history", b"[1]").unwrap();
        assert_eq!(store.get("history").unwrap(), Some(b"[1]".to_vec()));
    }
}
