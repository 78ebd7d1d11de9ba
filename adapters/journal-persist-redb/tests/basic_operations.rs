//! Basic persistence adapter operation tests

use journal_persist::{DocMeta, PersistAdapter, StoredUpdate};
use journal_persist_redb::RedbPersistAdapter;
use tempfile::TempDir;

async fn create_test_adapter() -> (RedbPersistAdapter, TempDir) {
	let temp_dir = TempDir::new().expect("failed to create temp directory");
	let path = temp_dir.path().join("journal.redb");

	let adapter = RedbPersistAdapter::open(&path).await.expect("failed to open adapter");

	(adapter, temp_dir)
}

#[tokio::test]
async fn test_create_and_store_update() {
	let (adapter, _temp) = create_test_adapter().await;

	let update = StoredUpdate::with_client(vec![0x01, 0x02, 0x03], "client1".into());

	adapter.store_update(update.clone()).await.expect("failed to store update");

	let updates = adapter.get_updates().await.expect("failed to get updates");

	assert_eq!(updates.len(), 1);
	assert_eq!(updates[0].data, vec![0x01, 0x02, 0x03]);
}

#[tokio::test]
async fn test_empty_document() {
	let (adapter, _temp) = create_test_adapter().await;

	let updates = adapter.get_updates().await.expect("failed to get updates");

	assert_eq!(updates.len(), 0);
}

#[tokio::test]
async fn test_multiple_updates() {
	let (adapter, _temp) = create_test_adapter().await;

	for i in 1..=3u8 {
		let update = StoredUpdate::new(vec![i]);
		adapter.store_update(update).await.expect("failed to store update");
	}

	let updates = adapter.get_updates().await.expect("failed to get updates");

	assert_eq!(updates.len(), 3);
	assert_eq!(updates[0].data, vec![1]);
	assert_eq!(updates[1].data, vec![2]);
	assert_eq!(updates[2].data, vec![3]);
}

#[tokio::test]
async fn test_metadata_round_trip() {
	let (adapter, _temp) = create_test_adapter().await;

	let meta = DocMeta {
		initialized: true,
		created_at: 1698499200,
		updated_at: 1698499200,
		size_bytes: 42,
		update_count: 1,
	};

	adapter.set_meta(meta.clone()).await.expect("failed to set metadata");

	let retrieved = adapter.get_meta().await.expect("failed to get metadata");

	assert!(retrieved.initialized);
	assert_eq!(retrieved.created_at, 1698499200);
	assert_eq!(retrieved.size_bytes, 42);
}

#[tokio::test]
async fn test_missing_metadata_defaults() {
	let (adapter, _temp) = create_test_adapter().await;

	let meta = adapter.get_meta().await.expect("failed to get metadata");

	assert_eq!(meta, DocMeta::default());
}

#[tokio::test]
async fn test_delete_document() {
	let (adapter, _temp) = create_test_adapter().await;

	let update = StoredUpdate::new(vec![0xFF]);
	adapter.store_update(update).await.expect("failed to store update");

	let updates = adapter.get_updates().await.expect("failed to get updates");
	assert_eq!(updates.len(), 1);

	adapter.delete().await.expect("failed to delete");

	let updates = adapter.get_updates().await.expect("failed to get updates");
	assert_eq!(updates.len(), 0);

	let meta = adapter.get_meta().await.expect("failed to get metadata");
	assert_eq!(meta, DocMeta::default());
}

#[tokio::test]
async fn test_large_binary_update() {
	let (adapter, _temp) = create_test_adapter().await;

	let large_data = vec![0xAB; 102400];
	let update = StoredUpdate::new(large_data.clone());

	adapter.store_update(update).await.expect("failed to store update");

	let updates = adapter.get_updates().await.expect("failed to get updates");

	assert_eq!(updates.len(), 1);
	assert_eq!(updates[0].data.len(), 102400);
	assert_eq!(updates[0].data, large_data);
}

#[tokio::test]
async fn test_reopen_preserves_sequence() {
	let temp_dir = TempDir::new().expect("failed to create temp directory");
	let path = temp_dir.path().join("journal.redb");

	{
		let adapter = RedbPersistAdapter::open(&path).await.expect("failed to open adapter");
		adapter.store_update(StoredUpdate::new(vec![1])).await.expect("failed to store update");
		adapter.store_update(StoredUpdate::new(vec![2])).await.expect("failed to store update");
	}

	let adapter = RedbPersistAdapter::open(&path).await.expect("failed to reopen adapter");
	let updates = adapter.get_updates().await.expect("failed to get updates");
	assert_eq!(updates.len(), 2);

	adapter.store_update(StoredUpdate::new(vec![3])).await.expect("failed to store update");
	let updates = adapter.get_updates().await.expect("failed to get updates");
	assert_eq!(updates.len(), 3);
	assert_eq!(updates[2].data, vec![3]);
}

#[tokio::test]
async fn test_subscribe_yields_existing_then_live() {
	use tokio_stream::StreamExt;

	let (adapter, _temp) = create_test_adapter().await;

	adapter.store_update(StoredUpdate::new(vec![1])).await.expect("failed to store update");

	let mut stream = adapter.subscribe().await.expect("failed to subscribe");

	let first = stream.next().await.expect("expected existing update");
	assert_eq!(first.data, vec![1]);

	adapter.store_update(StoredUpdate::new(vec![2])).await.expect("failed to store update");

	let second = stream.next().await.expect("expected live update");
	assert_eq!(second.data, vec![2]);
}

// vim: ts=4
