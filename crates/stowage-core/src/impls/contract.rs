//! 全バックエンド共通の契約テスト
//!
//! MockObjectStore は保存しないので、put の返り値と冪等性以外は対象外です。

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};

use crate::domain::{ErrorKind, Locator, ObjectKey, Payload, PutResult};
use crate::impls::{
    HmacUrlSigner, InMemoryObjectStore, LocalFsObjectStore, MockObjectStore, PublicUrlSigner,
};
use crate::ports::{FixedClock, ObjectStore, UrlSigner};

fn key(raw: &str) -> ObjectKey {
    ObjectKey::new(raw).unwrap()
}

async fn put_echoes_key(store: &dyn ObjectStore) {
    for raw in ["a.png", "docs/readme.txt", "x"] {
        let result = store.put(&key(raw), Payload::from("data")).await.unwrap();
        assert!(result.success);
        assert_eq!(result.key, key(raw));
        assert!(result.url.contains(raw));
    }
}

async fn put_then_get_roundtrips(store: &dyn ObjectStore) {
    let k = key("photos/a.png");
    assert_eq!(store.get(&k).await.unwrap(), None);

    store.put(&k, Payload::from("first")).await.unwrap();
    assert_eq!(store.require(&k).await.unwrap().as_bytes(), b"first");

    store.put(&k, Payload::from("second")).await.unwrap();
    assert_eq!(store.require(&k).await.unwrap().as_bytes(), b"second");
}

async fn exists_follows_put_and_delete(store: &dyn ObjectStore) {
    let k = key("b.txt");
    assert!(!store.exists(&k).await.unwrap());

    store.put(&k, Payload::from("x")).await.unwrap();
    assert!(store.exists(&k).await.unwrap());

    store.delete(&k).await.unwrap();
    assert!(!store.exists(&k).await.unwrap());
    assert_eq!(store.get(&k).await.unwrap(), None);
}

async fn delete_is_idempotent(store: &dyn ObjectStore) {
    let k = key("c.txt");
    store.delete(&k).await.unwrap();

    store.put(&k, Payload::from("x")).await.unwrap();
    store.delete(&k).await.unwrap();
    store.delete(&k).await.unwrap();
}

async fn require_reports_not_found(store: &dyn ObjectStore) {
    let err = store.require(&key("missing")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

async fn signed_url_requires_stored_object(store: &dyn ObjectStore) {
    let err = store.signed_url(&key("missing"), None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    store.put(&key("d.png"), Payload::from("x")).await.unwrap();
    let signed = store.signed_url(&key("d.png"), None).await.unwrap();
    assert!(signed.url.contains("d.png"));
}

async fn run_contract(store: &dyn ObjectStore) {
    put_echoes_key(store).await;
    put_then_get_roundtrips(store).await;
    exists_follows_put_and_delete(store).await;
    delete_is_idempotent(store).await;
    require_reports_not_found(store).await;
    signed_url_requires_stored_object(store).await;
}

#[tokio::test]
async fn in_memory_store_satisfies_contract() {
    run_contract(&InMemoryObjectStore::new()).await;
}

#[tokio::test]
async fn local_fs_store_satisfies_contract() {
    let dir = tempfile::tempdir().unwrap();
    run_contract(&LocalFsObjectStore::new(dir.path())).await;
}

#[tokio::test]
async fn stores_are_interchangeable_behind_arc_dyn() {
    let dir = tempfile::tempdir().unwrap();
    let stores: Vec<Arc<dyn ObjectStore>> = vec![
        Arc::new(InMemoryObjectStore::new()),
        Arc::new(LocalFsObjectStore::new(dir.path())),
    ];
    for store in stores {
        run_contract(&store).await;
    }
}

#[tokio::test]
async fn mock_store_satisfies_write_side_of_contract() {
    let store = MockObjectStore::default();
    put_echoes_key(&store).await;
    delete_is_idempotent(&store).await;
}

#[tokio::test]
async fn put_a_png_returns_uploads_locator() {
    let stores: Vec<Box<dyn ObjectStore>> = vec![
        Box::new(MockObjectStore::default()),
        Box::new(InMemoryObjectStore::new()),
    ];
    for store in stores {
        let result = store.put(&key("a.png"), Payload::from("buf")).await.unwrap();
        assert_eq!(
            result,
            PutResult {
                success: true,
                url: "/uploads/a.png".to_string(),
                key: key("a.png"),
            }
        );
    }
}

#[tokio::test]
async fn hmac_signed_urls_from_store_verify() {
    let at = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let signer: Arc<dyn UrlSigner> = Arc::new(
        HmacUrlSigner::new(Locator::default(), b"secret", FixedClock::new(at)).unwrap(),
    );
    let dir = tempfile::tempdir().unwrap();
    let store = LocalFsObjectStore::with_signer(dir.path(), signer.clone());

    let put = store.put(&key("e.png"), Payload::from("x")).await.unwrap();
    assert_eq!(put.url, "/uploads/e.png");

    let signed = store
        .signed_url(&key("e.png"), Some(Duration::from_secs(300)))
        .await
        .unwrap();
    assert_eq!(signed.expires_at, Some(at + chrono::Duration::seconds(300)));
    assert_eq!(signer.verify(&signed.url).unwrap(), key("e.png"));
}

#[tokio::test]
async fn custom_locator_flows_into_put_result() {
    let signer = Arc::new(PublicUrlSigner::new(Locator::new("https://cdn.example.com/u")));
    let store = InMemoryObjectStore::with_signer(signer);
    let result = store.put(&key("a.png"), Payload::from("x")).await.unwrap();
    assert_eq!(result.url, "https://cdn.example.com/u/a.png");
}
