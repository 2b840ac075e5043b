//! Integration tests for the sanctum-store crate: the SQLite tier under a
//! `KvStore`, across reopen.

use sanctum_store::{DurableTier, KvStore, SqliteTier};

#[tokio::test]
async fn durable_values_survive_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("sanctum.db");

    {
        let tier = SqliteTier::open_and_migrate(path.clone()).await.unwrap();
        let store = KvStore::with_durable(tier);
        store.write("system:installed-apps", "[]").await.unwrap();
        store.write("app:notes:draft", "hello").await.unwrap();
    }

    let tier = SqliteTier::open_and_migrate(path).await.unwrap();
    let store = KvStore::with_durable(tier);

    // Fresh memory tier: these can only come from SQLite.
    assert_eq!(store.read("app:notes:draft").await.unwrap(), "hello");
    assert_eq!(
        store.list("").await.unwrap(),
        vec!["app:notes:draft", "system:installed-apps"]
    );
}

#[tokio::test]
async fn remove_clears_both_tiers() {
    let dir = tempfile::tempdir().expect("tempdir");
    let tier = SqliteTier::open_and_migrate(dir.path().join("kv.db"))
        .await
        .unwrap();
    let store = KvStore::with_durable(tier.clone());

    store.write("k", "v").await.unwrap();
    store.remove("k").await.unwrap();

    assert!(tier.get("k").await.unwrap().is_none());
    assert!(store.read("k").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn scoped_views_share_durable_backing() {
    let tier = SqliteTier::open_in_memory().unwrap();
    tier.run_migrations().await.unwrap();
    let store = KvStore::with_durable(tier.clone());

    let scoped = store.scoped("app:system.files:");
    scoped.write("last-path", "/docs").await.unwrap();

    assert_eq!(
        tier.get("app:system.files:last-path").await.unwrap().as_deref(),
        Some("/docs")
    );
    assert_eq!(scoped.list("").await.unwrap(), vec!["last-path"]);
}
