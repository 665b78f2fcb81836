use std::sync::{Arc, RwLock};
use std::thread;

use posts::error::StoreError;
use posts::model::{Post, PostDraft, PostPatch};
use posts::store::{PostStore, MAX_ID};
use rustc_serialize::json::ToJson;

#[test]
fn search_first_returns_only_first_post() {
    let store = PostStore::seeded();
    let found = store.search(Some("first"), None);
    assert_eq!(found, vec![Post::new(1, "First post", "This is the first post.")]);
}

#[test]
fn create_third_post() {
    let mut store = PostStore::seeded();
    let post = store.create(PostDraft::new("Third", "c")).unwrap();
    assert!(post.id() >= 1 && post.id() <= MAX_ID);
    assert!(post.id() != 1 && post.id() != 2);
    assert_eq!(store.list(None, None).unwrap().len(), 3);
}

#[test]
fn delete_first_post() {
    let mut store = PostStore::seeded();
    store.delete(1).unwrap();
    assert_eq!(
        store.list(None, None).unwrap(),
        vec![Post::new(2, "Second post", "This is the second post.")]
    );
}

#[test]
fn update_second_post_title() {
    let mut store = PostStore::seeded();
    let post = store.update(2, PostPatch::title("Updated")).unwrap();
    assert_eq!(
        post.to_json().to_string(),
        r#"{"content":"This is the second post.","id":2,"title":"Updated"}"#
    );
}

#[test]
fn failed_operations_leave_store_usable() {
    let mut store = PostStore::seeded();
    assert_eq!(store.list(Some("title"), None).unwrap_err(), StoreError::InvalidParameter);
    assert_eq!(store.delete(77).unwrap_err(), StoreError::NotFound(77));
    assert!(matches!(store.update(1, PostPatch::default()), Err(StoreError::Validation(_))));
    assert!(matches!(store.create(PostDraft::default()), Err(StoreError::Validation(_))));

    assert_eq!(store.len(), 2);
    store.create(PostDraft::new("still", "works")).unwrap();
    assert_eq!(store.len(), 3);
}

#[test]
fn concurrent_creates_keep_ids_unique() {
    let store = Arc::new(RwLock::new(PostStore::seeded()));
    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let store = store.clone();
            thread::spawn(move || {
                for i in 0..25 {
                    let draft = PostDraft::new(&format!("{}-{}", worker, i), "body");
                    store.write().unwrap().create(draft).unwrap();
                    assert!(!store.read().unwrap().search(Some("-"), None).is_empty());
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let store = store.read().unwrap();
    let mut ids: Vec<u32> = store.posts().iter().map(Post::id).collect();
    assert_eq!(ids.len(), 102);
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 102);
}
