mod common;

use common::{BLOG_BUCKET, GatedTable, blog_store, seed_blog};
use inkpost_core::blog::{BlogPatch, NewBlog};
use inkpost_core::image::{ImageFile, ImageSource};
use inkpost_infrastructure::{FailPoint, MemoryGateway};
use std::sync::Arc;

fn new_blog(owner: Option<&str>, title: &str) -> NewBlog {
    NewBlog {
        title: title.to_string(),
        content: format!("{title} body"),
        owner_id: owner.map(str::to_string),
        owner_name: "Ada".to_string(),
        image: None,
    }
}

fn seeded() -> Arc<MemoryGateway> {
    let gateway = Arc::new(MemoryGateway::new());
    seed_blog(&gateway, 1, "first", "2024-01-01T10:00:00+00:00");
    seed_blog(&gateway, 2, "second", "2024-01-02T10:00:00+00:00");
    seed_blog(&gateway, 3, "third", "2024-01-03T10:00:00+00:00");
    gateway
}

#[tokio::test]
async fn test_fetch_all_is_newest_first_and_repeatable() {
    let gateway = seeded();
    let store = blog_store(gateway.clone(), &gateway);

    let first = store.fetch_all().await.unwrap();
    let second = store.fetch_all().await.unwrap();

    assert_eq!(first.iter().map(|b| b.id).collect::<Vec<_>>(), vec![3, 2, 1]);
    assert_eq!(first, second);
    assert_eq!(store.blogs().await, second);
    assert!(!store.is_loading());
}

#[tokio::test]
async fn test_failed_fetch_keeps_collection() {
    let gateway = seeded();
    let store = blog_store(gateway.clone(), &gateway);
    store.fetch_all().await.unwrap();

    gateway.fail(FailPoint::Select, "connection reset");
    let err = store.fetch_all().await.unwrap_err();

    assert_eq!(err.to_string(), "connection reset");
    assert_eq!(store.len().await, 3);
    assert!(!store.is_loading());
}

#[tokio::test]
async fn test_create_places_blog_at_front() {
    let gateway = seeded();
    let store = blog_store(gateway.clone(), &gateway);
    store.fetch_all().await.unwrap();

    let created = store
        .create(new_blog(Some("u-2"), "fresh"))
        .await
        .unwrap();

    let blogs = store.blogs().await;
    assert_eq!(blogs.len(), 4);
    assert_eq!(blogs[0], created);
    assert_eq!(created.user_id, "u-2");
    assert_eq!(created.user_name, "Ada");
    assert!(!store.is_posting());
}

#[tokio::test]
async fn test_unauthenticated_create_inserts_nothing() {
    let gateway = seeded();
    let store = blog_store(gateway.clone(), &gateway);

    let err = store.create(new_blog(None, "anon")).await.unwrap_err();

    assert!(err.is_validation());
    assert_eq!(gateway.calls(FailPoint::Insert), 0);
    assert_eq!(gateway.rows("blogs").len(), 3);
}

#[tokio::test]
async fn test_create_with_upload_stores_public_url() {
    let gateway = Arc::new(MemoryGateway::new());
    let store = blog_store(gateway.clone(), &gateway);
    let mut blog = new_blog(Some("u-1"), "pictured");
    blog.image = Some(ImageSource::Upload(ImageFile::new("sea.png", vec![7; 16])));

    let created = store.create(blog).await.unwrap();

    let keys = gateway.blob_keys(BLOG_BUCKET);
    assert_eq!(keys.len(), 1);
    assert_eq!(
        created.image_url,
        Some(format!("memory://{BLOG_BUCKET}/{}", keys[0]))
    );
}

#[tokio::test]
async fn test_create_with_reference_skips_upload() {
    let gateway = Arc::new(MemoryGateway::new());
    let store = blog_store(gateway.clone(), &gateway);
    let mut blog = new_blog(Some("u-1"), "linked");
    blog.image = Some(ImageSource::Reference(
        "https://cdn.example/cat.png".to_string(),
    ));

    let created = store.create(blog).await.unwrap();

    assert_eq!(created.image_url.as_deref(), Some("https://cdn.example/cat.png"));
    assert_eq!(gateway.calls(FailPoint::Upload), 0);
}

#[tokio::test]
async fn test_failed_upload_inserts_nothing() {
    let gateway = Arc::new(MemoryGateway::new());
    gateway.fail(FailPoint::Upload, "Payload too large");
    let store = blog_store(gateway.clone(), &gateway);
    let mut blog = new_blog(Some("u-1"), "pictured");
    blog.image = Some(ImageSource::Upload(ImageFile::new("sea.png", vec![1])));

    let err = store.create(blog).await.unwrap_err();

    assert!(err.is_upload());
    assert_eq!(gateway.calls(FailPoint::Insert), 0);
    assert!(store.blogs().await.is_empty());
}

#[tokio::test]
async fn test_failed_insert_removes_fresh_upload() {
    let gateway = Arc::new(MemoryGateway::new());
    gateway.fail(FailPoint::Insert, "permission denied for table blogs");
    let store = blog_store(gateway.clone(), &gateway);
    let mut blog = new_blog(Some("u-1"), "pictured");
    blog.image = Some(ImageSource::Upload(ImageFile::new("sea.png", vec![1])));

    let err = store.create(blog).await.unwrap_err();

    assert!(err.is_gateway());
    assert!(gateway.blob_keys(BLOG_BUCKET).is_empty());
}

#[tokio::test]
async fn test_update_patches_only_the_target() {
    let gateway = seeded();
    let store = blog_store(gateway.clone(), &gateway);
    let before = store.fetch_all().await.unwrap();

    let updated = store
        .update(2, BlogPatch::new().title("renamed").content("new body"))
        .await
        .unwrap();

    assert_eq!(updated.title, "renamed");
    assert_eq!(updated.content, "new body");
    let after = store.blogs().await;
    assert_eq!(after.iter().map(|b| b.id).collect::<Vec<_>>(), vec![3, 2, 1]);
    assert_eq!(after[1], updated);
    assert_eq!(after[0], before[0]);
    assert_eq!(after[2], before[2]);
}

#[tokio::test]
async fn test_update_missing_blog_is_not_found() {
    let gateway = seeded();
    let store = blog_store(gateway.clone(), &gateway);

    let err = store
        .update(99, BlogPatch::new().title("ghost"))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_remove_image_survives_blob_deletion_failure() {
    let gateway = Arc::new(MemoryGateway::new());
    let store = blog_store(gateway.clone(), &gateway);
    let mut blog = new_blog(Some("u-1"), "pictured");
    blog.image = Some(ImageSource::Upload(ImageFile::new("sea.png", vec![1])));
    let created = store.create(blog).await.unwrap();
    let key = gateway.blob_keys(BLOG_BUCKET).remove(0);
    gateway.fail(FailPoint::Remove, "storage unavailable");

    let updated = store
        .update(created.id, BlogPatch::new().remove_image())
        .await
        .unwrap();

    assert_eq!(updated.image_url, None);
    assert_eq!(store.blogs().await[0].image_url, None);
    assert_eq!(
        gateway.removal_requests(),
        vec![(BLOG_BUCKET.to_string(), key)]
    );
}

#[tokio::test]
async fn test_replace_image_deletes_previous_blob() {
    let gateway = Arc::new(MemoryGateway::new());
    let store = blog_store(gateway.clone(), &gateway);
    let mut blog = new_blog(Some("u-1"), "pictured");
    blog.image = Some(ImageSource::Upload(ImageFile::new("old.png", vec![1])));
    let created = store.create(blog).await.unwrap();
    let old_key = gateway.blob_keys(BLOG_BUCKET).remove(0);

    let updated = store
        .update(
            created.id,
            BlogPatch::new().replace_image(ImageFile::new("new.jpg", vec![2])),
        )
        .await
        .unwrap();

    let keys = gateway.blob_keys(BLOG_BUCKET);
    assert_eq!(keys.len(), 1);
    assert_ne!(keys[0], old_key);
    assert!(keys[0].ends_with(".jpg"));
    assert_eq!(
        updated.image_url,
        Some(format!("memory://{BLOG_BUCKET}/{}", keys[0]))
    );
}

#[tokio::test]
async fn test_delete_removes_entry_and_image() {
    let gateway = Arc::new(MemoryGateway::new());
    let store = blog_store(gateway.clone(), &gateway);
    let mut blog = new_blog(Some("u-1"), "pictured");
    blog.image = Some(ImageSource::Upload(ImageFile::new("sea.png", vec![1])));
    let created = store.create(blog).await.unwrap();
    store.create(new_blog(Some("u-1"), "plain")).await.unwrap();

    store.delete(created.id).await.unwrap();

    assert_eq!(store.len().await, 1);
    assert!(store.blogs().await.iter().all(|b| b.id != created.id));
    assert!(gateway.blob_keys(BLOG_BUCKET).is_empty());
    assert_eq!(gateway.rows("blogs").len(), 1);
}

#[tokio::test]
async fn test_delete_of_unknown_local_entry_is_noop_locally() {
    let gateway = seeded();
    let store = blog_store(gateway.clone(), &gateway);
    store.fetch_all().await.unwrap();
    seed_blog(&gateway, 10, "remote only", "2024-01-04T10:00:00+00:00");

    store.delete(10).await.unwrap();

    assert_eq!(store.len().await, 3);
    assert_eq!(gateway.rows("blogs").len(), 3);
}

#[tokio::test]
async fn test_find_falls_back_to_backend_without_caching() {
    let gateway = seeded();
    let store = blog_store(gateway.clone(), &gateway);

    let blog = store.find(2).await.unwrap();

    assert_eq!(blog.title, "second");
    assert!(store.is_empty().await);
    assert!(store.find(42).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_paging() {
    let gateway = Arc::new(MemoryGateway::new());
    for id in 1..=7 {
        seed_blog(&gateway, id, "b", &format!("2024-01-0{id}T10:00:00+00:00"));
    }
    let store = blog_store(gateway.clone(), &gateway);
    store.fetch_all().await.unwrap();

    assert_eq!(store.page_count(5).await, 2);
    let second_page = store.page(2, 5).await;
    assert_eq!(second_page.iter().map(|b| b.id).collect::<Vec<_>>(), vec![2, 1]);
}

#[tokio::test]
async fn test_concurrent_mutation_is_busy() {
    let gateway = Arc::new(MemoryGateway::new());
    let gated = Arc::new(GatedTable::new(gateway.clone()));
    let store = Arc::new(blog_store(gated.clone(), &gateway));

    gated.hold(true);
    let first = tokio::spawn({
        let store = store.clone();
        async move { store.create(new_blog(Some("u-1"), "one")).await }
    });
    gated.wait_entered().await;
    assert!(store.is_posting());

    let err = store
        .create(new_blog(Some("u-1"), "two"))
        .await
        .unwrap_err();
    assert!(err.is_busy());
    assert!(store.delete(1).await.unwrap_err().is_busy());

    gated.hold(false);
    gated.release();
    first.await.unwrap().unwrap();

    assert_eq!(gateway.rows("blogs").len(), 1);
    assert!(!store.is_posting());
}

#[tokio::test]
async fn test_superseded_fetch_is_discarded() {
    let gateway = seeded();
    let gated = Arc::new(GatedTable::new(gateway.clone()));
    let store = Arc::new(blog_store(gated.clone(), &gateway));

    gated.hold(true);
    let stale = tokio::spawn({
        let store = store.clone();
        async move { store.fetch_all().await }
    });
    gated.wait_entered().await;
    gated.hold(false);

    seed_blog(&gateway, 4, "fourth", "2024-01-04T10:00:00+00:00");
    let fresh = store.fetch_all().await.unwrap();
    assert_eq!(fresh.len(), 4);

    gated.release();
    let stale = stale.await.unwrap().unwrap();
    assert_eq!(stale.len(), 3);

    assert_eq!(store.blogs().await, fresh);
    assert!(!store.is_loading());
}
