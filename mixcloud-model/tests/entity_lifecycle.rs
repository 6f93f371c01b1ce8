//! Entity loading, connections and targeted operations against a fake context

use mixcloud_model::{Member, ModelError, Pagination, Targeted};
use mixcloud_test_utils::{Call, Fixtures, RecordingContext, ResourceBuilder};
use pretty_assertions::assert_eq;
use serde_json::json;

const API: &str = "https://api.mixcloud.com";

#[tokio::test]
async fn load_on_full_entity_without_force_fetches_nothing() {
    let context = RecordingContext::new();
    let mut entity = context.entity(Fixtures::full_user("bob", API), true);
    let before = entity.clone();

    let loaded = entity.load(false).await.unwrap();
    assert!(loaded.is_full());
    assert_eq!(*loaded, before);
    assert_eq!(context.fetch_count(), 0);
}

#[tokio::test]
async fn forced_load_fetches_exactly_once() {
    let context = RecordingContext::new();
    context.respond_to_key("/bob/", Fixtures::full_user("bob", API));
    let mut entity = context.entity(Fixtures::full_user("bob", API), true);

    entity.load(true).await.unwrap();
    assert_eq!(
        context.calls(),
        vec![Call::ByKey {
            key: "/bob/".to_string(),
            create_connections: false,
        }]
    );
}

#[tokio::test]
async fn loading_a_partial_entity_merges_and_creates_connections() {
    let context = RecordingContext::new();
    context.respond_to_key("/bob/", Fixtures::full_user("bob", API));

    let mut entity = context.entity(ResourceBuilder::user("bob").string("extra", "kept").build(), false);
    assert!(!entity.is_full());
    assert!(entity.connections().is_empty());
    assert!(entity.get("follower_count").is_err());

    entity.load(false).await.unwrap();

    assert!(entity.is_full());
    assert_eq!(entity.get("follower_count").unwrap().as_i64(), Some(42));
    assert_eq!(entity.get("extra").unwrap().as_str(), Some("kept"));
    assert!(entity.connections().contains_key("followers"));
    assert_eq!(context.fetch_count(), 1);

    // Already full now
    entity.load(false).await.unwrap();
    assert_eq!(context.fetch_count(), 1);
}

#[tokio::test]
async fn connection_fetches_its_url_once() {
    let context = RecordingContext::new();
    let url = "https://api.mixcloud.com/bob/comments/";
    context.respond_to_url(url, Fixtures::user_page("c", 2, None));

    let entity = context.entity(
        ResourceBuilder::user("bob").connection("comments", url).build(),
        true,
    );

    let connection = match entity.member("comments").unwrap() {
        Member::Connection(connection) => connection,
        other => panic!("expected a connection, got {:?}", other),
    };
    let page = connection.fetch(&Pagination::new()).await.unwrap();

    assert_eq!(page.as_collection().map(|c| c.len()), Some(2));
    assert_eq!(
        context.calls(),
        vec![Call::Absolute {
            url: url.to_string(),
            params: vec![],
        }]
    );
}

#[tokio::test]
async fn hyphenated_connection_names_resolve() {
    let context = RecordingContext::new();
    let url = "https://api.mixcloud.com/bob/listen-later/";
    context.respond_to_url(url, Fixtures::user_page("q", 1, None));

    let entity = context.entity(
        ResourceBuilder::user("bob").connection("listen-later", url).build(),
        true,
    );

    let page = entity.connection("listen-later", &Pagination::new()).await.unwrap();
    assert_eq!(page.as_collection().map(|c| c.len()), Some(1));
    assert!(entity.connection("listen_later", &Pagination::new()).await.is_ok());
    assert_eq!(context.fetch_count(), 2);
}

#[tokio::test]
async fn connection_forwards_pagination() {
    let context = RecordingContext::new();
    let url = "https://api.mixcloud.com/bob/followers/";
    context.respond_to_url(url, Fixtures::user_page("f", 1, None));
    let entity = context.entity(Fixtures::full_user("bob", API), true);

    entity
        .connection("followers", &Pagination::page(2).with_per_page(30))
        .await
        .unwrap();

    assert_eq!(
        context.calls(),
        vec![Call::Absolute {
            url: url.to_string(),
            params: vec![
                ("offset".to_string(), "60".to_string()),
                ("limit".to_string(), "30".to_string()),
            ],
        }]
    );
}

#[tokio::test]
async fn mixed_pagination_fails_before_fetching() {
    let context = RecordingContext::new();
    let entity = context.entity(Fixtures::full_user("bob", API), true);

    let result = entity
        .connection("followers", &Pagination::page(3).with_limit(10))
        .await;

    assert!(matches!(result, Err(ModelError::PreconditionViolation(_))));
    assert_eq!(context.fetch_count(), 0);
}

#[tokio::test]
async fn targeted_operations_bind_the_entity_key() {
    let context = RecordingContext::with_operations(&["follow", "embed_html"]).unwrap();
    let entity = context.entity(ResourceBuilder::user("bob").build(), false);

    let Targeted::Found(follow) = entity.targeted("follow") else {
        panic!("follow should be targeted");
    };
    assert_eq!(follow.key(), "/bob/");

    let result = follow.call().await.unwrap();
    assert_eq!(
        result.to_value(),
        json!({"operation": "follow", "key": "/bob/", "options": null})
    );

    let member = entity.member("embed_html").unwrap();
    let Member::Operation(embed) = member else {
        panic!("expected an operation");
    };
    let result = embed.call_with(&json!({"width": 300})).await.unwrap();
    assert_eq!(result.to_value()["options"]["width"], 300);
}

#[tokio::test]
async fn stored_keys_shadow_targeted_operations() {
    let context = RecordingContext::with_operations(&["name"]).unwrap();
    let entity = context.entity(ResourceBuilder::user("bob").build(), false);
    assert!(matches!(entity.member("name"), Ok(Member::Value(_))));
}

#[test]
fn failed_delegation_keeps_the_original_error() {
    let context = RecordingContext::with_operations(&["follow"]).unwrap();
    let entity = context.entity(ResourceBuilder::user("bob").build(), false);

    let err = entity.member("frobnicate").unwrap_err();
    assert_eq!(
        err.to_string(),
        "\"Entity\" object has no attribute \"frobnicate\""
    );
}

#[tokio::test]
async fn fetch_failures_propagate_unchanged() {
    let context = RecordingContext::new();
    let mut entity = context.entity(ResourceBuilder::user("ghost").build(), false);

    let err = entity.load(false).await.unwrap_err();
    assert!(matches!(err, ModelError::Fetch(_)));
    assert_eq!(err.to_string(), "no canned response for /ghost/");
    assert!(!entity.is_full());
}

#[tokio::test]
async fn dropped_context_is_reported() {
    let context = RecordingContext::with_operations(&["follow"]).unwrap();
    let mut entity = context.entity(ResourceBuilder::user("bob").build(), false);
    drop(context);

    assert!(matches!(entity.load(false).await, Err(ModelError::ContextDropped)));
    assert!(!entity.targeted("follow").is_found());
}
