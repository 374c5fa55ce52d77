use factorify::{define_factory, Fields};
use serde_json::json;
use test_utils::{builder::TestBuilder, error::TestError, fixture::Factories};

/// Tests creating a user with one post.
///
/// Expected: one post referencing the user
#[tokio::test]
async fn creates_children_after_owner() -> Result<(), TestError> {
    let test = TestBuilder::new().with_migrations().build().await?;
    let factories = Factories::new();

    let user = factories
        .user
        .with("posts", 1)?
        .create(test.config()?)
        .await?;

    test.assert_count("user", 1).await?;
    test.assert_count("post", 1).await?;
    test.assert_has("post", json!({ "user_id": user["id"] }), 1)
        .await?;

    Ok(())
}

/// Tests creating several children per owner.
///
/// Expected: two posts referencing the user
#[tokio::test]
async fn creates_many_children() -> Result<(), TestError> {
    let test = TestBuilder::new().with_migrations().build().await?;
    let factories = Factories::new();

    let user = factories
        .user
        .with("posts", 2)?
        .create(test.config()?)
        .await?;

    test.assert_count("user", 1).await?;
    test.assert_count("post", 2).await?;
    test.assert_has("post", json!({ "user_id": user["id"] }), 2)
        .await?;

    Ok(())
}

/// Tests that children are hydrated as an array.
///
/// Expected: `posts` is an array of two objects
#[tokio::test]
async fn returns_relationship_as_array() -> Result<(), TestError> {
    let test = TestBuilder::new().with_migrations().build().await?;
    let factories = Factories::new();

    let user = factories
        .user
        .with("posts", 2)?
        .create(test.config()?)
        .await?;

    let posts = user["posts"].as_array().cloned().unwrap_or_default();
    assert_eq!(posts.len(), 2);
    for post in posts {
        assert_eq!(post["userId"], user["id"]);
    }

    Ok(())
}

/// Tests that each owner of a batch receives its own children.
///
/// Expected: four posts, two per user, hydrated on the right owner
#[tokio::test]
async fn creates_children_per_owner() -> Result<(), TestError> {
    let test = TestBuilder::new().with_migrations().build().await?;
    let factories = Factories::new();

    let users = factories
        .user
        .with("posts", 2)?
        .create_many(2, test.config()?)
        .await?;

    test.assert_count("user", 2).await?;
    test.assert_count("post", 4).await?;

    for user in &users {
        test.assert_has("post", json!({ "user_id": user["id"] }), 2)
            .await?;

        let posts = user["posts"].as_array().cloned().unwrap_or_default();
        assert_eq!(posts.len(), 2);
        for post in posts {
            assert_eq!(post["userId"], user["id"]);
        }
    }

    Ok(())
}

/// Tests repeating the same has-many request.
///
/// Expected: ten posts referencing the user
#[tokio::test]
async fn chains_requests() -> Result<(), TestError> {
    let test = TestBuilder::new().with_migrations().build().await?;
    let factories = Factories::new();

    let user = factories
        .user
        .with("posts", 5)?
        .with("posts", 5)?
        .create(test.config()?)
        .await?;

    test.assert_count("user", 1).await?;
    test.assert_count("post", 10).await?;
    test.assert_has("post", json!({ "user_id": user["id"] }), 10)
        .await?;

    Ok(())
}

/// Tests applying a state to every child through a callback.
///
/// Expected: ten posts titled by the state
#[tokio::test]
async fn applies_state_to_children() -> Result<(), TestError> {
    let test = TestBuilder::new().with_migrations().build().await?;
    let factories = Factories::new();

    let user = factories
        .user
        .with_callback("posts", 10, |post| {
            post.apply("nodeArticle");
        })?
        .create(test.config()?)
        .await?;

    test.assert_count("user", 1).await?;
    test.assert_count("post", 10).await?;
    test.assert_has("post", json!({ "user_id": user["id"], "title": "NodeJS" }), 10)
        .await?;

    Ok(())
}

/// Tests an override sequence shorter than the batch of children.
///
/// Expected: the first two posts take the overrides, the rest keep generated titles
#[tokio::test]
async fn merges_sequence_into_children() -> Result<(), TestError> {
    let test = TestBuilder::new().with_migrations().build().await?;
    let factories = Factories::new();

    let user = factories
        .user
        .with_callback("posts", 10, |post| {
            post.merge(json!([{ "title": "Rust" }, { "title": "AdonisJS" }]));
        })?
        .create(test.config()?)
        .await?;

    test.assert_count("user", 1).await?;
    test.assert_count("post", 10).await?;
    test.assert_has("post", json!({ "user_id": user["id"], "title": "Rust" }), 1)
        .await?;
    test.assert_has("post", json!({ "user_id": user["id"], "title": "AdonisJS" }), 1)
        .await?;

    Ok(())
}

/// Tests the default foreign key of an ad-hoc relationship.
///
/// Expected: posts are linked through `user_id` without declaring it
#[tokio::test]
async fn detects_default_keys() -> Result<(), TestError> {
    let test = TestBuilder::new().with_migrations().build().await?;

    let posts = define_factory("post", |ctx| Fields::new().field("title", ctx.faker.sentence())).build();
    let users = define_factory("user", |ctx| {
        Fields::new()
            .field("email", ctx.faker.email())
            .field("password", ctx.faker.alphanumeric(6))
    })
    .has_many("post", &posts)
    .build();

    let user = users.with("post", 5)?.create(test.config()?).await?;

    test.assert_count("user", 1).await?;
    test.assert_count("post", 5).await?;
    test.assert_has("post", json!({ "user_id": user["id"] }), 5)
        .await?;

    Ok(())
}

/// Tests a has-many request with a count of zero.
///
/// Expected: `posts` hydrates to an empty array
#[tokio::test]
async fn hydrates_empty_array_without_children() -> Result<(), TestError> {
    let test = TestBuilder::new().with_migrations().build().await?;
    let factories = Factories::new();

    let user = factories
        .user
        .with("posts", 0)?
        .create(test.config()?)
        .await?;

    assert_eq!(user["posts"], json!([]));
    test.assert_count("post", 0).await?;

    Ok(())
}
