use serde_json::json;
use test_utils::{builder::TestBuilder, error::TestError, fixture::Factories};

/// Tests creating an account together with the user it belongs to.
///
/// Expected: the account's `userId` matches the hydrated `user.id`
#[tokio::test]
async fn creates_parent_before_owner() -> Result<(), TestError> {
    let test = TestBuilder::new().with_migrations().build().await?;
    let factories = Factories::new();

    let account = factories
        .account
        .with("user", 1)?
        .create(test.config()?)
        .await?;

    assert!(account["userId"].is_number());
    assert!(account["user"].is_object());
    assert_eq!(account["user"]["id"], account["userId"]);

    test.assert_has("account", json!({ "user_id": account["user"]["id"] }), 1)
        .await?;
    test.assert_has("user", json!({ "id": account["userId"] }), 1)
        .await?;

    Ok(())
}

/// Tests the stubbed variant.
///
/// Expected: linked instances and nothing written
#[tokio::test]
async fn stubs_parent_and_owner() -> Result<(), TestError> {
    let test = TestBuilder::new().with_migrations().build().await?;
    let factories = Factories::new();

    let account = factories
        .account
        .with("user", 1)?
        .make(test.config()?)
        .await?;

    assert!(account["userId"].is_number());
    assert_eq!(account["user"]["id"], account["userId"]);

    test.assert_count("account", 0).await?;
    test.assert_count("user", 0).await?;

    Ok(())
}

/// Tests that each owner of a batch gets its own parent.
///
/// Expected: two users, each referenced by exactly one account
#[tokio::test]
async fn creates_one_parent_per_owner() -> Result<(), TestError> {
    let test = TestBuilder::new().with_migrations().build().await?;
    let factories = Factories::new();

    let accounts = factories
        .account
        .with("user", 1)?
        .create_many(2, test.config()?)
        .await?;

    test.assert_count("user", 2).await?;
    test.assert_count("account", 2).await?;

    for account in &accounts {
        assert_eq!(account["user"]["id"], account["userId"]);
        test.assert_has("account", json!({ "user_id": account["user"]["id"] }), 1)
            .await?;
        test.assert_has("user", json!({ "id": account["user"]["id"] }), 1)
            .await?;
    }
    assert_ne!(accounts[0]["userId"], accounts[1]["userId"]);

    Ok(())
}

/// Tests the stubbed batch variant.
///
/// Expected: every stub is linked to its own stubbed parent
#[tokio::test]
async fn stubs_one_parent_per_owner() -> Result<(), TestError> {
    let test = TestBuilder::new().with_migrations().build().await?;
    let factories = Factories::new();

    let accounts = factories
        .account
        .with("user", 1)?
        .make_many(2, test.config()?)
        .await?;

    test.assert_count("user", 0).await?;
    test.assert_count("account", 0).await?;

    for account in &accounts {
        assert!(account["userId"].is_number());
        assert_eq!(account["user"]["id"], account["userId"]);
    }

    Ok(())
}

/// Tests chaining two belongs-to requests.
///
/// Expected: one user, one admin, one account referencing both
#[tokio::test]
async fn chains_parents() -> Result<(), TestError> {
    let test = TestBuilder::new().with_migrations().build().await?;
    let factories = Factories::new();

    let account = factories
        .account
        .with("user", 1)?
        .with("admin", 1)?
        .create(test.config()?)
        .await?;

    test.assert_count("user", 1).await?;
    test.assert_count("admin", 1).await?;
    test.assert_count("account", 1).await?;

    test.assert_has("account", json!({ "user_id": account["user"]["id"] }), 1)
        .await?;
    test.assert_has("account", json!({ "admin_id": account["admin"]["id"] }), 1)
        .await?;
    test.assert_has("user", json!({ "id": account["user"]["id"] }), 1)
        .await?;
    test.assert_has("admin", json!({ "id": account["admin"]["id"] }), 1)
        .await?;

    Ok(())
}

/// Tests configuring each parent through a callback.
///
/// Expected: the overrides reach the parents and the account references both
#[tokio::test]
async fn configures_parents_with_callbacks() -> Result<(), TestError> {
    let test = TestBuilder::new().with_migrations().build().await?;
    let factories = Factories::new();

    let account = factories
        .account
        .with_callback("user", 1, |user| {
            user.merge(json!({ "email": "bonjour" }));
        })?
        .with_callback("admin", 1, |admin| {
            admin.merge(json!({ "email": "admin" }));
        })?
        .create(test.config()?)
        .await?;

    test.assert_has("user", json!({ "email": "bonjour" }), 1)
        .await?;
    test.assert_has("admin", json!({ "email": "admin" }), 1)
        .await?;
    test.assert_has(
        "account",
        json!({ "user_id": account["user"]["id"], "admin_id": account["admin"]["id"] }),
        1,
    )
    .await?;

    Ok(())
}

/// Tests applying states to the parent through a callback.
///
/// Expected: the stored user carries both state patches
#[tokio::test]
async fn applies_states_to_parent() -> Result<(), TestError> {
    let test = TestBuilder::new().with_migrations().build().await?;
    let factories = Factories::new();

    let account = factories
        .account
        .with_callback("user", 1, |user| {
            user.apply("easyPassword").apply("easyEmail");
        })?
        .create(test.config()?)
        .await?;

    test.assert_has(
        "user",
        json!({ "password": "easy", "email": "easy@easy.com" }),
        1,
    )
    .await?;
    test.assert_has("account", json!({ "user_id": account["user"]["id"] }), 1)
        .await?;

    Ok(())
}
