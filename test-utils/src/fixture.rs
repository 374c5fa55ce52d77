//! Ready-made factories over the migrated schema.
//!
//! `Factories::new()` defines a fresh, independent set of builders. Builders carry
//! per-call session state, so each test should create its own set instead of
//! sharing one across tests running in parallel.
//!
//! Relationships:
//! - user has one `profile`, has many `posts`, has one `account`
//! - account belongs to `user` and to `admin`

use std::sync::Arc;

use factorify::{define_factory, Builder, FactorySlot, Fields};

/// Factories for the `user`, `profile`, `post`, `account` and `admin` tables.
pub struct Factories {
    pub user: Arc<Builder>,
    pub profile: Arc<Builder>,
    pub post: Arc<Builder>,
    pub account: Arc<Builder>,
    pub admin: Arc<Builder>,
}

impl Factories {
    pub fn new() -> Self {
        let profile = define_factory("profile", |ctx| {
            Fields::new()
                .field("age", ctx.faker.number_between(18, 99))
                .field("email", ctx.faker.email())
        })
        .state("old", |_| Fields::new().field("age", 150))
        .state("admin", |_| Fields::new().field("email", "admin@admin.com"))
        .build();

        let post = define_factory("post", |ctx| Fields::new().field("title", ctx.faker.sentence()))
            .state("nodeArticle", |_| Fields::new().field("title", "NodeJS"))
            .build();

        let admin = define_factory("admin", |ctx| {
            Fields::new()
                .field("id", ctx.faker.unique_id())
                .field("email", ctx.faker.email())
        })
        .build();

        // Users and accounts reference each other; the account side holds the weak end.
        let user_slot = FactorySlot::new();

        let account = define_factory("account", |ctx| {
            Fields::new().field("name", ctx.faker.product_name())
        })
        .belongs_to("user", user_slot.reference())
        .belongs_to("admin", &admin)
        .build();

        let user = define_factory("user", |ctx| Fields::new().field("id", ctx.faker.unique_id()))
            .state("easyPassword", |_| Fields::new().field("password", "easy"))
            .state("easyEmail", |_| Fields::new().field("email", "easy@easy.com"))
            .has_one("profile", &profile)
            .has_many("posts", &post)
            .has_one("account", &account)
            .build();

        user_slot.fill(&user);

        Self {
            user,
            profile,
            post,
            account,
            admin,
        }
    }
}

impl Default for Factories {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tests that the cyclic user/account pair resolves both ways.
    ///
    /// Expected: the account's `user` relationship points back at the user builder
    #[test]
    fn account_resolves_user_through_slot() {
        let factories = Factories::new();

        let meta = factories.account.factory().relation_meta("user");
        let related = meta.and_then(|meta| meta.related());

        assert!(related.is_some_and(|user| Arc::ptr_eq(&user, &factories.user)));
    }
}
