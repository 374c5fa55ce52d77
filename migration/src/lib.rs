//! Schema used by the factory integration tests.
//!
//! The tables mirror a small blogging domain: users own a profile, posts and an
//! account; accounts also belong to an admin.

pub use sea_orm_migration::prelude::*;

mod m20260101_000001_create_user_table;
mod m20260101_000002_create_admin_table;
mod m20260101_000003_create_profile_table;
mod m20260101_000004_create_post_table;
mod m20260101_000005_create_account_table;

pub use m20260101_000001_create_user_table::User;
pub use m20260101_000002_create_admin_table::Admin;
pub use m20260101_000003_create_profile_table::Profile;
pub use m20260101_000004_create_post_table::Post;
pub use m20260101_000005_create_account_table::Account;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000001_create_user_table::Migration),
            Box::new(m20260101_000002_create_admin_table::Migration),
            Box::new(m20260101_000003_create_profile_table::Migration),
            Box::new(m20260101_000004_create_post_table::Migration),
            Box::new(m20260101_000005_create_account_table::Migration),
        ]
    }
}
