//! Database seeding utilities.

use std::collections::HashMap;

use blog::models::{Category, Collection, NewPost, NewUser, Role, User};
use blog::{Database, DbError};
use futures::future::try_join_all;
use thiserror::Error;
use tracing::{debug, info};

use crate::fixtures::{
    POST_AUTHOR_INDEX, POST_COUNT, ROLE_NAMES, USER_FIXTURES, category_fixtures, post_fixtures,
};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Database(#[from] DbError),
    #[error("Role {0:?} not found; roles must be seeded before users")]
    MissingRole(String),
    #[error("No user at position {0} to author posts")]
    MissingAuthor(usize),
    #[error("No category at position {0} to link posts to")]
    MissingCategory(usize),
    #[error("Failed to render posts: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Rows of one collection after seeding, and how many of them this run created.
#[derive(Debug, Clone)]
pub struct Seeded<T> {
    pub rows: Vec<T>,
    pub created: usize,
}

impl<T> Seeded<T> {
    fn created(rows: Vec<T>) -> Self {
        let created = rows.len();
        Self { rows, created }
    }

    fn existing(rows: Vec<T>) -> Self {
        Self { rows, created: 0 }
    }
}

/// Number of rows created per collection by one [`Seeder::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub roles: usize,
    pub users: usize,
    pub categories: usize,
    pub posts: usize,
}

impl SeedReport {
    pub fn total(&self) -> usize {
        self.roles + self.users + self.categories + self.posts
    }
}

/// Populates empty collections with the fixed fixtures.
///
/// A collection that already holds any row is left untouched and its rows
/// are reused for later cross references; there is no per-item upsert.
pub struct Seeder {
    db: Database,
}

impl Seeder {
    /// Creates a new seeder over the given database.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    async fn is_empty(&self, collection: Collection) -> Result<bool, SeedError> {
        let count = self.db.count(collection).await?;
        if count > 0 {
            debug!("{collection} already has {count} rows, skipping");
        }
        Ok(count == 0)
    }

    /// Seeds roles. Rows come back in fixture order when created, id order when fetched.
    pub async fn seed_roles(&self) -> Result<Seeded<Role>, SeedError> {
        if !self.is_empty(Collection::Roles).await? {
            return Ok(Seeded::existing(self.db.list_roles().await?));
        }

        info!("Seeding {} roles...", ROLE_NAMES.len());
        let roles = try_join_all(ROLE_NAMES.iter().map(|name| self.db.create_role(name))).await?;

        Ok(Seeded::created(roles))
    }

    /// Seeds users, connecting each to its roles by name.
    pub async fn seed_users(&self, roles: &[Role]) -> Result<Seeded<User>, SeedError> {
        if !self.is_empty(Collection::Users).await? {
            return Ok(Seeded::existing(self.db.list_users().await?));
        }

        let role_ids: HashMap<&str, i64> =
            roles.iter().map(|r| (r.name.as_str(), r.id)).collect();

        let new_users = USER_FIXTURES
            .iter()
            .map(|fixture| -> Result<NewUser, SeedError> {
                let role_ids = fixture
                    .roles
                    .iter()
                    .map(|name| {
                        role_ids
                            .get(name)
                            .copied()
                            .ok_or_else(|| SeedError::MissingRole(name.to_string()))
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(NewUser {
                    name: fixture.name.to_string(),
                    email: fixture.email.to_string(),
                    role_ids,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!("Seeding {} users...", new_users.len());
        let users = try_join_all(new_users.iter().map(|user| self.db.create_user(user))).await?;

        Ok(Seeded::created(users))
    }

    /// Seeds categories `Category01` through `Category10`.
    pub async fn seed_categories(&self) -> Result<Seeded<Category>, SeedError> {
        if !self.is_empty(Collection::Categories).await? {
            return Ok(Seeded::existing(self.db.list_categories().await?));
        }

        let names = category_fixtures();
        info!("Seeding {} categories...", names.len());
        let categories =
            try_join_all(names.iter().map(|name| self.db.create_category(name))).await?;

        Ok(Seeded::created(categories))
    }

    /// Seeds posts one at a time. Returns the number of posts created.
    pub async fn seed_posts(
        &self,
        users: &[User],
        categories: &[Category],
    ) -> Result<usize, SeedError> {
        if !self.is_empty(Collection::Posts).await? {
            return Ok(0);
        }

        let author = users
            .get(POST_AUTHOR_INDEX)
            .ok_or(SeedError::MissingAuthor(POST_AUTHOR_INDEX))?;

        let fixtures = post_fixtures(POST_COUNT);
        info!("Seeding {} posts...", fixtures.len());

        for (i, fixture) in fixtures.iter().enumerate() {
            let category_ids = fixture
                .category_indices
                .iter()
                .map(|&idx| {
                    categories
                        .get(idx)
                        .map(|c| c.id)
                        .ok_or(SeedError::MissingCategory(idx))
                })
                .collect::<Result<Vec<_>, _>>()?;

            self.db
                .create_post(&NewPost {
                    title: fixture.title.clone(),
                    content: fixture.content.clone(),
                    author_id: author.id,
                    published: fixture.published,
                    category_ids,
                })
                .await?;

            if (i + 1) % 10 == 0 {
                info!("  Seeded {}/{} posts", i + 1, fixtures.len());
            }
        }

        Ok(fixtures.len())
    }

    /// Seeds all four collections in dependency order.
    pub async fn run(&self) -> Result<SeedReport, SeedError> {
        let roles = self.seed_roles().await?;
        let users = self.seed_users(&roles.rows).await?;
        let categories = self.seed_categories().await?;
        let posts = self.seed_posts(&users.rows, &categories.rows).await?;

        let report = SeedReport {
            roles: roles.created,
            users: users.created,
            categories: categories.created,
            posts,
        };
        info!("Seed created {} rows", report.total());
        Ok(report)
    }

    /// Renders every post with its author and categories as indented JSON.
    pub async fn posts_report(&self) -> Result<String, SeedError> {
        let posts = self.db.list_posts_with_relations().await?;
        Ok(serde_json::to_string_pretty(&posts)?)
    }

    /// Clears all blog data.
    pub async fn clear_all(&self) -> Result<(), SeedError> {
        self.db.clear_all().await?;
        Ok(())
    }
}
