use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::errors::DbError;
use crate::migrations::Migration;
use crate::models::{Category, Collection, NewPost, NewUser, Post, PostWithRelations, Role, User};

/// Tables emptied by [`Database::clear_all`], children before parents.
const CLEAR_ORDER: [&str; 6] = [
    "post_categories",
    "posts",
    "categories",
    "user_roles",
    "users",
    "roles",
];

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

/// Post row joined with its author's columns.
#[derive(FromRow)]
struct PostAuthorRow {
    id: i64,
    title: String,
    content: String,
    author_id: i64,
    published: bool,
    created_at: OffsetDateTime,
    author_name: String,
    author_email: String,
}

#[derive(FromRow)]
struct PostCategoryRow {
    post_id: i64,
    id: i64,
    name: String,
}

impl Database {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens a SQLite database by URL, creating the file when it is missing.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, DbError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        Ok(Self::new(pool))
    }

    pub async fn count(&self, collection: Collection) -> Result<i64, DbError> {
        let sql = format!("SELECT COUNT(*) FROM {}", collection.table());
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;

        Ok(count)
    }

    pub async fn create_role(&self, name: &str) -> Result<Role, DbError> {
        let role = sqlx::query_as(
            r#"
            INSERT INTO roles (name)
            VALUES (?)
            RETURNING id, name
            "#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(role)
    }

    pub async fn list_roles(&self) -> Result<Vec<Role>, DbError> {
        let roles = sqlx::query_as("SELECT id, name FROM roles ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(roles)
    }

    /// Inserts a user and connects it to `role_ids` in one transaction.
    pub async fn create_user(&self, user: &NewUser) -> Result<User, DbError> {
        let mut tx = self.pool.begin().await?;

        let created: User = sqlx::query_as(
            r#"
            INSERT INTO users (name, email)
            VALUES (?, ?)
            RETURNING id, name, email
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .fetch_one(&mut *tx)
        .await?;

        for role_id in &user.role_ids {
            sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role_id) VALUES (?, ?)")
                .bind(created.id)
                .bind(role_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(created)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, DbError> {
        let users = sqlx::query_as("SELECT id, name, email FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    pub async fn roles_for_user(&self, user_id: i64) -> Result<Vec<Role>, DbError> {
        let roles = sqlx::query_as(
            r#"
            SELECT r.id, r.name
            FROM roles r
            JOIN user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = ?
            ORDER BY r.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(roles)
    }

    pub async fn create_category(&self, name: &str) -> Result<Category, DbError> {
        let category = sqlx::query_as(
            r#"
            INSERT INTO categories (name)
            VALUES (?)
            RETURNING id, name
            "#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(category)
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, DbError> {
        let categories = sqlx::query_as("SELECT id, name FROM categories ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(categories)
    }

    /// Inserts a post and links its categories in one transaction.
    pub async fn create_post(&self, post: &NewPost) -> Result<Post, DbError> {
        let mut tx = self.pool.begin().await?;

        let created: Post = sqlx::query_as(
            r#"
            INSERT INTO posts (title, content, author_id, published, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, title, content, author_id, published, created_at
            "#,
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.author_id)
        .bind(post.published)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(&mut *tx)
        .await?;

        for category_id in &post.category_ids {
            sqlx::query(
                "INSERT OR IGNORE INTO post_categories (post_id, category_id) VALUES (?, ?)",
            )
            .bind(created.id)
            .bind(category_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(created)
    }

    /// Returns every post with its author and categories, ordered by id.
    pub async fn list_posts_with_relations(&self) -> Result<Vec<PostWithRelations>, DbError> {
        let rows: Vec<PostAuthorRow> = sqlx::query_as(
            r#"
            SELECT p.id, p.title, p.content, p.author_id, p.published, p.created_at,
                   u.name AS author_name, u.email AS author_email
            FROM posts p
            JOIN users u ON u.id = p.author_id
            ORDER BY p.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let links: Vec<PostCategoryRow> = sqlx::query_as(
            r#"
            SELECT pc.post_id, c.id, c.name
            FROM post_categories pc
            JOIN categories c ON c.id = pc.category_id
            ORDER BY pc.post_id, c.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut categories_by_post: HashMap<i64, Vec<Category>> = HashMap::new();
        for link in links {
            categories_by_post
                .entry(link.post_id)
                .or_default()
                .push(Category {
                    id: link.id,
                    name: link.name,
                });
        }

        let posts = rows
            .into_iter()
            .map(|row| PostWithRelations {
                categories: categories_by_post.remove(&row.id).unwrap_or_default(),
                author: User {
                    id: row.author_id,
                    name: row.author_name,
                    email: row.author_email,
                },
                post: Post {
                    id: row.id,
                    title: row.title,
                    content: row.content,
                    author_id: row.author_id,
                    published: row.published,
                    created_at: row.created_at,
                },
            })
            .collect();

        Ok(posts)
    }

    /// Deletes every row of the four collections in one transaction, so a
    /// failure leaves the data untouched.
    ///
    /// **WARNING**: This deletes all blog data. Use with caution.
    pub async fn clear_all(&self) -> Result<(), DbError> {
        info!("Clearing all blog data...");

        let mut tx = self.pool.begin().await?;

        // Order matters due to foreign key constraints
        for table in CLEAR_ORDER {
            let sql = format!("DELETE FROM {table}");
            sqlx::query(&sql).execute(&mut *tx).await?;
        }

        tx.commit().await?;
        info!("All data cleared");
        Ok(())
    }

    /// Applies `migrations` in order, skipping those already recorded.
    ///
    /// Each migration runs in its own transaction together with its entry in
    /// `_blog_migrations`. Returns the number of migrations applied.
    pub async fn apply_migrations(&self, migrations: &[Migration]) -> Result<usize, DbError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _blog_migrations (
                name TEXT NOT NULL PRIMARY KEY,
                applied_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        let applied: HashSet<String> = sqlx::query_scalar("SELECT name FROM _blog_migrations")
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .collect();

        let mut count = 0;
        for migration in migrations {
            if applied.contains(&migration.name) {
                debug!("Migration {} already applied", migration.name);
                continue;
            }

            info!("Applying migration {}", migration.name);
            let mut tx = self.pool.begin().await?;
            sqlx::raw_sql(&migration.sql).execute(&mut *tx).await?;
            sqlx::query("INSERT INTO _blog_migrations (name, applied_at) VALUES (?, ?)")
                .bind(&migration.name)
                .bind(OffsetDateTime::now_utc())
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            count += 1;
        }

        Ok(count)
    }
}
