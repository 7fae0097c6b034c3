//! Integration tests for the fixture seeder.
//!
//! Each test builds its own SQLite file in a temporary directory with the
//! shipped migrations applied, so no external database is needed.
//!
//! Run with: `cargo nextest run -p blog-tools seed`

use std::collections::BTreeSet;
use std::path::Path;

use blog::Database;
use blog::migrations::{self, MIGRATIONS_DIR};
use blog::models::{Collection, NewUser, User};
use blog_tools::db::{SeedError, SeedReport, Seeder};
use blog_tools::fixtures::{category_name, post_category_indices};
use tempfile::TempDir;

/// Opens a fresh database with the schema applied. The `TempDir` must outlive the pool.
async fn test_db() -> (TempDir, Database) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let url = format!("sqlite://{}", dir.path().join("blog.db").display());
    let db = Database::connect(&url, 1)
        .await
        .expect("Failed to open database");

    let migrations = migrations::collect(Path::new(MIGRATIONS_DIR)).expect("Failed to load migrations");
    db.apply_migrations(&migrations)
        .await
        .expect("Failed to apply migrations");

    (dir, db)
}

async fn counts(db: &Database) -> Vec<i64> {
    let mut counts = Vec::new();
    for collection in Collection::ALL {
        counts.push(db.count(collection).await.unwrap());
    }
    counts
}

async fn user_by_email(db: &Database, email: &str) -> User {
    db.list_users()
        .await
        .unwrap()
        .into_iter()
        .find(|u| u.email == email)
        .unwrap_or_else(|| panic!("no user {email}"))
}

#[tokio::test]
async fn test_first_run_creates_all_fixtures() {
    let (_dir, db) = test_db().await;

    let report = Seeder::new(db.clone()).run().await.unwrap();

    assert_eq!(
        report,
        SeedReport {
            roles: 2,
            users: 2,
            categories: 10,
            posts: 30,
        }
    );
    assert_eq!(counts(&db).await, vec![2, 2, 10, 30]);
}

#[tokio::test]
async fn test_second_run_creates_nothing() {
    let (_dir, db) = test_db().await;
    let seeder = Seeder::new(db.clone());

    seeder.run().await.unwrap();
    let before = counts(&db).await;

    let report = seeder.run().await.unwrap();
    assert_eq!(report, SeedReport::default());
    assert_eq!(counts(&db).await, before);
}

#[tokio::test]
async fn test_users_get_roles_by_name() {
    let (_dir, db) = test_db().await;
    Seeder::new(db.clone()).run().await.unwrap();

    let admin = user_by_email(&db, "admin@example.com").await;
    let example = user_by_email(&db, "example@example.com").await;

    let admin_roles: BTreeSet<_> = db
        .roles_for_user(admin.id)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(admin_roles, BTreeSet::from(["ADMIN".to_string(), "USER".to_string()]));

    let example_roles: Vec<_> = db
        .roles_for_user(example.id)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(example_roles, ["USER"]);
}

#[tokio::test]
async fn test_existing_roles_are_reused() {
    let (_dir, db) = test_db().await;

    // Reverse order so ids do not line up with fixture positions
    let user_role = db.create_role("USER").await.unwrap();
    let admin_role = db.create_role("ADMIN").await.unwrap();

    let report = Seeder::new(db.clone()).run().await.unwrap();
    assert_eq!(report.roles, 0);
    assert_eq!(report.users, 2);

    let admin = user_by_email(&db, "admin@example.com").await;
    let admin_roles = db.roles_for_user(admin.id).await.unwrap();
    assert_eq!(admin_roles, vec![user_role, admin_role]);
}

#[tokio::test]
async fn test_existing_users_are_reused_in_id_order() {
    let (_dir, db) = test_db().await;

    let mut existing = Vec::new();
    for (name, email) in [("zoe", "zoe@example.com"), ("adam", "adam@example.com")] {
        let user = db
            .create_user(&NewUser {
                name: name.to_string(),
                email: email.to_string(),
                role_ids: vec![],
            })
            .await
            .unwrap();
        existing.push(user);
    }

    let report = Seeder::new(db.clone()).run().await.unwrap();
    assert_eq!(report.users, 0);
    assert_eq!(report.posts, 30);
    assert_eq!(db.count(Collection::Users).await.unwrap(), 2);

    // The second-lowest id authors every post, whatever the names sort to
    let posts = db.list_posts_with_relations().await.unwrap();
    assert_eq!(posts.len(), 30);
    assert!(posts.iter().all(|p| p.author == existing[1]));
}

#[tokio::test]
async fn test_missing_role_aborts_before_creating_users() {
    let (_dir, db) = test_db().await;
    db.create_role("USER").await.unwrap();

    let err = Seeder::new(db.clone()).run().await.unwrap_err();

    assert!(matches!(err, SeedError::MissingRole(ref name) if name == "ADMIN"));
    assert_eq!(db.count(Collection::Users).await.unwrap(), 0);
}

#[tokio::test]
async fn test_non_empty_collection_is_not_topped_up() {
    let (_dir, db) = test_db().await;
    db.create_category("Custom").await.unwrap();

    let err = Seeder::new(db.clone()).run().await.unwrap_err();

    // Only one category exists, so the second post cannot find position 1
    assert!(matches!(err, SeedError::MissingCategory(1)));
    assert_eq!(db.count(Collection::Categories).await.unwrap(), 1);
    assert_eq!(db.count(Collection::Posts).await.unwrap(), 1);
}

#[tokio::test]
async fn test_posts_follow_fixture_rules() {
    let (_dir, db) = test_db().await;
    Seeder::new(db.clone()).run().await.unwrap();

    let author = user_by_email(&db, "example@example.com").await;
    let posts = db.list_posts_with_relations().await.unwrap();
    assert_eq!(posts.len(), 30);

    for (i, post) in posts.iter().enumerate() {
        assert_eq!(post.post.title, format!("Post{:02}", i + 1));
        assert_eq!(post.post.published, i % 4 != 0, "post {i}");
        assert_eq!(post.author, author);

        let expected: BTreeSet<String> = post_category_indices(i)
            .iter()
            .map(|&idx| category_name(idx))
            .collect();
        let actual: BTreeSet<String> = post.categories.iter().map(|c| c.name.clone()).collect();
        assert_eq!(actual, expected, "post {i}");
    }

    // Indices coincide for posts 0, 1, 10, 11, 20 and 21
    let single = posts.iter().filter(|p| p.categories.len() == 1).count();
    assert_eq!(single, 6);
}

#[tokio::test]
async fn test_posts_report_is_indented_json() {
    let (_dir, db) = test_db().await;
    let seeder = Seeder::new(db);
    seeder.run().await.unwrap();

    let report = seeder.posts_report().await.unwrap();
    assert!(report.starts_with("[\n  {"));

    let value: serde_json::Value = serde_json::from_str(&report).unwrap();
    let posts = value.as_array().unwrap();
    assert_eq!(posts.len(), 30);
    assert_eq!(posts[0]["title"], "Post01");
    assert_eq!(posts[0]["published"], false);
    assert_eq!(posts[0]["author"]["name"], "example");
    assert_eq!(posts[3]["categories"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_clear_all_allows_reseeding() {
    let (_dir, db) = test_db().await;
    let seeder = Seeder::new(db.clone());
    seeder.run().await.unwrap();

    seeder.clear_all().await.unwrap();
    assert_eq!(counts(&db).await, vec![0, 0, 0, 0]);

    let report = seeder.run().await.unwrap();
    assert_eq!(report.total(), 44);
}
