//! Fixed fixture data for an empty blog database.
//!
//! Everything here is deterministic: two roles, two users, ten categories and
//! thirty posts. Cross references (role ids, author, category ids) are
//! expressed as names or indices and resolved by the [`Seeder`] against the
//! rows it created or fetched.
//!
//! [`Seeder`]: crate::db::Seeder

/// Role names, in creation order.
pub const ROLE_NAMES: [&str; 2] = ["ADMIN", "USER"];

pub const CATEGORY_COUNT: usize = 10;
pub const POST_COUNT: usize = 30;

/// Every post is written by the second user.
pub const POST_AUTHOR_INDEX: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserFixture {
    pub name: &'static str,
    pub email: &'static str,
    /// Role names resolved against the role collection.
    pub roles: &'static [&'static str],
}

pub const USER_FIXTURES: [UserFixture; 2] = [
    UserFixture {
        name: "admin",
        email: "admin@example.com",
        roles: &["ADMIN", "USER"],
    },
    UserFixture {
        name: "example",
        email: "example@example.com",
        roles: &["USER"],
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostFixture {
    pub title: String,
    pub content: String,
    pub published: bool,
    /// Positions in the category list, not ids.
    pub category_indices: [usize; 2],
}

/// Two-digit, zero-padded 1-based label for `index`.
fn label(index: usize) -> String {
    format!("{:02}", index + 1)
}

/// `Category01` for index 0 through `Category10` for index 9.
pub fn category_name(index: usize) -> String {
    format!("Category{}", label(index))
}

pub fn category_fixtures() -> Vec<String> {
    (0..CATEGORY_COUNT).map(category_name).collect()
}

/// Every fourth post, starting with the first, is a draft.
pub fn is_published(index: usize) -> bool {
    index % 4 != 0
}

/// Category positions for the post at `index`. Both can name the same category.
pub fn post_category_indices(index: usize) -> [usize; 2] {
    [index % 2, index % 10]
}

pub fn post_fixture(index: usize) -> PostFixture {
    let title = format!("Post{}", label(index));
    PostFixture {
        content: format!("{title} content"),
        title,
        published: is_published(index),
        category_indices: post_category_indices(index),
    }
}

pub fn post_fixtures(count: usize) -> Vec<PostFixture> {
    (0..count).map(post_fixture).collect()
}
