//! Database integration for seeding fixture data.
//!
//! The [`Seeder`] fills the role, user, category and post collections in
//! dependency order, each only when it is empty.

mod seeder;

pub use seeder::{SeedError, SeedReport, Seeded, Seeder};
