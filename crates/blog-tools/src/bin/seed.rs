//! Seeds an empty blog database with fixture data, then prints every post
//! with its author and categories.
//!
//! Run with:
//! ```
//! cargo run -p blog-tools --bin seed -- --migrate
//! ```

use blog::{Database, migrations};
use blog_tools::config::SeedArgs;
use blog_tools::db::Seeder;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = SeedArgs::parse();

    let db = Database::connect(&args.database_url, args.max_connections).await?;
    tracing::info!("Connected to database");

    if args.migrate {
        let migrations = migrations::collect(&args.migrations_dir)?;
        let applied = db.apply_migrations(&migrations).await?;
        tracing::info!("Applied {} of {} migrations", applied, migrations.len());
    }

    let seeder = Seeder::new(db);
    if args.reset {
        seeder.clear_all().await?;
    }

    let report = seeder.run().await?;

    // Summary output
    tracing::info!("Seed completed!");
    tracing::info!("  Roles: {}", report.roles);
    tracing::info!("  Users: {}", report.users);
    tracing::info!("  Categories: {}", report.categories);
    tracing::info!("  Posts: {}", report.posts);

    println!("{}", seeder.posts_report().await?);

    Ok(())
}
