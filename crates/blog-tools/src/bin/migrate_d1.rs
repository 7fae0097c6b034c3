//! Applies the migration tree to a hosted D1 database through wrangler.
//!
//! Run with:
//! ```
//! DB_NAME=blog-prod cargo run -p blog-tools --bin migrate-d1
//! ```

use blog_tools::config::DeployArgs;
use blog_tools::deploy::{Deployer, ProcessRunner, Wrangler};
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

    let args = DeployArgs::parse();

    let wrangler = Wrangler::new(ProcessRunner, &args.wrangler_bin);
    let outcome = Deployer::new(wrangler, &args.migrations_dir, &args.db_name)
        .with_target(args.target)
        .run()
        .await?;

    tracing::info!(
        "Migration run against {} finished ({} files staged)",
        args.db_name,
        outcome.staged.len()
    );
    println!("{}", outcome.output);

    Ok(())
}
