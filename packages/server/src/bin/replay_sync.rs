//! Run one sync job by hand, against the configured database.
//!
//! Useful for replaying a job that exhausted its retries, or for inspecting
//! what a job would act on with `--dry-run`.

use anyhow::{Context, Result};
use clap::Parser;
use crosspost_core::common::{PostId, UserId};
use crosspost_core::config::Config;
use crosspost_core::domains::crosspost::sync_event;
use crosspost_core::kernel::SyncDeps;
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "replay_sync")]
#[command(about = "Replay a cross-platform sync event for one post")]
struct Cli {
    /// Home user whose action is being mirrored
    actor_id: i64,

    post_id: i64,

    /// create, reply, quote, delete, like, unlike, bookmark or unbookmark
    event: String,

    /// Load and print the post and enabled platforms without calling any platform
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,crosspost_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let deps = SyncDeps::from_config(&config, pool)?;
    let actor_id = UserId::new(cli.actor_id);
    let post_id = PostId::new(cli.post_id);

    if cli.dry_run {
        let post = deps.posts.get_post(post_id).await?;
        let platforms = deps.settings.enabled_platforms(actor_id).await?;
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "post": post,
                "enabled_platforms": platforms,
            }))?
        );
        return Ok(());
    }

    match sync_event(actor_id, post_id, &cli.event, &deps).await {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(e) => {
            let retryable = e.is_retryable();
            tracing::error!(error = %e, retryable, "Sync event failed");
            anyhow::bail!(
                "{} ({})",
                e,
                if retryable { "retryable" } else { "not retryable" }
            )
        }
    }
}
