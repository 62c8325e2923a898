//! Operator tooling for the photo backend.
//!
//! The one real command is `register`, the administrative recovery path for
//! photo servers: it registers (or re-registers) a server, clears its
//! unreachable breaker, and pushes the shard's full photo list so the
//! server catches up on everything it missed. `resync` is the same command
//! under the name operators reach for when the breaker is tripped.

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use lightbox_db::models::photo_server::RegisterPhotoServer;
use lightbox_fanout::{register_photo_server, HttpTransport, RetryConfig};

#[derive(Parser)]
#[command(name = "lightbox-admin", version, about = "Operator tooling for the Lightbox photo backend")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a photo server and push its shard's full photo list.
    ///
    /// Re-registering an existing server (same update URL) refreshes its
    /// row, clears the unreachable breaker, and resyncs everything it
    /// missed while out of rotation.
    #[command(visible_alias = "resync")]
    Register {
        /// Shard subdomain the server serves (e.g. photos01)
        #[arg(long)]
        subdomain: String,
        /// Endpoint that accepts photo update commands
        #[arg(long)]
        update_url: String,
        /// Shared key the server expects in its Authorization header
        #[arg(long, env = "PHOTO_SERVER_AUTH_KEY")]
        auth_key: String,
    },
    /// Apply pending database migrations.
    Migrate,
    /// Check database connectivity.
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lightbox_admin=info,lightbox_fanout=info,lightbox_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = lightbox_db::create_pool(&database_url)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::Register {
            subdomain,
            update_url,
            auth_key,
        } => {
            lightbox_db::health_check(&pool)
                .await
                .context("Database health check failed")?;

            let register = RegisterPhotoServer {
                subdomain,
                photos_update_url: update_url,
                auth_key,
            };
            let transport = HttpTransport::default();
            let (server, pushed) = register_photo_server(
                &pool,
                &transport,
                &RetryConfig::default(),
                &register,
                Utc::now(),
            )
            .await
            .context("Photo server registration failed")?;

            println!(
                "Registered photo server {} for shard {} ({} photos resynced)",
                server.id, server.subdomain, pushed
            );
        }
        Commands::Migrate => {
            lightbox_db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Database migrations applied");
        }
        Commands::Health => {
            lightbox_db::health_check(&pool)
                .await
                .context("Database health check failed")?;
            println!("ok");
        }
    }

    Ok(())
}
