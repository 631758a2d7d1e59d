// File: convosync-server/src/main.rs

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use convosync_core::db::Database;
use convosync_core::platforms::voiceflow::VoiceflowClient;
use convosync_core::repositories::postgres::PostgresTranscriptRepository;
use convosync_core::services::ingest_service::TranscriptIngestService;
use convosync_core::services::sync_service::{SyncOptions, TranscriptSyncService};
use convosync_core::tasks::transcript_sync::spawn_transcript_sync_task;
use convosync_core::Error;

#[derive(Parser, Debug, Clone)]
#[command(name = "convosync")]
#[command(author, version, about = "Transcript ingestion and session reconstruction service")]
struct Args {
    /// Postgres connection URL.
    #[arg(long, env = "DATABASE_URL", default_value = "postgres://postgres@localhost:5432/convosync")]
    db_url: String,

    /// Voiceflow project whose transcripts are synced.
    #[arg(long, env = "CONVOSYNC_PROJECT_ID")]
    project_id: String,

    /// Override the transcript API base URL (for testing).
    #[arg(long, env = "CONVOSYNC_API_BASE")]
    api_base: Option<String>,

    /// Restrict the listing to one environment tag, e.g. "production".
    #[arg(long, env = "CONVOSYNC_ENVIRONMENT")]
    environment: Option<String>,

    /// Seconds between scheduled sync passes.
    #[arg(long, default_value = "900")]
    interval_secs: u64,

    /// Run exactly one sync pass and exit.
    #[arg(long, default_value = "false")]
    once: bool,

    /// Ignore the incremental watermark and sync everything.
    #[arg(long, default_value = "false")]
    force: bool,
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("convosync=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(sub)
        .expect("Failed to set global subscriber");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    init_tracing();
    let args = Args::parse();
    info!(
        "convosync starting. project={}, once={}, force={}",
        args.project_id, args.once, args.force
    );

    if let Err(e) = run(args).await {
        error!("convosync error: {:?}", e);
        std::process::exit(1);
    }
    info!("Main finished. Goodbye!");
    Ok(())
}

async fn run(args: Args) -> Result<(), Error> {
    // Missing credentials abort the whole pass up front.
    let api_key = std::env::var("VOICEFLOW_API_KEY")
        .map_err(|_| Error::Config("VOICEFLOW_API_KEY is not set".to_string()))?;

    let db = Database::new(&args.db_url).await?;
    db.migrate().await?;

    let mut client = VoiceflowClient::new(api_key, args.project_id)?
        .with_environment(args.environment.clone());
    if let Some(base) = &args.api_base {
        client = client.with_base_url(base.clone());
    }

    let ingest = Arc::new(TranscriptIngestService::new(db.clone()));
    let transcripts = Arc::new(PostgresTranscriptRepository::new(db.pool().clone()));
    let sync_service = Arc::new(TranscriptSyncService::new(
        Arc::new(client),
        ingest,
        transcripts,
    ));

    if args.once {
        let summary = sync_service
            .perform_sync(SyncOptions { force: args.force })
            .await?;
        info!(
            "Sync pass => synced={}, failed={}",
            summary.synced, summary.failed
        );
        for err in &summary.errors {
            info!("  warning: {}", err);
        }
        return Ok(());
    }

    let handle = spawn_transcript_sync_task(Arc::clone(&sync_service), args.interval_secs);
    info!(
        "Scheduled sync every {}s; press Ctrl-C to stop.",
        args.interval_secs
    );
    tokio::signal::ctrl_c().await.map_err(Error::Io)?;
    handle.abort();

    Ok(())
}
