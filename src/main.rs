use clap::Parser;
use miette::{IntoDiagnostic, Result};
use payproc::config::Settings;
use payproc::domain::ports::Repositories;
use payproc::infrastructure::in_memory::InMemoryBackend;
use payproc::interfaces::batch::BatchRunner;
use payproc::interfaces::csv::request_reader::RequestReader;
use payproc::interfaces::handler::{Request, RequestHandler};
use payproc::interfaces::response_writer::ResponseWriter;
use payproc::interfaces::seed::Seed;
use payproc::provider::PaymentProvider;
use payproc::telemetry;
use std::fs::File;
use std::io;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[cfg(feature = "storage-rocksdb")]
async fn open_repositories(settings: &Settings, seed: &Seed) -> Result<Repositories> {
    if let Some(db_path) = &settings.db_path {
        // Use persistent storage (RocksDB)
        let store =
            payproc::infrastructure::rocksdb::RocksDBStore::open(db_path).into_diagnostic()?;
        seed.load_into_rocksdb(&store).into_diagnostic()?;
        return Ok(store.repositories());
    }
    Ok(in_memory(seed).await)
}

#[cfg(not(feature = "storage-rocksdb"))]
async fn open_repositories(settings: &Settings, seed: &Seed) -> Result<Repositories> {
    if settings.db_path.is_some() {
        eprintln!(
            "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(in_memory(seed).await)
}

async fn in_memory(seed: &Seed) -> Repositories {
    let backend = InMemoryBackend::new();
    seed.load_into_memory(&backend).await;
    backend.repositories()
}

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::parse();
    if !telemetry::init(&settings.log_level) {
        eprintln!("WARNING: a global tracing subscriber was already installed");
    }

    let seed = match &settings.seed {
        Some(path) => Seed::from_path(path).into_diagnostic()?,
        None => Seed::default(),
    };
    let repositories = open_repositories(&settings, &seed).await?;

    // Ctrl-C cancels any authorization still waiting on the network.
    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, cancelling in-flight authorizations");
                shutdown.cancel();
            }
        });
    }

    let handler = RequestHandler::new(&repositories, Arc::new(PaymentProvider::default()))
        .with_actor(settings.created_by.clone())
        .with_authorization_timeout(settings.authorization_timeout());
    let mut batch = BatchRunner::new(handler, &shutdown);

    let file = File::open(&settings.input).into_diagnostic()?;
    let reader = RequestReader::new(file);
    for record in reader.requests() {
        match record {
            Ok(record) => batch.submit(Request::try_from(record)),
            Err(e) => {
                eprintln!("Error reading request: {}", e);
            }
        }
    }

    let stdout = io::stdout();
    let mut writer = ResponseWriter::new(stdout.lock());
    batch.finish(&mut writer).await.into_diagnostic()?;
    Ok(())
}
