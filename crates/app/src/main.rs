use std::sync::Arc;

use tnai::TutorApp;
use tnai::repl;
use tnai::settings::SettingsStore;
use tnai_storage::{KeyValueStore, MemoryStorage, SqliteStorage};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Logs go to stderr so they never interleave with the rendered surface.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let settings = SettingsStore::load().settings();
    let storage_path = settings.storage_path.display().to_string();
    let storage: Arc<dyn KeyValueStore> = match SqliteStorage::open(&storage_path).await {
        Ok(storage) => Arc::new(storage),
        Err(error) => {
            tracing::warn!(
                path = %storage_path,
                error = %error,
                "sqlite storage unavailable, sessions will not survive restarts"
            );
            Arc::new(MemoryStorage::new())
        }
    };

    let mut app = TutorApp::new(settings, storage);
    app.boot();

    if let Err(error) = repl::run(&mut app).await {
        tracing::error!(error = %error, "terminal session ended with an error");
    }
}
