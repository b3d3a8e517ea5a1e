use std::fs::File;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use career_pal::services::{config_service, ChatClient, CompletionBackend};
use career_pal::ui;

/// Diagnostics go to a file: the TUI owns the alternate screen, so anything
/// written to stderr would be invisible or corrupt the display.
fn init_logging() {
    let Ok(path) = config_service::log_path() else {
        return;
    };
    let Ok(file) = File::create(&path) else {
        return;
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let base_url = config_service::effective_base_url();
    tracing::info!(%base_url, "starting career-pal");

    let backend: Arc<dyn CompletionBackend> = Arc::new(ChatClient::new(&base_url));
    let mut app = ui::App::new(backend);

    let mut terminal = ui::setup_terminal()?;
    let result = app.run(&mut terminal).await;
    ui::restore_terminal(&mut terminal)?;

    result?;
    Ok(())
}
