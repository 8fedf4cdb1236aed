pub mod error;
pub mod events;
pub mod models;
pub mod session;
pub mod settings;
pub mod store;
mod utils;

use std::{future::Future, sync::Arc};

use anyhow::{Context, Result};
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

pub use error::Error;
use session::{EvictionSweeper, SessionController, SessionIdAllocator};
use settings::ServiceSettings;
use store::KeyedStore;

/// Everything an ingress handler needs, built once per process.
pub struct AppState {
    pub sessions: SessionController,
    pub settings: ServiceSettings,
}

impl AppState {
    pub fn new(settings: &ServiceSettings) -> Self {
        let store = Arc::new(KeyedStore::new());
        let allocator = Arc::new(SessionIdAllocator::new(settings.allocation_timeout()));
        Self::with_controller(SessionController::new(store, allocator), settings.clone())
    }

    pub fn with_controller(sessions: SessionController, settings: ServiceSettings) -> Self {
        Self { sessions, settings }
    }
}

/// Process entry point: sets up logging and settings, then serves
/// newline-delimited JSON events on stdin until EOF or Ctrl-C.
pub fn run() -> Result<()> {
    let settings = ServiceSettings::from_env()?;
    utils::logging::init(settings.log_filter());

    info!("pagepulse starting up...");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(serve(AppState::new(&settings)))
}

async fn serve(state: AppState) -> Result<()> {
    let mut sweeper = EvictionSweeper::new();
    sweeper.start(
        state.sessions.clone(),
        state.settings.sweep_interval(),
        state.settings.session_idle_ttl(),
    )?;

    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl-C: {err}");
            std::future::pending::<()>().await;
        }
        warn!("interrupted, shutting down");
    };
    let served = serve_lines(&state, tokio::io::stdin(), tokio::io::stdout(), shutdown).await;

    sweeper.stop().await?;
    info!(
        "pagepulse stopped with {} live sessions",
        state.sessions.store().len()
    );
    served
}

/// Answers each request line on `input` with one reply line on `output`
/// until the input closes or `shutdown` resolves.
///
/// `shutdown` is polled as one future for the whole loop, so a signal that
/// lands while a line is being handled ends the loop on the next turn.
async fn serve_lines<R, W, S>(state: &AppState, input: R, mut output: W, shutdown: S) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    S: Future<Output = ()>,
{
    let mut lines = BufReader::new(input).lines();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => break,
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read request line")? else {
                    info!("input closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }

                let mut reply = events::handle_line(state, &line).await;
                reply.push('\n');
                output
                    .write_all(reply.as_bytes())
                    .await
                    .context("failed to write reply")?;
                output.flush().await.context("failed to flush reply")?;
            }
        }
    }

    Ok(())
}
