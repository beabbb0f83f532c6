//! ScreenLink server entry point.
//!
//! Wires one accepted peer connection to a client proxy and a harness, then
//! runs console commands from stdin until EOF, `quit`, Ctrl-C, or a failed
//! write from either the proxy or the harness.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()           -- TOML file or defaults
//!  └─ TcpListener::accept()   -- one peer
//!  └─ ProxyContext            -- FramedStream + cursor cache + bridge
//!       ├─ TracingHooks        (registered on the bridge)
//!       ├─ VersionedClientProxy (spawns its poller thread)
//!       └─ Harness
//!  └─ ConsoleWorker           -- owns proxy + harness, runs blocking writes
//!  └─ command loop            -- stdin lines, command outcomes, proxy events, Ctrl-C
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use screenlink_server::application::client_proxy::{ProxyEvent, VersionedClientProxy};
use screenlink_server::application::context::ProxyContext;
use screenlink_server::application::harness::Harness;
use screenlink_server::infrastructure::automation::TracingHooks;
use screenlink_server::infrastructure::console::{
    parse_command, Command, CommandOutcome, ConsoleWorker,
};
use screenlink_server::infrastructure::storage::config::load_config;
use screenlink_server::infrastructure::stream::FramedStream;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().context("loading configuration")?;

    // Initialise structured logging.  `RUST_LOG` overrides the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();

    info!("ScreenLink server starting");
    let version = config.protocol_version()?;

    // ── Accept one peer ───────────────────────────────────────────────────────
    let address = config.listen_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    info!("waiting for \"{}\" on {address}", config.server.screen_name);

    let (socket, peer) = tokio::select! {
        accepted = listener.accept() => accepted.context("accepting peer")?,
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received before a peer connected");
            return Ok(());
        }
    };
    info!("peer connected from {peer}, protocol {version}");

    // Proxy writes are synchronous; hand the socket over as a blocking stream.
    socket.set_nodelay(true)?;
    let socket = socket.into_std()?;
    socket.set_nonblocking(false)?;

    // ── Shared context, proxy and harness ─────────────────────────────────────
    let context = Arc::new(ProxyContext::with_initial_cursor(
        Arc::new(FramedStream::new(socket)),
        config.initial_cursor(),
    ));
    context.bridge().register(Arc::new(TracingHooks::default()))?;

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let proxy = VersionedClientProxy::new(
        config.server.screen_name.clone(),
        version,
        Arc::clone(&context),
        config.poller_config(),
    )?
    .with_event_queue(events_tx);
    let harness = Harness::with_version(Arc::clone(&context), config.harness_config(), version)?;

    let (results_tx, mut results_rx) = mpsc::unbounded_channel();
    let worker = ConsoleWorker::spawn(proxy, harness, results_tx).context("starting console")?;

    info!("ScreenLink server ready.  Type \"help\" for commands, Ctrl-C to exit.");

    // ── Command loop ──────────────────────────────────────────────────────────
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    info!("stdin closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line) {
                    Ok(Command::Quit) => break,
                    Ok(cmd) => {
                        if !worker.submit(cmd) {
                            error!("console worker stopped");
                            break;
                        }
                    }
                    Err(e) => println!("{e}"),
                }
            }
            Some(outcome) = results_rx.recv() => match outcome {
                CommandOutcome::Done(Some(output)) => println!("{output}"),
                CommandOutcome::Done(None) => {}
                CommandOutcome::Failed(e) => warn!("{e}"),
                CommandOutcome::ConnectionLost(e) => {
                    error!("connection to \"{}\" lost: {e}", config.server.screen_name);
                    break;
                }
            },
            Some(event) = events_rx.recv() => {
                if let ProxyEvent::WriteFailed { name, error, .. } = event {
                    error!("connection to \"{name}\" lost: {error}");
                    break;
                }
            }
            _ = &mut shutdown => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    if !worker.shutdown(Duration::from_secs(2)).await {
        warn!("console worker did not stop within 2s; exiting anyway");
    }
    info!("ScreenLink server stopped");
    Ok(())
}
