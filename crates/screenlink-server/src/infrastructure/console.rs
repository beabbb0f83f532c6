//! Line-oriented command console for driving a proxy or harness by hand.
//!
//! The binary reads one command per stdin line and runs it against the live
//! connection.  Two families of verbs exist:
//!
//! | Harness verbs (deduped moves, no hooks) | Proxy verbs (production path)   |
//! |-----------------------------------------|---------------------------------|
//! | `move x y`                              | `mouse-move x y`                |
//! | `press key mask button`                 | `key-down key mask button`      |
//! | `release key mask button`               | `key-up key mask button`        |
//! | `click button` / `unclick button`       | `mouse-down b` / `mouse-up b`   |
//! | `enter` / `leave`                       | `screen-enter x y seq mask`     |
//! | `pos`                                   | `screen-leave`                  |
//! |                                         | `key-repeat key mask count btn` |
//!
//! Each line is parsed with clap as if it were a command line, so `help` and
//! `help <verb>` come for free.  Numbers may be decimal or `0x`-prefixed hex.
//!
//! Proxy and harness writes block on the socket, so [`ConsoleWorker`] runs
//! them on a dedicated thread and reports each [`CommandOutcome`] back over a
//! channel.

use std::str::FromStr;
use std::sync::mpsc as std_mpsc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::application::client_proxy::{ProxyError, VersionedClientProxy};
use crate::application::context::StreamError;
use crate::application::harness::Harness;
use screenlink_core::MoveOutcome;

/// One console line, parsed as `screenlink <command> [args...]`.
#[derive(Debug, Parser)]
#[command(name = "screenlink")]
struct ConsoleLine {
    #[command(subcommand)]
    command: Command,
}

/// One parsed console command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    // ── Harness ──
    /// Move the harness cursor; skipped if already there
    Move {
        #[arg(allow_negative_numbers = true, value_parser = parse_i32)]
        x: i32,
        #[arg(allow_negative_numbers = true, value_parser = parse_i32)]
        y: i32,
    },
    /// Inject a key-down
    Press {
        #[arg(allow_negative_numbers = true, value_parser = parse_i32)]
        key: i32,
        #[arg(value_parser = parse_u32)]
        mask: u32,
        #[arg(value_parser = parse_u32)]
        button: u32,
    },
    /// Inject a key-up
    Release {
        #[arg(allow_negative_numbers = true, value_parser = parse_i32)]
        key: i32,
        #[arg(value_parser = parse_u32)]
        mask: u32,
        #[arg(value_parser = parse_u32)]
        button: u32,
    },
    /// Inject a mouse-button press
    Click {
        #[arg(allow_negative_numbers = true, value_parser = parse_i32)]
        button: i32,
    },
    /// Inject a mouse-button release
    Unclick {
        #[arg(allow_negative_numbers = true, value_parser = parse_i32)]
        button: i32,
    },
    /// Enter the screen at the cached cursor position
    Enter,
    /// Leave the screen
    Leave,
    /// Print the cached cursor position
    #[command(name = "pos")]
    Position,

    // ── Proxy ──
    /// Send a key-down through the proxy
    KeyDown {
        #[arg(allow_negative_numbers = true, value_parser = parse_i32)]
        key: i32,
        #[arg(value_parser = parse_u32)]
        mask: u32,
        #[arg(value_parser = parse_u32)]
        button: u32,
    },
    /// Send a key-up through the proxy
    KeyUp {
        #[arg(allow_negative_numbers = true, value_parser = parse_i32)]
        key: i32,
        #[arg(value_parser = parse_u32)]
        mask: u32,
        #[arg(value_parser = parse_u32)]
        button: u32,
    },
    /// Send a key-repeat through the proxy
    KeyRepeat {
        #[arg(allow_negative_numbers = true, value_parser = parse_i32)]
        key: i32,
        #[arg(value_parser = parse_u32)]
        mask: u32,
        #[arg(allow_negative_numbers = true, value_parser = parse_i32)]
        count: i32,
        #[arg(value_parser = parse_u32)]
        button: u32,
    },
    /// Send a mouse-button press through the proxy
    MouseDown {
        #[arg(allow_negative_numbers = true, value_parser = parse_i32)]
        button: i32,
    },
    /// Send a mouse-button release through the proxy
    MouseUp {
        #[arg(allow_negative_numbers = true, value_parser = parse_i32)]
        button: i32,
    },
    /// Send an absolute mouse move through the proxy
    MouseMove {
        #[arg(allow_negative_numbers = true, value_parser = parse_i32)]
        x: i32,
        #[arg(allow_negative_numbers = true, value_parser = parse_i32)]
        y: i32,
    },
    /// Send a screen-enter through the proxy
    ScreenEnter {
        #[arg(allow_negative_numbers = true, value_parser = parse_i32)]
        x: i32,
        #[arg(allow_negative_numbers = true, value_parser = parse_i32)]
        y: i32,
        #[arg(value_parser = parse_u32)]
        sequence: u32,
        #[arg(value_parser = parse_u32)]
        mask: u32,
    },
    /// Send a screen-leave through the proxy
    ScreenLeave,

    // ── Console ──
    /// Stop the server
    #[command(alias = "exit")]
    Quit,
}

/// Parses one console line.
///
/// `help` and `help <verb>` are reported as a [`clap::Error`] of kind
/// [`clap::error::ErrorKind::DisplayHelp`] whose `Display` is the help text.
///
/// # Errors
///
/// Returns the [`clap::Error`] for an unknown verb, a missing or extra
/// argument, or a value that is not a number.
pub fn parse_command(line: &str) -> Result<Command, clap::Error> {
    ConsoleLine::try_parse_from(std::iter::once("screenlink").chain(line.split_whitespace()))
        .map(|parsed| parsed.command)
}

impl FromStr for Command {
    type Err = clap::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_command(s)
    }
}

fn parse_i32(raw: &str) -> Result<i32, String> {
    let parsed = match raw.strip_prefix("0x") {
        Some(hex) => i32::from_str_radix(hex, 16),
        None => raw.parse(),
    };
    parsed.map_err(|e| format!("{raw:?} is not a number: {e}"))
}

fn parse_u32(raw: &str) -> Result<u32, String> {
    let parsed = match raw.strip_prefix("0x") {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => raw.parse(),
    };
    parsed.map_err(|e| format!("{raw:?} is not a number: {e}"))
}

/// Runs `cmd` and returns the text to print, if any.
///
/// [`Command::Quit`] is handled by the caller and is a no-op here.
///
/// # Errors
///
/// Propagates the [`ProxyError`] from the proxy or harness call.
pub fn execute(
    cmd: Command,
    proxy: &VersionedClientProxy,
    harness: &Harness,
) -> Result<Option<String>, ProxyError> {
    let output = match cmd {
        Command::Move { x, y } => match harness.move_mouse(x, y)? {
            MoveOutcome::Emitted => None,
            MoveOutcome::Suppressed => Some(format!("already at {x},{y}")),
        },
        Command::Press { key, mask, button } => {
            harness.press_key(key, mask, button)?;
            None
        }
        Command::Release { key, mask, button } => {
            harness.unpress_key(key, mask, button)?;
            None
        }
        Command::Click { button } => {
            harness.click_mouse(button)?;
            None
        }
        Command::Unclick { button } => {
            harness.unclick_mouse(button)?;
            None
        }
        Command::Enter => {
            harness.enter_screen()?;
            None
        }
        Command::Leave => {
            harness.leave_screen()?;
            None
        }
        Command::Position => {
            let pos = harness.mouse_position();
            Some(format!("{},{}", pos.x, pos.y))
        }
        Command::KeyDown { key, mask, button } => {
            proxy.key_down(key, mask, button)?;
            None
        }
        Command::KeyUp { key, mask, button } => {
            proxy.key_up(key, mask, button)?;
            None
        }
        Command::KeyRepeat { key, mask, count, button } => {
            proxy.key_repeat(key, mask, count, button)?;
            None
        }
        Command::MouseDown { button } => {
            proxy.mouse_down(button)?;
            None
        }
        Command::MouseUp { button } => {
            proxy.mouse_up(button)?;
            None
        }
        Command::MouseMove { x, y } => {
            proxy.mouse_move(x, y)?;
            None
        }
        Command::ScreenEnter { x, y, sequence, mask } => {
            proxy.enter(x, y, sequence, mask, false)?;
            None
        }
        Command::ScreenLeave => {
            proxy.leave()?;
            None
        }
        Command::Quit => None,
    };
    Ok(output)
}

// ── Worker ────────────────────────────────────────────────────────────────────

/// Result of one command run by a [`ConsoleWorker`].
#[derive(Debug)]
pub enum CommandOutcome {
    /// The command ran; print the text if there is any.
    Done(Option<String>),
    /// The command failed but the connection is still usable.
    Failed(ProxyError),
    /// The peer connection failed or was closed; nothing more can be sent.
    ConnectionLost(ProxyError),
}

impl From<Result<Option<String>, ProxyError>> for CommandOutcome {
    fn from(result: Result<Option<String>, ProxyError>) -> Self {
        match result {
            Ok(output) => Self::Done(output),
            Err(e @ ProxyError::Stream(StreamError::Io(_) | StreamError::Closed)) => {
                Self::ConnectionLost(e)
            }
            Err(e) => Self::Failed(e),
        }
    }
}

/// Owns the proxy and harness and runs commands on a dedicated thread, so the
/// async command loop never waits on a socket write.
pub struct ConsoleWorker {
    commands: std_mpsc::Sender<Command>,
    done: oneshot::Receiver<()>,
}

impl ConsoleWorker {
    /// Starts the worker thread.  Every submitted command produces exactly
    /// one [`CommandOutcome`] on `results`.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread cannot be spawned.
    pub fn spawn(
        proxy: VersionedClientProxy,
        harness: Harness,
        results: mpsc::UnboundedSender<CommandOutcome>,
    ) -> std::io::Result<Self> {
        let (commands, queue) = std_mpsc::channel::<Command>();
        let (done_tx, done) = oneshot::channel();

        std::thread::Builder::new()
            .name("screenlink-console".to_string())
            .spawn(move || {
                for cmd in queue {
                    debug!("console: {cmd:?}");
                    let outcome = CommandOutcome::from(execute(cmd, &proxy, &harness));
                    if results.send(outcome).is_err() {
                        break;
                    }
                }
                // Dropping the proxy fires on_shutdown and joins its poller.
                drop(harness);
                drop(proxy);
                let _ = done_tx.send(());
            })?;

        Ok(Self { commands, done })
    }

    /// Queues `cmd`.  Returns `false` once the worker thread has exited.
    pub fn submit(&self, cmd: Command) -> bool {
        self.commands.send(cmd).is_ok()
    }

    /// Stops accepting commands and waits up to `grace` for the queue to
    /// drain and the proxy to shut down.  Returns `false` on timeout.
    pub async fn shutdown(self, grace: Duration) -> bool {
        let Self { commands, done } = self;
        drop(commands);
        matches!(tokio::time::timeout(grace, done).await, Ok(Ok(())))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
