//! Logging infrastructure bridging tracing events to the playground console.
//!
//! The `ConsoleLayer` is a tracing `Layer` that intercepts tracing events
//! and forwards appropriate ones to a console sink (usually the session's
//! output channel). It filters events by level: ERROR, WARN and INFO are
//! forwarded; DEBUG and TRACE stay in the log file only.

use std::sync::Arc;

use tracing::field::Visit;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::Registry;

/// A tracing Layer that forwards events to a console sink.
pub struct ConsoleLayer {
    send_line: Arc<dyn Fn(Level, String) + Send + Sync>,
}

impl ConsoleLayer {
    pub fn new<F>(send_line: F) -> Self
    where
        F: Fn(Level, String) + Send + Sync + 'static,
    {
        Self {
            send_line: Arc::new(send_line),
        }
    }
}

/// Visitor that extracts the message field from tracing events.
struct MessageVisitor {
    message: Option<String>,
}

impl MessageVisitor {
    fn new() -> Self {
        Self { message: None }
    }
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{value:?}"));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        }
    }
}

impl<S> Layer<S> for ConsoleLayer
where
    S: tracing::Subscriber,
{
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let metadata = event.metadata();

        let level = *metadata.level();
        if level > Level::INFO {
            // DEBUG and TRACE are too chatty for the console surface.
            return;
        }

        let mut visitor = MessageVisitor::new();
        event.record(&mut visitor);

        if let Some(message) = visitor.message {
            (self.send_line)(level, message);
        }
    }
}

/// Initialize the dual-layer tracing subscriber.
///
/// Sets up:
/// - File layer: writes to the system temp dir with daily rotation
/// - Console layer: forwards INFO+ messages to the sink
/// - `EnvFilter`: respects `RUST_LOG` env var, defaults to "info"
///
/// Returns a `WorkerGuard` that must be kept alive for file logging to work.
pub fn init_tracing<F>(send_line: F) -> WorkerGuard
where
    F: Fn(Level, String) + Send + Sync + 'static,
{
    let file_appender = tracing_appender::rolling::daily(std::env::temp_dir(), "playpen.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(env_filter);

    let console_layer =
        ConsoleLayer::new(send_line).with_filter(tracing_subscriber::filter::LevelFilter::INFO);

    Registry::default().with(file_layer).with(console_layer).init();

    guard
}
