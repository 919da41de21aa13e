//! Logging setup for ragchat hosts.

pub mod event_layer;

pub use event_layer::{LogEvent, SessionEventLayer};

use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Installs the global subscriber.
///
/// `RUST_LOG` wins over `default_filter` when set. When `events` is given,
/// every log event is also forwarded there as a [`LogEvent`].
pub fn init_tracing(
    default_filter: &str,
    events: Option<mpsc::UnboundedSender<LogEvent>>,
) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_filter))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(events.map(SessionEventLayer::new))
        .try_init()?;
    Ok(())
}
