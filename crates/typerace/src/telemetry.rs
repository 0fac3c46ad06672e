//! Log output setup.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::util::SubscriberInitExt;

use crate::TyperaceError;

/// Installs a global `fmt` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_directive` is used (e.g.
/// `"info"` or `"typerace_room=debug,info"`). Fails if a global subscriber
/// is already installed.
pub fn init_tracing(default_directive: &str) -> Result<(), TyperaceError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .finish()
        .try_init()?;
    Ok(())
}
