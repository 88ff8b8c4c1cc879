pub mod app; // Shared session + stores
pub mod charts; // Medical charts series and distributions
pub mod client; // Backend REST client
pub mod config;
pub mod error;
pub mod files;
pub mod image_store; // ImageKit uploads
pub mod models;
pub mod session;
pub mod store; // Auth + medical records stores
pub mod upload; // Prescription upload orchestration
pub mod validation;

#[cfg(test)]
mod testing;

pub use app::AppState;
pub use config::ClientConfig;
pub use error::ClientError;

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the default
/// filter. Calling it again is a no-op.
pub fn init_tracing() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    }
}
