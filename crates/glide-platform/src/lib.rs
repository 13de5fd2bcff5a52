//! Host glue for running a Glide list outside a windowing toolkit.
//!
//! Everything here lives on the UI thread except the [`WorkerPool`] threads,
//! which only ever hand results back through a [`UiQueue`].

pub mod config;
pub mod dispatch;
pub mod host;
pub mod image_loader;
pub mod timer;

pub use config::HostConfig;
pub use dispatch::{UiQueue, WorkerPool};
pub use host::ListHost;
pub use image_loader::{ImageLoader, ImageSource, LoadError};
pub use timer::AnimationTimer;

/// Install `env_logger` with `info` as the default level. `RUST_LOG`
/// overrides it. Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}
