//! HTTP relay in front of a TensorBoard log directory.
//!
//! Writes go straight to TensorBoard event files, one folder per
//! experiment; reads are proxied to a running TensorBoard instance.
//! [`client::TbClient`] talks to the relay.

pub mod client;
pub mod config;
pub mod events;
pub mod handlers;
pub mod histogram;
pub mod middleware;
pub mod pb;
pub mod server;
pub mod tensorboard;

pub use config::RelayConfig;

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// One open event writer per experiment, created on first write.
    pub writers: events::WriterRegistry,

    /// Proxy for reads, bounded by `RelayConfig::proxy_timeout`.
    pub tensorboard: tensorboard::TensorBoard,
}

impl AppState {
    pub fn new(config: RelayConfig) -> Result<Self, tensorboard::ProxyError> {
        let tensorboard =
            tensorboard::TensorBoard::new(&config.tensorboard_url, config.proxy_timeout)?;
        Ok(Self {
            writers: events::WriterRegistry::new(config.log_dir),
            tensorboard,
        })
    }
}
