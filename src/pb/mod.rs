#[allow(clippy::all)]
mod tensorboard;

pub use tensorboard::*;
