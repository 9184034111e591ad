#[allow(clippy::module_inception)]
pub mod groove;
pub mod score;
pub mod state;
