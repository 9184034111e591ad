pub mod errors;
pub mod groove;
pub mod motion;
pub mod pdik;
#[cfg(feature = "python_wrap")]
pub mod python_wrapper;
pub mod spacetime;
pub mod utils;

pub use errors::Error;
