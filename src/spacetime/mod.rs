pub mod configuration;
pub mod robot;
