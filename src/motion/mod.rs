pub mod blend;
pub mod filter;
pub mod pd;
