//! CLI command implementations.

pub mod price;
pub mod serve;

pub use price::PriceCommand;
pub use serve::ServeCommand;
