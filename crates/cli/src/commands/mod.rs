pub mod config;
pub mod endpoints;
pub mod fees;
pub mod price;
pub mod utils;

pub use config::{handle_config_command, ConfigCommands};
pub use endpoints::show_endpoints;
pub use fees::{show_fees, OutputFormat};
pub use price::show_prices;
