pub mod handlers;

pub use handlers::{config, fallback, json_config};
