pub mod logger;
pub mod progress;

pub use logger::{init_logger, log_to_file, LOG_FILE};
