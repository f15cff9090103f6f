mod load;
mod types;

pub use load::{load, load_from_path, CONFIG_ENV, LOCAL_CONFIG_FILE};
pub use types::{AppConfig, LoggingConfig, RunnerConfig};
