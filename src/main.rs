use env_logger::{Builder, Env};
use lovescale::{AppConfig, AppError, run_with_config};

fn main() -> Result<(), AppError> {
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    run_with_config(AppConfig::from_env())
}
