//! The configured level drives the host log backend.

use log::{Level, LevelFilter};
use portwire::config::SystemConfig;

#[test]
fn configured_level_filters_the_backend() {
    let config = SystemConfig::from_json(r#"{ "log_level": "debug" }"#).unwrap();
    let level = config.level_filter().unwrap();
    assert_eq!(level, LevelFilter::Debug);

    env_logger::Builder::new()
        .filter_level(level)
        .is_test(true)
        .try_init()
        .unwrap();

    assert_eq!(log::max_level(), LevelFilter::Debug);
    assert!(log::log_enabled!(Level::Debug));
    assert!(!log::log_enabled!(Level::Trace));
}
