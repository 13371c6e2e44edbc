pub mod make;
pub mod migrate;
pub mod seed;

/// Timestamp format of status listings
pub(crate) const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
