pub mod annotate;
pub mod bounding_box;
pub mod clock;
pub mod constants;
pub mod detection;
pub mod frame;
pub mod monitor_config;
