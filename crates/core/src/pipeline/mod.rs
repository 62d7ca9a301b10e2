pub mod monitor_use_case;
pub mod pipeline_logger;
pub mod preview_sink;
