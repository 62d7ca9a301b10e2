pub mod alert_controller;
pub mod alert_dispatcher;
