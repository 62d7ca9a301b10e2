pub mod alerting;
pub mod capture;
pub mod detection;
pub mod notification;
pub mod pipeline;
pub mod shared;
pub mod snapshot;

#[cfg(test)]
pub(crate) mod test_support;
