pub mod client;
pub mod error;
pub mod evaluate;
pub mod metrics;
pub mod model;
pub mod panel;
pub mod samples;
