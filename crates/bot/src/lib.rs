pub mod api;
pub mod metrics;
pub mod poller;
pub mod state;
pub mod telegram;
