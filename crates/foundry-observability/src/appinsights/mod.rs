pub mod client;
pub mod connection_string;
pub mod observer;
pub mod types;

pub use client::AppInsightsClient;
pub use connection_string::ConnectionString;
pub use observer::AppInsightsObserver;
