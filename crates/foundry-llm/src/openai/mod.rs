pub mod client;

pub use client::{ModelEntry, OpenAIClient};
