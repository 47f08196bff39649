pub mod client;

pub use client::{AzureOpenAIClient, AzureOpenAIClientBuilder};
