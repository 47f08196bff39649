pub mod types;
pub mod traits;
pub mod credential;
pub mod config;
pub mod azure_openai;
pub mod openai;
pub mod local;

mod wire;

pub use traits::{ChatClient, ChatRequest, ChatResponse, ChatOptions, TokenUsage};
pub use credential::{
    AccessToken, AzureCliCredential, Credential, StaticTokenCredential, TokenCredential,
    AI_AZURE_SCOPE, COGNITIVE_SERVICES_SCOPE,
};
pub use config::{ClientFactory, ProviderConfig, ProviderType};
pub use azure_openai::AzureOpenAIClient;
pub use openai::{ModelEntry, OpenAIClient};
pub use local::{FoundryLocal, ModelInfo, DEFAULT_LOCAL_ENDPOINT};
pub use types::{Message, Content, ContentPart};
