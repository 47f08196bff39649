use serde::{Deserialize, Serialize};

/// Capability attached to an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolDefinition {
    CodeInterpreter,
    AzureAiSearch,
    /// Tool kinds these samples do not configure (file_search, function, ...)
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolResources {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_interpreter: Option<CodeInterpreterResource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_ai_search: Option<AzureAiSearchResource>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeInterpreterResource {
    #[serde(default)]
    pub file_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AzureAiSearchResource {
    #[serde(default)]
    pub indexes: Vec<AiSearchIndexResource>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiSearchIndexResource {
    pub index_connection_id: String,
    pub index_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_type: Option<AzureAiSearchQueryType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AzureAiSearchQueryType {
    Simple,
    Semantic,
    Vector,
    VectorSimpleHybrid,
    VectorSemanticHybrid,
}

/// Code execution sandbox, optionally seeded with uploaded files
#[derive(Debug, Clone, Default)]
pub struct CodeInterpreterTool {
    file_ids: Vec<String>,
}

impl CodeInterpreterTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file_ids(file_ids: Vec<String>) -> Self {
        Self { file_ids }
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        vec![ToolDefinition::CodeInterpreter]
    }

    pub fn resources(&self) -> ToolResources {
        ToolResources {
            code_interpreter: Some(CodeInterpreterResource {
                file_ids: self.file_ids.clone(),
            }),
            azure_ai_search: None,
        }
    }
}

/// Query over an existing Azure AI Search index reached through a project connection
#[derive(Debug, Clone)]
pub struct AzureAiSearchTool {
    index: AiSearchIndexResource,
}

impl AzureAiSearchTool {
    pub fn new(index_connection_id: impl Into<String>, index_name: impl Into<String>) -> Self {
        Self {
            index: AiSearchIndexResource {
                index_connection_id: index_connection_id.into(),
                index_name: index_name.into(),
                query_type: None,
                top_k: None,
                filter: None,
            },
        }
    }

    pub fn with_query_type(mut self, query_type: AzureAiSearchQueryType) -> Self {
        self.index.query_type = Some(query_type);
        self
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.index.top_k = Some(top_k);
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.index.filter = Some(filter.into());
        self
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        vec![ToolDefinition::AzureAiSearch]
    }

    pub fn resources(&self) -> ToolResources {
        ToolResources {
            code_interpreter: None,
            azure_ai_search: Some(AzureAiSearchResource {
                indexes: vec![self.index.clone()],
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_definition_wire_format() {
        let json = serde_json::to_value(CodeInterpreterTool::new().definitions()).unwrap();
        assert_eq!(json, json!([{"type": "code_interpreter"}]));

        let parsed: Vec<ToolDefinition> =
            serde_json::from_value(json!([{"type": "azure_ai_search"}, {"type": "file_search"}])).unwrap();
        assert_eq!(parsed, vec![ToolDefinition::AzureAiSearch, ToolDefinition::Other]);
    }

    #[test]
    fn test_search_resources_wire_format() {
        let tool = AzureAiSearchTool::new("/subscriptions/s/connections/search", "docs-index")
            .with_query_type(AzureAiSearchQueryType::VectorSemanticHybrid)
            .with_top_k(3)
            .with_filter("");

        let json = serde_json::to_value(tool.resources()).unwrap();
        assert_eq!(
            json,
            json!({
                "azure_ai_search": {
                    "indexes": [{
                        "index_connection_id": "/subscriptions/s/connections/search",
                        "index_name": "docs-index",
                        "query_type": "vector_semantic_hybrid",
                        "top_k": 3,
                        "filter": ""
                    }]
                }
            })
        );
    }
}
