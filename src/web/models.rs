use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    // Sent by the browser for follow-up questions; not used for retrieval
    #[serde(default)]
    pub thread_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_id_is_camel_case() {
        let req: ChatRequest =
            serde_json::from_str(r#"{"prompt":"hi","threadId":"t-1"}"#).unwrap();
        assert_eq!(req.prompt.as_deref(), Some("hi"));
        assert_eq!(req.thread_id.as_deref(), Some("t-1"));
    }

    #[test]
    fn error_without_details_omits_field() {
        let body = serde_json::to_string(&ErrorResponse::new("Prompt is required")).unwrap();
        assert_eq!(body, r#"{"error":"Prompt is required"}"#);
    }
}
