//! Request and response bodies of the Responses endpoint.
//!
//! Bodies are decoded into these types before anything reads them, so a
//! reply either yields text or a [`CompletionError::MalformedResponse`].

use chatgpt_core::{CompletionError, Turn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct ResponsesRequest<'a> {
    pub model: &'a str,
    pub input: &'a [Turn],
}

#[derive(Debug, Deserialize)]
pub struct ResponsesBody {
    #[serde(default)]
    output: Vec<OutputItem>,
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OutputItem {
    Message {
        #[serde(default)]
        content: Vec<ContentPart>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    OutputText { text: String },
    Refusal { refusal: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
}

impl ResponsesBody {
    /// Collapse the output items into the reply text.
    pub fn into_text(self) -> Result<String, CompletionError> {
        if let Some(error) = self.error {
            return Err(CompletionError::MalformedResponse(format!(
                "response failed: {}",
                error.message
            )));
        }

        if let Some(text) = self.output_text.filter(|t| !t.trim().is_empty()) {
            return Ok(text.trim().to_string());
        }

        let mut text = String::new();
        let mut refusal = None;
        for item in self.output {
            let OutputItem::Message { content } = item else {
                continue;
            };
            for part in content {
                match part {
                    ContentPart::OutputText { text: chunk } => text.push_str(&chunk),
                    ContentPart::Refusal { refusal: r } => refusal = Some(r),
                    ContentPart::Other => {}
                }
            }
        }

        // A refusal is still what the model answered.
        let text = if text.trim().is_empty() {
            refusal.unwrap_or_default()
        } else {
            text
        };

        let text = text.trim();
        if text.is_empty() {
            return Err(CompletionError::MalformedResponse(
                "response contained no output text".to_string(),
            ));
        }
        Ok(text.to_string())
    }
}

/// Message carried by an error body, if the body has the usual shape.
pub fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .map(|b| b.error.message)
}
