use serde::Serialize;
use serde_json::Value;

/// Body of a Messages API call.
///
/// Fields are kept as raw JSON so the proxy can relay whatever the browser
/// sent without interpreting it. Absent fields are omitted on the wire; an
/// explicit `null` is sent as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChatRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Value>,
}

impl ChatRequest {
    /// Picks the relayed fields out of an arbitrary JSON body. Anything that
    /// is not an object relays as `{}`.
    pub fn from_body(body: &Value) -> Self {
        Self {
            model: body.get("model").cloned(),
            max_tokens: body.get("max_tokens").cloned(),
            system: body.get("system").cloned(),
            messages: body.get("messages").cloned(),
        }
    }

    pub fn new(model: &str, max_tokens: u32, system: &str, messages: &[ChatMessage]) -> Self {
        Self {
            model: Some(Value::from(model)),
            max_tokens: Some(Value::from(max_tokens)),
            system: Some(Value::from(system)),
            messages: Some(serde_json::json!(messages)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

/// Raw upstream response, relayed as-is by the proxy.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatResponse(pub Value);

impl ChatResponse {
    /// Text of the first content block, if the response has one.
    pub fn first_text(&self) -> Option<&str> {
        self.0.get("content")?.get(0)?.get("text")?.as_str()
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_body__should_omit_absent_fields() {
        // Given
        let request = ChatRequest::from_body(&json!({"model": "m", "extra": true}));

        // When
        let encoded = serde_json::to_value(&request).expect("encode");

        // Then
        assert_eq!(encoded, json!({"model": "m"}));
    }

    #[test]
    fn from_body__should_keep_explicit_nulls() {
        // Given
        let request = ChatRequest::from_body(&json!({"model": "m", "system": null}));

        // When
        let encoded = serde_json::to_value(&request).expect("encode");

        // Then
        assert_eq!(encoded, json!({"model": "m", "system": null}));
    }

    #[test]
    fn from_body__should_relay_non_objects_as_empty() {
        for body in [json!([]), json!("text"), json!(42), Value::Null] {
            let encoded = serde_json::to_value(ChatRequest::from_body(&body)).expect("encode");
            assert_eq!(encoded, json!({}), "{body}");
        }
    }

    #[test]
    fn chat_request__should_build_user_message_body() {
        // When
        let request = ChatRequest::new("haiku", 150, "be brief", &[ChatMessage::user("hi")]);

        // Then
        assert_eq!(
            serde_json::to_value(&request).expect("encode"),
            json!({
                "model": "haiku",
                "max_tokens": 150,
                "system": "be brief",
                "messages": [{"role": "user", "content": "hi"}],
            })
        );
    }

    #[test]
    fn first_text__should_return_none_without_content() {
        // Given
        let response = ChatResponse(json!({"type": "error", "error": {"message": "nope"}}));

        // Then
        assert_eq!(response.first_text(), None);
    }

    #[test]
    fn first_text__should_read_first_block() {
        // Given
        let response = ChatResponse(json!({
            "content": [{"type": "text", "text": "Tacos."}, {"type": "text", "text": "Ignored"}]
        }));

        // Then
        assert_eq!(response.first_text(), Some("Tacos."));
    }
}
