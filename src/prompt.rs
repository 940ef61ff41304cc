//! Prompt text and the chat-completion request body.

use serde::Serialize;

/// Instruction sent as the `system` message of every request.
pub const SYSTEM_PROMPT: &str = "You are an expert shell assistant. Output only a single valid shell command.\n\nRETURN THE RESULT ONLY IN THE FOLLOWING JSON FORMAT: {\"command\": \"<command>\"}";

/// Token placed between the context snapshot and the user's request.
pub const SEPARATOR: &str = "---";

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct RequestBody<'a> {
    messages: [Message<'a>; 2],
    response_format: ResponseFormat,
}

/// Joins the context snapshot and the typed request into the user message.
pub fn build_user_prompt(context: &str, input: &str) -> String {
    format!("{}{}{}", context, SEPARATOR, input)
}

/// Serializes the request body sent to the completion endpoint.
///
/// Field order is fixed by the struct layout, so identical prompts always
/// produce identical bytes.
///
/// # Example
///
/// ```
/// use conjure::prompt::build_request_body;
///
/// let body = build_request_body("sys", "usr").unwrap();
/// assert_eq!(
///     body,
///     r#"{"messages":[{"role":"system","content":"sys"},{"role":"user","content":"usr"}],"response_format":{"type":"json_object"}}"#
/// );
/// ```
pub fn build_request_body(system_prompt: &str, user_prompt: &str) -> serde_json::Result<String> {
    let body = RequestBody {
        messages: [
            Message {
                role: "system",
                content: system_prompt,
            },
            Message {
                role: "user",
                content: user_prompt,
            },
        ],
        response_format: ResponseFormat {
            kind: "json_object",
        },
    };
    serde_json::to_string(&body)
}
