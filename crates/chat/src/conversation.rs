use codedesk_protocol::{ChatRequest, ContentPart, ConversationTurn, Role};
use std::path::Path;

pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are a programming assistant.";

/// Prior turns in caller order, followed by the new user turn when it has any parts.
pub fn build_contents(request: ChatRequest) -> Vec<ConversationTurn> {
    let ChatRequest {
        history,
        message,
        files,
    } = request;

    let mut contents = history;

    let mut parts = Vec::with_capacity(files.len() + 1);
    if !message.is_empty() {
        parts.push(ContentPart::text(message));
    }
    parts.extend(
        files
            .into_iter()
            .map(|file| ContentPart::inline(file.mime_type, file.data)),
    );

    if !parts.is_empty() {
        contents.push(ConversationTurn::new(Role::User, parts));
    }
    contents
}

/// Read the system instruction fresh from disk, so edits apply to the next request.
pub async fn load_system_instruction(path: &Path) -> String {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            DEFAULT_SYSTEM_INSTRUCTION.to_string()
        }
        Err(e) => {
            log::warn!(
                "Failed to read system instruction {}: {e}; using default",
                path.display()
            );
            DEFAULT_SYSTEM_INSTRUCTION.to_string()
        }
    }
}
