//! # Codedesk Chat
//!
//! Stateless bridge between the browser chat UI and the Gemini `generateContent` API.
//!
//! Every call carries the full conversation: prior turns are forwarded untouched, the new
//! message and its inline attachments become one user turn, and the system instruction is
//! re-read from disk.

mod conversation;
mod error;
mod gemini;

pub use conversation::{build_contents, load_system_instruction, DEFAULT_SYSTEM_INSTRUCTION};
pub use error::{ChatError, Result};
pub use gemini::{
    extract_reply, ChatBridge, ChatConfig, GenerateContentRequest, GenerationConfig,
    SystemInstruction, DEFAULT_API_BASE, DEFAULT_MODEL, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT,
    MAX_TIMEOUT,
};
