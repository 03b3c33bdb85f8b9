//! Validation rules for user-supplied input.
//!
//! Pure functions with no side effects: they never touch connection state,
//! which keeps every rule testable in isolation. On success the *trimmed*
//! form is returned; that trimmed form is what gets stored and broadcast.

use thiserror::Error;

/// Maximum length of a chat message, after trimming.
pub const MAX_CHAT_LEN: usize = 500;
/// Display-name length bounds, after trimming.
pub const MIN_NAME_LEN: usize = 2;
pub const MAX_NAME_LEN: usize = 32;
/// Maximum length of an AI prompt, after trimming.
pub const MAX_PROMPT_LEN: usize = 1000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("Name must be between {MIN_NAME_LEN} and {MAX_NAME_LEN} characters.")]
    Length,
    #[error("Name may only contain letters, digits, spaces, - and _.")]
    Charset,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("Message cannot be empty.")]
    Empty,
    #[error("Message is too long (max {MAX_CHAT_LEN} characters).")]
    TooLong,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("AI prompt cannot be empty.")]
    Empty,
    #[error("AI prompt is too long (max {MAX_PROMPT_LEN} characters).")]
    TooLong,
}

/// Validate a display name.
pub fn validate_name(name: &str) -> Result<String, NameError> {
    let trimmed = name.trim();
    if trimmed.len() < MIN_NAME_LEN || trimmed.len() > MAX_NAME_LEN {
        return Err(NameError::Length);
    }
    if !trimmed
        .chars()
        .all(|c| c.is_alphanumeric() || c == ' ' || c == '-' || c == '_')
    {
        return Err(NameError::Charset);
    }
    Ok(trimmed.to_string())
}

/// Validate a chat message body.
pub fn validate_chat_text(text: &str) -> Result<String, ChatError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ChatError::Empty);
    }
    if trimmed.len() > MAX_CHAT_LEN {
        return Err(ChatError::TooLong);
    }
    Ok(trimmed.to_string())
}

/// Validate an AI prompt.
pub fn validate_prompt(prompt: &str) -> Result<String, PromptError> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(PromptError::Empty);
    }
    if trimmed.len() > MAX_PROMPT_LEN {
        return Err(PromptError::TooLong);
    }
    Ok(trimmed.to_string())
}
