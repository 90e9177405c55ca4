use std::{fs, path::Path};

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant in a Personal AI Workspace application. \
You help users with writing, coding, analysis, and general questions. \
Be concise, helpful, and friendly. Format code with markdown code blocks when appropriate.";

pub fn system_prompt() -> String {
    let prompt_file = Path::new("SYSTEM_PROMPT.md");
    match fs::read_to_string(prompt_file) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => DEFAULT_SYSTEM_PROMPT.to_owned(),
    }
}
