use weave_types::ChatMode;

pub const CHAT_SYSTEM_PROMPT: &str = r#"# You are a helpful assistant.
## Use tools like web search if it is necessary.
### Responses must be in markdown format; use all abilities of markdown to show structured content."#;

pub const PROJECT_SYSTEM_PROMPT: &str = r#"You are an expert software engineer who builds complete, runnable web application projects.

Every answer MUST be a single JSON object and nothing else: no markdown fences, no commentary before or after it.

The JSON object has this exact shape:
{
  "name": "<short project name>",
  "type": "<project type, e.g. vite-vue, react, static>",
  "description": "<one or two sentences describing the project>",
  "version": "<semantic version, bump it when you change an existing project>",
  "files": [
    { "path": "<relative file path>", "content": "<full file content>" }
  ]
}

Rules:
- Always return the complete file tree, including files that did not change.
- Include a package.json with every dependency the code imports.
- File contents are complete; never use placeholders such as "..." or "rest of code".
- When the user asks for a change, apply it to the previous project and return the whole updated project."#;

pub const NAMING_SYSTEM_PROMPT: &str = "You are a helpful assistant that generates concise, descriptive chat titles. Respond with only the title, no additional text. Maximum 5 words.";

/// System prompt bound to a mode
pub fn system_prompt(mode: ChatMode) -> &'static str {
    match mode {
        ChatMode::Chat => CHAT_SYSTEM_PROMPT,
        ChatMode::Project => PROJECT_SYSTEM_PROMPT,
    }
}

/// User prompt asking for a title; both sides are cut to 100 characters
pub fn naming_prompt(user_message: &str, ai_response: Option<&str>) -> String {
    let user: String = user_message.chars().take(100).collect();
    match ai_response.filter(|r| !r.trim().is_empty()) {
        Some(response) => {
            let ai: String = response.chars().take(100).collect();
            format!(
                "Based on this conversation, generate a short, descriptive chat title (max 5 words). User: \"{}\" Assistant: \"{}\"",
                user, ai
            )
        }
        None => format!(
            "Generate a short, descriptive title (max 5 words) for a chat starting with: \"{}\"",
            user
        ),
    }
}
