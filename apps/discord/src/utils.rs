//! Small text helpers shared by the reply paths.

/// Expand `${VAR}` patterns with environment variable values.
///
/// Unknown variables are replaced with an empty string.
pub fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next();
            let mut name = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                name.push(c);
            }
            if let Ok(value) = std::env::var(&name) {
                result.push_str(&value);
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// Split text into parts of at most `limit` characters.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let chars = text.chars().collect::<Vec<_>>();
    chars
        .chunks(limit.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Remove `<@id>` and `<@!id>` mentions of `user` and trim.
pub fn strip_mention(content: &str, user: &str) -> String {
    content
        .replace(&format!("<@{user}>"), "")
        .replace(&format!("<@!{user}>"), "")
        .trim()
        .to_owned()
}
