// Shared prompt fragments. Each feature module keeps its own prompts.rs
// next to the code that sends them.

/// Default system role when a feature has nothing more specific to say.
pub const DEFAULT_ROLE: &str = "You are a helpful assistant.";

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Replaces each `{key}` placeholder in `template` with its value in a single
/// pass, so placeholder-like text inside inserted values is left alone.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        let matched = values
            .iter()
            .find(|(key, _)| tail.starts_with(key) && tail[key.len()..].starts_with('}'));
        match matched {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_replaces_every_occurrence() {
        let out = fill("{a} and {b}, then {a}", &[("a", "x"), ("b", "y")]);
        assert_eq!(out, "x and y, then x");
    }

    #[test]
    fn test_fill_does_not_expand_inserted_text() {
        let out = fill("{a}|{b}", &[("a", "{b}"), ("b", "y")]);
        assert_eq!(out, "{b}|y");
    }

    #[test]
    fn test_fill_leaves_literal_braces() {
        let out = fill(r#"{"Name": "{name}"}"#, &[("name", "Ada")]);
        assert_eq!(out, r#"{"Name": "Ada"}"#);
    }

    #[test]
    fn test_fill_leaves_unknown_placeholders() {
        assert_eq!(fill("{a} {c}", &[("a", "1")]), "1 {c}");
    }
}
