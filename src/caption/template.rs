//! Caption prompt templating with `{placeholder}` substitution.
//!
//! Given a template string and a set of named inputs, replaces every
//! `{key}` with the matching input. `{{` and `}}` produce literal braces.
//! Unknown keys and unbalanced braces are errors.
use crate::error::{AppError, AppResult};

/// Values available to a caption template.
///
/// `{prompt}` is also reachable as `{image_prompt}`.
#[derive(Debug, Clone, Copy)]
pub struct TemplateInputs<'a> {
    pub prompt: &'a str,
    pub image_description: &'a str,
    pub opener: &'a str,
    pub closer: &'a str,
}

impl<'a> TemplateInputs<'a> {
    fn lookup(&self, key: &str) -> Option<&'a str> {
        match key {
            "prompt" | "image_prompt" => Some(self.prompt),
            "image_description" => Some(self.image_description),
            "opener" => Some(self.opener),
            "closer" => Some(self.closer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CaptionTemplate {
    source: String,
}

impl CaptionTemplate {
    pub fn new(source: impl Into<String>) -> Self {
        CaptionTemplate { source: source.into() }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render the template by substituting placeholders from `inputs`.
    pub fn render(&self, inputs: &TemplateInputs<'_>) -> AppResult<String> {
        let mut out = String::with_capacity(self.source.len() + 256);
        let mut chars = self.source.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            match c {
                '{' => {
                    if matches!(chars.peek(), Some((_, '{'))) {
                        chars.next();
                        out.push('{');
                        continue;
                    }
                    let mut key = String::new();
                    let mut closed = false;
                    for (_, k) in chars.by_ref() {
                        if k == '}' {
                            closed = true;
                            break;
                        }
                        if k == '{' {
                            break;
                        }
                        key.push(k);
                    }
                    if !closed {
                        return Err(AppError::Template(format!(
                            "Unclosed placeholder starting at byte {}",
                            pos
                        )));
                    }
                    let value = inputs.lookup(&key).ok_or_else(|| {
                        AppError::Template(format!("Missing input for placeholder: {}", key))
                    })?;
                    out.push_str(value);
                }
                '}' => {
                    if matches!(chars.peek(), Some((_, '}'))) {
                        chars.next();
                        out.push('}');
                    } else {
                        return Err(AppError::Template(format!(
                            "Single '}}' encountered at byte {}",
                            pos
                        )));
                    }
                }
                _ => out.push(c),
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> TemplateInputs<'static> {
        TemplateInputs {
            prompt: "a fox in the snow",
            image_description: "A red fox standing in fresh snow",
            opener: "Check this out!",
            closer: "What do you think?",
        }
    }

    #[test]
    fn test_all_placeholders_are_substituted() {
        let template = CaptionTemplate::new(
            "Start with '{opener}'. Prompt: {image_prompt}. Image: {image_description}. End with '{closer}'.",
        );
        let rendered = template.render(&inputs()).unwrap();
        assert_eq!(
            rendered,
            "Start with 'Check this out!'. Prompt: a fox in the snow. \
             Image: A red fox standing in fresh snow. End with 'What do you think?'."
        );
    }

    #[test]
    fn test_prompt_alias() {
        let template = CaptionTemplate::new("{prompt}|{image_prompt}");
        assert_eq!(
            template.render(&inputs()).unwrap(),
            "a fox in the snow|a fox in the snow"
        );
    }

    #[test]
    fn test_escaped_braces_are_literal() {
        let template = CaptionTemplate::new("Reply as JSON {{\"caption\": \"...\"}} about {prompt}");
        assert_eq!(
            template.render(&inputs()).unwrap(),
            "Reply as JSON {\"caption\": \"...\"} about a fox in the snow"
        );
    }

    #[test]
    fn test_unknown_placeholder_is_an_error() {
        let template = CaptionTemplate::new("Hello {audience}");
        let err = template.render(&inputs()).unwrap_err();
        assert!(matches!(err, AppError::Template(_)));
        assert!(err.to_string().contains("audience"));
    }

    #[test]
    fn test_unbalanced_braces_are_errors() {
        assert!(CaptionTemplate::new("oops {prompt").render(&inputs()).is_err());
        assert!(CaptionTemplate::new("oops } here").render(&inputs()).is_err());
    }

    #[test]
    fn test_template_without_placeholders_is_unchanged() {
        let template = CaptionTemplate::new("Write a short caption.");
        assert_eq!(template.render(&inputs()).unwrap(), "Write a short caption.");
    }
}
