//! Hashtag normalization shared by the caption and publishing clients.

/// Normalize tags to `#tag` form and join them with single spaces.
///
/// Surrounding whitespace and any leading `#` are stripped before exactly one
/// `#` is re-added. Tags that end up empty are skipped.
pub fn format_hashtags<S: AsRef<str>>(tags: &[S]) -> String {
    tags.iter()
        .map(|tag| tag.as_ref().trim().trim_start_matches('#'))
        .filter(|tag| !tag.is_empty())
        .map(|tag| format!("#{}", tag))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Append hashtags to `caption` as a new paragraph.
///
/// Returns the caption unchanged when there is nothing to append: an empty
/// or all-blank tag list adds no trailing blank line.
pub fn append_hashtags<S: AsRef<str>>(caption: &str, tags: &[S]) -> String {
    let formatted = format_hashtags(tags);
    if formatted.is_empty() {
        return caption.to_string();
    }
    format!("{}\n\n{}", caption, formatted)
}
