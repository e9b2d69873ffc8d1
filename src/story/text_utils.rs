//! Small text helpers shared by the story and scene stages.

/// Phrases that show the child choosing and acting on their own. Used as a coarse
/// acceptance check on generated stories; it can both miss good stories and pass weak ones.
pub const SELF_CHOICE_KEYWORDS: &[&str] = &[
    "스스로",
    "혼자서",
    "해 봤",
    "해봤",
    "해 보았",
    "조심조심",
    "조심스럽게",
    "천천히",
    "한 입 더",
    "골랐",
];

const DISALLOWED_CHARS: &[char] = &['"', '\'', '“', '”', '‘', '’', '<', '>', '`'];

/// Removes quote and angle-bracket characters so text can sit inside an image prompt.
pub fn strip_disallowed_chars(text: &str) -> String {
    text.chars()
        .filter(|c| !DISALLOWED_CHARS.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Total non-overlapping occurrences of every self-choice keyword.
pub fn count_self_choice_indicators(text: &str) -> usize {
    SELF_CHOICE_KEYWORDS
        .iter()
        .map(|keyword| text.matches(keyword).count())
        .sum()
}

/// First `limit` characters (not bytes) of `text`.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

/// Last `limit` characters (not bytes) of `text`.
pub fn tail_chars(text: &str, limit: usize) -> String {
    let count = text.chars().count();
    text.chars().skip(count.saturating_sub(limit)).collect()
}
