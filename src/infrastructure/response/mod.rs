use once_cell::sync::Lazy;
use regex::Regex;

static THINK_TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<think>[\s\S]*?</think>|<think\s*/>").unwrap());

static REASONING_TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<reasoning>[\s\S]*?</reasoning>").unwrap());

/// Cleans generated text before it reaches the CSV pipeline: reasoning tags
/// go, every line is trimmed and blank lines are dropped.
pub fn clean_generated_text(response: &str) -> String {
    let without_think = THINK_TAG_PATTERN.replace_all(response, "");
    let without_reasoning = REASONING_TAG_PATTERN.replace_all(&without_think, "");

    without_reasoning
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Free-form list reply (one idea per line) into items. Leading and trailing
/// bullets, digits, dots and blanks are stripped; items of five characters
/// or fewer are noise.
pub fn split_list_items(response: &str) -> Vec<String> {
    const MARKERS: &[char] = &['•', '-', '*', '.', ' ', '0', '1', '2', '3', '4', '5', '6', '7', '8', '9'];

    response
        .trim()
        .lines()
        .filter(|line| line.trim().chars().count() > 5)
        .map(|line| line.trim().trim_matches(MARKERS).to_string())
        .filter(|item| !item.is_empty())
        .collect()
}
