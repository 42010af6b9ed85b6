//! Human-readable model names.

/// Provider prefixes removed before formatting.
const PROVIDER_PREFIXES: [&str; 2] = ["@cf/", "@hf/"];

/// Words always rendered upper-case.
const ACRONYMS: [&str; 9] = ["GPT", "AI", "ML", "NLP", "API", "FP8", "FP16", "IT", "AWQ"];

/// Format a raw model identifier into a display name.
///
/// ```
/// use faqsync::model::format_display_name;
///
/// assert_eq!(
///     format_display_name("@cf/meta/llama-3.3-70b-instruct-fp8-fast"),
///     "Llama 3.3 70B Instruct FP8 Fast"
/// );
/// assert_eq!(format_display_name("@cf/google/gemma-3-12b-it"), "Gemma 3 12B IT");
/// ```
pub fn format_display_name(model_id: &str) -> String {
    let trimmed = model_id.trim();
    if trimmed.is_empty() {
        return "Unknown Model".to_string();
    }

    let without_prefix = PROVIDER_PREFIXES
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .unwrap_or(trimmed);

    let name = without_prefix
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or(without_prefix);

    let words: Vec<String> = name
        .split(['-', '_', ' '])
        .filter(|word| !word.is_empty())
        .map(format_word)
        .collect();

    if words.is_empty() {
        return "Unknown Model".to_string();
    }
    words.join(" ")
}

fn format_word(word: &str) -> String {
    let upper = word.to_uppercase();
    if ACRONYMS.contains(&upper.as_str()) || is_parameter_size(word) {
        return upper;
    }

    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `8b`, `70b`, `1.5b`, `16e` style size tokens.
fn is_parameter_size(word: &str) -> bool {
    let Some(last) = word.chars().last() else {
        return false;
    };
    let digits = &word[..word.len() - last.len_utf8()];
    matches!(last, 'b' | 'B' | 'e' | 'm' | 'M')
        && !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.chars().next().is_some_and(|c| c.is_ascii_digit())
}
