//! Model identifier grammar.
//!
//! A valid identifier looks like `@cf/meta/llama-3.1-8b-instruct`:
//! `@<provider>/<namespace>/<name>` where the provider is lower-case
//! alphanumeric, the namespace allows `[A-Za-z0-9_-]` and the name
//! additionally allows `.`.

/// Check a model identifier against the `@provider/namespace/name` grammar.
///
/// ```
/// use faqsync::model::is_valid_model_id;
///
/// assert!(is_valid_model_id("@cf/meta/llama-3.1-8b-instruct"));
/// assert!(!is_valid_model_id("llama-3.1-8b-instruct"));
/// assert!(!is_valid_model_id("@cf/meta/llama 3"));
/// ```
pub fn is_valid_model_id(id: &str) -> bool {
    let Some(rest) = id.strip_prefix('@') else {
        return false;
    };

    let mut parts = rest.splitn(3, '/');
    let (Some(provider), Some(namespace), Some(name)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    !provider.is_empty()
        && provider
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        && !namespace.is_empty()
        && namespace.chars().all(is_namespace_char)
        && !name.is_empty()
        && name.chars().all(|c| is_namespace_char(c) || c == '.')
}

fn is_namespace_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}
