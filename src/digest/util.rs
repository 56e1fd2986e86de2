use std::error::Error;

/// Truncate `input` to at most `max_chars` Unicode characters, stripping
/// control characters and appending `…` plus the original length when
/// truncated. Used for every upstream body that ends up in a log line.
pub fn truncate_with_ellipsis(input: &str, max_chars: usize) -> String {
    let clean: String = input
        .chars()
        .map(|c| if c == '\n' || c == '\t' { ' ' } else { c })
        .filter(|c| !c.is_control())
        .collect();
    let total = clean.chars().count();
    if total > max_chars {
        let mut s: String = clean.chars().take(max_chars).collect();
        s.push_str(&format!("… ({total} chars)"));
        s
    } else {
        clean
    }
}

/// Render an error together with every `source()` below it, joined by `: `.
pub fn error_chain(err: &dyn Error) -> String {
    let mut out = err.to_string();
    let mut current = err.source();
    while let Some(cause) = current {
        let text = cause.to_string();
        if !out.contains(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        current = cause.source();
    }
    out
}

/// Mask a secret for display, keeping only a short tail.
pub fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 4 {
        return "****".to_string();
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("****{tail}")
}
