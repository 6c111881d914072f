use crate::extractor::ExtractionHints;

/// Normalizes listing text before it is sent to the extractor
///
/// Unifies line endings, collapses whitespace, drops `Page N` markers left
/// by print layouts, trims, and truncates to `max_chars` characters.
pub fn prepare_input(text: &str, max_chars: usize) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let tokens: Vec<&str> = unified.split_whitespace().collect();

    let mut kept: Vec<&str> = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i];
        let next_is_number = tokens
            .get(i + 1)
            .map_or(false, |next| next.starts_with(|c: char| c.is_ascii_digit()));

        if token == "Page" && next_is_number {
            let rest = tokens[i + 1].trim_start_matches(|c: char| c.is_ascii_digit());
            if !rest.is_empty() {
                kept.push(rest);
            }
            i += 2;
            continue;
        }

        kept.push(token);
        i += 1;
    }

    let normalized = kept.join(" ");
    match normalized.char_indices().nth(max_chars) {
        Some((cut, _)) => normalized[..cut].to_string(),
        None => normalized,
    }
}

/// Prefixes explicitly scraped title/company to prepared text
pub fn with_hints(prepared: &str, hints: &ExtractionHints) -> String {
    let mut input = String::new();

    if let Some(title) = hints.title.as_deref().filter(|t| !t.trim().is_empty()) {
        input.push_str("TITLE: ");
        input.push_str(title.trim());
        input.push('\n');
    }
    if let Some(company) = hints.company.as_deref().filter(|c| !c.trim().is_empty()) {
        input.push_str("COMPANY: ");
        input.push_str(company.trim());
        input.push('\n');
    }
    if !input.is_empty() {
        input.push('\n');
    }

    input.push_str(prepared);
    input
}
