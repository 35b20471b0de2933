/*!
 * Key normalization for glossary terms.
 *
 * Every source term, alias and proposal key goes through `normalize_term`
 * exactly once before it touches the store, so `葉陽`, `葉陽 ` and a
 * full-width variant all land on the same entry.
 */

/// Normalize a source term into its glossary key.
///
/// Full-width ASCII is folded to half-width, the ideographic space becomes a
/// plain space, surrounding whitespace is trimmed and internal whitespace runs
/// collapse to a single space. Case is preserved.
pub fn normalize_term(term: &str) -> String {
    let mut normalized = String::with_capacity(term.len());
    let mut pending_space = false;

    for ch in term.chars().map(fold_width) {
        if ch.is_whitespace() {
            pending_space = !normalized.is_empty();
            continue;
        }
        if pending_space {
            normalized.push(' ');
            pending_space = false;
        }
        normalized.push(ch);
    }

    normalized
}

/// Normalize a target-language translation.
///
/// Targets are operator-facing text, so only surrounding whitespace is dropped.
pub fn normalize_target(target: &str) -> String {
    target.trim().to_string()
}

fn fold_width(ch: char) -> char {
    match ch {
        '\u{3000}' => ' ',
        '\u{FF01}'..='\u{FF5E}' => char::from_u32(ch as u32 - 0xFEE0).unwrap_or(ch),
        _ => ch,
    }
}
