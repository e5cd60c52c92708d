// src/domain/names.rs
//
// Name truncation shared by every named entity.
// Applied identically when a row is written and when it is looked up,
// so a lookup with an over-long name still finds the stored row.

/// Keep at most `max` characters of `name` (characters, not bytes).
pub fn truncate_name(name: &str, max: usize) -> String {
    match name.char_indices().nth(max) {
        Some((cut, _)) => name[..cut].to_string(),
        None => name.to_string(),
    }
}
