//! "Did you mean?" suggestions for unknown function names.

/// Largest edit distance at which a registered name is suggested.
pub const MAX_SUGGESTION_DISTANCE: usize = 2;

/// Levenshtein distance: the number of single-character insertions,
/// deletions or substitutions turning `a` into `b`.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let b_len = b.chars().count();
    if a.is_empty() {
        return b_len;
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];
    for (i, a_char) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, b_char) in b.chars().enumerate() {
            let substitution = prev[j] + usize::from(a_char != b_char);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(substitution);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_len]
}

/// Functions whose name is within [`MAX_SUGGESTION_DISTANCE`] of `name`,
/// formatted `package::name()`, sorted and deduplicated.
pub fn similar_functions<'a>(
    name: &str,
    candidates: impl Iterator<Item = (&'a str, &'a str)>,
) -> Vec<String> {
    let mut found: Vec<String> = candidates
        .filter(|(_, candidate)| edit_distance(name, candidate) <= MAX_SUGGESTION_DISTANCE)
        .map(|(package, candidate)| format!("{package}::{candidate}()"))
        .collect();
    found.sort();
    found.dedup();
    found
}
