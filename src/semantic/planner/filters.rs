//! Selections and wildcards to WHERE predicates.

use super::plan::Predicate;
use super::product::{MatchMode, NullCheck, Selection, Wildcard};

/// Escape character used in generated LIKE patterns.
pub const LIKE_ESCAPE: char = '!';

/// Predicates contributed by one selection, in order: membership, then null test.
pub fn selection_predicates(selection: &Selection) -> Vec<Predicate> {
    let mut out = Vec::new();
    if !selection.values.is_empty() {
        out.push(Predicate::InList {
            field: selection.id.clone(),
            values: selection.values.clone(),
            negated: selection.exclude,
        });
    }
    if let Some(check) = selection.null {
        out.push(Predicate::IsNull {
            field: selection.id.clone(),
            negated: check == NullCheck::IsNotNull,
        });
    }
    out
}

pub fn wildcard_predicate(wildcard: &Wildcard) -> Predicate {
    let (pattern, escape) = like_pattern(&wildcard.value, wildcard.mode);
    Predicate::Like {
        field: wildcard.id.clone(),
        pattern,
        escape,
        negated: wildcard.exclude,
    }
}

/// Build a LIKE pattern matching `value` literally in the given position.
///
/// `%`, `_` and the escape character in `value` are escaped; the escape
/// character is returned only when something needed escaping.
pub fn like_pattern(value: &str, mode: MatchMode) -> (String, Option<char>) {
    let mut escaped = String::with_capacity(value.len() + 2);
    let mut needs_escape = false;
    for c in value.chars() {
        if c == '%' || c == '_' || c == LIKE_ESCAPE {
            escaped.push(LIKE_ESCAPE);
            needs_escape = true;
        }
        escaped.push(c);
    }

    let pattern = match mode {
        MatchMode::StartsWith => format!("{escaped}%"),
        MatchMode::EndsWith => format!("%{escaped}"),
        MatchMode::Contains => format!("%{escaped}%"),
        MatchMode::Exact => escaped,
    };
    (pattern, needs_escape.then_some(LIKE_ESCAPE))
}
