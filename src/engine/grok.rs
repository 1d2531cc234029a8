//! Logstash grok export.
//!
//! Output only: the grok text is derived from the current rows and never fed
//! back into parsing. Captured tokens become `%{_NAME:name}` references;
//! every other row, captured boundaries included, is copied verbatim.
//!
//! ```text
//! _SHOT (shot\d+)
//! SHOT (?:\.%{_SHOT:shot}_)
//! ```

use super::component::{Component, Role};

/// `%{_NAME:name}` reference for a captured token, raw pattern otherwise.
/// Only tokens get a definition line, so only tokens are referenced.
pub(crate) fn reference(row: &Component) -> String {
    if row.captures() && row.role() == Role::Token {
        format!("%{{_{}:{}}}", row.descriptor().to_uppercase(), row.descriptor().to_lowercase())
    } else {
        row.pattern().to_string()
    }
}

pub(crate) fn body<'c>(rows: impl IntoIterator<Item = &'c Component>) -> String {
    rows.into_iter().map(reference).collect()
}

/// Definition line for a word, plus the composed line when its token captures.
pub(crate) fn word(descriptor: &str, rows: &[Component]) -> String {
    let name = descriptor.to_uppercase();
    let Some(token) = rows.iter().find(|row| row.role() == Role::Token) else {
        return format!("{name} (?:{})", body(rows));
    };

    let definition = format!("{name} ({})", token.pattern());
    if !token.captures() {
        return definition;
    }
    format!("_{definition}\n{name} (?:{})", body(rows))
}

/// Child definitions followed by the phrase line.
pub(crate) fn phrase<'c>(descriptor: &str, children: &[String], rows: impl IntoIterator<Item = &'c Component>) -> String {
    let mut lines: Vec<String> = children.to_vec();
    lines.push(format!("{} (?:{})", descriptor.to_uppercase(), body(rows)));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::component::PatternFlags;

    fn row(role: Role, pattern: &str, captures: bool) -> Component {
        Component::new(role, "shot", vec![pattern.to_string()], captures, true, PatternFlags::empty())
    }

    #[test]
    fn captured_word_has_definition_and_pattern() {
        let rows = [row(Role::Determiner, r"\.", false), row(Role::Token, r"shot\d+", true), row(Role::Terminator, "_", false)];
        assert_eq!(word("shot", &rows), "_SHOT (shot\\d+)\nSHOT (?:\\.%{_SHOT:shot}_)");
    }

    #[test]
    fn uncaptured_word_is_definition_only() {
        let rows = [row(Role::Determiner, "", false), row(Role::Token, "v", false), row(Role::Terminator, "", false)];
        assert_eq!(word("marker", &rows), "MARKER (v)");
    }

    #[test]
    fn phrase_appends_own_line() {
        let rows = [row(Role::Determiner, "", false), row(Role::Token, r"\d+", true), row(Role::Terminator, "", false)];
        let out = phrase("master", &["A (a)".to_string()], &rows);
        assert_eq!(out, "A (a)\nMASTER (?:%{_SHOT:shot})");
    }
}
