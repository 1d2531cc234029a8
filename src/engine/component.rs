//! Components: the three slots of a word.
//!
//! A [`Component`] is one row of a grammar table. Words own exactly three of
//! them (determiner, token, terminator); phrases flatten the rows of all their
//! children into one composite table.

use super::mutation::{RESERVED_CANDIDATES, resolve_index};
use crate::error::{GrammarError, Result};
use regex::{Regex, RegexBuilder};

/// Position of a component inside its word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Determiner,
    Token,
    Terminator,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Determiner, Role::Token, Role::Terminator];

    /// Index of this role in a mutation triple.
    pub fn slot(self) -> usize {
        match self {
            Role::Determiner => 0,
            Role::Token => 1,
            Role::Terminator => 2,
        }
    }

    /// Determiners and terminators form the scaffold of a phrase.
    pub fn is_boundary(self) -> bool {
        self != Role::Token
    }

    pub(crate) fn descriptor(self, word: &str) -> String {
        match self {
            Role::Determiner => format!("{word}_determiner"),
            Role::Token => word.to_string(),
            Role::Terminator => format!("{word}_terminator"),
        }
    }
}

bitflags::bitflags! {
    /// Regex flags a word compiles with.
    ///
    /// Inside a phrase the flags are scoped to the word's own fragments with
    /// an inline group (`(?i:...)`), so two words with different flags can be
    /// composed into one pattern.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PatternFlags: u8 {
        const CASE_INSENSITIVE     = 1 << 0;
        const MULTI_LINE           = 1 << 1;
        const DOT_MATCHES_NEW_LINE = 1 << 2;
        const IGNORE_WHITESPACE    = 1 << 3;
        const SWAP_GREED           = 1 << 4;
    }
}

impl PatternFlags {
    pub(crate) fn configure(self, builder: &mut RegexBuilder) {
        builder
            .case_insensitive(self.contains(PatternFlags::CASE_INSENSITIVE))
            .multi_line(self.contains(PatternFlags::MULTI_LINE))
            .dot_matches_new_line(self.contains(PatternFlags::DOT_MATCHES_NEW_LINE))
            .ignore_whitespace(self.contains(PatternFlags::IGNORE_WHITESPACE))
            .swap_greed(self.contains(PatternFlags::SWAP_GREED));
    }

    /// Inline flag letters, e.g. `"is"`.
    pub(crate) fn inline(self) -> String {
        let mut letters = String::new();
        for (flag, letter) in [
            (PatternFlags::CASE_INSENSITIVE, 'i'),
            (PatternFlags::MULTI_LINE, 'm'),
            (PatternFlags::DOT_MATCHES_NEW_LINE, 's'),
            (PatternFlags::IGNORE_WHITESPACE, 'x'),
            (PatternFlags::SWAP_GREED, 'U'),
        ] {
            if self.contains(flag) {
                letters.push(letter);
            }
        }
        letters
    }
}

bitflags::bitflags! {
    /// Which components of a word wrap their pattern in a named group.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capture: u8 {
        const DETERMINER = 1 << 0;
        const TOKEN      = 1 << 1;
        const TERMINATOR = 1 << 2;
    }
}

impl Capture {
    pub fn role(role: Role) -> Capture {
        match role {
            Role::Determiner => Capture::DETERMINER,
            Role::Token => Capture::TOKEN,
            Role::Terminator => Capture::TERMINATOR,
        }
    }
}

impl Default for Capture {
    fn default() -> Self {
        Capture::TOKEN
    }
}

/// A single grammar row: a role, its candidate patterns and the active one.
///
/// Invariant: `active < candidates.len()`. Every index is resolved through
/// [`resolve_index`] before it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    role: Role,
    word: String,
    descriptor: String,
    candidates: Vec<String>,
    active: usize,
    captures: bool,
    restricted: bool,
    flags: PatternFlags,
}

impl Component {
    pub(crate) fn new(
        role: Role,
        word: &str,
        candidates: Vec<String>,
        captures: bool,
        restricted: bool,
        flags: PatternFlags,
    ) -> Self {
        Component {
            role,
            word: word.to_string(),
            descriptor: role.descriptor(word),
            candidates,
            active: 0,
            captures,
            restricted,
            flags,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Name of the word this row came from.
    pub fn word(&self) -> &str {
        &self.word
    }

    /// Group name used when the row captures (`shot`, `shot_determiner`, ...).
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    /// The active pattern, without capture group or flags.
    pub fn pattern(&self) -> &str {
        &self.candidates[self.active]
    }

    pub fn captures(&self) -> bool {
        self.captures
    }

    pub fn is_restricted(&self) -> bool {
        self.restricted
    }

    pub fn flags(&self) -> PatternFlags {
        self.flags
    }

    /// Candidates given at construction, without the reserved ones.
    pub fn declared(&self) -> &[String] {
        &self.candidates[..self.candidates.len().saturating_sub(RESERVED_CANDIDATES)]
    }

    /// Number of candidates a diagnosis may try. Restricted rows never reach
    /// the reserved anchor and wildcard candidates.
    pub fn searchable(&self) -> usize {
        if self.restricted { self.candidates.len().saturating_sub(RESERVED_CANDIDATES) } else { self.candidates.len() }
    }

    /// Active pattern, wrapped in a named group when the row captures.
    pub fn fragment(&self) -> String {
        if self.captures { format!("(?P<{}>{})", self.descriptor, self.pattern()) } else { self.pattern().to_string() }
    }

    /// [`fragment`](Self::fragment) with the word's flags applied inline.
    pub(crate) fn scoped_fragment(&self) -> String {
        if self.flags.is_empty() {
            self.fragment()
        } else {
            format!("(?{}:{})", self.flags.inline(), self.fragment())
        }
    }

    pub(crate) fn resolve(&self, index: isize) -> Result<usize> {
        resolve_index(index, self.candidates.len()).ok_or_else(|| GrammarError::MutationOutOfRange {
            descriptor: self.descriptor.clone(),
            index,
            candidates: self.candidates.len(),
        })
    }

    pub(crate) fn set_active(&mut self, active: usize) {
        debug_assert!(active < self.candidates.len());
        self.active = active;
    }

    pub(crate) fn set_captures(&mut self, captures: bool) {
        self.captures = captures;
    }
}

/// Compile `pattern` on behalf of `descriptor`.
pub(crate) fn compile(descriptor: &str, pattern: &str, flags: PatternFlags) -> Result<Regex> {
    let mut builder = RegexBuilder::new(pattern);
    flags.configure(&mut builder);
    builder.build().map_err(|source| GrammarError::InvalidPattern {
        descriptor: descriptor.to_string(),
        pattern: pattern.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(candidates: &[&str], captures: bool) -> Component {
        let candidates = candidates.iter().map(|c| c.to_string()).collect();
        Component::new(Role::Token, "shot", candidates, captures, true, PatternFlags::empty())
    }

    #[test]
    fn descriptors_follow_role() {
        let det = Component::new(Role::Determiner, "shot", vec![String::new()], false, true, PatternFlags::empty());
        assert_eq!(det.descriptor(), "shot_determiner");
        assert_eq!(token(&["x"], true).descriptor(), "shot");
        assert!(det.role().is_boundary());
        assert!(!Role::Token.is_boundary());
    }

    #[test]
    fn fragment_wraps_captures() {
        assert_eq!(token(&[r"shot\d+"], true).fragment(), r"(?P<shot>shot\d+)");
        assert_eq!(token(&[r"shot\d+"], false).fragment(), r"shot\d+");
    }

    #[test]
    fn scoped_fragment_carries_flags() {
        let c = Component::new(
            Role::Token,
            "ext",
            vec!["exr".into()],
            true,
            true,
            PatternFlags::CASE_INSENSITIVE | PatternFlags::SWAP_GREED,
        );
        assert_eq!(c.scoped_fragment(), "(?iU:(?P<ext>exr))");
    }

    #[test]
    fn searchable_excludes_reserved_when_restricted() {
        let mut c = token(&["a", "b", "c", "d", "e", "f"], true);
        assert_eq!(c.searchable(), 2);
        c.restricted = false;
        assert_eq!(c.searchable(), 6);
    }

    #[test]
    fn resolve_rejects_out_of_range() {
        let c = token(&["a", "b"], false);
        assert_eq!(c.resolve(-1).unwrap(), 1);
        let err = c.resolve(2).unwrap_err();
        assert!(matches!(err, GrammarError::MutationOutOfRange { index: 2, candidates: 2, .. }));
    }

    #[test]
    fn compile_reports_descriptor() {
        let err = compile("broken", "(unclosed", PatternFlags::empty()).unwrap_err();
        assert!(err.to_string().contains("broken"));
        assert!(compile("ok", "ABC", PatternFlags::CASE_INSENSITIVE).unwrap().is_match("abc"));
    }
}
