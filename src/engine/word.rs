//! Words: atomic Determiner-Token-Terminator matchers.
//!
//! A word is three [`Component`]s whose active patterns are concatenated into
//! one regex:
//!
//! ```text
//! determiner   token          terminator
//! \.           (?P<shot>...)  _
//! ```
//!
//! Each component carries the user's candidates followed by four reserved
//! candidates (see `mutation.rs`). Diagnosis searches those candidates for a
//! combination that matches a failing string:
//!
//! ```text
//! 1. token      [drop, i, drop]        first i that matches anywhere
//! 2. determiner [i, token, drop]       only if the declared one fails
//! 3. terminator [drop, token, i]       only if the declared one fails
//! ```
//!
//! Restricted words search only their user candidates.

use super::checkpoint::Checkpoint;
use super::component::{Capture, Component, PatternFlags, Role, compile};
use super::diagnosis::{Diagnosis, Fix};
use super::element::{Element, core_spans, span_pattern};
use super::grok;
use super::mutation::{DROP, LAZY, Mutation};
use crate::error::{GrammarError, Result};
use log::{debug, trace};
use regex::{Captures, Regex};
use std::ops::Range;

const ANY: &str = ".+?";
const ANY_OR_NONE: &str = ".*?";

/// Builder for [`Word`]. Defaults: determiners `[""]`, tokens `[".*"]`,
/// terminators `[""]`, no flags, token-only capture, restricted.
#[derive(Debug, Clone)]
pub struct WordBuilder {
    descriptor: String,
    determiners: Vec<String>,
    tokens: Vec<String>,
    terminators: Vec<String>,
    flags: PatternFlags,
    capture: Capture,
    restricted: bool,
}

impl WordBuilder {
    pub fn new(descriptor: impl Into<String>) -> Self {
        WordBuilder {
            descriptor: descriptor.into(),
            determiners: vec![String::new()],
            tokens: vec![".*".to_string()],
            terminators: vec![String::new()],
            flags: PatternFlags::empty(),
            capture: Capture::default(),
            restricted: true,
        }
    }

    pub fn determiners<I, S>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.determiners = candidates.into_iter().map(Into::into).collect();
        self
    }

    pub fn tokens<I, S>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tokens = candidates.into_iter().map(Into::into).collect();
        self
    }

    pub fn terminators<I, S>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.terminators = candidates.into_iter().map(Into::into).collect();
        self
    }

    pub fn flags(mut self, flags: PatternFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn capture(mut self, capture: Capture) -> Self {
        self.capture = capture;
        self
    }

    /// Restricted words never try the reserved anchor/wildcard candidates
    /// while diagnosing.
    pub fn restricted(mut self, restricted: bool) -> Self {
        self.restricted = restricted;
        self
    }

    /// Append the reserved candidates, validate every pattern and take the
    /// pristine snapshot.
    pub fn build(self) -> Result<Word> {
        let WordBuilder { descriptor, mut determiners, mut tokens, mut terminators, flags, capture, restricted } = self;

        for (role, list) in [(Role::Determiner, &determiners), (Role::Token, &tokens), (Role::Terminator, &terminators)] {
            if list.is_empty() {
                return Err(GrammarError::EmptyCandidates { descriptor: role.descriptor(&descriptor) });
            }
        }

        let markers = marker_class(determiners.iter().chain(terminators.iter()));
        determiners.extend(reserved("^"));
        tokens.extend(reserved(&markers));
        terminators.extend(reserved("$"));

        let components = [
            (Role::Determiner, determiners),
            (Role::Token, tokens),
            (Role::Terminator, terminators),
        ]
        .map(|(role, candidates)| {
            Component::new(role, &descriptor, candidates, capture.contains(Capture::role(role)), restricted, flags)
        });

        for component in &components {
            for candidate in component.candidates() {
                compile(component.descriptor(), candidate, flags)?;
            }
        }

        let word = Word { descriptor, pristine: components.clone(), components, flags, restricted };
        word.regex()?;
        debug!("[word:build] name=\"{}\" regex=\"{}\"", word.descriptor, word.pattern());
        Ok(word)
    }
}

fn reserved(anchor: &str) -> [String; 4] {
    [anchor.to_string(), ANY.to_string(), ANY_OR_NONE.to_string(), String::new()]
}

/// Literal text of a pattern: groups, quantifier braces and metacharacters
/// removed, escaped punctuation unescaped.
fn literal_text(raw: &str) -> String {
    regex!(r"\\(.)|\{[^}]*\}|\([^)]*\)|[.?+*^$\[\]|()]")
        .replace_all(raw, |caps: &Captures| match caps.get(1) {
            Some(escaped) if escaped.as_str().chars().all(|c| c.is_ascii_punctuation()) => escaped.as_str().to_string(),
            _ => String::new(),
        })
        .into_owned()
}

/// `[^...]+` over every literal character of the boundary candidates,
/// shortest marker first.
fn marker_class<'a>(markers: impl Iterator<Item = &'a String>) -> String {
    let mut literals: Vec<String> = markers.map(|m| literal_text(m)).filter(|m| !m.is_empty()).collect();
    literals.sort_by_key(|m| m.chars().count());

    let mut chars: Vec<char> = Vec::new();
    for c in literals.iter().flat_map(|m| m.chars()) {
        if !chars.contains(&c) {
            chars.push(c);
        }
    }
    if chars.is_empty() {
        return ".+".to_string();
    }
    let class: String = chars.iter().map(|c| regex::escape(&c.to_string())).collect();
    format!("[^{class}]+")
}

/// `(?:a|b|...)` over the declared candidates of a boundary row plus its
/// active one. Empty when every option is empty.
fn boundary_alternation(row: &Component) -> String {
    let mut options: Vec<&str> = row.declared().iter().map(String::as_str).collect();
    if !options.contains(&row.pattern()) {
        options.push(row.pattern());
    }
    if options.iter().all(|option| option.is_empty()) {
        return String::new();
    }
    format!("(?:{})", options.join("|"))
}

/// An atomic matcher made of a determiner, a token and a terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    descriptor: String,
    components: [Component; 3],
    flags: PatternFlags,
    restricted: bool,
    pristine: [Component; 3],
}

impl Word {
    pub fn builder(descriptor: impl Into<String>) -> WordBuilder {
        WordBuilder::new(descriptor)
    }

    pub fn component(&self, role: Role) -> &Component {
        &self.components[role.slot()]
    }

    pub fn flags(&self) -> PatternFlags {
        self.flags
    }

    pub fn is_restricted(&self) -> bool {
        self.restricted
    }

    /// The composed pattern text.
    pub fn pattern(&self) -> String {
        self.components.iter().map(Component::fragment).collect()
    }

    /// Switch every non-empty slot of `mutation` to the given candidate.
    ///
    /// All indices are resolved before anything changes, so an out-of-range
    /// index leaves the word untouched.
    pub fn mutate(&mut self, mutation: Mutation) -> Result<()> {
        let mut resolved = [None; 3];
        for role in Role::ALL {
            if let Some(index) = mutation.slot(role) {
                resolved[role.slot()] = Some(self.components[role.slot()].resolve(index)?);
            }
        }
        for (component, active) in self.components.iter_mut().zip(resolved) {
            if let Some(active) = active {
                component.set_active(active);
            }
        }
        Ok(())
    }

    fn test(&mut self, input: &str, mutation: Mutation) -> Result<bool> {
        self.mutate(mutation)?;
        let found = self.regex()?.is_match(input);
        trace!("[word:test] name=\"{}\" mutation={} found={}", self.descriptor, mutation, found);
        Ok(found)
    }

    /// First searchable candidate of `role` that matches with the other slots
    /// taken from `base`.
    fn search(&mut self, input: &str, role: Role, base: Mutation) -> Result<Option<isize>> {
        let limit = self.component(role).searchable();
        for index in 0..limit as isize {
            if self.test(input, base.with(role, index))? {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }
}

impl Element for Word {
    fn descriptor(&self) -> &str {
        &self.descriptor
    }

    fn components(&self) -> &[Component] {
        &self.components
    }

    fn regex(&self) -> Result<Regex> {
        compile(&self.descriptor, &self.pattern(), self.flags)
    }

    /// Boundaries accept any declared candidate, so a token that shows up
    /// twice between known separators is reported twice.
    fn locate(&self, input: &str) -> Result<Vec<Range<usize>>> {
        let pattern = span_pattern(&self.components, |row| {
            if row.role().is_boundary() { boundary_alternation(row) } else { row.fragment() }
        });
        let regex = compile(&self.descriptor, &pattern, self.flags)?;
        Ok(core_spans(&regex, input))
    }

    fn diagnose(&mut self, input: &str) -> Result<Diagnosis> {
        let mut report = Diagnosis::new(&self.descriptor);
        if self.regex()?.is_match(input) {
            return Ok(report);
        }
        report.error = true;

        let mut scratch = Checkpoint::new(self);
        let Some(token) = scratch.search(input, Role::Token, Mutation::new(DROP, 0, DROP))? else {
            debug!("[diagnose:word] name=\"{}\" token=none", scratch.descriptor);
            return Ok(report);
        };

        let mut determiner = Some(0);
        if !scratch.test(input, Mutation::new(0, token, DROP))? {
            determiner = scratch.search(input, Role::Determiner, Mutation::new(0, token, DROP))?;
        }
        let mut terminator = Some(0);
        if !scratch.test(input, Mutation::new(DROP, token, 0))? {
            terminator = scratch.search(input, Role::Terminator, Mutation::new(DROP, token, 0))?;
        }

        if let (Some(determiner), Some(terminator)) = (determiner, terminator) {
            report.fix.push(Fix::Mutation { mutation: Mutation::new(determiner, token, terminator) });
        }
        debug!("[diagnose:word] name=\"{}\" token={} fix={:?}", scratch.descriptor, token, report.fix);
        Ok(report)
    }

    fn repair(&mut self, fix: &[Fix]) -> Result<()> {
        match fix.first() {
            None => Err(GrammarError::EmptyFix { descriptor: self.descriptor.clone() }),
            Some(Fix::Mutation { mutation }) => {
                self.mutate(*mutation)?;
                self.pristine = self.components.clone();
                debug!("[repair:word] name=\"{}\" mutation={} regex=\"{}\"", self.descriptor, mutation, self.pattern());
                Ok(())
            }
            Some(other) => {
                Err(GrammarError::FixMismatch { descriptor: self.descriptor.clone(), fix: other.to_string() })
            }
        }
    }

    fn reset(&mut self) {
        self.components = self.pristine.clone();
    }

    fn nullify(&mut self) -> Result<()> {
        self.mutate(Mutation::new(DROP, LAZY, DROP))?;
        for component in &mut self.components {
            component.set_captures(false);
        }
        Ok(())
    }

    fn grok(&self) -> String {
        grok::word(&self.descriptor, &self.components)
    }

    fn clone_box(&self) -> Box<dyn Element> {
        Box::new(self.clone())
    }
}
