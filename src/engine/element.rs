//! The capability shared by words and phrases.
//!
//! A phrase owns its children as `Box<dyn Element>` and never needs to know
//! whether a child is a word or a nested phrase.

use super::component::{Component, PatternFlags, compile};
use super::diagnosis::{Diagnosis, Fix};
use crate::error::Result;
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

/// Named fields captured by a successful parse.
pub type Fields = BTreeMap<String, String>;

pub(crate) const SPAN_BEGIN: &str = "__span_begin";
pub(crate) const SPAN_END: &str = "__span_end";

pub trait Element: fmt::Debug + Send + Sync {
    /// Unique name within the parent scope; doubles as the token group name.
    fn descriptor(&self) -> &str;

    /// Grammar rows in composition order (three per word).
    fn components(&self) -> &[Component];

    /// Compose the current rows into a regex. Recomputed on every call.
    fn regex(&self) -> Result<Regex>;

    /// Every place this element could sit in `input`, left to right, as core
    /// spans: the part between its leading and trailing boundary. Spans never
    /// overlap; more than one means the element's position is ambiguous.
    fn locate(&self, input: &str) -> Result<Vec<Range<usize>>>;

    /// Find a fix for `input`. Leaves `self` as it was on entry.
    fn diagnose(&mut self, input: &str) -> Result<Diagnosis>;

    /// Apply a fix list produced by [`diagnose`](Self::diagnose).
    fn repair(&mut self, fix: &[Fix]) -> Result<()>;

    /// Return to the last pristine state (construction or last repair).
    fn reset(&mut self);

    /// Make the element match the empty string and stop capturing.
    fn nullify(&mut self) -> Result<()>;

    /// Logstash grok definitions for this element.
    fn grok(&self) -> String;

    fn clone_box(&self) -> Box<dyn Element>;

    /// Named groups of the leftmost match, or `None` when `input` does not
    /// match.
    fn parse(&self, input: &str) -> Result<Option<Fields>> {
        let regex = self.regex()?;
        Ok(regex.captures(input).map(|caps| fields(&regex, &caps)))
    }

    /// `parse`, falling back to diagnose and repair on failure.
    fn smart_parse(&mut self, input: &str) -> Result<Option<Fields>> {
        if let Some(found) = self.parse(input)? {
            return Ok(Some(found));
        }
        let diagnosis = self.diagnose(input)?;
        if diagnosis.is_repairable() {
            self.repair(&diagnosis.fix)?;
        }
        self.parse(input)
    }
}

impl Clone for Box<dyn Element> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

fn fields(regex: &Regex, caps: &Captures) -> Fields {
    regex
        .capture_names()
        .flatten()
        .filter(|name| *name != SPAN_BEGIN && *name != SPAN_END)
        .filter_map(|name| caps.name(name).map(|m| (name.to_string(), m.as_str().to_string())))
        .collect()
}

/// Concatenate `fragment(row)` for every row, fencing the token region with
/// empty marker groups so [`core_spans`] can read it back.
pub(crate) fn span_pattern<'c>(
    rows: impl IntoIterator<Item = &'c Component>,
    fragment: impl Fn(&Component) -> String,
) -> String {
    let rows: Vec<&Component> = rows.into_iter().collect();
    let first = rows.iter().position(|row| !row.role().is_boundary());
    let last = rows.iter().rposition(|row| !row.role().is_boundary());

    let mut pattern = String::new();
    for (i, row) in rows.iter().enumerate() {
        if Some(i) == first {
            pattern.push_str(&format!("(?P<{SPAN_BEGIN}>)"));
        }
        pattern.push_str(&fragment(row));
        if Some(i) == last {
            pattern.push_str(&format!("(?P<{SPAN_END}>)"));
        }
    }
    pattern
}

/// Core spans of every match of a [`span_pattern`] regex. Each search resumes
/// at the end of the previous core span, so a boundary shared by two
/// neighbouring matches is found twice.
pub(crate) fn core_spans(regex: &Regex, input: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut at = 0;
    while let Some(caps) = regex.captures_at(input, at) {
        let (Some(begin), Some(end)) = (caps.name(SPAN_BEGIN), caps.name(SPAN_END)) else {
            break;
        };
        spans.push(begin.start()..end.start());
        at = if end.start() > at {
            end.start()
        } else {
            match input[at..].chars().next() {
                Some(c) => at + c.len_utf8(),
                None => break,
            }
        };
    }
    spans
}

/// Core spans of `rows` with every boundary relaxed to a lazy wildcard:
/// where the token text sits, whatever surrounds it.
pub(crate) fn token_spans(descriptor: &str, rows: &[Component], input: &str) -> Result<Vec<Range<usize>>> {
    let pattern = span_pattern(rows, |row| {
        if row.role().is_boundary() { ".*?".to_string() } else { row.scoped_fragment() }
    });
    let regex = compile(descriptor, &pattern, PatternFlags::empty())?;
    Ok(core_spans(&regex, input))
}
