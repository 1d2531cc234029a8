//! Repair instructions and diagnosis reports.
//!
//! `diagnose` produces a [`Diagnosis`] whose `fix` list is a sequence of
//! [`Fix`] instructions; `repair` consumes the same list. Fixes are replayed
//! in order, so a report is only ever built with the order that reproduces the
//! diagnosed state: element repairs and phrase structure first, then the
//! scaffold mutation on the rebuilt table.

use super::mutation::{Mode, Mutation};
use serde::Serialize;
use std::fmt;

/// A structured repair instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Fix {
    /// Set the phrase's linking mode.
    Linking { linking: bool },
    /// Word-level repair: one absolute mutation triple.
    Mutation { mutation: Mutation },
    /// Boundary mutation on the rows of a phrase table selected by `mode`.
    Scaffold { mutation: Mutation, mode: Mode },
    /// Reorder the children of a phrase.
    PhraseStructure { element_order: Vec<String> },
    /// Forward a fix list to the named child.
    Element { element: String, fix: Vec<Fix> },
}

impl fmt::Display for Fix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fix::Linking { linking } => write!(f, "linking({linking})"),
            Fix::Mutation { mutation } => write!(f, "mutation{mutation}"),
            Fix::Scaffold { mutation, mode } => write!(f, "scaffold{mutation}@{mode}"),
            Fix::PhraseStructure { element_order } => write!(f, "phrase_structure[{}]", element_order.join(", ")),
            Fix::Element { element, fix } => {
                let inner: Vec<String> = fix.iter().map(|x| x.to_string()).collect();
                write!(f, "element({element}: {})", inner.join("; "))
            }
        }
    }
}

/// Result of a `diagnose` call.
///
/// `error == false` means the string already parses. `error == true` with an
/// empty `fix` means no repair was found. The remaining fields record what each
/// phase observed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnosis {
    pub descriptor: String,
    pub error: bool,
    pub fix: Vec<Fix>,
    /// Wildcarding every boundary made the string parse.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broken_scaffold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicting_determiners: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicting_terminators: Option<bool>,
    /// Children for which no word- or phrase-level repair exists.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unfound_elements: Vec<String>,
    /// The children appear in the input in a different order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broken_phrase_structure: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_order: Option<Vec<String>>,
    /// Two children claimed overlapping parts of the input, so no order was
    /// inferred.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub ambiguous_order: bool,
}

impl Diagnosis {
    pub fn new(descriptor: impl Into<String>) -> Self {
        Diagnosis { descriptor: descriptor.into(), ..Default::default() }
    }

    /// The string failed to parse and at least one fix was found.
    pub fn is_repairable(&self) -> bool {
        self.error && !self.fix.is_empty()
    }

    /// The string failed to parse and nothing can repair it.
    pub fn is_unrepairable(&self) -> bool {
        self.error && self.fix.is_empty()
    }

    /// Merge a phase report into `self`. Fixes are appended; flags already set
    /// by an earlier phase win.
    pub(crate) fn absorb(&mut self, other: Diagnosis) {
        self.fix.extend(other.fix);
        self.broken_scaffold = self.broken_scaffold.or(other.broken_scaffold);
        self.conflicting_determiners = self.conflicting_determiners.or(other.conflicting_determiners);
        self.conflicting_terminators = self.conflicting_terminators.or(other.conflicting_terminators);
        self.broken_phrase_structure = self.broken_phrase_structure.or(other.broken_phrase_structure);
        if self.element_order.is_none() {
            self.element_order = other.element_order;
        }
        for name in other.unfound_elements {
            if !self.unfound_elements.contains(&name) {
                self.unfound_elements.push(name);
            }
        }
        self.ambiguous_order |= other.ambiguous_order;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::mutation::DROP;

    #[test]
    fn absorb_keeps_first_flags_and_appends_fixes() {
        let mut first = Diagnosis::new("master");
        first.error = true;
        first.broken_scaffold = Some(false);
        first.unfound_elements.push("scene".into());

        let mut second = Diagnosis::new("master");
        second.broken_scaffold = Some(true);
        second.conflicting_terminators = Some(true);
        second.unfound_elements = vec!["scene".into(), "version".into()];
        second.fix.push(Fix::Linking { linking: false });

        first.absorb(second);
        assert_eq!(first.broken_scaffold, Some(false));
        assert_eq!(first.conflicting_terminators, Some(true));
        assert_eq!(first.unfound_elements, vec!["scene".to_string(), "version".to_string()]);
        assert_eq!(first.fix, vec![Fix::Linking { linking: false }]);
        assert!(first.is_repairable());
    }

    #[test]
    fn display_is_compact() {
        let fix = Fix::Element {
            element: "shot".into(),
            fix: vec![Fix::Mutation { mutation: Mutation::new(1, 0, 1) }],
        };
        assert_eq!(fix.to_string(), "element(shot: mutation[1, 0, 1])");

        let scaffold = Fix::Scaffold { mutation: Mutation::scaffold(DROP, 0), mode: Mode::Conflict };
        assert_eq!(scaffold.to_string(), "scaffold[-1, _, 0]@conflict");
    }

    #[test]
    fn serializes_as_tagged_records() {
        let mut report = Diagnosis::new("master");
        report.error = true;
        report.fix.push(Fix::Scaffold { mutation: Mutation::scaffold(DROP, 0), mode: Mode::Both });
        report.fix.push(Fix::PhraseStructure { element_order: vec!["b".into(), "a".into()] });

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["fix"][0]["type"], "scaffold");
        assert_eq!(value["fix"][0]["mutation"], serde_json::json!([-1, null, 0]));
        assert_eq!(value["fix"][0]["mode"], "both");
        assert_eq!(value["fix"][1]["element_order"], serde_json::json!(["b", "a"]));
        assert!(value.get("ambiguous_order").is_none());
        assert!(value.get("broken_scaffold").is_none());
    }
}
