//! Phrases: ordered compositions of words and nested phrases.
//!
//! A phrase flattens the rows of its children into one table and composes
//! its regex from that table:
//!
//! ```text
//! scene           shot              layer
//! scene T \.      \. T _            _ T \.
//!          '--+--'     '---+---'
//!          linked        linked       (one copy of each shared boundary)
//! ```
//!
//! The table is always rebuilt from the children by [`Phrase::construct_data`];
//! scaffold repairs are recorded and replayed on every rebuild so they survive
//! later element repairs and resets.
//!
//! Diagnosis runs in three phases on a checkpointed copy of the phrase:
//!
//! ```text
//! 1. scaffold   linking toggle, then boundary wildcarding narrowed by mode
//! 2. element    child diagnose/repair, scaffold re-check, order inference
//! 3. verify     replay the fixes on the entry state and re-run 1
//! ```

use super::checkpoint::Checkpoint;
use super::component::{Component, PatternFlags, compile};
use super::diagnosis::{Diagnosis, Fix};
use super::element::{Element, core_spans, span_pattern, token_spans};
use super::grok;
use super::mutation::{DROP, LAZY, Mode, Mutation};
use crate::error::{GrammarError, Result};
use log::{debug, trace, warn};
use regex::Regex;
use std::ops::Range;

/// Builder for [`Phrase`]. Linking defaults to `true`.
#[derive(Debug)]
pub struct PhraseBuilder {
    descriptor: String,
    children: Vec<Box<dyn Element>>,
    linking: bool,
}

impl PhraseBuilder {
    pub fn new(descriptor: impl Into<String>) -> Self {
        PhraseBuilder { descriptor: descriptor.into(), children: Vec::new(), linking: true }
    }

    pub fn element<E: Element + 'static>(mut self, element: E) -> Self {
        self.children.push(Box::new(element));
        self
    }

    pub fn linking(mut self, linking: bool) -> Self {
        self.linking = linking;
        self
    }

    pub fn build(self) -> Result<Phrase> {
        Phrase::new(self.descriptor, self.children, self.linking)
    }
}

/// An ordered, named composition of child elements.
#[derive(Debug, Clone)]
pub struct Phrase {
    descriptor: String,
    children: Vec<Box<dyn Element>>,
    linking: bool,
    table: Vec<Component>,
    conflicts: Vec<bool>,
    committed: Vec<(Mutation, Mode)>,
}

impl Phrase {
    pub fn new(descriptor: impl Into<String>, children: Vec<Box<dyn Element>>, linking: bool) -> Result<Self> {
        let descriptor = descriptor.into();
        for (i, child) in children.iter().enumerate() {
            if children[..i].iter().any(|other| other.descriptor() == child.descriptor()) {
                return Err(GrammarError::DuplicateElement {
                    phrase: descriptor,
                    element: child.descriptor().to_string(),
                });
            }
        }

        let mut phrase =
            Phrase { descriptor, children, linking, table: Vec::new(), conflicts: Vec::new(), committed: Vec::new() };
        phrase.construct_data()?;
        phrase.regex()?;
        debug!("[phrase:build] name=\"{}\" rows={} regex=\"{}\"", phrase.descriptor, phrase.table.len(), phrase.pattern());
        Ok(phrase)
    }

    pub fn builder(descriptor: impl Into<String>) -> PhraseBuilder {
        PhraseBuilder::new(descriptor)
    }

    pub fn linking(&self) -> bool {
        self.linking
    }

    /// One flag per table row; only seam boundaries are ever `true`.
    pub fn conflicts(&self) -> &[bool] {
        &self.conflicts
    }

    /// Child descriptors in composition order.
    pub fn element_order(&self) -> Vec<&str> {
        self.children.iter().map(|child| child.descriptor()).collect()
    }

    pub fn child(&self, name: &str) -> Option<&dyn Element> {
        self.children.iter().find(|child| child.descriptor() == name).map(|child| child.as_ref())
    }

    /// The composed pattern text.
    pub fn pattern(&self) -> String {
        self.linked_rows().into_iter().map(Component::scoped_fragment).collect()
    }

    /// Rebuild the table from the children, recompute conflict flags and
    /// replay committed scaffold repairs.
    pub fn construct_data(&mut self) -> Result<()> {
        self.table = self.children.iter().flat_map(|child| child.components().iter().cloned()).collect();
        self.conflicts = detect_conflicts(&self.table);
        for (mutation, mode) in self.committed.clone() {
            self.mutate(mutation, mode, None)?;
        }
        Ok(())
    }

    /// Apply `mutation` to the rows selected by `mode`, optionally narrowed
    /// first to the explicit table rows in `rows`.
    ///
    /// Every index is resolved before any row changes.
    pub fn mutate(&mut self, mutation: Mutation, mode: Mode, rows: Option<&[usize]>) -> Result<()> {
        let candidates: Vec<usize> = match rows {
            Some(rows) => {
                if let Some(&row) = rows.iter().find(|&&row| row >= self.table.len()) {
                    return Err(GrammarError::RowOutOfRange {
                        phrase: self.descriptor.clone(),
                        row,
                        rows: self.table.len(),
                    });
                }
                rows.to_vec()
            }
            None => (0..self.table.len()).collect(),
        };

        let mut plan = Vec::new();
        for row in mode.select(&candidates, &self.conflicts) {
            let component = &self.table[row];
            if let Some(index) = mutation.slot(component.role()) {
                plan.push((row, component.resolve(index)?));
            }
        }
        for (row, active) in plan {
            self.table[row].set_active(active);
        }
        Ok(())
    }

    /// Rows that take part in the regex. With linking on, a boundary row is
    /// skipped when the previous kept row is a boundary with the same pattern.
    fn linked_rows(&self) -> Vec<&Component> {
        if !self.linking {
            return self.table.iter().collect();
        }
        let mut rows: Vec<&Component> = Vec::with_capacity(self.table.len());
        for row in &self.table {
            let repeated = rows.last().is_some_and(|prev| {
                prev.role().is_boundary() && row.role().is_boundary() && prev.pattern() == row.pattern()
            });
            if !repeated {
                rows.push(row);
            }
        }
        rows
    }

    fn child_mut(&mut self, name: &str) -> Result<&mut Box<dyn Element>> {
        let phrase = &self.descriptor;
        self.children.iter_mut().find(|child| child.descriptor() == name).ok_or_else(|| {
            GrammarError::UnknownElement { phrase: phrase.clone(), element: name.to_string() }
        })
    }

    fn reorder(&mut self, order: &[String]) -> Result<()> {
        let permutation = order.len() == self.children.len()
            && self.children.iter().all(|child| order.iter().filter(|name| *name == child.descriptor()).count() == 1);
        if !permutation {
            return Err(GrammarError::InvalidOrder { phrase: self.descriptor.clone(), order: order.to_vec() });
        }
        self.children.sort_by_key(|child| order.iter().position(|name| name == child.descriptor()));
        Ok(())
    }

    // --- Diagnosis ---

    /// Parse with `mutation` applied to the rows `mode` selects. Rolls back.
    fn try_scaffold(&mut self, input: &str, mutation: Mutation, mode: Mode) -> Result<bool> {
        let mut scratch = Checkpoint::new(self);
        scratch.mutate(mutation, mode, None)?;
        let found = scratch.parse(input)?.is_some();
        trace!("[diagnose:try] phrase=\"{}\" mutation={} mode={} found={}", scratch.descriptor, mutation, mode, found);
        Ok(found)
    }

    /// Narrowest mode under which `mutation` parses: `conflict`, then `ends`,
    /// then `both`.
    fn narrowest(&mut self, input: &str, mutation: Mutation) -> Result<Option<Mode>> {
        for mode in [Mode::Conflict, Mode::Ends, Mode::Both] {
            if self.try_scaffold(input, mutation, mode)? {
                return Ok(Some(mode));
            }
        }
        Ok(None)
    }

    /// Look for a linking or boundary-only repair. Leaves `self` unchanged.
    fn scaffold_test(&mut self, input: &str) -> Result<Diagnosis> {
        let mut report = Diagnosis::new(&self.descriptor);
        if self.parse(input)?.is_some() {
            return Ok(report);
        }
        report.error = true;

        let mut scratch = Checkpoint::new(self);
        scratch.linking = !scratch.linking;
        let relinked = scratch.parse(input)?.is_some();
        scratch.linking = !scratch.linking;
        if relinked {
            report.fix.push(Fix::Linking { linking: !scratch.linking });
            debug!("[diagnose:scaffold] phrase=\"{}\" linking={}", scratch.descriptor, !scratch.linking);
            return Ok(report);
        }

        let broken = scratch.try_scaffold(input, Mutation::scaffold(LAZY, LAZY), Mode::All)?;
        report.broken_scaffold = Some(broken);
        if !broken {
            debug!("[diagnose:scaffold] phrase=\"{}\" broken_scaffold=false", scratch.descriptor);
            return Ok(report);
        }

        // a wider mode can fail where a narrower one parses
        let determiners = Mutation::scaffold(DROP, 0);
        let mode = scratch.narrowest(input, determiners)?;
        report.conflicting_determiners = Some(mode.is_some());
        if let Some(mode) = mode {
            report.fix.push(Fix::Scaffold { mutation: determiners, mode });
            debug!("[diagnose:scaffold] phrase=\"{}\" mutation={} mode={}", scratch.descriptor, determiners, mode);
            return Ok(report);
        }

        let terminators = Mutation::scaffold(0, DROP);
        let mode = scratch.narrowest(input, terminators)?;
        report.conflicting_terminators = Some(mode.is_some());
        if let Some(mode) = mode {
            report.fix.push(Fix::Scaffold { mutation: terminators, mode });
            debug!("[diagnose:scaffold] phrase=\"{}\" mutation={} mode={}", scratch.descriptor, terminators, mode);
        }
        Ok(report)
    }

    /// Diagnose and repair every child, then re-check the phrase and infer
    /// the order the children appear in.
    ///
    /// Leaves `self` in the repaired state; callers hold a checkpoint.
    fn element_test(&mut self, input: &str) -> Result<Diagnosis> {
        let mut report = Diagnosis::new(&self.descriptor);
        for child in &mut self.children {
            let diagnosis = child.diagnose(input)?;
            if !diagnosis.error {
                continue;
            }
            let name = child.descriptor().to_string();
            if diagnosis.fix.is_empty() {
                report.unfound_elements.push(name);
                continue;
            }
            child.repair(&diagnosis.fix)?;
            report.fix.push(Fix::Element { element: name, fix: diagnosis.fix });
        }
        report.error = !report.fix.is_empty() || !report.unfound_elements.is_empty();
        self.construct_data()?;
        debug!(
            "[diagnose:element] phrase=\"{}\" repaired={} unfound={:?}",
            self.descriptor,
            report.fix.len(),
            report.unfound_elements
        );

        if self.parse(input)?.is_some() {
            return Ok(report);
        }
        let scaffold = self.scaffold_test(input)?;
        if !scaffold.fix.is_empty() {
            self.repair(&scaffold.fix)?;
            report.absorb(scaffold);
            return Ok(report);
        }
        report.absorb(scaffold);

        // read where unfound tokens sit before nulling them out
        let mut strays = Vec::new();
        for name in report.unfound_elements.clone() {
            let child = self.child_mut(&name)?;
            let spans = token_spans(child.descriptor(), child.components(), input)?;
            child.nullify()?;
            strays.push((name, spans));
        }
        self.construct_data()?;

        match self.infer_order(input, &strays)? {
            None => {
                report.ambiguous_order = true;
                debug!("[diagnose:order] phrase=\"{}\" ambiguous=true", self.descriptor);
            }
            Some(order) => {
                let changed = order.iter().map(String::as_str).ne(self.element_order());
                report.broken_phrase_structure = Some(changed);
                if changed {
                    debug!("[diagnose:order] phrase=\"{}\" order={:?}", self.descriptor, order);
                    self.reorder(&order)?;
                    self.construct_data()?;
                    report.element_order = Some(order.clone());
                    report.fix.push(Fix::PhraseStructure { element_order: order });
                }
            }
        }
        Ok(report)
    }

    /// Order of the children as they appear in `input`.
    ///
    /// Located children are placed by the start of their core span. Unfound
    /// children, and children that cannot be located, go where their token
    /// text sits in the gaps the located ones leave; with no such text they
    /// keep their declared slot. `None` when two core spans overlap or a child
    /// can sit in more than one place.
    fn infer_order(&self, input: &str, strays: &[(String, Vec<Range<usize>>)]) -> Result<Option<Vec<String>>> {
        let mut placed: Vec<(Range<usize>, usize)> = Vec::new();
        let mut loose: Vec<(usize, Vec<Range<usize>>)> = Vec::new();
        for (slot, child) in self.children.iter().enumerate() {
            if let Some((_, spans)) = strays.iter().find(|(name, _)| name == child.descriptor()) {
                loose.push((slot, spans.clone()));
                continue;
            }
            let mut spans = child.locate(input)?;
            match spans.len() {
                0 => loose.push((slot, token_spans(child.descriptor(), child.components(), input)?)),
                1 => placed.push((spans.remove(0), slot)),
                n => {
                    debug!(
                        "[diagnose:order] phrase=\"{}\" element=\"{}\" placements={}",
                        self.descriptor,
                        child.descriptor(),
                        n
                    );
                    return Ok(None);
                }
            }
        }
        placed.sort_by_key(|(span, _)| (span.start, span.end));
        if placed.windows(2).any(|pair| overlaps(&pair[0].0, &pair[1].0)) {
            return Ok(None);
        }

        let mut unplaced = Vec::new();
        for (slot, spans) in loose {
            let free = spans.into_iter().find(|span| placed.iter().all(|(taken, _)| !overlaps(span, taken)));
            match free {
                Some(span) => placed.push((span, slot)),
                None => unplaced.push(slot),
            }
        }
        placed.sort_by_key(|(span, slot)| (span.start, span.end, *slot));

        let mut located = placed.into_iter().map(|(_, slot)| slot);
        let order = (0..self.children.len())
            .filter_map(|slot| if unplaced.contains(&slot) { Some(slot) } else { located.next() })
            .map(|slot| self.children[slot].descriptor().to_string())
            .collect();
        Ok(Some(order))
    }
}

/// Zero-width spans at the same offset do not overlap.
fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

/// Pair the inner boundary rows (outermost excluded) seam by seam and flag
/// both members of a pair whose patterns differ.
fn detect_conflicts(table: &[Component]) -> Vec<bool> {
    let mut conflicts = vec![false; table.len()];
    let boundaries: Vec<usize> = (0..table.len()).filter(|&row| table[row].role().is_boundary()).collect();
    if boundaries.len() < 2 {
        return conflicts;
    }
    for pair in boundaries[1..boundaries.len() - 1].chunks_exact(2) {
        if table[pair[0]].pattern() != table[pair[1]].pattern() {
            conflicts[pair[0]] = true;
            conflicts[pair[1]] = true;
        }
    }
    conflicts
}

impl Element for Phrase {
    fn descriptor(&self) -> &str {
        &self.descriptor
    }

    fn components(&self) -> &[Component] {
        &self.table
    }

    fn regex(&self) -> Result<Regex> {
        compile(&self.descriptor, &self.pattern(), PatternFlags::empty())
    }

    fn locate(&self, input: &str) -> Result<Vec<Range<usize>>> {
        let pattern = span_pattern(self.linked_rows(), Component::scoped_fragment);
        let regex = compile(&self.descriptor, &pattern, PatternFlags::empty())?;
        Ok(core_spans(&regex, input))
    }

    fn diagnose(&mut self, input: &str) -> Result<Diagnosis> {
        let mut report = Diagnosis::new(&self.descriptor);
        if self.parse(input)?.is_some() {
            return Ok(report);
        }
        report.error = true;

        let mut scratch = Checkpoint::new(self);

        // --- Phase 1: scaffold ---
        let scaffold = scratch.scaffold_test(input)?;
        let done = !scaffold.fix.is_empty();
        report.absorb(scaffold);
        if done {
            return Ok(report);
        }

        // --- Phase 2: elements ---
        let elements = scratch.element_test(input)?;
        report.absorb(elements);

        // --- Phase 3: verify on the entry state ---
        // unfound children are back to their entry state here, not nulled out
        let mut replay = scratch.original().clone();
        if !report.fix.is_empty() {
            replay.repair(&report.fix)?;
        }
        let verify = replay.scaffold_test(input)?;
        if !verify.fix.is_empty() {
            replay.repair(&verify.fix)?;
        }
        report.absorb(verify);
        if replay.parse(input)?.is_none() {
            report.fix.clear();
        }

        debug!(
            "[diagnose:phrase] phrase=\"{}\" fix=[{}]",
            scratch.descriptor,
            report.fix.iter().map(|fix| fix.to_string()).collect::<Vec<_>>().join("; ")
        );
        Ok(report)
    }

    fn repair(&mut self, fix: &[Fix]) -> Result<()> {
        if fix.is_empty() {
            return Err(GrammarError::EmptyFix { descriptor: self.descriptor.clone() });
        }
        for instruction in fix {
            match instruction {
                Fix::Linking { linking } => self.linking = *linking,
                Fix::Scaffold { mutation, mode } => {
                    self.mutate(*mutation, *mode, None)?;
                    if !self.committed.contains(&(*mutation, *mode)) {
                        self.committed.push((*mutation, *mode));
                    }
                }
                Fix::PhraseStructure { element_order } => {
                    self.reorder(element_order)?;
                    self.construct_data()?;
                }
                Fix::Element { element, fix } => {
                    self.child_mut(element)?.repair(fix)?;
                    self.construct_data()?;
                }
                Fix::Mutation { .. } => {
                    return Err(GrammarError::FixMismatch {
                        descriptor: self.descriptor.clone(),
                        fix: instruction.to_string(),
                    });
                }
            }
            debug!("[repair] phrase=\"{}\" fix={}", self.descriptor, instruction);
        }
        Ok(())
    }

    fn reset(&mut self) {
        for child in &mut self.children {
            child.reset();
        }
        if let Err(err) = self.construct_data() {
            warn!("[reset] phrase=\"{}\" error=\"{}\"", self.descriptor, err);
        }
    }

    fn nullify(&mut self) -> Result<()> {
        for row in &mut self.table {
            row.set_captures(false);
        }
        self.mutate(Mutation::new(DROP, DROP, DROP), Mode::All, None)?;
        self.mutate(Mutation::new(LAZY, DROP, DROP), Mode::All, Some(&[0][..]))
    }

    fn grok(&self) -> String {
        let children: Vec<String> = self.children.iter().map(|child| child.grok()).collect();
        grok::phrase(&self.descriptor, &children, self.linked_rows())
    }

    fn clone_box(&self) -> Box<dyn Element> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::word::Word;

    fn word(name: &str, determiner: &str, token: &str, terminator: &str) -> Word {
        Word::builder(name).determiners([determiner]).tokens([token]).terminators([terminator]).build().unwrap()
    }

    fn date() -> Phrase {
        Phrase::builder("date")
            .element(word("year", "", r"\d{4}", "-"))
            .element(word("month", "-", r"\d{2}", "-"))
            .element(word("day", "-", r"\d{2}", ""))
            .build()
            .unwrap()
    }

    #[test]
    fn linking_drops_repeated_boundaries() {
        let phrase = date();
        assert_eq!(phrase.pattern(), r"(?P<year>\d{4})-(?P<month>\d{2})-(?P<day>\d{2})");
        let fields = phrase.parse("2024-05-17").unwrap().unwrap();
        assert_eq!(fields["month"], "05");

        let unlinked = Phrase::builder("date")
            .element(word("year", "", r"\d{4}", "-"))
            .element(word("month", "-", r"\d{2}", ""))
            .linking(false)
            .build()
            .unwrap();
        assert_eq!(unlinked.pattern(), r"(?P<year>\d{4})--(?P<month>\d{2})");
    }

    #[test]
    fn identical_seams_are_not_conflicts() {
        let phrase = date();
        assert!(phrase.conflicts().iter().all(|flag| !flag));
    }

    #[test]
    fn differing_seams_flag_both_rows() {
        let phrase = Phrase::builder("pair")
            .element(word("a", "", "a+", "_"))
            .element(word("b", ".", "b+", ""))
            .build()
            .unwrap();
        assert_eq!(phrase.conflicts(), [false, false, true, true, false, false]);
    }

    #[test]
    fn mutate_by_mode_and_rows() {
        let mut phrase = Phrase::builder("pair")
            .element(word("a", "<", "a+", "_"))
            .element(word("b", ".", "b+", ">"))
            .build()
            .unwrap();

        phrase.mutate(Mutation::scaffold(DROP, DROP), Mode::Conflict, None).unwrap();
        assert_eq!(phrase.pattern(), "<(?P<a>a+)(?P<b>b+)>");

        phrase.reset();
        phrase.mutate(Mutation::scaffold(DROP, DROP), Mode::Ends, None).unwrap();
        assert_eq!(phrase.pattern(), "(?P<a>a+)_.(?P<b>b+)");

        phrase.reset();
        phrase.mutate(Mutation::scaffold(DROP, DROP), Mode::All, Some(&[2][..])).unwrap();
        assert_eq!(phrase.pattern(), "<(?P<a>a+).(?P<b>b+)>");

        let err = phrase.mutate(Mutation::PRISTINE, Mode::All, Some(&[6][..])).unwrap_err();
        assert!(matches!(err, GrammarError::RowOutOfRange { row: 6, rows: 6, .. }));
    }

    #[test]
    fn duplicate_children_are_rejected() {
        let err = Phrase::builder("dup").element(word("a", "", "a", "")).element(word("a", "", "b", "")).build();
        assert!(matches!(err, Err(GrammarError::DuplicateElement { element, .. }) if element == "a"));
    }

    #[test]
    fn repair_validates_fixes() {
        let mut phrase = date();
        assert!(matches!(phrase.repair(&[]), Err(GrammarError::EmptyFix { .. })));

        let order = vec!["day".to_string(), "year".to_string()];
        let err = phrase.repair(&[Fix::PhraseStructure { element_order: order }]).unwrap_err();
        assert!(matches!(err, GrammarError::InvalidOrder { .. }));

        let err = phrase.repair(&[Fix::Element { element: "hour".into(), fix: vec![] }]).unwrap_err();
        assert!(matches!(err, GrammarError::UnknownElement { .. }));

        let err = phrase.repair(&[Fix::Mutation { mutation: Mutation::PRISTINE }]).unwrap_err();
        assert!(matches!(err, GrammarError::FixMismatch { .. }));
    }

    #[test]
    fn phrase_structure_repair_reorders() {
        let mut phrase = date();
        let order: Vec<String> = ["day", "month", "year"].map(String::from).to_vec();
        phrase.repair(&[Fix::PhraseStructure { element_order: order.clone() }]).unwrap();
        assert_eq!(phrase.element_order(), ["day", "month", "year"]);
        phrase.repair(&[Fix::PhraseStructure { element_order: order }]).unwrap();
        assert_eq!(phrase.element_order(), ["day", "month", "year"]);
    }

    #[test]
    fn scaffold_repair_survives_reset_and_is_idempotent() {
        let mut phrase = Phrase::builder("pair")
            .element(word("a", "", "a+", "_"))
            .element(word("b", ".", "b+", ""))
            .build()
            .unwrap();
        let fix = vec![Fix::Scaffold { mutation: Mutation::scaffold(DROP, 0), mode: Mode::Conflict }];

        phrase.repair(&fix).unwrap();
        let once = phrase.pattern();
        assert_eq!(once, "(?P<a>a+)_(?P<b>b+)");
        phrase.repair(&fix).unwrap();
        assert_eq!(phrase.pattern(), once);

        phrase.reset();
        assert_eq!(phrase.pattern(), once);
    }

    #[test]
    fn nested_phrase_composes_child_rows() {
        let date = date();
        let rows = date.components().len();
        let stamp = Phrase::builder("stamp")
            .element(date)
            .element(word("suffix", "_", "[a-z]+", "$"))
            .build()
            .unwrap();
        assert_eq!(stamp.components().len(), rows + 3);

        let fields = stamp.parse("2024-05-17_final").unwrap().unwrap();
        assert_eq!(fields["day"], "17");
        assert_eq!(fields["suffix"], "final");
        assert!(stamp.child("date").is_some());
    }

    #[test]
    fn nullify_matches_empty() {
        let mut phrase = date();
        phrase.nullify().unwrap();
        assert_eq!(phrase.pattern(), ".*?");
        assert_eq!(phrase.parse("").unwrap(), Some(Default::default()));
    }

    #[test]
    fn locate_spans_tokens_only() {
        let phrase = date();
        assert_eq!(phrase.locate("on 2024-05-17.").unwrap(), vec![3..13]);
    }

    #[test]
    fn overlapping_spans_leave_order_ambiguous() {
        let mut phrase = Phrase::builder("code")
            .element(word("head", "", r"[a-z]+\d", ""))
            .element(word("tail", "", r"\d[a-z]+", ""))
            .build()
            .unwrap();
        let diagnosis = phrase.diagnose("ab1cd").unwrap();

        assert!(diagnosis.error);
        assert!(diagnosis.ambiguous_order);
        assert_eq!(diagnosis.broken_phrase_structure, None);
        assert!(!diagnosis.fix.iter().any(|fix| matches!(fix, Fix::PhraseStructure { .. })));
        assert!(diagnosis.is_unrepairable());
    }

    #[test]
    fn stray_tokens_fill_the_gaps() {
        let phrase = Phrase::builder("tags")
            .element(word("a", "<", "a+", ">"))
            .element(word("b", "<", "b+", ">"))
            .element(word("c", "<", "c+", ">"))
            .build()
            .unwrap();

        let strays = [("c".to_string(), vec![0..2])];
        let order = phrase.infer_order("cc <a> <b>", &strays).unwrap().unwrap();
        assert_eq!(order, ["c", "a", "b"]);

        // no text for the stray: it keeps its declared slot
        let strays = [("c".to_string(), vec![])];
        let order = phrase.infer_order("<b> <a>", &strays).unwrap().unwrap();
        assert_eq!(order, ["b", "a", "c"]);
    }

    #[test]
    fn grok_lists_children_then_phrase() {
        let phrase = Phrase::builder("pair")
            .element(word("a", "", "a+", "_"))
            .element(word("b", "_", "b+", ""))
            .build()
            .unwrap();
        let expected = "_A (a+)\nA (?:%{_A:a}_)\n_B (b+)\nB (?:_%{_B:b})\nPAIR (?:%{_A:a}_%{_B:b})";
        assert_eq!(phrase.grok(), expected);
    }
}
