use crate::engine::{Diagnosis, Element, Fields, Fix, Phrase};
use crate::error::Result;
use regex::Regex;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

/// A master phrase shared between threads.
///
/// Plain parses take a read lock, so any number of threads can parse at once.
/// Diagnosis and repair take the write lock for the whole search-and-commit
/// sequence.
#[derive(Debug)]
pub struct Grammar {
    master: RwLock<Phrase>,
}

/// Result from [`Grammar::parse`] and [`Grammar::smart_parse`].
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// The parsed input text.
    pub text: String,
    /// Captured fields, `None` when the text did not parse.
    pub fields: Option<Fields>,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// What [`Grammar::smart_parse_verbose`] did besides parsing.
#[derive(Debug, Clone, Default)]
pub struct ParseDetails {
    /// Report from the diagnosis, when the direct parse failed.
    pub diagnosis: Option<Diagnosis>,
    /// Whether a repair was committed to the master phrase.
    pub repaired: bool,
    pub diagnose: Duration,
    pub repair: Duration,
    /// Time spent in the final parse.
    pub parse: Duration,
    pub total: Duration,
}

/// Result from [`Grammar::smart_parse_verbose`].
#[derive(Debug, Clone)]
pub struct ParseResultVerbose {
    pub text: String,
    pub fields: Option<Fields>,
    pub elapsed: Duration,
    pub details: ParseDetails,
}

impl Grammar {
    pub fn new(master: Phrase) -> Self {
        Grammar { master: RwLock::new(master) }
    }

    // Diagnosis restores its state while unwinding, so a poisoned lock still guards a consistent phrase.
    fn read(&self) -> RwLockReadGuard<'_, Phrase> {
        self.master.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Phrase> {
        self.master.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Parse `text` without touching the grammar.
    ///
    /// # Example
    /// ```
    /// use dtt_grammar::{Grammar, Phrase, Word};
    ///
    /// let take = Word::builder("take").determiners(["_"]).tokens([r"t\d+"]).terminators(["$"]).build()?;
    /// let grammar = Grammar::new(Phrase::builder("clip").element(take).build()?);
    ///
    /// let out = grammar.parse("clip_t3")?;
    /// assert_eq!(out.fields.unwrap()["take"], "t3");
    /// # Ok::<(), dtt_grammar::GrammarError>(())
    /// ```
    pub fn parse(&self, text: &str) -> Result<ParseResult> {
        let start = Instant::now();
        let fields = self.read().parse(text)?;
        Ok(ParseResult { text: text.to_string(), fields, elapsed: start.elapsed() })
    }

    /// Parse `text`, diagnosing and committing a repair when the direct parse
    /// fails.
    pub fn smart_parse(&self, text: &str) -> Result<ParseResult> {
        let out = self.smart_parse_verbose(text)?;
        Ok(ParseResult { text: out.text, fields: out.fields, elapsed: out.elapsed })
    }

    /// [`smart_parse`](Self::smart_parse) with the diagnosis and per-step
    /// timings.
    pub fn smart_parse_verbose(&self, text: &str) -> Result<ParseResultVerbose> {
        let start = Instant::now();
        let mut details = ParseDetails::default();

        let direct = self.read().parse(text)?;
        if direct.is_some() {
            details.parse = start.elapsed();
            details.total = details.parse;
            return Ok(ParseResultVerbose { text: text.to_string(), fields: direct, elapsed: details.total, details });
        }

        let mut master = self.write();
        // another writer may have repaired the grammar while we waited
        let step = Instant::now();
        if let Some(fields) = master.parse(text)? {
            details.parse = step.elapsed();
            details.total = start.elapsed();
            return Ok(ParseResultVerbose {
                text: text.to_string(),
                fields: Some(fields),
                elapsed: details.total,
                details,
            });
        }

        let step = Instant::now();
        let diagnosis = master.diagnose(text)?;
        details.diagnose = step.elapsed();

        let step = Instant::now();
        if diagnosis.is_repairable() {
            master.repair(&diagnosis.fix)?;
            details.repaired = true;
        }
        details.repair = step.elapsed();

        let step = Instant::now();
        let fields = master.parse(text)?;
        details.parse = step.elapsed();

        log::debug!(
            "[grammar:smart_parse] text=\"{}\" repaired={} parsed={} total_us={}",
            text,
            details.repaired,
            fields.is_some(),
            start.elapsed().as_micros()
        );
        details.diagnosis = Some(diagnosis);
        details.total = start.elapsed();
        Ok(ParseResultVerbose { text: text.to_string(), fields, elapsed: details.total, details })
    }

    pub fn diagnose(&self, text: &str) -> Result<Diagnosis> {
        self.write().diagnose(text)
    }

    pub fn repair(&self, fix: &[Fix]) -> Result<()> {
        self.write().repair(fix)
    }

    /// Return every element to its last pristine state.
    pub fn reset(&self) {
        self.write().reset();
    }

    pub fn regex(&self) -> Result<Regex> {
        self.read().regex()
    }

    pub fn grok(&self) -> String {
        self.read().grok()
    }

    pub fn into_inner(self) -> Phrase {
        self.master.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Word;

    fn clip() -> Grammar {
        let shot = Word::builder("shot")
            .determiners(["_", "-"])
            .tokens([r"shot\d+"])
            .terminators(["_", "-"])
            .build()
            .unwrap();
        let take =
            Word::builder("take").determiners(["_", "-"]).tokens([r"t\d+"]).terminators(["$"]).build().unwrap();
        Grammar::new(Phrase::builder("clip").element(shot).element(take).build().unwrap())
    }

    #[test]
    fn parse_returns_fields() {
        let grammar = clip();
        let res = grammar.parse("clip_shot10_t2").unwrap();

        assert_eq!(res.text, "clip_shot10_t2");
        assert!(res.elapsed >= Duration::ZERO);
        let fields = res.fields.unwrap();
        assert_eq!(fields["shot"], "shot10");
        assert_eq!(fields["take"], "t2");

        assert!(grammar.parse("clip.shot10.t2").unwrap().fields.is_none());
    }

    #[test]
    fn smart_parse_commits_the_repair() {
        let grammar = clip();
        assert!(grammar.parse("clip-shot10-t2").unwrap().fields.is_none());

        let res = grammar.smart_parse_verbose("clip-shot10-t2").unwrap();
        assert_eq!(res.fields.as_ref().map(|f| f["take"].as_str()), Some("t2"));
        assert!(res.details.repaired);
        assert!(res.details.diagnosis.as_ref().is_some_and(Diagnosis::is_repairable));
        assert!(res.details.total >= res.details.diagnose);
        assert_eq!(res.elapsed, res.details.total);

        // committed: the plain parse now succeeds too
        assert!(grammar.parse("clip-shot10-t2").unwrap().fields.is_some());
        assert_eq!(grammar.regex().unwrap().as_str(), r"-(?P<shot>shot\d+)-(?P<take>t\d+)$");
    }

    #[test]
    fn smart_parse_skips_diagnosis_on_direct_match() {
        let grammar = clip();
        let res = grammar.smart_parse_verbose("clip_shot10_t2").unwrap();
        assert!(res.fields.is_some());
        assert!(res.details.diagnosis.is_none());
        assert!(!res.details.repaired);
    }

    #[test]
    fn unrepairable_text_is_not_committed() {
        let grammar = clip();
        let before = grammar.regex().unwrap().as_str().to_string();

        let res = grammar.smart_parse_verbose("nothing here").unwrap();
        assert!(res.fields.is_none());
        assert!(!res.details.repaired);
        assert_eq!(grammar.regex().unwrap().as_str(), before);
        assert!(grammar.repair(&[]).is_err());
    }

    #[test]
    fn parses_from_many_threads() {
        let grammar = clip();
        let inputs = ["clip_shot1_t1", "clip_shot2_t2", "clip_shot3_t3", "clip-shot4-t4"];

        let parsed: Vec<bool> = std::thread::scope(|scope| {
            let handles: Vec<_> = inputs
                .iter()
                .map(|input| {
                    let grammar = &grammar;
                    scope.spawn(move || grammar.smart_parse(input).unwrap().fields.is_some())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(parsed.iter().all(|ok| *ok));
    }

    #[test]
    fn reset_and_into_inner() {
        let grammar = clip();
        grammar.smart_parse("clip-shot10-t2").unwrap();
        grammar.reset();
        // repairs are the new pristine state
        assert!(grammar.parse("clip-shot10-t2").unwrap().fields.is_some());

        let phrase = grammar.into_inner();
        assert_eq!(phrase.element_order(), ["shot", "take"]);
        assert!(phrase.grok().ends_with("CLIP (?:-%{_SHOT:shot}-%{_TAKE:take}$)"));
    }
}
