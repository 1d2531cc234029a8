//! Self-repairing Determiner-Token-Terminator grammars.
//!
//! A [`Word`] matches one field of a semi-structured identifier (a file or
//! job name) with three patterns: the boundary in front of the field, the
//! field itself and the boundary behind it. Words compose into a [`Phrase`].
//! When a string does not parse, the phrase can [`diagnose`](Element::diagnose)
//! why and [`repair`](Element::repair) itself so it does.
//!
//! ```
//! use dtt_grammar::{Element, Phrase, Word};
//!
//! let shot = Word::builder("shot").determiners(["_", "-"]).tokens([r"shot\d+"]).terminators(["_", "-"]).build()?;
//! let take = Word::builder("take").determiners(["_", "-"]).tokens([r"t\d+"]).terminators(["$"]).build()?;
//! let mut phrase = Phrase::builder("clip").element(shot).element(take).build()?;
//!
//! let fields = phrase.parse("clip_shot10_t2")?.expect("matches");
//! assert_eq!(fields["shot"], "shot10");
//!
//! // A different separator: diagnose finds new boundaries, repair commits them.
//! assert!(phrase.parse("clip-shot10-t2")?.is_none());
//! let fields = phrase.smart_parse("clip-shot10-t2")?.expect("repaired");
//! assert_eq!(fields["take"], "t2");
//! # Ok::<(), dtt_grammar::GrammarError>(())
//! ```
//!
//! [`Grammar`] wraps a master phrase for use from several threads.

#[macro_use]
mod macros;
mod api;
mod engine;
mod error;

pub use api::{Grammar, ParseDetails, ParseResult, ParseResultVerbose};
pub use engine::{
    ANCHOR, Capture, Checkpoint, Component, DROP, Diagnosis, Element, Fields, Fix, LAZY, LAZY_NON_EMPTY, Mode,
    Mutation, PatternFlags, Phrase, PhraseBuilder, Role, Word, WordBuilder, resolve_index,
};
pub use error::{GrammarError, Result};
