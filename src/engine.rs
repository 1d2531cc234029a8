//! Grammar engine: words, phrases and the diagnose/repair protocol.
//!
//! The engine models an identifier as a sequence of **words**, each made of
//! three parts: a *determiner* (the boundary in front), a *token* (the value
//! we want) and a *terminator* (the boundary behind). Words are grouped into
//! **phrases**, which may nest.
//!
//! ## How the parts work together
//!
//! ```text
//! WordBuilder::build          (word.rs)
//!   - append reserved candidates (anchor, wildcards, drop)
//!   - validate every candidate
//!            │
//!            v
//! Phrase::construct_data      (phrase.rs)
//!   - flatten child rows into one table
//!   - conflict flags per seam
//!   - replay committed scaffold repairs
//!            │
//! input ─────┼── Element::parse ── Some(fields) ──> done
//!            │          │
//!            │        None
//!            v          v
//! Element::diagnose   (word.rs / phrase.rs, under a Checkpoint)
//!   - word: candidate search per slot
//!   - phrase: scaffold, elements, verify
//!            │
//!            v
//!       Diagnosis { fix: Vec<Fix> }   (diagnosis.rs)
//!            │
//!            v
//! Element::repair ── rebuild table ── parse again
//! ```
//!
//! Diagnosis never leaves a trace on the element it ran on: every trial runs
//! inside a [`Checkpoint`] that writes the entry state back when it drops.
//! Only `repair` commits changes.
//!
//! ## Responsibilities by module
//!
//! - `mutation.rs`: mutation triples, reserved candidate indices and the row
//!   selection modes.
//! - `component.rs`: a single grammar row, pattern flags and capture flags.
//! - `checkpoint.rs`: the scoped rollback guard used while searching.
//! - `element.rs`: the [`Element`] trait shared by words and phrases.
//! - `word.rs`: [`Word`] and its builder.
//! - `phrase.rs`: [`Phrase`], linking, conflicts and the three-phase diagnosis.
//! - `diagnosis.rs`: [`Fix`] and [`Diagnosis`].
//! - `grok.rs`: Logstash grok export.
//!
//! ## Debugging
//!
//! The engine logs through the `log` facade. `debug` shows phase outcomes and
//! committed repairs, `trace` shows every single trial.

#[path = "engine/checkpoint.rs"]
mod checkpoint;
#[path = "engine/component.rs"]
mod component;
#[path = "engine/diagnosis.rs"]
mod diagnosis;
#[path = "engine/element.rs"]
mod element;
#[path = "engine/grok.rs"]
mod grok;
#[path = "engine/mutation.rs"]
mod mutation;
#[path = "engine/phrase.rs"]
mod phrase;
#[path = "engine/word.rs"]
mod word;


pub use checkpoint::Checkpoint;
pub use component::{Capture, Component, PatternFlags, Role};
pub use diagnosis::{Diagnosis, Fix};
pub use element::{Element, Fields};
pub use mutation::{ANCHOR, DROP, LAZY, LAZY_NON_EMPTY, Mode, Mutation, resolve_index};
pub use phrase::{Phrase, PhraseBuilder};
pub use word::{Word, WordBuilder};
