//! Error type shared by every grammar element.
//!
//! A string that does not match is never an error: `parse` returns `Ok(None)`
//! and an unrepairable string is reported as a [`Diagnosis`](crate::Diagnosis)
//! with an empty fix list. `GrammarError` is reserved for contract violations
//! by the caller or the grammar author.

/// All errors that can be returned by words, phrases and the grammar facade.
#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    /// A candidate or composed pattern failed to compile.
    #[error("invalid pattern for {descriptor}: {pattern:?}")]
    InvalidPattern {
        descriptor: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A mutation index does not resolve to a candidate of the component.
    #[error("mutation index {index} out of range for {descriptor} ({candidates} candidates)")]
    MutationOutOfRange { descriptor: String, index: isize, candidates: usize },

    /// `repair` was called with nothing to apply.
    #[error("fix for {descriptor} is empty")]
    EmptyFix { descriptor: String },

    /// A fix names a child element that the phrase does not own.
    #[error("phrase {phrase} has no element {element}")]
    UnknownElement { phrase: String, element: String },

    /// Two children of one phrase share a descriptor.
    #[error("phrase {phrase} already contains an element named {element}")]
    DuplicateElement { phrase: String, element: String },

    /// A fix variant the receiving element cannot apply.
    #[error("{descriptor} cannot apply fix {fix}")]
    FixMismatch { descriptor: String, fix: String },

    /// An explicit row subset names a row past the end of the phrase table.
    #[error("row {row} out of range for {phrase} ({rows} rows)")]
    RowOutOfRange { phrase: String, row: usize, rows: usize },

    /// A phrase-structure order that is not a permutation of the children.
    #[error("invalid element order for {phrase}: {order:?}")]
    InvalidOrder { phrase: String, order: Vec<String> },

    /// A word component was declared without any candidate pattern.
    #[error("{descriptor} has no candidate patterns")]
    EmptyCandidates { descriptor: String },
}

pub type Result<T> = std::result::Result<T, GrammarError>;
