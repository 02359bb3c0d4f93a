use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = ::std::result::Result<T, Error>;

/// Everything that can go wrong while building or rendering an automaton.
///
/// A missing transition during simulation is *not* an error, it is how an
/// automaton rejects.
#[derive(Debug, Error)]
pub enum Error {
    #[error("state `{0}` is declared more than once")]
    DuplicateState(String),

    #[error("symbol `{0}` is declared more than once")]
    DuplicateSymbol(String),

    #[error("the epsilon symbol `{0}` cannot be part of the alphabet")]
    EpsilonInAlphabet(String),

    #[error("state `{0}` is used but never declared")]
    UnknownState(String),

    #[error("symbol `{0}` is used but not part of the alphabet")]
    UnknownSymbol(String),

    #[error("no start state was given")]
    MissingStartState,

    #[error("a DFA cannot have epsilon transitions (from `{0}`)")]
    EpsilonInDfa(String),

    #[error("conflicting transitions from `{state}` on `{symbol}`: `{first}` and `{second}`")]
    ConflictingTransition {
        state: String,
        symbol: String,
        first: String,
        second: String,
    },

    #[error("invalid automaton description: {0}")]
    Config(#[from] serde_json::Error),

    #[error("failed to read `{path}`: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write `{path}`: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("could not run the graphviz `dot` executable: {0}")]
    Backend(io::Error),

    #[error("graphviz `dot` failed with {status}: {stderr}")]
    BackendFailed { status: String, stderr: String },
}
