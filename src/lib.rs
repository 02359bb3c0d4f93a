//! Draw finite automata with Graphviz and trace how a DFA reads a string.
//!
//! The interesting parts are the epsilon closures of an NFA
//! (`Nfa::compute_epsilon_closures`) and the path a DFA takes through its
//! states (`Dfa::simulate_str`). Everything in `dot` only maps automata onto
//! Graphviz nodes and edges.

pub mod automaton;
pub mod config;
pub mod dfa;
pub mod dot;
pub mod error;
pub mod nfa;

pub use crate::automaton::Automaton;
pub use crate::dfa::{Dfa, DfaBuilder, Simulation};
pub use crate::error::{Error, Result};
pub use crate::nfa::{EpsilonClosures, Nfa, NfaBuilder, NfaRun};

/// The states reachable from every state of `nfa` through epsilon transitions.
pub fn compute_epsilon_closures(nfa: &Nfa) -> EpsilonClosures {
    nfa.compute_epsilon_closures()
}

/// The path `dfa` takes over `input`, and whether it accepts.
pub fn simulate(dfa: &Dfa, input: &str) -> Simulation {
    dfa.simulate_str(input)
}
