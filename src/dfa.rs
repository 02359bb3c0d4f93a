use bit_vec::BitVec;
use log::debug;

use crate::automaton::{is_epsilon, Automaton, Interner, StateNumber, SymbolNumber, Trace};
use crate::error::{Error, Result};

/// Outgoing transitions of one state, indexed by symbol number.
#[derive(Clone, Debug)]
pub struct DfaState {
    pub transitions: Box<[Option<StateNumber>]>,
}

/// A validated deterministic automaton with a partial transition function.
#[derive(Clone, Debug)]
pub struct Dfa {
    names: Interner,
    alphabet: Interner,
    states: Box<[DfaState]>,
    start: StateNumber,
    finals: BitVec,
}

impl Dfa {
    pub fn builder() -> DfaBuilder {
        DfaBuilder::default()
    }

    pub fn states(&self) -> &Interner {
        &self.names
    }

    pub fn start(&self) -> StateNumber {
        self.start
    }

    pub fn is_final(&self, state: StateNumber) -> bool {
        self.finals.get(state).unwrap_or(false)
    }

    pub fn state_name(&self, state: StateNumber) -> &str {
        self.names.name(state)
    }

    /// The explicit "no transition" case is `None`.
    pub fn lookup(&self, state: StateNumber, symbol: SymbolNumber) -> Option<StateNumber> {
        self.states
            .get(state)
            .and_then(|st| st.transitions.get(symbol))
            .cloned()
            .flatten()
    }

    /// All defined transitions as `(from, symbol, to)`, by state and then symbol.
    pub fn transitions(&self) -> impl Iterator<Item = (StateNumber, SymbolNumber, StateNumber)> + '_ {
        self.states.iter().enumerate().flat_map(|(from, st)| {
            st.transitions
                .iter()
                .enumerate()
                .filter_map(move |(symbol, to)| to.map(|to| (from, symbol, to)))
        })
    }

    pub fn simulate(&self, input: &[SymbolNumber]) -> Simulation {
        self.run(self.trace(input.iter().map(|&symbol| Some(symbol))))
    }

    /// Reads `input` one `char` at a time. Characters outside the alphabet
    /// have no transition, so they make the DFA reject.
    pub fn simulate_str(&self, input: &str) -> Simulation {
        let simulation = self.run(self.trace_str(input));
        debug!(
            "simulated {:?}: path {:?}, accepted: {}",
            input,
            simulation.path_names(self),
            simulation.accepted
        );
        simulation
    }

    /// Nothing past the symbol that got the DFA stuck is read.
    fn run<I>(&self, mut trace: Trace<'_, Self, I>) -> Simulation
    where
        I: Iterator<Item = Option<SymbolNumber>>,
    {
        let mut path = vec![self.start];
        let mut symbols = Vec::new();
        for (symbol, state) in &mut trace {
            symbols.push(symbol);
            path.push(state);
        }
        let halted = trace.halted();
        let accepted = !halted && self.is_final(path[path.len() - 1]);

        Simulation {
            path,
            symbols,
            halted,
            accepted,
        }
    }
}

impl Automaton for Dfa {
    type State = StateNumber;

    fn alphabet(&self) -> &Interner {
        &self.alphabet
    }

    fn start_state(&self) -> StateNumber {
        self.start
    }

    fn next_state(&self, &state: &StateNumber, symbol: SymbolNumber) -> Option<StateNumber> {
        self.lookup(state, symbol)
    }

    fn is_accepting(&self, &state: &StateNumber) -> bool {
        self.is_final(state)
    }
}

/// The outcome of running a DFA on one input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Simulation {
    /// Visited states, starting with the start state.
    pub path: Vec<StateNumber>,
    /// The symbols that were consumed, one per step of `path`.
    pub symbols: Vec<SymbolNumber>,
    /// Set when a symbol without a transition stopped the run early.
    pub halted: bool,
    pub accepted: bool,
}

impl Simulation {
    pub fn consumed(&self) -> usize {
        self.symbols.len()
    }

    pub fn final_state(&self) -> StateNumber {
        self.path[self.path.len() - 1]
    }

    /// The `(from, symbol)` pairs that were traversed.
    pub fn taken_edges(&self) -> impl Iterator<Item = (StateNumber, SymbolNumber)> + '_ {
        self.path.iter().cloned().zip(self.symbols.iter().cloned())
    }

    pub fn path_names<'d>(&self, dfa: &'d Dfa) -> Vec<&'d str> {
        self.path.iter().map(|&state| dfa.state_name(state)).collect()
    }
}

/// Collects a DFA description by name and validates it in `build`.
#[derive(Clone, Debug, Default)]
pub struct DfaBuilder {
    states: Vec<String>,
    alphabet: Vec<String>,
    transitions: Vec<(String, String, String)>,
    start: Option<String>,
    accepting: Vec<String>,
}

impl DfaBuilder {
    pub fn new() -> Self {
        DfaBuilder::default()
    }

    pub fn state<S: Into<String>>(&mut self, name: S) -> &mut Self {
        self.states.push(name.into());
        self
    }

    pub fn symbol<S: Into<String>>(&mut self, symbol: S) -> &mut Self {
        self.alphabet.push(symbol.into());
        self
    }

    pub fn transition<F, S, T>(&mut self, from: F, symbol: S, to: T) -> &mut Self
    where
        F: Into<String>,
        S: Into<String>,
        T: Into<String>,
    {
        self.transitions.push((from.into(), symbol.into(), to.into()));
        self
    }

    pub fn start<S: Into<String>>(&mut self, name: S) -> &mut Self {
        self.start = Some(name.into());
        self
    }

    pub fn accept<S: Into<String>>(&mut self, name: S) -> &mut Self {
        self.accepting.push(name.into());
        self
    }

    pub fn build(&self) -> Result<Dfa> {
        let names = intern_states(&self.states)?;
        let alphabet = intern_alphabet(&self.alphabet)?;

        let start = self.start.as_ref().ok_or(Error::MissingStartState)?;
        let start = state_number(&names, start)?;

        let mut finals = BitVec::from_elem(names.len(), false);
        for name in &self.accepting {
            finals.set(state_number(&names, name)?, true);
        }

        let mut table = vec![vec![None; alphabet.len()]; names.len()];
        for (from, symbol, to) in &self.transitions {
            let from_number = state_number(&names, from)?;
            if is_epsilon(symbol) {
                return Err(Error::EpsilonInDfa(from.clone()));
            }
            let on = symbol_number(&alphabet, symbol)?;
            let to_number = state_number(&names, to)?;
            let slot = &mut table[from_number][on];
            match *slot {
                Some(existing) if existing != to_number => {
                    return Err(Error::ConflictingTransition {
                        state: from.clone(),
                        symbol: symbol.clone(),
                        first: names.name(existing).to_owned(),
                        second: to.clone(),
                    });
                }
                _ => *slot = Some(to_number),
            }
        }

        let states = table
            .into_iter()
            .map(|transitions| DfaState {
                transitions: transitions.into_boxed_slice(),
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();

        debug!(
            "built DFA with {} states over {} symbols",
            names.len(),
            alphabet.len()
        );

        Ok(Dfa {
            names,
            alphabet,
            states,
            start,
            finals,
        })
    }
}

pub(crate) fn intern_states(states: &[String]) -> Result<Interner> {
    let mut names = Interner::new();
    for name in states {
        names
            .intern(name)
            .ok_or_else(|| Error::DuplicateState(name.clone()))?;
    }
    Ok(names)
}

pub(crate) fn intern_alphabet(symbols: &[String]) -> Result<Interner> {
    let mut alphabet = Interner::new();
    for symbol in symbols {
        if is_epsilon(symbol) {
            return Err(Error::EpsilonInAlphabet(symbol.clone()));
        }
        alphabet
            .intern(symbol)
            .ok_or_else(|| Error::DuplicateSymbol(symbol.clone()))?;
    }
    Ok(alphabet)
}

pub(crate) fn state_number(names: &Interner, name: &str) -> Result<StateNumber> {
    names
        .get(name)
        .ok_or_else(|| Error::UnknownState(name.to_owned()))
}

pub(crate) fn symbol_number(alphabet: &Interner, symbol: &str) -> Result<SymbolNumber> {
    alphabet
        .get(symbol)
        .ok_or_else(|| Error::UnknownSymbol(symbol.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mod3() -> Dfa {
        Dfa::builder()
            .state("q0")
            .state("q1")
            .state("q2")
            .symbol("0")
            .symbol("1")
            .transition("q0", "0", "q0")
            .transition("q0", "1", "q1")
            .transition("q1", "0", "q2")
            .transition("q1", "1", "q0")
            .transition("q2", "0", "q1")
            .transition("q2", "1", "q2")
            .start("q0")
            .accept("q2")
            .build()
            .unwrap()
    }

    #[test]
    fn follows_the_table() {
        let dfa = mod3();
        let sim = dfa.simulate_str("0010111");
        assert_eq!(
            sim.path_names(&dfa),
            vec!["q0", "q0", "q0", "q1", "q2", "q2", "q2", "q2"]
        );
        assert!(!sim.halted);
        assert!(sim.accepted);
        assert_eq!(sim.consumed(), 7);
    }

    #[test]
    fn simulate_by_symbol_number() {
        let dfa = mod3();
        let one = dfa.alphabet().get("1").unwrap();
        let zero = dfa.alphabet().get("0").unwrap();
        let sim = dfa.simulate(&[one, zero]);
        assert_eq!(sim.path_names(&dfa), vec!["q0", "q1", "q2"]);
        assert!(sim.accepted);
    }

    #[test]
    fn empty_input_stays_in_start() {
        let dfa = mod3();
        let sim = dfa.simulate_str("");
        assert_eq!(sim.path, vec![dfa.start()]);
        assert!(!sim.accepted);
        assert_eq!(sim.taken_edges().count(), 0);
    }

    #[test]
    fn missing_transition_rejects_even_in_accepting_state() {
        let dfa = Dfa::builder()
            .state("a")
            .state("b")
            .symbol("x")
            .symbol("y")
            .transition("a", "x", "b")
            .start("a")
            .accept("b")
            .build()
            .unwrap();

        let sim = dfa.simulate_str("xyx");
        assert_eq!(sim.path_names(&dfa), vec!["a", "b"]);
        assert!(sim.halted);
        assert!(!sim.accepted);
        assert_eq!(dfa.lookup(1, 1), None);
    }

    #[test]
    fn unknown_character_rejects() {
        let dfa = mod3();
        let sim = dfa.simulate_str("10z1");
        assert_eq!(sim.path_names(&dfa), vec!["q0", "q1", "q2"]);
        assert!(sim.halted);
        assert!(!sim.accepted);
    }

    #[test]
    fn input_after_a_halt_is_not_read() {
        let dfa = mod3();
        let mut pulled = 0;
        let zeros = "0".repeat(50);
        let input = "1z".chars().chain(zeros.chars()).inspect(|_| pulled += 1);
        let symbols = input.map(|c| dfa.alphabet().get(c.encode_utf8(&mut [0; 4])));
        let sim = dfa.run(dfa.trace(symbols));
        assert_eq!(sim.path_names(&dfa), vec!["q0", "q1"]);
        assert_eq!(sim.symbols, vec![1]);
        assert!(sim.halted);
        assert_eq!(pulled, 2);
    }

    #[test]
    fn taken_edges_pair_states_with_symbols() {
        let dfa = mod3();
        let sim = dfa.simulate_str("10");
        let edges: Vec<_> = sim.taken_edges().collect();
        assert_eq!(edges, vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn transitions_are_listed_by_state() {
        let dfa = mod3();
        let all: Vec<_> = dfa.transitions().collect();
        assert_eq!(all.len(), 6);
        assert_eq!(all[0], (0, 0, 0));
        assert_eq!(all[5], (2, 1, 2));
    }

    #[test]
    fn rejects_malformed_descriptions() {
        let missing_start = Dfa::builder().state("a").build();
        assert!(matches!(missing_start, Err(Error::MissingStartState)));

        let undeclared_start = Dfa::builder().state("a").start("b").build();
        assert!(matches!(undeclared_start, Err(Error::UnknownState(ref s)) if s == "b"));

        let undeclared_accept = Dfa::builder().state("a").start("a").accept("z").build();
        assert!(matches!(undeclared_accept, Err(Error::UnknownState(ref s)) if s == "z"));

        let duplicate = Dfa::builder().state("a").state("a").start("a").build();
        assert!(matches!(duplicate, Err(Error::DuplicateState(_))));

        let bad_symbol = Dfa::builder()
            .state("a")
            .symbol("0")
            .transition("a", "1", "a")
            .start("a")
            .build();
        assert!(matches!(bad_symbol, Err(Error::UnknownSymbol(ref s)) if s == "1"));

        let epsilon = Dfa::builder()
            .state("a")
            .transition("a", "λ", "a")
            .start("a")
            .build();
        assert!(matches!(epsilon, Err(Error::EpsilonInDfa(_))));

        let epsilon_symbol = Dfa::builder().state("a").symbol("ε").start("a").build();
        assert!(matches!(epsilon_symbol, Err(Error::EpsilonInAlphabet(_))));
    }

    #[test]
    fn conflicting_transitions_are_rejected_but_repeats_are_fine() {
        let mut builder = Dfa::builder();
        builder
            .state("a")
            .state("b")
            .symbol("0")
            .transition("a", "0", "b")
            .transition("a", "0", "b")
            .start("a");
        assert!(builder.build().is_ok());

        builder.transition("a", "0", "a");
        match builder.build() {
            Err(Error::ConflictingTransition { first, second, .. }) => {
                assert_eq!(first, "b");
                assert_eq!(second, "a");
            }
            other => panic!("expected a conflict, got {:?}", other),
        }
    }
}
