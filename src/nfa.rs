use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use bit_set::BitSet;
use bit_vec::BitVec;
use log::debug;

use crate::automaton::{is_epsilon, Automaton, Interner, StateNumber, SymbolNumber, EPSILON};
use crate::dfa::{intern_alphabet, intern_states, state_number, symbol_number, Dfa};
use crate::error::{Error, Result};

// NFAs

/// `None` labels an epsilon transition.
pub type Label = Option<SymbolNumber>;

#[derive(Clone, Debug, Default)]
struct NfaState {
    transitions: BTreeMap<Label, BitSet>,
}

/// A validated nondeterministic automaton, possibly with epsilon transitions.
///
/// The epsilon closures are computed once when the automaton is built and are
/// never touched afterwards.
#[derive(Clone, Debug)]
pub struct Nfa {
    names: Interner,
    alphabet: Interner,
    states: Vec<NfaState>,
    start: StateNumber,
    finals: BitVec,
    epsilon_closures: EpsilonClosures,
}

impl Nfa {
    pub fn builder() -> NfaBuilder {
        NfaBuilder::default()
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

    pub fn label_name(&self, label: Label) -> &str {
        label.map_or(EPSILON, |symbol| self.alphabet.name(symbol))
    }

    pub fn has_epsilon_transitions(&self) -> bool {
        self.states
            .iter()
            .any(|st| st.transitions.get(&None).map_or(false, |to| !to.is_empty()))
    }

    /// Targets of `state` on `label`; `None` when there are none.
    pub fn lookup(&self, state: StateNumber, label: Label) -> Option<&BitSet> {
        self.states
            .get(state)
            .and_then(|st| st.transitions.get(&label))
            .filter(|to| !to.is_empty())
    }

    /// All transitions as `(from, label, to)`, one entry per target state.
    pub fn transitions(&self) -> impl Iterator<Item = (StateNumber, Label, StateNumber)> + '_ {
        self.states.iter().enumerate().flat_map(|(from, st)| {
            st.transitions
                .iter()
                .flat_map(move |(&label, to)| to.iter().map(move |to| (from, label, to)))
        })
    }

    /// The closure table derived at construction time.
    pub fn epsilon_closures(&self) -> &EpsilonClosures {
        &self.epsilon_closures
    }

    /// Recomputes the epsilon closure of every state from the transitions.
    pub fn compute_epsilon_closures(&self) -> EpsilonClosures {
        EpsilonClosures {
            names: self.names.clone(),
            closures: closures_of(&self.states),
        }
    }

    /// Runs the automaton on epsilon-closed sets of states, one `char` per step.
    pub fn run(&self, input: &str) -> NfaRun {
        let mut steps = vec![self.start_state()];
        let mut trace = self.trace_str(input);
        steps.extend(trace.by_ref().map(|(_, set)| set));
        let halted = trace.halted();
        let accepted = !halted && steps.last().map_or(false, |set| self.is_accepting(set));

        debug!(
            "ran NFA on {:?}: {} steps, accepted: {}",
            input,
            steps.len() - 1,
            accepted
        );

        NfaRun {
            steps,
            halted,
            accepted,
        }
    }

    /// Subset construction over epsilon closures.
    ///
    /// Every reachable, non-empty set of NFA states becomes one DFA state named
    /// after its members, e.g. `{q0,q1}`. Empty target sets are left out, so a
    /// missing transition in the result means the NFA would get stuck.
    pub fn to_dfa(&self) -> Result<Dfa> {
        let mut builder = Dfa::builder();
        for (_, symbol) in self.alphabet.iter() {
            builder.symbol(symbol);
        }

        let mut names: HashMap<BTreeSet<StateNumber>, String> = HashMap::new();
        let start: BTreeSet<StateNumber> = self.start_state().iter().collect();
        let start_name = self.subset_name(&start);
        builder.state(start_name.as_str()).start(start_name.as_str());
        if start.iter().any(|&st| self.is_final(st)) {
            builder.accept(start_name.as_str());
        }
        names.insert(start.clone(), start_name);

        let mut worklist = vec![start];
        while let Some(cur_states) = worklist.pop() {
            let cur_name = names[&cur_states].clone();
            let cur_set: BitSet = cur_states.iter().cloned().collect();
            for (symbol, symbol_name) in self.alphabet.iter() {
                let nxt_states: BTreeSet<StateNumber> = match self.next_state(&cur_set, symbol) {
                    Some(set) => set.iter().collect(),
                    // Skip the stuck state
                    None => continue,
                };

                if !names.contains_key(&nxt_states) {
                    let nxt_name = self.subset_name(&nxt_states);
                    builder.state(nxt_name.as_str());
                    if nxt_states.iter().any(|&st| self.is_final(st)) {
                        builder.accept(nxt_name.as_str());
                    }
                    names.insert(nxt_states.clone(), nxt_name);
                    worklist.push(nxt_states.clone());
                }

                builder.transition(cur_name.as_str(), symbol_name, names[&nxt_states].as_str());
            }
        }

        debug!("subset construction produced {} states", names.len());
        builder.build()
    }

    fn subset_name(&self, states: &BTreeSet<StateNumber>) -> String {
        let members: Vec<&str> = states.iter().map(|&st| self.state_name(st)).collect();
        format!("{{{}}}", members.join(","))
    }
}

impl Automaton for Nfa {
    type State = BitSet;

    fn alphabet(&self) -> &Interner {
        &self.alphabet
    }

    fn start_state(&self) -> BitSet {
        self.epsilon_closures.get(self.start).clone()
    }

    /// An empty successor set counts as "no transition".
    fn next_state(&self, states: &BitSet, symbol: SymbolNumber) -> Option<BitSet> {
        let mut nxt_states = BitSet::with_capacity(self.states.len());
        for state in states {
            if let Some(to) = self.lookup(state, Some(symbol)) {
                nxt_states.union_with(to);
            }
        }
        let closed = self.epsilon_closures.close(&nxt_states);
        if closed.is_empty() {
            None
        } else {
            Some(closed)
        }
    }

    fn is_accepting(&self, states: &BitSet) -> bool {
        states.iter().any(|st| self.is_final(st))
    }
}

fn closures_of(states: &[NfaState]) -> Vec<BitSet> {
    (0..states.len())
        .map(|state| epsilon_closure(states, state))
        .collect()
}

/// Depth-first search over epsilon edges only. A state already in the closure
/// is not expanded again, which is what makes epsilon cycles terminate.
fn epsilon_closure(states: &[NfaState], state: StateNumber) -> BitSet {
    let mut closure = BitSet::with_capacity(states.len());
    let mut stack = vec![state];
    while let Some(current) = stack.pop() {
        if !closure.insert(current) {
            continue;
        }
        if let Some(to) = states[current].transitions.get(&None) {
            stack.extend(to.iter().filter(|&st| !closure.contains(st)));
        }
    }
    closure
}

/// For every state, the states reachable through epsilon transitions alone,
/// the state itself included.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EpsilonClosures {
    names: Interner,
    closures: Vec<BitSet>,
}

impl EpsilonClosures {
    pub fn get(&self, state: StateNumber) -> &BitSet {
        &self.closures[state]
    }

    /// The closure of the state called `name`, as state names.
    pub fn by_name(&self, name: &str) -> Option<Vec<&str>> {
        self.names.get(name).map(|state| self.names_of(state))
    }

    pub fn names_of(&self, state: StateNumber) -> Vec<&str> {
        self.closures[state]
            .iter()
            .map(|st| self.names.name(st))
            .collect()
    }

    /// Union of the closures of all members of `states`.
    pub fn close(&self, states: &BitSet) -> BitSet {
        let mut closed = BitSet::with_capacity(self.closures.len());
        for state in states {
            closed.union_with(&self.closures[state]);
        }
        closed
    }

    pub fn iter(&self) -> impl Iterator<Item = (StateNumber, &BitSet)> {
        self.closures.iter().enumerate()
    }

    pub fn len(&self) -> usize {
        self.closures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closures.is_empty()
    }
}

impl fmt::Display for EpsilonClosures {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{")?;
        for (state, _) in self.iter() {
            if state > 0 {
                write!(f, ", ")?;
            }
            write!(
                f,
                "{}: {{{}}}",
                self.names.name(state),
                self.names_of(state).join(", ")
            )?;
        }
        write!(f, "}}")
    }
}

/// The outcome of running an NFA on one input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NfaRun {
    /// Active (epsilon-closed) state sets, starting with the closure of the
    /// start state.
    pub steps: Vec<BitSet>,
    pub halted: bool,
    pub accepted: bool,
}

impl NfaRun {
    pub fn consumed(&self) -> usize {
        self.steps.len() - 1
    }
}

/// Collects an NFA description by name and validates it in `build`.
#[derive(Clone, Debug, Default)]
pub struct NfaBuilder {
    states: Vec<String>,
    alphabet: Vec<String>,
    transitions: Vec<(String, String, Vec<String>)>,
    start: Option<String>,
    accepting: Vec<String>,
}

impl NfaBuilder {
    pub fn new() -> Self {
        NfaBuilder::default()
    }

    pub fn state<S: Into<String>>(&mut self, name: S) -> &mut Self {
        self.states.push(name.into());
        self
    }

    pub fn symbol<S: Into<String>>(&mut self, symbol: S) -> &mut Self {
        self.alphabet.push(symbol.into());
        self
    }

    /// `symbol` may be `λ` or `ε` for an epsilon transition; `to` may be empty.
    pub fn transition<F, S, I>(&mut self, from: F, symbol: S, to: I) -> &mut Self
    where
        F: Into<String>,
        S: Into<String>,
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let to = to.into_iter().map(Into::into).collect();
        self.transitions.push((from.into(), symbol.into(), to));
        self
    }

    pub fn epsilon<F, I>(&mut self, from: F, to: I) -> &mut Self
    where
        F: Into<String>,
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.transition(from, EPSILON, to)
    }

    pub fn start<S: Into<String>>(&mut self, name: S) -> &mut Self {
        self.start = Some(name.into());
        self
    }

    pub fn accept<S: Into<String>>(&mut self, name: S) -> &mut Self {
        self.accepting.push(name.into());
        self
    }

    pub fn build(&self) -> Result<Nfa> {
        let names = intern_states(&self.states)?;
        let alphabet = intern_alphabet(&self.alphabet)?;

        let start = self.start.as_ref().ok_or(Error::MissingStartState)?;
        let start = state_number(&names, start)?;

        let mut finals = BitVec::from_elem(names.len(), false);
        for name in &self.accepting {
            finals.set(state_number(&names, name)?, true);
        }

        let mut states = vec![NfaState::default(); names.len()];
        for (from, symbol, to) in &self.transitions {
            let from = state_number(&names, from)?;
            let label = if is_epsilon(symbol) {
                None
            } else {
                Some(symbol_number(&alphabet, symbol)?)
            };
            let mut targets = BitSet::with_capacity(names.len());
            for name in to {
                targets.insert(state_number(&names, name)?);
            }
            states[from]
                .transitions
                .entry(label)
                .or_insert_with(BitSet::new)
                .union_with(&targets);
        }

        let epsilon_closures = EpsilonClosures {
            closures: closures_of(&states),
            names: names.clone(),
        };
        debug!("epsilon closures: {}", epsilon_closures);

        Ok(Nfa {
            names,
            alphabet,
            states,
            start,
            finals,
            epsilon_closures,
        })
    }
}
