use std::collections::HashMap;
use std::fmt::Debug;
use std::str::Chars;

pub type StateNumber = usize;
pub type SymbolNumber = usize;

/// The symbol used to write down an epsilon transition.
pub const EPSILON: &str = "λ";
/// How epsilon transitions are labelled in diagrams. Also accepted on input.
pub const EPSILON_LABEL: &str = "ε";

pub fn is_epsilon(symbol: &str) -> bool {
    symbol == EPSILON || symbol == EPSILON_LABEL
}

pub fn edge_label(symbol: &str) -> &str {
    if is_epsilon(symbol) {
        EPSILON_LABEL
    } else {
        symbol
    }
}

/// Dense numbering for the opaque names of states and symbols.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Interner {
    names: Vec<String>,
    numbers: HashMap<String, usize>,
}

impl Interner {
    pub fn new() -> Self {
        Interner::default()
    }

    /// Returns `None` if `name` was interned before.
    pub fn intern(&mut self, name: &str) -> Option<usize> {
        if self.numbers.contains_key(name) {
            return None;
        }
        let number = self.names.len();
        self.names.push(name.to_owned());
        self.numbers.insert(name.to_owned(), number);
        Some(number)
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.numbers.get(name).cloned()
    }

    /// Numbers are only ever handed out by `intern`, so they are always in range.
    pub fn name(&self, number: usize) -> &str {
        &self.names[number]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.names.iter().map(String::as_str).enumerate()
    }
}

/// Step-wise view on an automaton, shared by the DFA and the NFA.
///
/// `next_state` returning `None` means there is no transition: the automaton
/// is stuck and rejects whatever input is left.
pub trait Automaton {
    type State: Clone + Debug;

    fn alphabet(&self) -> &Interner;

    fn start_state(&self) -> Self::State;

    fn next_state(&self, state: &Self::State, symbol: SymbolNumber) -> Option<Self::State>;

    fn is_accepting(&self, state: &Self::State) -> bool;

    /// Walks the automaton over `input`, where `None` stands for a symbol
    /// outside the alphabet.
    fn trace<I>(&self, input: I) -> Trace<'_, Self, I::IntoIter>
    where
        Self: Sized,
        I: IntoIterator<Item = Option<SymbolNumber>>,
    {
        Trace {
            aut: self,
            input: input.into_iter(),
            state: Some(self.start_state()),
        }
    }

    /// Every `char` of `input` is one symbol.
    fn trace_str<'a>(&'a self, input: &'a str) -> Trace<'a, Self, CharSymbols<'a>>
    where
        Self: Sized,
    {
        self.trace(CharSymbols::new(self.alphabet(), input))
    }
}

/// Maps the characters of a string to alphabet symbols.
#[derive(Clone, Debug)]
pub struct CharSymbols<'a> {
    alphabet: &'a Interner,
    chars: Chars<'a>,
}

impl<'a> CharSymbols<'a> {
    pub fn new(alphabet: &'a Interner, input: &'a str) -> Self {
        CharSymbols {
            alphabet,
            chars: input.chars(),
        }
    }
}

impl<'a> Iterator for CharSymbols<'a> {
    type Item = Option<SymbolNumber>;

    fn next(&mut self) -> Option<Self::Item> {
        let c = self.chars.next()?;
        let mut buf = [0; 4];
        Some(self.alphabet.get(c.encode_utf8(&mut buf)))
    }
}

/// The states an automaton moves through, not including the start state,
/// each paired with the symbol that led there.
///
/// Input is pulled one symbol at a time. The iterator ends when the input runs out or when a symbol has no
/// transition; `halted` tells those two apart.
#[derive(Debug)]
pub struct Trace<'a, A: Automaton, I> {
    aut: &'a A,
    input: I,
    state: Option<A::State>,
}

impl<'a, A: Automaton, I> Trace<'a, A, I> {
    pub fn halted(&self) -> bool {
        self.state.is_none()
    }
}

impl<'a, A, I> Iterator for Trace<'a, A, I>
where
    A: Automaton,
    I: Iterator<Item = Option<SymbolNumber>>,
{
    type Item = (SymbolNumber, A::State);

    fn next(&mut self) -> Option<Self::Item> {
        let next = {
            let state = self.state.as_ref()?;
            let symbol = self.input.next()?;
            symbol.and_then(|symbol| self.aut.next_state(state, symbol).map(|to| (symbol, to)))
        };
        self.state = next.as_ref().map(|(_, to)| to.clone());
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interner_numbers_densely_and_rejects_duplicates() {
        let mut interner = Interner::new();
        assert_eq!(interner.intern("q0"), Some(0));
        assert_eq!(interner.intern("q1"), Some(1));
        assert_eq!(interner.intern("q0"), None);
        assert_eq!(interner.get("q1"), Some(1));
        assert_eq!(interner.get("q2"), None);
        assert_eq!(interner.name(1), "q1");
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn epsilon_spellings() {
        assert!(is_epsilon("λ"));
        assert!(is_epsilon("ε"));
        assert!(!is_epsilon("a"));
        assert_eq!(edge_label("λ"), "ε");
        assert_eq!(edge_label("0"), "0");
    }

    /// Counts to `limit`, one symbol per step, and has no transition from `limit`.
    struct Counter {
        alphabet: Interner,
        limit: usize,
    }

    impl Automaton for Counter {
        type State = usize;

        fn alphabet(&self) -> &Interner {
            &self.alphabet
        }

        fn start_state(&self) -> usize {
            0
        }

        fn next_state(&self, &state: &usize, _: SymbolNumber) -> Option<usize> {
            if state < self.limit {
                Some(state + 1)
            } else {
                None
            }
        }

        fn is_accepting(&self, &state: &usize) -> bool {
            state == self.limit
        }
    }

    fn counter(limit: usize) -> Counter {
        let mut alphabet = Interner::new();
        alphabet.intern("a");
        alphabet.intern("b");
        Counter { alphabet, limit }
    }

    #[test]
    fn trace_str_maps_characters_to_symbols() {
        let aut = counter(5);
        let steps: Vec<_> = aut.trace_str("aba").collect();
        assert_eq!(steps, vec![(0, 1), (1, 2), (0, 3)]);
    }

    #[test]
    fn trace_stops_reading_once_stuck() {
        let aut = counter(2);
        let mut pulled = 0;
        let mut trace = aut.trace(std::iter::repeat(Some(0)).take(100).inspect(|_| pulled += 1));
        assert_eq!(trace.by_ref().count(), 2);
        assert!(trace.halted());
        drop(trace);
        assert_eq!(pulled, 3);
    }

    #[test]
    fn unknown_character_halts_the_trace() {
        let aut = counter(5);
        let mut trace = aut.trace_str("azb");
        assert_eq!(trace.next(), Some((0, 1)));
        assert_eq!(trace.next(), None);
        assert!(trace.halted());
    }
}
