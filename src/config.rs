//! Automaton descriptions as JSON documents.
//!
//! ```json
//! {
//!     "kind": "dfa",
//!     "states": ["q0", "q1"],
//!     "alphabet": ["0", "1"],
//!     "transitions": [{ "from": "q0", "symbol": "1", "to": "q1" }],
//!     "start_state": "q0",
//!     "accept_states": ["q1"]
//! }
//! ```
//!
//! `to` may also be a list of states, which is what NFAs use. Everything is
//! checked when the description is turned into an automaton.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::automaton::{Automaton, EPSILON};
use crate::dfa::Dfa;
use crate::error::{Error, Result};
use crate::nfa::Nfa;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Dfa,
    Nfa,
    #[serde(alias = "epsilon-nfa", alias = "e-nfa")]
    Enfa,
}

impl FromStr for Kind {
    type Err = String;

    fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dfa" => Ok(Kind::Dfa),
            "nfa" => Ok(Kind::Nfa),
            "enfa" | "epsilon-nfa" | "e-nfa" => Ok(Kind::Enfa),
            _ => Err(format!("Unknown automaton kind: {}. Supported: dfa, nfa, enfa", s)),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            Kind::Dfa => "dfa",
            Kind::Nfa => "nfa",
            Kind::Enfa => "enfa",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Targets {
    One(String),
    Many(Vec<String>),
}

impl Targets {
    pub fn as_slice(&self) -> &[String] {
        match *self {
            Targets::One(ref to) => ::std::slice::from_ref(to),
            Targets::Many(ref to) => to,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct TransitionConfig {
    pub from: String,
    pub symbol: String,
    pub to: Targets,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AutomatonConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<Kind>,
    pub states: Vec<String>,
    #[serde(default)]
    pub alphabet: Vec<String>,
    #[serde(default)]
    pub transitions: Vec<TransitionConfig>,
    #[serde(default)]
    pub start_state: Option<String>,
    #[serde(default)]
    pub accept_states: Vec<String>,
}

impl AutomatonConfig {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        AutomatonConfig::from_reader(BufReader::new(file))
    }

    /// Describes an existing DFA, e.g. the result of a subset construction.
    pub fn from_dfa(dfa: &Dfa) -> Self {
        let alphabet = dfa.alphabet();
        AutomatonConfig {
            kind: Some(Kind::Dfa),
            states: dfa.states().iter().map(|(_, name)| name.to_owned()).collect(),
            alphabet: alphabet.iter().map(|(_, symbol)| symbol.to_owned()).collect(),
            transitions: dfa
                .transitions()
                .map(|(from, symbol, to)| TransitionConfig {
                    from: dfa.state_name(from).to_owned(),
                    symbol: alphabet.name(symbol).to_owned(),
                    to: Targets::One(dfa.state_name(to).to_owned()),
                })
                .collect(),
            start_state: Some(dfa.state_name(dfa.start()).to_owned()),
            accept_states: dfa
                .states()
                .iter()
                .filter(|&(state, _)| dfa.is_final(state))
                .map(|(_, name)| name.to_owned())
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// A DFA has at most one target per transition; more than one distinct
    /// target is reported as a conflict.
    pub fn into_dfa(&self) -> Result<Dfa> {
        let mut builder = Dfa::builder();
        for state in &self.states {
            builder.state(state.as_str());
        }
        for symbol in &self.alphabet {
            builder.symbol(symbol.as_str());
        }
        for tr in &self.transitions {
            for to in tr.to.as_slice() {
                builder.transition(tr.from.as_str(), tr.symbol.as_str(), to.as_str());
            }
        }
        if let Some(ref start) = self.start_state {
            builder.start(start.as_str());
        }
        for state in &self.accept_states {
            builder.accept(state.as_str());
        }
        builder.build()
    }

    pub fn into_nfa(&self) -> Result<Nfa> {
        let mut builder = Nfa::builder();
        for state in &self.states {
            builder.state(state.as_str());
        }
        for symbol in &self.alphabet {
            builder.symbol(symbol.as_str());
        }
        for tr in &self.transitions {
            builder.transition(tr.from.as_str(), tr.symbol.as_str(), tr.to.as_slice());
        }
        if let Some(ref start) = self.start_state {
            builder.start(start.as_str());
        }
        for state in &self.accept_states {
            builder.accept(state.as_str());
        }
        builder.build()
    }
}

impl FromStr for AutomatonConfig {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|&s| s.to_owned()).collect()
}

fn tr(from: &str, symbol: &str, to: &[&str]) -> TransitionConfig {
    TransitionConfig {
        from: from.to_owned(),
        symbol: symbol.to_owned(),
        to: match to {
            [one] => Targets::One((*one).to_owned()),
            many => Targets::Many(strings(many)),
        },
    }
}

/// Accepts binary numbers that are 2 modulo 3, most significant bit first.
pub fn demo_dfa() -> AutomatonConfig {
    AutomatonConfig {
        kind: Some(Kind::Dfa),
        states: strings(&["q0", "q1", "q2"]),
        alphabet: strings(&["0", "1"]),
        transitions: vec![
            tr("q0", "0", &["q0"]),
            tr("q0", "1", &["q1"]),
            tr("q1", "0", &["q2"]),
            tr("q1", "1", &["q0"]),
            tr("q2", "0", &["q1"]),
            tr("q2", "1", &["q2"]),
        ],
        start_state: Some("q0".to_owned()),
        accept_states: strings(&["q2"]),
    }
}

pub fn demo_nfa() -> AutomatonConfig {
    AutomatonConfig {
        kind: Some(Kind::Nfa),
        states: strings(&["q0", "q1", "q2"]),
        alphabet: strings(&["0", "1"]),
        transitions: vec![
            tr("q0", "0", &["q0", "q1"]),
            tr("q0", "1", &["q1"]),
            tr("q1", "0", &["q2"]),
            tr("q1", "1", &["q0"]),
            tr("q2", "0", &[]),
            tr("q2", "1", &["q2"]),
        ],
        start_state: Some("q0".to_owned()),
        accept_states: strings(&["q2"]),
    }
}

pub fn demo_epsilon_nfa() -> AutomatonConfig {
    AutomatonConfig {
        kind: Some(Kind::Enfa),
        states: strings(&["q0", "q1", "q2", "q3"]),
        alphabet: strings(&["a", "b"]),
        transitions: vec![
            tr("q0", EPSILON, &["q1", "q3"]),
            tr("q1", "a", &["q2"]),
            tr("q2", "b", &["q0"]),
            tr("q3", "b", &["q2"]),
        ],
        start_state: Some("q0".to_owned()),
        accept_states: strings(&["q2"]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL_NFA: &str = r#"{
        "states": ["s", "t"],
        "alphabet": ["x"],
        "transitions": [
            { "from": "s", "symbol": "x", "to": ["s", "t"] },
            { "from": "s", "symbol": "ε", "to": "t" }
        ],
        "start_state": "s",
        "accept_states": ["t"]
    }"#;

    #[test]
    fn reads_single_and_list_targets() {
        let config: AutomatonConfig = SMALL_NFA.parse().unwrap();
        assert_eq!(config.kind, None);
        assert_eq!(config.transitions[0].to.as_slice().len(), 2);
        assert_eq!(config.transitions[1].to, Targets::One("t".to_owned()));

        let nfa = config.into_nfa().unwrap();
        assert!(nfa.has_epsilon_transitions());
        assert_eq!(nfa.epsilon_closures().by_name("s"), Some(vec!["s", "t"]));
    }

    #[test]
    fn multiple_targets_conflict_in_a_dfa() {
        let config: AutomatonConfig = SMALL_NFA.parse().unwrap();
        assert!(matches!(
            config.into_dfa(),
            Err(Error::ConflictingTransition { .. })
        ));
    }

    #[test]
    fn missing_start_state_is_a_validation_error() {
        let config: AutomatonConfig = r#"{ "states": ["a"] }"#.parse().unwrap();
        assert!(matches!(config.into_dfa(), Err(Error::MissingStartState)));
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let result = "{ \"states\": 3 }".parse::<AutomatonConfig>();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn kinds_parse_from_flags_and_json() {
        assert_eq!("E-NFA".parse::<Kind>(), Ok(Kind::Enfa));
        let config: AutomatonConfig =
            r#"{ "kind": "epsilon-nfa", "states": [] }"#.parse().unwrap();
        assert_eq!(config.kind, Some(Kind::Enfa));

        for spelling in &["enfa", "epsilon-nfa", "e-nfa"] {
            assert_eq!(spelling.parse::<Kind>(), Ok(Kind::Enfa));
            let json = format!(r#"{{ "kind": "{}", "states": [] }}"#, spelling);
            let config: AutomatonConfig = json.parse().unwrap();
            assert_eq!(config.kind, Some(Kind::Enfa));
        }
    }

    #[test]
    fn demos_are_well_formed() {
        assert!(demo_dfa().into_dfa().is_ok());
        assert!(demo_nfa().into_nfa().is_ok());
        assert!(demo_epsilon_nfa().into_nfa().is_ok());
        assert!(demo_epsilon_nfa().into_dfa().is_err());
    }

    #[test]
    fn survives_a_json_round_trip() {
        let config = demo_nfa();
        let json = config.to_json().unwrap();
        assert_eq!(json.parse::<AutomatonConfig>().unwrap(), config);
    }

    #[test]
    fn describes_existing_dfas() {
        let dfa = demo_dfa().into_dfa().unwrap();
        assert_eq!(AutomatonConfig::from_dfa(&dfa), demo_dfa());
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nfa.json");
        std::fs::write(&path, SMALL_NFA).unwrap();
        assert!(AutomatonConfig::from_path(&path).is_ok());
        assert!(matches!(
            AutomatonConfig::from_path(dir.path().join("missing.json")),
            Err(Error::Read { .. })
        ));
    }
}
