//! Library for working with finite automata and the regular languages they recognize.
//!
//! The central type is [`automaton::Automaton`], a state/transition graph over a fixed
//! [`alphabet::Alphabet`]. A single data type covers deterministic automata,
//! nondeterministic ones and those with epsilon transitions; instead of a type
//! hierarchy, the capabilities of a concrete value are exposed as the predicates
//! `is_deterministic`, `is_complete` and `is_epsilon_free`, and every algorithm states
//! which capabilities it requires and which it guarantees. Violated preconditions are
//! reported as [`error::LanguageError`] values, never patched up silently.
//!
//! Recognition simulates the set of states the automaton may be in, so one engine
//! serves the deterministic and the nondeterministic case alike. On top of that the
//! crate implements the classical algorithms relating automata and regular languages:
//! the subset construction and epsilon elimination, minimization by partition
//! refinement, the closure operations of the language algebra (union, intersection,
//! complement, concatenation, star, mirror, quotient) and the translation between
//! regular expressions and automata in both directions.
//!
//! All transforms are pure: they take their inputs by reference and return freshly
//! built automata, which keeps them composable and individually testable. Constructed
//! state names are a deterministic function of their origin (e.g. the sorted contents
//! of a subset or a partition class), so repeated runs produce identical output.

/// The prelude is supposed to make using this package easier. Importing everything,
/// i.e. `use reglang::prelude::*;`, should be enough to use the package.
pub mod prelude {
    pub use crate::{
        alphabet::{Alphabet, Label, Words, EMPTY_WORD_SYMBOL},
        automaton::{Automaton, State, StateName},
        error::LanguageError,
        language::Language,
        math,
        regex::{Regex, EMPTY_LANGUAGE_SYMBOL},
        word::Word,
    };
}

/// Definitions of mathematical objects used throughout the crate that do not really
/// fit anywhere else, mostly collection type aliases and partitions.
pub mod math;

/// Alphabets, transition labels and word enumeration.
pub mod alphabet;

/// Validated immutable words and the operations on them.
pub mod word;

/// The automaton model: states, the transition relation, capability predicates and
/// reachability queries.
pub mod automaton;

/// The error taxonomy shared by all fallible operations.
pub mod error;

/// Languages as explicit word sets or automaton-backed sets.
pub mod language;

/// Regular expressions and their translation from and to automata.
pub mod regex;

mod determinization;
mod minimization;
mod operations;
mod run;

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use lazy_static::lazy_static;

    lazy_static! {
        /// The two-symbol alphabet most fixtures are defined over.
        pub static ref AB: Alphabet = Alphabet::new(['a', 'b']);
    }

    /// Deterministic complete automaton accepting exactly the words ending in `a`.
    pub fn ends_with_a_dfa() -> Automaton {
        let mut automaton = Automaton::new(AB.clone());
        automaton.add_states(["q0", "q1"]).unwrap();
        automaton.set_initial("q0").unwrap();
        automaton.add_final("q1").unwrap();
        for (source, symbol, target) in [
            ("q0", 'a', "q1"),
            ("q0", 'b', "q0"),
            ("q1", 'a', "q1"),
            ("q1", 'b', "q0"),
        ] {
            automaton
                .add_transition(source, Label::Symbol(symbol), target)
                .unwrap();
        }
        automaton
    }

    /// Nondeterministic automaton with two `a`-successors of the initial state,
    /// accepting `a` and `ab`.
    pub fn forked_nfa() -> Automaton {
        let mut automaton = Automaton::new(AB.clone());
        automaton.add_states(["q0", "q1", "q2"]).unwrap();
        automaton.set_initial("q0").unwrap();
        automaton.add_final("q2").unwrap();
        for (source, symbol, target) in [
            ("q0", 'a', "q1"),
            ("q0", 'a', "q2"),
            ("q1", 'b', "q2"),
        ] {
            automaton
                .add_transition(source, Label::Symbol(symbol), target)
                .unwrap();
        }
        automaton
    }

    /// A linear automaton accepting exactly the given word over [`struct@AB`].
    pub fn single_word_automaton(content: &str) -> Automaton {
        let mut automaton = Automaton::new(AB.clone());
        let symbols: Vec<char> = content.chars().collect();
        for position in 0..=symbols.len() {
            automaton.add_state(position.to_string()).unwrap();
        }
        automaton.set_initial("0").unwrap();
        automaton.add_final(&symbols.len().to_string()).unwrap();
        for (position, &symbol) in symbols.iter().enumerate() {
            automaton
                .add_transition(
                    &position.to_string(),
                    Label::Symbol(symbol),
                    &(position + 1).to_string(),
                )
                .unwrap();
        }
        automaton
    }
}
