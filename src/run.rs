//! Word recognition by simulation.
//!
//! The engine tracks a *configuration*, the set of states the automaton may currently
//! be in, instead of a single state. This makes one simulation loop serve both the
//! deterministic and the nondeterministic case, with epsilon closure applied after
//! every step for automata that permit spontaneous transitions.

use crate::{
    automaton::{Automaton, StateName},
    math,
    word::Word,
};

impl Automaton {
    /// Feeds the given symbols to the automaton and returns the final configuration.
    ///
    /// The starting configuration is the epsilon closure of the initial state; it is
    /// empty when no initial state has been designated. Returns `None` as soon as a
    /// symbol outside the alphabet is encountered.
    pub fn read<I>(&self, input: I) -> Option<math::OrderedSet<StateName>>
    where
        I: IntoIterator<Item = char>,
    {
        let mut configuration: math::OrderedSet<StateName> =
            self.initial_state().cloned().into_iter().collect();
        configuration = self.epsilon_closure(&configuration);
        for symbol in input {
            if !self.alphabet.contains(symbol) {
                return None;
            }
            configuration = self.epsilon_closure(&self.move_on_symbol(&configuration, symbol));
        }
        Some(configuration)
    }

    /// Returns true iff the automaton accepts the given word, i.e. the configuration
    /// after consuming all symbols intersects the final states.
    ///
    /// Recognition is a predicate over arbitrary input, not a validating parse: a
    /// symbol outside the alphabet simply rejects the word, it is not an error.
    pub fn recognizes(&self, word: &Word) -> bool {
        self.recognizes_chars(word.symbols().iter().copied())
    }

    /// Like [`Automaton::recognizes`], for a raw symbol sequence.
    pub fn recognizes_chars<I>(&self, input: I) -> bool
    where
        I: IntoIterator<Item = char>,
    {
        self.read(input)
            .map_or(false, |configuration| {
                configuration
                    .iter()
                    .any(|state| self.state(state).is_some_and(|s| s.is_final()))
            })
    }

    /// Returns true iff the two words drive the automaton into the same configuration.
    /// Words that are equivalent in this sense have exactly the same extensions into
    /// the recognized language.
    pub fn equivalent_words(&self, left: &Word, right: &Word) -> bool {
        self.read(left.symbols().iter().copied()) == self.read(right.symbols().iter().copied())
    }
}
