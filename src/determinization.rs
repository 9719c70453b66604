//! Epsilon closure, epsilon elimination and the subset construction.

use std::collections::VecDeque;

use bit_set::BitSet;
use itertools::Itertools;
use tracing::{debug, trace};

use crate::{
    alphabet::Label,
    automaton::{Automaton, State, StateName},
    error::LanguageError,
    math,
};

/// Name given to the sink state that guarantees completeness.
pub(crate) const SINK_NAME: &str = "∅";

/// Deterministic, order-independent name for a set of states: the members joined in
/// sorted order. Repeated runs therefore produce bit-for-bit identical automata.
fn subset_name(members: &BitSet, names: &[&StateName]) -> StateName {
    format!("{{{}}}", members.iter().map(|i| names[i].as_str()).join(","))
}

impl Automaton {
    /// The smallest superset of `states` closed under following epsilon transitions,
    /// computed as a worklist fixed point. The state set is finite and closure is
    /// monotone, so the iteration terminates.
    pub fn epsilon_closure(
        &self,
        states: &math::OrderedSet<StateName>,
    ) -> math::OrderedSet<StateName> {
        let mut closure = states.clone();
        let mut stack: Vec<StateName> = states.iter().cloned().collect();
        while let Some(state) = stack.pop() {
            for target in self.transitions_from(&state, Label::Epsilon) {
                if closure.insert(target.clone()) {
                    stack.push(target.clone());
                }
            }
        }
        closure
    }

    /// The union over all states in the set of their one-step successors on `symbol`,
    /// without any epsilon closure. Composing this with [`Automaton::epsilon_closure`]
    /// yields the move function the subset construction is built on.
    pub fn move_on_symbol(
        &self,
        states: &math::OrderedSet<StateName>,
        symbol: char,
    ) -> math::OrderedSet<StateName> {
        states
            .iter()
            .flat_map(|state| self.transitions_from(state, Label::Symbol(symbol)))
            .cloned()
            .collect()
    }

    /// Converts the automaton into an equivalent deterministic and complete one via
    /// the subset construction.
    ///
    /// Works for any input, including nondeterministic automata with epsilon
    /// transitions. Only subsets reachable from the closure of the initial state are
    /// materialized; moves with no successor are routed to a single sink state so the
    /// output is complete by construction. Requires an initial state.
    pub fn determinize(&self) -> Result<Automaton, LanguageError> {
        let initial = self
            .initial_state()
            .ok_or(LanguageError::MissingInitialState)?
            .clone();

        let names: Vec<&StateName> = self.state_names().collect();
        let index: math::Map<&str, usize> = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();
        let symbols: Vec<char> = self.alphabet.symbols().collect();

        // per-state epsilon closures, iterated to the fixed point
        let epsilon_successors: Vec<Vec<usize>> = names
            .iter()
            .map(|name| {
                self.transitions_from(name, Label::Epsilon)
                    .map(|t| index[t.as_str()])
                    .collect()
            })
            .collect();
        let mut closures: Vec<BitSet> = (0..names.len())
            .map(|i| {
                let mut singleton = BitSet::with_capacity(names.len());
                singleton.insert(i);
                singleton
            })
            .collect();
        let mut changed = true;
        while changed {
            changed = false;
            for i in 0..names.len() {
                let mut widened = closures[i].clone();
                for &j in &epsilon_successors[i] {
                    widened.union_with(&closures[j]);
                }
                if widened != closures[i] {
                    closures[i] = widened;
                    changed = true;
                }
            }
        }

        let successors: Vec<math::Map<char, Vec<usize>>> = names
            .iter()
            .map(|name| {
                symbols
                    .iter()
                    .map(|&symbol| {
                        (
                            symbol,
                            self.transitions_from(name, Label::Symbol(symbol))
                                .map(|t| index[t.as_str()])
                                .collect(),
                        )
                    })
                    .collect()
            })
            .collect();
        let finals: BitSet = names
            .iter()
            .enumerate()
            .filter(|(_, name)| self.state(name).is_some_and(State::is_final))
            .map(|(i, _)| i)
            .collect();

        let close = |set: &BitSet| {
            let mut closed = BitSet::with_capacity(names.len());
            for i in set.iter() {
                closed.union_with(&closures[i]);
            }
            closed
        };

        let mut out = Automaton::new(self.alphabet.clone());
        let mut discovered: math::Bijection<Vec<usize>, StateName> = math::Bijection::new();
        let mut queue: VecDeque<(BitSet, StateName)> = VecDeque::new();
        let mut sink_present = false;

        let start = closures[index[initial.as_str()]].clone();
        let start_name = subset_name(&start, &names);
        out.add_state(start_name.clone())?;
        out.set_initial(&start_name)?;
        if !start.is_disjoint(&finals) {
            out.add_final(&start_name)?;
        }
        discovered.insert(start.iter().collect(), start_name.clone());
        queue.push_back((start, start_name));

        while let Some((subset, subset_id)) = queue.pop_front() {
            for &symbol in &symbols {
                let mut moved = BitSet::with_capacity(names.len());
                for i in subset.iter() {
                    for &target in &successors[i][&symbol] {
                        moved.insert(target);
                    }
                }
                let target_set = close(&moved);

                let target_id = if target_set.is_empty() {
                    if !sink_present {
                        out.add_state(SINK_NAME)?;
                        for &loop_symbol in &symbols {
                            out.add_transition(SINK_NAME, Label::Symbol(loop_symbol), SINK_NAME)?;
                        }
                        sink_present = true;
                    }
                    SINK_NAME.to_string()
                } else {
                    let key: Vec<usize> = target_set.iter().collect();
                    match discovered.get_by_left(&key) {
                        Some(known) => known.clone(),
                        None => {
                            let name = subset_name(&target_set, &names);
                            trace!("discovered subset {name}");
                            out.add_state(name.clone())?;
                            if !target_set.is_disjoint(&finals) {
                                out.add_final(&name)?;
                            }
                            discovered.insert(key, name.clone());
                            queue.push_back((target_set, name.clone()));
                            name
                        }
                    }
                };
                out.add_transition(&subset_id, Label::Symbol(symbol), &target_id)?;
            }
        }

        debug!(
            "subset construction mapped {} states onto {} subsets",
            self.size(),
            out.size()
        );
        Ok(out)
    }

    /// Removes all epsilon transitions while preserving the recognized language.
    ///
    /// The state set and state names are kept; each state gets the direct transitions
    /// `closure(move(closure(q), a))` and is final iff its closure meets the final
    /// states. The output is epsilon-free but in general still nondeterministic.
    pub fn eliminate_epsilon(&self) -> Automaton {
        let mut out = Automaton::new(self.alphabet.clone());
        for state in self.states.values() {
            let mut copy = state.clone();
            let closure =
                self.epsilon_closure(&std::iter::once(state.name.clone()).collect());
            copy.accepting = closure
                .iter()
                .any(|q| self.state(q).is_some_and(State::is_final));
            out.insert_state_unchecked(copy);
            for symbol in self.alphabet.symbols() {
                let targets = self.epsilon_closure(&self.move_on_symbol(&closure, symbol));
                for target in &targets {
                    out.link(&state.name, Label::Symbol(symbol), target);
                }
            }
        }
        out
    }

    /// Returns a completed copy: if some state is missing a successor on some symbol,
    /// a sink state with self-loops on every symbol is added and all missing
    /// transitions are routed into it. Determinism, epsilon transitions and the
    /// recognized language are untouched.
    pub fn complete(&self) -> Automaton {
        let mut out = self.clone();
        if out.is_complete() {
            return out;
        }
        let sink = out.fresh_name(SINK_NAME);
        out.insert_state_unchecked(State::new(sink.clone()));
        let all_states: Vec<StateName> = out.state_names().cloned().collect();
        for state in &all_states {
            for symbol in self.alphabet.symbols() {
                if out.transitions_from(state, Label::Symbol(symbol)).next().is_none() {
                    out.link(state, Label::Symbol(symbol), &sink);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use crate::alphabet::Label;
    use crate::automaton::Automaton;
    use crate::error::LanguageError;
    use crate::math;
    use crate::tests::{ends_with_a_dfa, forked_nfa, AB};

    fn set(states: &[&str]) -> math::OrderedSet<String> {
        states.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn epsilon_closure_follows_chains() {
        let mut automaton = Automaton::with_epsilon(AB.clone());
        automaton.add_states(["q0", "q1", "q2", "q3"]).unwrap();
        automaton.add_transition("q0", Label::Epsilon, "q1").unwrap();
        automaton.add_transition("q1", Label::Epsilon, "q2").unwrap();
        automaton
            .add_transition("q2", Label::Symbol('a'), "q3")
            .unwrap();

        assert_eq!(
            automaton.epsilon_closure(&set(&["q0"])),
            set(&["q0", "q1", "q2"])
        );
        assert_eq!(automaton.epsilon_closure(&set(&["q3"])), set(&["q3"]));
        assert_eq!(
            automaton.move_on_symbol(&set(&["q0", "q1", "q2"]), 'a'),
            set(&["q3"])
        );
    }

    #[test]
    fn determinize_requires_an_initial_state() {
        let mut automaton = Automaton::new(AB.clone());
        automaton.add_state("q0").unwrap();
        assert_eq!(
            automaton.determinize().err(),
            Some(LanguageError::MissingInitialState)
        );
    }

    #[test_log::test]
    fn determinization_yields_a_deterministic_complete_equivalent() {
        let forked = forked_nfa();
        assert!(!forked.is_deterministic());

        let dfa = forked.determinize().unwrap();
        assert!(dfa.is_deterministic());
        assert!(dfa.is_complete());
        assert!(dfa.is_epsilon_free());

        for word in AB.words().take_while(|w| w.len() <= 4) {
            assert_eq!(
                dfa.recognizes_chars(word.iter().copied()),
                forked.recognizes_chars(word.iter().copied()),
                "disagreement on {word:?}"
            );
        }
    }

    #[test]
    fn determinization_handles_epsilon_transitions() {
        // accepts exactly "a": q0 -ε-> q1 -a-> q2
        let mut automaton = Automaton::with_epsilon(AB.clone());
        automaton.add_states(["q0", "q1", "q2"]).unwrap();
        automaton.set_initial("q0").unwrap();
        automaton.add_final("q2").unwrap();
        automaton.add_transition("q0", Label::Epsilon, "q1").unwrap();
        automaton
            .add_transition("q1", Label::Symbol('a'), "q2")
            .unwrap();

        let dfa = automaton.determinize().unwrap();
        assert!(dfa.is_deterministic() && dfa.is_complete());
        for word in AB.words().take_while(|w| w.len() <= 3) {
            assert_eq!(
                dfa.recognizes_chars(word.iter().copied()),
                automaton.recognizes_chars(word.iter().copied()),
            );
        }
    }

    #[test]
    fn subset_names_are_reproducible() {
        let first = forked_nfa().determinize().unwrap();
        let second = forked_nfa().determinize().unwrap();
        assert_eq!(first.to_string(), second.to_string());
        assert!(first.contains_state("{q0}"));
    }

    #[test]
    fn epsilon_elimination_preserves_the_language() {
        let mut automaton = Automaton::with_epsilon(AB.clone());
        automaton.add_states(["q0", "q1", "q2"]).unwrap();
        automaton.set_initial("q0").unwrap();
        automaton.add_final("q2").unwrap();
        automaton.add_transition("q0", Label::Epsilon, "q1").unwrap();
        automaton
            .add_transition("q1", Label::Symbol('a'), "q2")
            .unwrap();
        automaton.add_transition("q2", Label::Epsilon, "q0").unwrap();

        let direct = automaton.eliminate_epsilon();
        assert!(direct.is_epsilon_free());
        assert_eq!(direct.size(), automaton.size());
        for word in AB.words().take_while(|w| w.len() <= 4) {
            assert_eq!(
                direct.recognizes_chars(word.iter().copied()),
                automaton.recognizes_chars(word.iter().copied()),
            );
        }
    }

    #[test]
    fn completion_adds_a_sink_only_when_needed() {
        let complete = ends_with_a_dfa();
        assert_eq!(complete.complete().size(), complete.size());

        let partial = forked_nfa();
        let completed = partial.complete();
        assert!(completed.is_complete());
        assert_eq!(completed.size(), partial.size() + 1);
        for word in AB.words().take_while(|w| w.len() <= 3) {
            assert_eq!(
                completed.recognizes_chars(word.iter().copied()),
                partial.recognizes_chars(word.iter().copied()),
            );
        }
    }
}
