//! Closure operations on regular languages, expressed as automaton transforms.
//!
//! Every operation returns a freshly built automaton and leaves its operands
//! untouched; binary operations require both operands to share one alphabet.

use std::collections::VecDeque;

use crate::{
    alphabet::Label,
    automaton::{Automaton, State, StateName},
    error::LanguageError,
    word::Word,
};

fn ensure_same_alphabet(left: &Automaton, right: &Automaton) -> Result<(), LanguageError> {
    if left.alphabet() != right.alphabet() {
        return Err(LanguageError::AlphabetMismatch);
    }
    Ok(())
}

/// Copies every state (with its final mark, but no initial role) and every transition
/// of `source` into `target`, with all state names prefixed to keep identities
/// disjoint from anything already present.
fn copy_prefixed(target: &mut Automaton, source: &Automaton, prefix: &str, keep_finals: bool) {
    for state in source.states() {
        let mut copy = State::new(format!("{prefix}{}", state.name()));
        copy.accepting = keep_finals && state.is_final();
        target.insert_state_unchecked(copy);
    }
    for (from, label, to) in source.transitions() {
        target.link(&format!("{prefix}{from}"), label, &format!("{prefix}{to}"));
    }
}

impl Automaton {
    /// Product construction common to union and intersection: states are reachable
    /// pairs, finality of a pair is decided by `accept`.
    fn product(
        &self,
        other: &Automaton,
        accept: impl Fn(bool, bool) -> bool,
    ) -> Result<Automaton, LanguageError> {
        ensure_same_alphabet(self, other)?;
        if !(self.is_deterministic() && self.is_complete())
            || !(other.is_deterministic() && other.is_complete())
        {
            return Err(LanguageError::NotDeterministicOrComplete);
        }
        let left_initial = self
            .initial_state()
            .ok_or(LanguageError::MissingInitialState)?
            .clone();
        let right_initial = other
            .initial_state()
            .ok_or(LanguageError::MissingInitialState)?
            .clone();

        let pair_name = |p: &str, q: &str| format!("({p},{q})");
        let is_final = |a: &Automaton, s: &str| a.state(s).is_some_and(State::is_final);

        let mut out = Automaton::new(self.alphabet().clone());
        let start = pair_name(&left_initial, &right_initial);
        out.add_state(start.clone())?;
        out.set_initial(&start)?;
        if accept(
            is_final(self, &left_initial),
            is_final(other, &right_initial),
        ) {
            out.add_final(&start)?;
        }

        let mut queue = VecDeque::from([(left_initial, right_initial)]);
        while let Some((p, q)) = queue.pop_front() {
            for symbol in self.alphabet().symbols() {
                let p_next = self
                    .transitions_from(&p, Label::Symbol(symbol))
                    .next()
                    .ok_or(LanguageError::NotDeterministicOrComplete)?
                    .clone();
                let q_next = other
                    .transitions_from(&q, Label::Symbol(symbol))
                    .next()
                    .ok_or(LanguageError::NotDeterministicOrComplete)?
                    .clone();
                let target = pair_name(&p_next, &q_next);
                if !out.contains_state(&target) {
                    out.add_state(target.clone())?;
                    if accept(is_final(self, &p_next), is_final(other, &q_next)) {
                        out.add_final(&target)?;
                    }
                    queue.push_back((p_next, q_next));
                }
                out.add_transition(&pair_name(&p, &q), Label::Symbol(symbol), &target)?;
            }
        }
        Ok(out)
    }

    /// The automaton recognizing the union of the two languages, built as a product
    /// of two deterministic complete automata. The output is deterministic and
    /// complete; for the nondeterministic union used in inductive constructions see
    /// [`Automaton::sum`].
    pub fn union(&self, other: &Automaton) -> Result<Automaton, LanguageError> {
        self.product(other, |p, q| p || q)
    }

    /// The automaton recognizing the intersection of the two languages, built as a
    /// product of two deterministic complete automata.
    pub fn intersection(&self, other: &Automaton) -> Result<Automaton, LanguageError> {
        self.product(other, |p, q| p && q)
    }

    /// The automaton recognizing the complement language. Requires a deterministic
    /// *complete* automaton; the final and non-final marks are swapped.
    pub fn complement(&self) -> Result<Automaton, LanguageError> {
        if !self.is_deterministic() || !self.is_complete() {
            return Err(LanguageError::NotDeterministicOrComplete);
        }
        let mut out = self.clone();
        for state in out.states.values_mut() {
            state.accepting = !state.accepting;
        }
        Ok(out)
    }

    /// Nondeterministic union: both operands are renamed apart and a fresh initial
    /// state is epsilon-linked to their former initial states. Unlike
    /// [`Automaton::union`] this works for arbitrary operands, at the price of a
    /// nondeterministic result.
    pub fn sum(&self, other: &Automaton) -> Result<Automaton, LanguageError> {
        ensure_same_alphabet(self, other)?;
        let left_initial = self
            .initial_state()
            .ok_or(LanguageError::MissingInitialState)?
            .clone();
        let right_initial = other
            .initial_state()
            .ok_or(LanguageError::MissingInitialState)?
            .clone();

        let mut out = Automaton::with_epsilon(self.alphabet().clone());
        copy_prefixed(&mut out, self, "0.", true);
        copy_prefixed(&mut out, other, "1.", true);
        let fresh = out.fresh_name("*");
        out.insert_state_unchecked(State::new(fresh.clone()));
        out.set_initial(&fresh)?;
        out.link(&fresh, Label::Epsilon, &format!("0.{left_initial}"));
        out.link(&fresh, Label::Epsilon, &format!("1.{right_initial}"));
        Ok(out)
    }

    /// The automaton recognizing the concatenation of the two languages: operands
    /// are renamed apart and every final state of `self` is epsilon-linked to the
    /// initial state of `other`. The result is generally nondeterministic; callers
    /// needing a deterministic automaton determinize explicitly.
    pub fn concatenate(&self, other: &Automaton) -> Result<Automaton, LanguageError> {
        ensure_same_alphabet(self, other)?;
        let left_initial = self
            .initial_state()
            .ok_or(LanguageError::MissingInitialState)?
            .clone();
        let right_initial = other
            .initial_state()
            .ok_or(LanguageError::MissingInitialState)?
            .clone();

        let mut out = Automaton::with_epsilon(self.alphabet().clone());
        copy_prefixed(&mut out, self, "0.", false);
        copy_prefixed(&mut out, other, "1.", true);
        out.set_initial(&format!("0.{left_initial}"))?;
        for final_state in self.final_states() {
            out.link(
                &format!("0.{final_state}"),
                Label::Epsilon,
                &format!("1.{right_initial}"),
            );
        }
        Ok(out)
    }

    /// The automaton recognizing the Kleene star of the language: a fresh
    /// initial-and-final state is epsilon-linked to the former initial state, and
    /// every former final state is epsilon-linked back to it.
    pub fn star(&self) -> Result<Automaton, LanguageError> {
        let initial = self
            .initial_state()
            .ok_or(LanguageError::MissingInitialState)?
            .clone();

        let mut out = Automaton::with_epsilon(self.alphabet().clone());
        copy_prefixed(&mut out, self, "0.", true);
        let fresh = out.fresh_name("*");
        let mut hub = State::new(fresh.clone());
        hub.accepting = true;
        out.insert_state_unchecked(hub);
        out.set_initial(&fresh)?;
        out.link(&fresh, Label::Epsilon, &format!("0.{initial}"));
        for final_state in self.final_states() {
            out.link(&format!("0.{final_state}"), Label::Epsilon, &fresh);
        }
        Ok(out)
    }

    /// The automaton recognizing the mirrored (reversed) language: every transition
    /// is reversed and the initial and final roles swap sides. Since only one state
    /// may be initial, a fresh epsilon-linked initial state is introduced whenever
    /// the automaton does not have exactly one final state.
    pub fn mirror(&self) -> Result<Automaton, LanguageError> {
        let initial = self
            .initial_state()
            .ok_or(LanguageError::MissingInitialState)?
            .clone();
        let finals: Vec<StateName> = self.final_states().cloned().collect();
        let needs_fresh_initial = finals.len() != 1;

        let mut out = if self.supports_epsilon() || needs_fresh_initial {
            Automaton::with_epsilon(self.alphabet().clone())
        } else {
            Automaton::new(self.alphabet().clone())
        };
        for state in self.states() {
            out.insert_state_unchecked(State::new(state.name().to_string()));
        }
        for (source, label, target) in self.transitions() {
            out.link(target, label, source);
        }
        if let Some(state) = out.states.get_mut(&initial) {
            state.accepting = true;
        }
        if needs_fresh_initial {
            let fresh = out.fresh_name("*");
            out.insert_state_unchecked(State::new(fresh.clone()));
            out.set_initial(&fresh)?;
            for final_state in &finals {
                out.link(&fresh, Label::Epsilon, final_state);
            }
        } else {
            out.set_initial(&finals[0])?;
        }
        Ok(out)
    }

    /// The automaton recognizing the left quotient `w⁻¹·L`, the words `v` such that
    /// `w·v` lies in the language. The graph is kept and re-rooted at the
    /// configuration reached by reading `w`; a fresh epsilon-linked initial state is
    /// introduced when that configuration is not a singleton.
    pub fn left_quotient(&self, word: &Word) -> Result<Automaton, LanguageError> {
        if word.alphabet() != self.alphabet() {
            return Err(LanguageError::AlphabetMismatch);
        }
        if self.initial_state().is_none() {
            return Err(LanguageError::MissingInitialState);
        }
        let configuration = self
            .read(word.symbols().iter().copied())
            .unwrap_or_default();
        let rooted_directly = configuration.len() == 1;

        let mut out = if self.supports_epsilon() || !rooted_directly {
            Automaton::with_epsilon(self.alphabet().clone())
        } else {
            Automaton::new(self.alphabet().clone())
        };
        for state in self.states() {
            let mut copy = State::new(state.name().to_string());
            copy.accepting = state.is_final();
            out.insert_state_unchecked(copy);
        }
        for (source, label, target) in self.transitions() {
            out.link(source, label, target);
        }
        if rooted_directly {
            if let Some(root) = configuration.iter().next() {
                out.set_initial(root)?;
            }
        } else {
            let fresh = out.fresh_name("*");
            out.insert_state_unchecked(State::new(fresh.clone()));
            out.set_initial(&fresh)?;
            for state in &configuration {
                out.link(&fresh, Label::Epsilon, state);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use crate::alphabet::Alphabet;
    use crate::error::LanguageError;
    use crate::tests::{ends_with_a_dfa, forked_nfa, AB};
    use crate::word::Word;

    fn word(content: &str) -> Word {
        Word::new(content, AB.clone()).unwrap()
    }

    #[test]
    fn complement_requires_deterministic_complete_input() {
        assert_eq!(
            forked_nfa().complement().err(),
            Some(LanguageError::NotDeterministicOrComplete)
        );
    }

    #[test]
    fn double_complement_is_the_identity_on_acceptance() {
        let automaton = ends_with_a_dfa();
        let back = automaton.complement().unwrap().complement().unwrap();
        for w in AB.words().take_while(|w| w.len() <= 4) {
            assert_eq!(
                automaton.recognizes_chars(w.iter().copied()),
                back.recognizes_chars(w.iter().copied()),
            );
        }
    }

    #[test]
    fn union_with_the_complement_is_total() {
        let automaton = ends_with_a_dfa();
        let total = automaton.union(&automaton.complement().unwrap()).unwrap();
        assert!(total.is_deterministic() && total.is_complete());
        for w in AB.words().take_while(|w| w.len() <= 4) {
            assert!(total.recognizes_chars(w.iter().copied()));
        }
    }

    #[test]
    fn intersection_with_the_complement_is_empty() {
        let automaton = ends_with_a_dfa();
        let empty = automaton
            .intersection(&automaton.complement().unwrap())
            .unwrap();
        for w in AB.words().take_while(|w| w.len() <= 4) {
            assert!(!empty.recognizes_chars(w.iter().copied()));
        }
    }

    #[test]
    fn binary_operations_check_the_alphabets() {
        let automaton = ends_with_a_dfa();
        let mut other = crate::automaton::Automaton::new(Alphabet::new(['a']));
        other.add_state("q0").unwrap();
        other.set_initial("q0").unwrap();
        assert_eq!(
            automaton.union(&other).err(),
            Some(LanguageError::AlphabetMismatch)
        );
        assert_eq!(
            automaton.sum(&other).err(),
            Some(LanguageError::AlphabetMismatch)
        );
    }

    #[test]
    fn product_operations_reject_nondeterministic_operands() {
        assert_eq!(
            ends_with_a_dfa().union(&forked_nfa()).err(),
            Some(LanguageError::NotDeterministicOrComplete)
        );
    }

    #[test]
    fn sum_accepts_words_of_either_operand() {
        let either = ends_with_a_dfa()
            .sum(&ends_with_a_dfa().complement().unwrap())
            .unwrap();
        for w in AB.words().take_while(|w| w.len() <= 3) {
            assert!(either.recognizes_chars(w.iter().copied()));
        }
    }

    #[test]
    fn concatenation_joins_the_languages() {
        // {a} then {b}
        let left = crate::tests::single_word_automaton("a");
        let right = crate::tests::single_word_automaton("b");
        let joined = left.concatenate(&right).unwrap();
        assert!(joined.recognizes(&word("ab")));
        assert!(!joined.recognizes(&word("a")));
        assert!(!joined.recognizes(&word("b")));
        assert!(!joined.recognizes(&word("ba")));
        assert!(!joined.recognizes(&word("")));
    }

    #[test]
    fn star_iterates_the_language() {
        let starred = crate::tests::single_word_automaton("ab").star().unwrap();
        assert!(starred.recognizes(&word("")));
        assert!(starred.recognizes(&word("ab")));
        assert!(starred.recognizes(&word("abab")));
        assert!(!starred.recognizes(&word("aba")));
        assert!(!starred.recognizes(&word("b")));
    }

    #[test]
    fn mirror_reverses_every_accepted_word() {
        let mirrored = ends_with_a_dfa().mirror().unwrap();
        for w in AB.words().take_while(|w| w.len() <= 4) {
            let reversed: Vec<char> = w.iter().rev().copied().collect();
            assert_eq!(
                mirrored.recognizes_chars(w.iter().copied()),
                ends_with_a_dfa().recognizes_chars(reversed.into_iter()),
            );
        }
    }

    #[test]
    fn left_quotient_strips_a_prefix_from_the_language() {
        let automaton = ends_with_a_dfa();
        // a⁻¹(Σ*a) contains the empty word and everything ending in a
        let residual = automaton.left_quotient(&word("a")).unwrap();
        assert!(residual.recognizes(&word("")));
        assert!(residual.recognizes(&word("ba")));
        assert!(!residual.recognizes(&word("b")));
        // b⁻¹(Σ*a) is Σ*a again
        let residual = automaton.left_quotient(&word("b")).unwrap();
        assert!(residual.recognizes(&word("a")));
        assert!(!residual.recognizes(&word("")));
    }
}
