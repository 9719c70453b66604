//! Languages: possibly infinite sets of words over a fixed alphabet.
//!
//! A language is represented either extensionally, as an explicit finite word set
//! which then is the ground truth, or intensionally through an automaton, in which
//! case membership is decided by recognition rather than by materializing words.

use crate::{
    alphabet::Alphabet,
    automaton::{Automaton, StateName},
    error::LanguageError,
    math,
    word::Word,
};

/// A set of words over a fixed alphabet, finite and explicit or recognized by an
/// automaton. All operations are explicitly named rather than operator overloads and
/// return fresh values.
#[derive(Debug, Clone)]
pub enum Language {
    /// An explicit finite set of words.
    Finite {
        /// The words of the language.
        words: math::OrderedSet<Word>,
        /// The common alphabet of all the words.
        alphabet: Alphabet,
    },
    /// A regular language given by an automaton recognizing it.
    Recognizable {
        /// The automaton deciding membership.
        automaton: Automaton,
    },
}

impl Language {
    /// Creates an extensional language from the given words, all of which must be
    /// defined over the given alphabet.
    pub fn finite<I: IntoIterator<Item = Word>>(
        words: I,
        alphabet: Alphabet,
    ) -> Result<Language, LanguageError> {
        let words: math::OrderedSet<Word> = words.into_iter().collect();
        if words.iter().any(|w| w.alphabet() != &alphabet) {
            return Err(LanguageError::AlphabetMismatch);
        }
        Ok(Language::Finite { words, alphabet })
    }

    /// The empty language over the given alphabet.
    pub fn empty(alphabet: Alphabet) -> Language {
        Language::Finite {
            words: math::OrderedSet::new(),
            alphabet,
        }
    }

    /// Wraps an automaton as the language it recognizes.
    pub fn recognizable(automaton: Automaton) -> Language {
        Language::Recognizable { automaton }
    }

    /// The alphabet the language is defined over.
    pub fn alphabet(&self) -> &Alphabet {
        match self {
            Language::Finite { alphabet, .. } => alphabet,
            Language::Recognizable { automaton } => automaton.alphabet(),
        }
    }

    /// Decides membership of the given word.
    pub fn contains(&self, word: &Word) -> bool {
        match self {
            Language::Finite { words, .. } => words.contains(word),
            Language::Recognizable { automaton } => automaton.recognizes(word),
        }
    }

    /// The number of words, when the representation is extensional.
    pub fn size(&self) -> Option<usize> {
        match self {
            Language::Finite { words, .. } => Some(words.len()),
            Language::Recognizable { .. } => None,
        }
    }

    /// Returns true iff the language holds finitely many words. An automaton
    /// recognizes a finite language exactly when no useful state lies on a cycle.
    pub fn is_finite(&self) -> bool {
        match self {
            Language::Finite { .. } => true,
            Language::Recognizable { automaton } => !has_useful_cycle(automaton),
        }
    }

    /// Produces an automaton recognizing the language. Extensional languages are
    /// compiled into a nondeterministic union of one path per word.
    pub fn to_automaton(&self) -> Result<Automaton, LanguageError> {
        match self {
            Language::Recognizable { automaton } => Ok(automaton.clone()),
            Language::Finite { words, alphabet } => {
                let mut combined: Option<Automaton> = None;
                for word in words {
                    let path = word_path(word, alphabet)?;
                    combined = Some(match combined {
                        None => path,
                        Some(sofar) => sofar.sum(&path)?,
                    });
                }
                match combined {
                    Some(automaton) => Ok(automaton),
                    None => {
                        let mut rejecting = Automaton::new(alphabet.clone());
                        rejecting.add_state("0")?;
                        rejecting.set_initial("0")?;
                        Ok(rejecting)
                    }
                }
            }
        }
    }

    /// The union of the two languages. Two extensional languages stay extensional,
    /// anything else goes through the automaton representation.
    pub fn union(&self, other: &Language) -> Result<Language, LanguageError> {
        self.ensure_same_alphabet(other)?;
        match (self, other) {
            (
                Language::Finite { words: left, .. },
                Language::Finite {
                    words: right,
                    alphabet,
                },
            ) => Language::finite(left.union(right).cloned(), alphabet.clone()),
            _ => Ok(Language::recognizable(
                self.to_automaton()?.sum(&other.to_automaton()?)?,
            )),
        }
    }

    /// The intersection of the two languages. When one side is extensional, the
    /// result is obtained by filtering it through the other side.
    pub fn intersect(&self, other: &Language) -> Result<Language, LanguageError> {
        self.ensure_same_alphabet(other)?;
        match (self, other) {
            (Language::Finite { words, alphabet, .. }, _) => Language::finite(
                words.iter().filter(|w| other.contains(w)).cloned(),
                alphabet.clone(),
            ),
            (_, Language::Finite { words, alphabet, .. }) => Language::finite(
                words.iter().filter(|w| self.contains(w)).cloned(),
                alphabet.clone(),
            ),
            _ => {
                let left = self.to_automaton()?.determinize()?;
                let right = other.to_automaton()?.determinize()?;
                Ok(Language::recognizable(left.intersection(&right)?))
            }
        }
    }

    /// The concatenation of the two languages, extensional when both operands are.
    pub fn concatenate(&self, other: &Language) -> Result<Language, LanguageError> {
        self.ensure_same_alphabet(other)?;
        match (self, other) {
            (
                Language::Finite { words: left, .. },
                Language::Finite {
                    words: right,
                    alphabet,
                },
            ) => {
                let mut words = math::OrderedSet::new();
                for u in left {
                    for v in right {
                        words.insert(u.concat(v)?);
                    }
                }
                Language::finite(words, alphabet.clone())
            }
            _ => Ok(Language::recognizable(
                self.to_automaton()?.concatenate(&other.to_automaton()?)?,
            )),
        }
    }

    /// The Kleene star of the language; always automaton-backed since the result is
    /// infinite for every language containing a non-empty word.
    pub fn star(&self) -> Result<Language, LanguageError> {
        Ok(Language::recognizable(self.to_automaton()?.star()?))
    }

    /// The complement with respect to all words over the alphabet.
    pub fn complement(&self) -> Result<Language, LanguageError> {
        let deterministic = self.to_automaton()?.determinize()?;
        Ok(Language::recognizable(deterministic.complement()?))
    }

    /// The mirrored language, with every word reversed.
    pub fn mirror(&self) -> Result<Language, LanguageError> {
        match self {
            Language::Finite { words, alphabet } => {
                Language::finite(words.iter().map(Word::mirror), alphabet.clone())
            }
            Language::Recognizable { automaton } => {
                Ok(Language::recognizable(automaton.mirror()?))
            }
        }
    }

    /// The left quotient `w⁻¹·L`, the words `v` such that `w·v` lies in the language.
    pub fn quotient(&self, word: &Word) -> Result<Language, LanguageError> {
        if word.alphabet() != self.alphabet() {
            return Err(LanguageError::AlphabetMismatch);
        }
        match self {
            Language::Finite { words, alphabet } => Language::finite(
                words
                    .iter()
                    .filter(|w| w.symbols().starts_with(word.symbols()))
                    .map(|w| {
                        Word::from_validated(
                            w.symbols()[word.len()..].to_vec(),
                            alphabet.clone(),
                        )
                    }),
                alphabet.clone(),
            ),
            Language::Recognizable { automaton } => {
                Ok(Language::recognizable(automaton.left_quotient(word)?))
            }
        }
    }

    fn ensure_same_alphabet(&self, other: &Language) -> Result<(), LanguageError> {
        if self.alphabet() != other.alphabet() {
            return Err(LanguageError::AlphabetMismatch);
        }
        Ok(())
    }
}

/// A linear automaton accepting exactly the given word.
fn word_path(word: &Word, alphabet: &Alphabet) -> Result<Automaton, LanguageError> {
    let mut out = Automaton::new(alphabet.clone());
    for position in 0..=word.len() {
        out.add_state(position.to_string())?;
    }
    out.set_initial("0")?;
    out.add_final(&word.len().to_string())?;
    for (position, &symbol) in word.symbols().iter().enumerate() {
        out.add_transition(
            &position.to_string(),
            symbol.into(),
            &(position + 1).to_string(),
        )?;
    }
    Ok(out)
}

/// Returns true iff some accessible and coaccessible state lies on a cycle, i.e.
/// the automaton accepts infinitely many words.
fn has_useful_cycle(automaton: &Automaton) -> bool {
    let accessible = automaton.accessible_states();
    let coaccessible = automaton.coaccessible_states();
    let useful: math::OrderedSet<&StateName> = accessible.intersection(&coaccessible).collect();

    // iterative depth-first search; a gray successor closes a cycle
    const WHITE: u8 = 0;
    const GRAY: u8 = 1;
    const BLACK: u8 = 2;
    let mut color: math::Map<&StateName, u8> = useful.iter().map(|&q| (q, WHITE)).collect();
    for &root in &useful {
        if color[root] != WHITE {
            continue;
        }
        let mut stack: Vec<(&StateName, bool)> = vec![(root, false)];
        while let Some((state, leaving)) = stack.pop() {
            if leaving {
                color.insert(state, BLACK);
                continue;
            }
            if color[state] != WHITE {
                continue;
            }
            color.insert(state, GRAY);
            stack.push((state, true));
            if let Some(row) = automaton.transitions.get(state) {
                for target in row.values().flatten() {
                    match color.get(target) {
                        Some(&GRAY) => return true,
                        Some(&WHITE) => stack.push((target, false)),
                        _ => {}
                    }
                }
            }
        }
    }
    false
}
