use std::fmt;

use itertools::Itertools;

use crate::{
    alphabet::{Alphabet, EMPTY_WORD_SYMBOL},
    error::LanguageError,
    math,
};

/// An immutable sequence of symbols, tagged with the alphabet it was validated against.
///
/// Every symbol of the content is guaranteed to be a member of the alphabet; the check
/// happens at construction time and violating it is a [`LanguageError::InvalidWordContent`].
/// Two words are equal iff both their content and their alphabet match. All operations
/// return fresh words and leave `self` untouched.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Word {
    symbols: Vec<char>,
    alphabet: Alphabet,
}

impl Word {
    /// Creates a word from textual content. Whitespace and the [`EMPTY_WORD_SYMBOL`]
    /// marker are stripped before validation, so `"a b"` and `"ab"` denote the same
    /// word and `"ε"` denotes the empty word.
    pub fn new(content: &str, alphabet: Alphabet) -> Result<Word, LanguageError> {
        let symbols: Vec<char> = content
            .chars()
            .filter(|c| !c.is_whitespace() && *c != EMPTY_WORD_SYMBOL)
            .collect();
        for &symbol in &symbols {
            if !alphabet.contains(symbol) {
                return Err(LanguageError::InvalidWordContent(symbol));
            }
        }
        Ok(Word { symbols, alphabet })
    }

    /// The empty word over the given alphabet.
    pub fn empty(alphabet: Alphabet) -> Word {
        Word {
            symbols: vec![],
            alphabet,
        }
    }

    /// Builds a word from symbols that are already known to lie in the alphabet.
    pub(crate) fn from_validated(symbols: Vec<char>, alphabet: Alphabet) -> Word {
        Word { symbols, alphabet }
    }

    /// The symbols making up this word.
    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }

    /// The alphabet this word was validated against.
    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// The number of symbols in the word.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns true iff this is the empty word.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Concatenates `self` with `other`. Both words must share the same alphabet.
    pub fn concat(&self, other: &Word) -> Result<Word, LanguageError> {
        if self.alphabet != other.alphabet {
            return Err(LanguageError::AlphabetMismatch);
        }
        let mut symbols = self.symbols.clone();
        symbols.extend_from_slice(&other.symbols);
        Ok(Word::from_validated(symbols, self.alphabet.clone()))
    }

    /// Appends one occurrence of `symbol` on the right. Appending the empty-word
    /// marker leaves the word unchanged.
    pub fn push_right(&self, symbol: char) -> Result<Word, LanguageError> {
        if symbol == EMPTY_WORD_SYMBOL {
            return Ok(self.clone());
        }
        if !self.alphabet.contains(symbol) {
            return Err(LanguageError::InvalidWordContent(symbol));
        }
        let mut symbols = self.symbols.clone();
        symbols.push(symbol);
        Ok(Word::from_validated(symbols, self.alphabet.clone()))
    }

    /// Prepends one occurrence of `symbol` on the left, see [`Word::push_right`].
    pub fn push_left(&self, symbol: char) -> Result<Word, LanguageError> {
        if symbol == EMPTY_WORD_SYMBOL {
            return Ok(self.clone());
        }
        if !self.alphabet.contains(symbol) {
            return Err(LanguageError::InvalidWordContent(symbol));
        }
        let mut symbols = Vec::with_capacity(self.symbols.len() + 1);
        symbols.push(symbol);
        symbols.extend_from_slice(&self.symbols);
        Ok(Word::from_validated(symbols, self.alphabet.clone()))
    }

    /// The prefix consisting of the first `length` symbols. Lengths beyond the word
    /// yield the word itself.
    pub fn left_factor(&self, length: usize) -> Word {
        let length = length.min(self.symbols.len());
        Word::from_validated(self.symbols[..length].to_vec(), self.alphabet.clone())
    }

    /// The suffix consisting of the last `length` symbols, see [`Word::left_factor`].
    pub fn right_factor(&self, length: usize) -> Word {
        let length = length.min(self.symbols.len());
        let start = self.symbols.len() - length;
        Word::from_validated(self.symbols[start..].to_vec(), self.alphabet.clone())
    }

    /// All distinct scattered subwords of length at least `min_length`, i.e. words
    /// obtained by deleting symbols while preserving the order of the remainder.
    /// The result is sorted; note that the number of subwords grows exponentially
    /// with the length of the word.
    pub fn subwords(&self, min_length: usize) -> Vec<Word> {
        let n = self.symbols.len();
        let mut seen: math::OrderedSet<Vec<char>> = math::OrderedSet::new();
        for length in min_length..=n {
            for indices in (0..n).combinations(length) {
                seen.insert(indices.iter().map(|&i| self.symbols[i]).collect());
            }
        }
        seen.into_iter()
            .map(|symbols| Word::from_validated(symbols, self.alphabet.clone()))
            .collect()
    }

    /// Returns true iff `period` is a period of the word, i.e. the symbol at every
    /// position matches the one `period` places later. Zero is never a period; any
    /// `period >= len` trivially is one.
    pub fn is_periodic(&self, period: usize) -> bool {
        if period == 0 {
            return false;
        }
        (0..self.symbols.len().saturating_sub(period))
            .all(|i| self.symbols[i] == self.symbols[i + period])
    }

    /// Returns true iff the word is primitive, i.e. not expressible as `u^k` for any
    /// shorter word `u` and `k >= 2`. The empty word is not primitive.
    pub fn is_primitive(&self) -> bool {
        let n = self.symbols.len();
        if n == 0 {
            return false;
        }
        for d in 1..n {
            if n % d == 0 && (0..n).all(|i| self.symbols[i] == self.symbols[i % d]) {
                return false;
            }
        }
        true
    }

    /// The reversed word.
    pub fn mirror(&self) -> Word {
        Word::from_validated(
            self.symbols.iter().rev().copied().collect(),
            self.alphabet.clone(),
        )
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.symbols.is_empty() {
            write!(f, "{EMPTY_WORD_SYMBOL}")
        } else {
            write!(f, "{}", self.symbols.iter().join(""))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ab() -> Alphabet {
        Alphabet::new(['a', 'b'])
    }

    #[test]
    fn construction_validates_against_the_alphabet() {
        assert!(Word::new("abba", ab()).is_ok());
        assert_eq!(
            Word::new("abc", ab()),
            Err(LanguageError::InvalidWordContent('c'))
        );
    }

    #[test]
    fn whitespace_and_empty_word_marker_are_stripped() {
        let word = Word::new(" a\tb ε", ab()).unwrap();
        assert_eq!(word, Word::new("ab", ab()).unwrap());
        assert!(Word::new("ε", ab()).unwrap().is_empty());
    }

    #[test]
    fn equality_requires_matching_alphabets() {
        let narrow = Word::new("a", Alphabet::new(['a'])).unwrap();
        let wide = Word::new("a", ab()).unwrap();
        assert_ne!(narrow, wide);
    }

    #[test]
    fn concat_rejects_mismatched_alphabets() {
        let left = Word::new("a", ab()).unwrap();
        let right = Word::new("a", Alphabet::new(['a'])).unwrap();
        assert_eq!(left.concat(&right), Err(LanguageError::AlphabetMismatch));

        let both = left.concat(&Word::new("ba", ab()).unwrap()).unwrap();
        assert_eq!(both, Word::new("aba", ab()).unwrap());
    }

    #[test]
    fn adjunction_of_epsilon_is_identity() {
        let word = Word::new("ab", ab()).unwrap();
        assert_eq!(word.push_right(EMPTY_WORD_SYMBOL).unwrap(), word);
        assert_eq!(word.push_left('b').unwrap(), Word::new("bab", ab()).unwrap());
        assert_eq!(
            word.push_right('z'),
            Err(LanguageError::InvalidWordContent('z'))
        );
    }

    #[test]
    fn factors() {
        let word = Word::new("abba", ab()).unwrap();
        assert_eq!(word.left_factor(2), Word::new("ab", ab()).unwrap());
        assert_eq!(word.right_factor(3), Word::new("bba", ab()).unwrap());
        assert_eq!(word.left_factor(9), word);
        assert!(word.right_factor(0).is_empty());
    }

    #[test]
    fn subwords_are_distinct_and_sorted() {
        let word = Word::new("ab", ab()).unwrap();
        let subwords = word.subwords(1);
        assert_eq!(
            subwords,
            vec![
                Word::new("a", ab()).unwrap(),
                Word::new("ab", ab()).unwrap(),
                Word::new("b", ab()).unwrap(),
            ]
        );
        // "aa" has identical one-symbol subwords, they show up once
        assert_eq!(Word::new("aa", ab()).unwrap().subwords(1).len(), 2);
    }

    #[test]
    fn periodicity_and_primitivity() {
        let word = Word::new("abab", ab()).unwrap();
        assert!(word.is_periodic(2));
        assert!(!word.is_periodic(3));
        assert!(!word.is_periodic(0));
        assert!(!word.is_primitive());
        assert!(Word::new("aba", ab()).unwrap().is_primitive());
        assert!(!Word::empty(ab()).is_primitive());
    }

    #[test]
    fn mirror_reverses_content() {
        let word = Word::new("abb", ab()).unwrap();
        assert_eq!(word.mirror(), Word::new("bba", ab()).unwrap());
        assert_eq!(word.mirror().mirror(), word);
    }

    #[test]
    fn display_uses_the_empty_word_marker() {
        assert_eq!(Word::empty(ab()).to_string(), "ε");
        assert_eq!(Word::new("ab", ab()).unwrap().to_string(), "ab");
    }
}
