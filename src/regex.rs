//! Regular expressions and their correspondence with automata.
//!
//! The two directions mirror the inductive proof of Kleene's theorem: a regular
//! expression compiles to an epsilon-automaton by composing the closure
//! constructions over single-symbol automata, and an automaton decompiles to an
//! expression by eliminating its states one by one from a generalized transition
//! graph whose edges carry expressions.

use std::fmt;

use tracing::trace;

use crate::{
    alphabet::{Alphabet, Label, EMPTY_WORD_SYMBOL},
    automaton::{Automaton, StateName},
    error::LanguageError,
    math,
};

/// Marker used when displaying the empty language.
pub const EMPTY_LANGUAGE_SYMBOL: char = '∅';

/// Syntax tree of a regular expression over some alphabet.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Regex {
    /// The empty language.
    Empty,
    /// The language containing only the empty word.
    Epsilon,
    /// The language containing the one-symbol word.
    Symbol(char),
    /// Concatenation of two expressions.
    Concat(Box<Regex>, Box<Regex>),
    /// Alternation of two expressions.
    Union(Box<Regex>, Box<Regex>),
    /// Kleene star of an expression.
    Star(Box<Regex>),
}

impl Regex {
    /// Parses a pattern over the given alphabet.
    ///
    /// Concrete syntax: alphabet symbols stand for themselves, `|` is alternation,
    /// juxtaposition is concatenation, postfix `*` is iteration, parentheses group,
    /// `ε` denotes the empty word and `∅` the empty language. Whitespace is ignored.
    /// Symbols outside the alphabet are rejected with
    /// [`LanguageError::SymbolNotInAlphabet`], malformed patterns with
    /// [`LanguageError::InvalidRegex`].
    pub fn parse(pattern: &str, alphabet: &Alphabet) -> Result<Regex, LanguageError> {
        let mut parser = Parser {
            tokens: pattern
                .char_indices()
                .filter(|(_, c)| !c.is_whitespace())
                .collect(),
            position: 0,
            end: pattern.len(),
            alphabet,
        };
        let expression = parser.union()?;
        match parser.peek() {
            None => Ok(expression),
            Some((at, c)) => Err(LanguageError::InvalidRegex {
                position: at,
                message: format!("unexpected `{c}`"),
            }),
        }
    }

    /// Union with the obvious simplifications applied.
    pub(crate) fn union_of(left: Regex, right: Regex) -> Regex {
        match (left, right) {
            (Regex::Empty, r) | (r, Regex::Empty) => r,
            (l, r) if l == r => l,
            (l, r) => Regex::Union(Box::new(l), Box::new(r)),
        }
    }

    /// Concatenation with the obvious simplifications applied.
    pub(crate) fn concat_of(left: Regex, right: Regex) -> Regex {
        match (left, right) {
            (Regex::Empty, _) | (_, Regex::Empty) => Regex::Empty,
            (Regex::Epsilon, r) => r,
            (l, Regex::Epsilon) => l,
            (l, r) => Regex::Concat(Box::new(l), Box::new(r)),
        }
    }

    /// Star with the obvious simplifications applied.
    pub(crate) fn star_of(inner: Regex) -> Regex {
        match inner {
            Regex::Empty | Regex::Epsilon => Regex::Epsilon,
            Regex::Star(r) => Regex::Star(r),
            r => Regex::Star(Box::new(r)),
        }
    }

    /// Compiles the expression into an automaton over the given alphabet, following
    /// the structure of the expression: leaves become one- or two-state automata,
    /// the inner nodes apply [`Automaton::sum`], [`Automaton::concatenate`] and
    /// [`Automaton::star`]. The result generally contains epsilon transitions.
    pub fn to_automaton(&self, alphabet: &Alphabet) -> Result<Automaton, LanguageError> {
        match self {
            Regex::Empty => {
                let mut out = Automaton::with_epsilon(alphabet.clone());
                out.add_state("0")?;
                out.set_initial("0")?;
                Ok(out)
            }
            Regex::Epsilon => {
                let mut out = Automaton::with_epsilon(alphabet.clone());
                out.add_state("0")?;
                out.set_initial("0")?;
                out.add_final("0")?;
                Ok(out)
            }
            Regex::Symbol(symbol) => {
                let mut out = Automaton::with_epsilon(alphabet.clone());
                out.add_states(["0", "1"])?;
                out.set_initial("0")?;
                out.add_final("1")?;
                out.add_transition("0", Label::Symbol(*symbol), "1")?;
                Ok(out)
            }
            Regex::Concat(left, right) => left
                .to_automaton(alphabet)?
                .concatenate(&right.to_automaton(alphabet)?),
            Regex::Union(left, right) => left
                .to_automaton(alphabet)?
                .sum(&right.to_automaton(alphabet)?),
            Regex::Star(inner) => inner.to_automaton(alphabet)?.star(),
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Regex::Union(_, _) => 0,
            Regex::Concat(_, _) => 1,
            Regex::Star(_) => 2,
            _ => 3,
        }
    }

    fn fmt_prec(&self, f: &mut fmt::Formatter<'_>, parent: u8) -> fmt::Result {
        let precedence = self.precedence();
        if precedence < parent {
            write!(f, "(")?;
        }
        match self {
            Regex::Empty => write!(f, "{EMPTY_LANGUAGE_SYMBOL}")?,
            Regex::Epsilon => write!(f, "{EMPTY_WORD_SYMBOL}")?,
            Regex::Symbol(c) => write!(f, "{c}")?,
            Regex::Union(left, right) => {
                left.fmt_prec(f, precedence)?;
                write!(f, "|")?;
                right.fmt_prec(f, precedence)?;
            }
            Regex::Concat(left, right) => {
                left.fmt_prec(f, precedence)?;
                right.fmt_prec(f, precedence)?;
            }
            Regex::Star(inner) => {
                inner.fmt_prec(f, precedence + 1)?;
                write!(f, "*")?;
            }
        }
        if precedence < parent {
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_prec(f, 0)
    }
}

struct Parser<'a> {
    tokens: Vec<(usize, char)>,
    position: usize,
    end: usize,
    alphabet: &'a Alphabet,
}

impl Parser<'_> {
    fn peek(&self) -> Option<(usize, char)> {
        self.tokens.get(self.position).copied()
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        let token = self.peek();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn union(&mut self) -> Result<Regex, LanguageError> {
        let mut expression = self.concatenation()?;
        while matches!(self.peek(), Some((_, '|'))) {
            self.bump();
            let right = self.concatenation()?;
            expression = Regex::Union(Box::new(expression), Box::new(right));
        }
        Ok(expression)
    }

    fn concatenation(&mut self) -> Result<Regex, LanguageError> {
        let mut expression = self.postfix()?;
        while matches!(self.peek(), Some((_, c)) if c != '|' && c != ')') {
            let right = self.postfix()?;
            expression = Regex::Concat(Box::new(expression), Box::new(right));
        }
        Ok(expression)
    }

    fn postfix(&mut self) -> Result<Regex, LanguageError> {
        let mut expression = self.atom()?;
        while matches!(self.peek(), Some((_, '*'))) {
            self.bump();
            expression = Regex::Star(Box::new(expression));
        }
        Ok(expression)
    }

    fn atom(&mut self) -> Result<Regex, LanguageError> {
        match self.bump() {
            None => Err(LanguageError::InvalidRegex {
                position: self.end,
                message: "expected an expression".to_string(),
            }),
            Some((_, '(')) => {
                let inner = self.union()?;
                match self.bump() {
                    Some((_, ')')) => Ok(inner),
                    Some((at, c)) => Err(LanguageError::InvalidRegex {
                        position: at,
                        message: format!("expected `)`, found `{c}`"),
                    }),
                    None => Err(LanguageError::InvalidRegex {
                        position: self.end,
                        message: "unclosed parenthesis".to_string(),
                    }),
                }
            }
            Some((_, c)) if c == EMPTY_WORD_SYMBOL => Ok(Regex::Epsilon),
            Some((_, c)) if c == EMPTY_LANGUAGE_SYMBOL => Ok(Regex::Empty),
            Some((at, c)) if c == '*' || c == ')' || c == '|' => {
                Err(LanguageError::InvalidRegex {
                    position: at,
                    message: format!("unexpected `{c}`"),
                })
            }
            Some((_, c)) if self.alphabet.contains(c) => Ok(Regex::Symbol(c)),
            Some((_, c)) => Err(LanguageError::SymbolNotInAlphabet(Label::Symbol(c))),
        }
    }
}

impl Automaton {
    /// Compiles a pattern into an automaton recognizing the same language, see
    /// [`Regex::parse`] for the accepted syntax.
    pub fn from_regex(pattern: &str, alphabet: &Alphabet) -> Result<Automaton, LanguageError> {
        Regex::parse(pattern, alphabet)?.to_automaton(alphabet)
    }

    /// Produces a regular expression denoting the recognized language.
    ///
    /// Uses state elimination on a generalized transition graph spanned between a
    /// fresh start and accept state. States are eliminated in lexicographic name
    /// order; the order only influences the size of the resulting expression, never
    /// the denoted language, but fixing it keeps the output reproducible.
    pub fn to_regex(&self) -> Result<String, LanguageError> {
        let initial = self
            .initial_state()
            .ok_or(LanguageError::MissingInitialState)?
            .clone();

        let start = self.fresh_name("start");
        let accept = self.fresh_name("accept");

        let mut edges: math::OrderedMap<(StateName, StateName), Regex> = math::OrderedMap::new();
        let merge = |edges: &mut math::OrderedMap<(StateName, StateName), Regex>,
                         from: StateName,
                         to: StateName,
                         expression: Regex| {
            let slot = edges.remove(&(from.clone(), to.clone())).unwrap_or(Regex::Empty);
            edges.insert((from, to), Regex::union_of(slot, expression));
        };

        for (source, label, target) in self.transitions() {
            let expression = match label {
                Label::Epsilon => Regex::Epsilon,
                Label::Symbol(c) => Regex::Symbol(c),
            };
            merge(&mut edges, source.clone(), target.clone(), expression);
        }
        merge(&mut edges, start.clone(), initial, Regex::Epsilon);
        for final_state in self.final_states() {
            merge(&mut edges, final_state.clone(), accept.clone(), Regex::Epsilon);
        }

        for state in self.state_names() {
            let through = Regex::star_of(
                edges
                    .remove(&(state.clone(), state.clone()))
                    .unwrap_or(Regex::Empty),
            );
            let mut incoming = Vec::new();
            let mut outgoing = Vec::new();
            let keys: Vec<(StateName, StateName)> = edges.keys().cloned().collect();
            for key in keys {
                if key.1 == *state {
                    if let Some(expression) = edges.remove(&key) {
                        incoming.push((key.0, expression));
                    }
                } else if key.0 == *state {
                    if let Some(expression) = edges.remove(&key) {
                        outgoing.push((key.1, expression));
                    }
                }
            }
            for (from, into_state) in &incoming {
                for (to, out_of_state) in &outgoing {
                    let path = Regex::concat_of(
                        Regex::concat_of(into_state.clone(), through.clone()),
                        out_of_state.clone(),
                    );
                    merge(&mut edges, from.clone(), to.clone(), path);
                }
            }
            trace!("eliminated state {state}");
        }

        let expression = edges
            .remove(&(start, accept))
            .unwrap_or(Regex::Empty);
        Ok(expression.to_string())
    }
}
