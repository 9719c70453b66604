use thiserror::Error;

use crate::alphabet::Label;

/// The ways in which building or transforming automata, words and languages can fail.
///
/// Structural precondition violations are reported to the caller immediately and are
/// never silently corrected; in particular no transform ever completes or determinizes
/// its input behind the caller's back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LanguageError {
    /// A state was referenced that does not belong to the automaton.
    #[error("state `{0}` does not belong to the automaton")]
    UnknownState(String),
    /// A state with the given name already exists.
    #[error("a state named `{0}` is already present")]
    StateExists(String),
    /// A second state was declared initial while another one still holds the role.
    #[error("`{current}` is already the initial state and must be demoted first")]
    InitialExists {
        /// Name of the state currently holding the initial role.
        current: String,
    },
    /// The automaton has no initial state, so the requested operation is undefined.
    #[error("the automaton has no initial state")]
    MissingInitialState,
    /// The label is neither a symbol of the alphabet nor an epsilon permitted here.
    #[error("label `{0}` is not usable on this automaton")]
    SymbolNotInAlphabet(Label),
    /// The exact transition triple to remove is not present.
    #[error("no transition `{from_state}` --{label}--> `{target}` is present")]
    TransitionNotFound {
        /// Source state of the missing transition.
        from_state: String,
        /// Label of the missing transition.
        label: Label,
        /// Target state of the missing transition.
        target: String,
    },
    /// A binary operation was applied to operands over different alphabets.
    #[error("the operands are defined over different alphabets")]
    AlphabetMismatch,
    /// The operation requires a deterministic and complete automaton.
    #[error("the automaton must be deterministic and complete")]
    NotDeterministicOrComplete,
    /// A word was constructed from a symbol outside its alphabet.
    #[error("symbol `{0}` lies outside the word's alphabet")]
    InvalidWordContent(char),
    /// A regular expression could not be parsed.
    #[error("invalid regular expression at position {position}: {message}")]
    InvalidRegex {
        /// Byte offset into the pattern at which parsing failed.
        position: usize,
        /// Human readable description of the problem.
        message: String,
    },
}
