use std::{
    collections::VecDeque,
    fmt,
    hash::{Hash, Hasher},
};

use itertools::Itertools;

use crate::{
    alphabet::{Alphabet, Label},
    error::LanguageError,
    math,
};

/// Name of a state. State identity is purely the name; the roles a state plays may
/// change over its life, its name never does.
pub type StateName = String;

/// A state of an automaton: a stable name plus the two orthogonal roles it may hold.
/// A state holding neither role is called ordinary. States never own transitions,
/// the [`Automaton`] owns the transition relation keyed by state name.
#[derive(Debug, Clone)]
pub struct State {
    pub(crate) name: StateName,
    pub(crate) initial: bool,
    pub(crate) accepting: bool,
}

impl State {
    pub(crate) fn new(name: impl Into<StateName>) -> State {
        State {
            name: name.into(),
            initial: false,
            accepting: false,
        }
    }

    /// The name identifying this state.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true iff this state holds the initial role.
    pub fn is_initial(&self) -> bool {
        self.initial
    }

    /// Returns true iff this state is final (accepting).
    pub fn is_final(&self) -> bool {
        self.accepting
    }

    /// Returns true iff the state is neither initial nor final.
    pub fn is_ordinary(&self) -> bool {
        !self.initial && !self.accepting
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
impl Eq for State {}

impl Hash for State {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A finite automaton over a fixed alphabet.
///
/// One data type covers the deterministic, nondeterministic and epsilon-transition
/// variants; instead of a type ladder, the capabilities of a concrete value are
/// exposed as the predicates [`Automaton::is_deterministic`], [`Automaton::is_complete`]
/// and [`Automaton::is_epsilon_free`]. Every transform documents which capabilities it
/// requires of its input and which it guarantees for its output, and returns a fresh
/// value rather than mutating the input.
///
/// Whether epsilon transitions may be added at all is fixed at construction time, see
/// [`Automaton::with_epsilon`].
#[derive(Debug, Clone)]
pub struct Automaton {
    pub(crate) alphabet: Alphabet,
    pub(crate) epsilon_allowed: bool,
    pub(crate) states: math::OrderedMap<StateName, State>,
    pub(crate) transitions: math::OrderedMap<StateName, math::OrderedMap<Label, math::OrderedSet<StateName>>>,
}

impl Automaton {
    /// Creates an empty epsilon-free automaton over the given alphabet.
    pub fn new(alphabet: Alphabet) -> Automaton {
        Automaton {
            alphabet,
            epsilon_allowed: false,
            states: math::OrderedMap::new(),
            transitions: math::OrderedMap::new(),
        }
    }

    /// Creates an empty automaton that permits epsilon transitions.
    pub fn with_epsilon(alphabet: Alphabet) -> Automaton {
        Automaton {
            epsilon_allowed: true,
            ..Automaton::new(alphabet)
        }
    }

    /// The alphabet this automaton is defined over.
    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// Returns true iff epsilon transitions may be added to this automaton.
    pub fn supports_epsilon(&self) -> bool {
        self.epsilon_allowed
    }

    /// The number of states.
    pub fn size(&self) -> usize {
        self.states.len()
    }

    /// Iterates over the state names in sorted order.
    pub fn state_names(&self) -> impl Iterator<Item = &StateName> {
        self.states.keys()
    }

    /// Iterates over the states in sorted name order.
    pub fn states(&self) -> impl Iterator<Item = &State> {
        self.states.values()
    }

    /// Looks up a state by name.
    pub fn state(&self, name: &str) -> Option<&State> {
        self.states.get(name)
    }

    /// Returns true iff a state of that name belongs to the automaton.
    pub fn contains_state(&self, name: &str) -> bool {
        self.states.contains_key(name)
    }

    /// The state currently holding the initial role, if any.
    pub fn initial_state(&self) -> Option<&StateName> {
        self.states.values().find(|s| s.initial).map(|s| &s.name)
    }

    /// Iterates over the names of all final states in sorted order.
    pub fn final_states(&self) -> impl Iterator<Item = &StateName> {
        self.states.values().filter(|s| s.accepting).map(|s| &s.name)
    }

    /// Adds a fresh ordinary state. Fails if the name is already taken.
    pub fn add_state(&mut self, name: impl Into<StateName>) -> Result<(), LanguageError> {
        let name = name.into();
        if self.states.contains_key(&name) {
            return Err(LanguageError::StateExists(name));
        }
        self.states.insert(name.clone(), State::new(name));
        Ok(())
    }

    /// Adds several fresh ordinary states at once, see [`Automaton::add_state`].
    pub fn add_states<I, N>(&mut self, names: I) -> Result<(), LanguageError>
    where
        I: IntoIterator<Item = N>,
        N: Into<StateName>,
    {
        for name in names {
            self.add_state(name)?;
        }
        Ok(())
    }

    /// Declares `name` the initial state. At most one state may hold the role at a
    /// time; a second declaration fails until the current holder is demoted, e.g.
    /// via [`Automaton::make_ordinary`]. Redeclaring the current holder is a no-op.
    pub fn set_initial(&mut self, name: &str) -> Result<(), LanguageError> {
        if !self.states.contains_key(name) {
            return Err(LanguageError::UnknownState(name.to_string()));
        }
        match self.initial_state() {
            Some(current) if current == name => return Ok(()),
            Some(current) => {
                return Err(LanguageError::InitialExists {
                    current: current.clone(),
                })
            }
            None => {}
        }
        if let Some(state) = self.states.get_mut(name) {
            state.initial = true;
        }
        Ok(())
    }

    /// Marks `name` as final.
    pub fn add_final(&mut self, name: &str) -> Result<(), LanguageError> {
        match self.states.get_mut(name) {
            Some(state) => {
                state.accepting = true;
                Ok(())
            }
            None => Err(LanguageError::UnknownState(name.to_string())),
        }
    }

    /// Removes the final role from `name`.
    pub fn remove_final(&mut self, name: &str) -> Result<(), LanguageError> {
        match self.states.get_mut(name) {
            Some(state) => {
                state.accepting = false;
                Ok(())
            }
            None => Err(LanguageError::UnknownState(name.to_string())),
        }
    }

    /// Demotes `name` to an ordinary state, clearing both the initial and the final
    /// role.
    pub fn make_ordinary(&mut self, name: &str) -> Result<(), LanguageError> {
        match self.states.get_mut(name) {
            Some(state) => {
                state.initial = false;
                state.accepting = false;
                Ok(())
            }
            None => Err(LanguageError::UnknownState(name.to_string())),
        }
    }

    /// Removes a state together with every transition entering or leaving it.
    pub fn remove_state(&mut self, name: &str) -> Result<(), LanguageError> {
        if self.states.remove(name).is_none() {
            return Err(LanguageError::UnknownState(name.to_string()));
        }
        self.transitions.remove(name);
        for row in self.transitions.values_mut() {
            row.retain(|_, targets| {
                targets.remove(name);
                !targets.is_empty()
            });
        }
        Ok(())
    }

    /// Adds the transition `source --label--> target`. Both endpoints must be states
    /// of the automaton and the label must be a symbol of the alphabet, or epsilon on
    /// an automaton that was constructed with epsilon support.
    pub fn add_transition(
        &mut self,
        source: &str,
        label: Label,
        target: &str,
    ) -> Result<(), LanguageError> {
        if !self.states.contains_key(source) {
            return Err(LanguageError::UnknownState(source.to_string()));
        }
        if !self.states.contains_key(target) {
            return Err(LanguageError::UnknownState(target.to_string()));
        }
        match label {
            Label::Epsilon if !self.epsilon_allowed => {
                return Err(LanguageError::SymbolNotInAlphabet(label))
            }
            Label::Symbol(c) if !self.alphabet.contains(c) => {
                return Err(LanguageError::SymbolNotInAlphabet(label))
            }
            _ => {}
        }
        self.link(source, label, target);
        Ok(())
    }

    /// Removes the exact transition triple. Signals [`LanguageError::TransitionNotFound`]
    /// whenever the triple is not present, including for unknown states or labels.
    pub fn remove_transition(
        &mut self,
        source: &str,
        label: Label,
        target: &str,
    ) -> Result<(), LanguageError> {
        let removed = self
            .transitions
            .get_mut(source)
            .and_then(|row| row.get_mut(&label))
            .map_or(false, |targets| targets.remove(target));
        if !removed {
            return Err(LanguageError::TransitionNotFound {
                from_state: source.to_string(),
                label,
                target: target.to_string(),
            });
        }
        // drop empty buckets so iteration never sees hollow entries
        if let Some(row) = self.transitions.get_mut(source) {
            if row.get(&label).is_some_and(|targets| targets.is_empty()) {
                row.remove(&label);
            }
            if row.is_empty() {
                self.transitions.remove(source);
            }
        }
        Ok(())
    }

    /// The (possibly empty) set of targets reachable from `state` in one step on
    /// `label`. Never fails, an unknown state or label simply has no targets.
    pub fn transitions_from<'a>(
        &'a self,
        state: &str,
        label: Label,
    ) -> impl Iterator<Item = &'a StateName> {
        self.transitions
            .get(state)
            .and_then(|row| row.get(&label))
            .into_iter()
            .flatten()
    }

    /// Iterates over all transition triples in sorted order.
    pub fn transitions(&self) -> impl Iterator<Item = (&StateName, Label, &StateName)> {
        self.transitions.iter().flat_map(|(source, row)| {
            row.iter()
                .flat_map(move |(&label, targets)| targets.iter().map(move |t| (source, label, t)))
        })
    }

    /// Returns true iff every state has at most one successor per alphabet symbol and
    /// no epsilon transition is present.
    pub fn is_deterministic(&self) -> bool {
        self.transitions.values().all(|row| {
            row.iter().all(|(label, targets)| match label {
                Label::Epsilon => false,
                Label::Symbol(_) => targets.len() <= 1,
            })
        })
    }

    /// Returns true iff every state has at least one successor per alphabet symbol.
    pub fn is_complete(&self) -> bool {
        self.states.keys().all(|state| {
            self.alphabet
                .symbols()
                .all(|symbol| self.transitions_from(state, Label::Symbol(symbol)).next().is_some())
        })
    }

    /// Returns true iff no epsilon transition is present.
    pub fn is_epsilon_free(&self) -> bool {
        self.transitions
            .values()
            .all(|row| !row.contains_key(&Label::Epsilon))
    }

    /// The set of states reachable from the initial state. Empty when no initial
    /// state has been designated.
    pub fn accessible_states(&self) -> math::OrderedSet<StateName> {
        let mut seen = math::OrderedSet::new();
        let initial = match self.initial_state() {
            Some(initial) => initial.clone(),
            None => return seen,
        };
        let mut queue = VecDeque::from([initial.clone()]);
        seen.insert(initial);
        while let Some(state) = queue.pop_front() {
            if let Some(row) = self.transitions.get(&state) {
                for target in row.values().flatten() {
                    if seen.insert(target.clone()) {
                        queue.push_back(target.clone());
                    }
                }
            }
        }
        seen
    }

    /// The set of states from which some final state is reachable, computed by a
    /// backwards search from the final states over the reversed transition relation.
    pub fn coaccessible_states(&self) -> math::OrderedSet<StateName> {
        let mut predecessors: math::Map<&StateName, Vec<&StateName>> = math::Map::default();
        for (source, _, target) in self.transitions() {
            predecessors.entry(target).or_default().push(source);
        }
        let mut seen: math::OrderedSet<StateName> =
            self.final_states().cloned().collect();
        let mut queue: VecDeque<StateName> = seen.iter().cloned().collect();
        while let Some(state) = queue.pop_front() {
            if let Some(sources) = predecessors.get(&state) {
                for &source in sources {
                    if seen.insert(source.clone()) {
                        queue.push_back(source.clone());
                    }
                }
            }
        }
        seen
    }

    /// Returns true iff `name` is reachable from the initial state.
    pub fn is_accessible(&self, name: &str) -> Result<bool, LanguageError> {
        if !self.states.contains_key(name) {
            return Err(LanguageError::UnknownState(name.to_string()));
        }
        Ok(self.accessible_states().contains(name))
    }

    /// Returns true iff some final state is reachable from `name`.
    pub fn is_coaccessible(&self, name: &str) -> Result<bool, LanguageError> {
        if !self.states.contains_key(name) {
            return Err(LanguageError::UnknownState(name.to_string()));
        }
        Ok(self.coaccessible_states().contains(name))
    }

    /// Returns true iff `name` is both accessible and coaccessible.
    pub fn is_useful(&self, name: &str) -> Result<bool, LanguageError> {
        Ok(self.is_accessible(name)? && self.is_coaccessible(name)?)
    }

    /// Returns a copy of the automaton restricted to its accessible states. Roles
    /// and the epsilon capability are preserved.
    pub fn accessible_part(&self) -> Automaton {
        let keep = self.accessible_states();
        let mut out = Automaton {
            alphabet: self.alphabet.clone(),
            epsilon_allowed: self.epsilon_allowed,
            states: math::OrderedMap::new(),
            transitions: math::OrderedMap::new(),
        };
        for state in self.states.values().filter(|s| keep.contains(&s.name)) {
            out.states.insert(state.name.clone(), state.clone());
        }
        for (source, label, target) in self.transitions() {
            if keep.contains(source) && keep.contains(target) {
                out.link(source, label, target);
            }
        }
        out
    }

    /// Picks a state name that is not yet taken, starting from `base` and appending
    /// primes until it is free.
    pub(crate) fn fresh_name(&self, base: &str) -> StateName {
        let mut name = base.to_string();
        while self.states.contains_key(&name) {
            name.push('\'');
        }
        name
    }

    /// Inserts a state without any validation.
    pub(crate) fn insert_state_unchecked(&mut self, state: State) {
        self.states.insert(state.name.clone(), state);
    }

    /// Inserts a transition without any validation.
    pub(crate) fn link(&mut self, source: &str, label: Label, target: &str) {
        self.transitions
            .entry(source.to_string())
            .or_default()
            .entry(label)
            .or_default()
            .insert(target.to_string());
    }
}

impl fmt::Display for Automaton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "States: {{{}}}", self.states.keys().join(", "))?;
        writeln!(f, "Alphabet: {}", self.alphabet)?;
        writeln!(
            f,
            "Initial: {}",
            self.initial_state().map_or("-", |s| s.as_str())
        )?;
        writeln!(f, "Final: {{{}}}", self.final_states().join(", "))?;
        writeln!(f, "Transitions:")?;
        for (source, label, target) in self.transitions() {
            writeln!(f, "  {source} --{label}--> {target}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ab() -> Alphabet {
        Alphabet::new(['a', 'b'])
    }

    #[test]
    fn duplicate_state_names_are_rejected() {
        let mut automaton = Automaton::new(ab());
        automaton.add_state("q0").unwrap();
        assert_eq!(
            automaton.add_state("q0"),
            Err(LanguageError::StateExists("q0".to_string()))
        );
    }

    #[test]
    fn only_one_initial_state_at_a_time() {
        let mut automaton = Automaton::new(ab());
        automaton.add_states(["q0", "q1"]).unwrap();
        automaton.set_initial("q0").unwrap();
        automaton.set_initial("q0").unwrap();
        assert_eq!(
            automaton.set_initial("q1"),
            Err(LanguageError::InitialExists {
                current: "q0".to_string()
            })
        );
        automaton.make_ordinary("q0").unwrap();
        automaton.set_initial("q1").unwrap();
        assert_eq!(automaton.initial_state(), Some(&"q1".to_string()));
    }

    #[test]
    fn roles_can_change_but_identity_is_the_name() {
        let mut automaton = Automaton::new(ab());
        automaton.add_state("q0").unwrap();
        automaton.add_final("q0").unwrap();
        assert!(automaton.state("q0").is_some_and(State::is_final));
        automaton.make_ordinary("q0").unwrap();
        assert!(automaton.state("q0").is_some_and(State::is_ordinary));
        assert_eq!(
            automaton.add_final("qx"),
            Err(LanguageError::UnknownState("qx".to_string()))
        );
    }

    #[test]
    fn transitions_are_validated() {
        let mut automaton = Automaton::new(ab());
        automaton.add_states(["q0", "q1"]).unwrap();
        automaton
            .add_transition("q0", Label::Symbol('a'), "q1")
            .unwrap();
        assert_eq!(
            automaton.add_transition("q0", Label::Symbol('c'), "q1"),
            Err(LanguageError::SymbolNotInAlphabet(Label::Symbol('c')))
        );
        assert_eq!(
            automaton.add_transition("q0", Label::Epsilon, "q1"),
            Err(LanguageError::SymbolNotInAlphabet(Label::Epsilon))
        );
        assert_eq!(
            automaton.add_transition("qx", Label::Symbol('a'), "q1"),
            Err(LanguageError::UnknownState("qx".to_string()))
        );

        let mut spontaneous = Automaton::with_epsilon(ab());
        spontaneous.add_states(["q0", "q1"]).unwrap();
        spontaneous
            .add_transition("q0", Label::Epsilon, "q1")
            .unwrap();
        assert!(!spontaneous.is_epsilon_free());
    }

    #[test]
    fn removing_an_absent_transition_is_signalled() {
        let mut automaton = Automaton::new(ab());
        automaton.add_states(["q0", "q1"]).unwrap();
        automaton
            .add_transition("q0", Label::Symbol('a'), "q1")
            .unwrap();
        automaton
            .remove_transition("q0", Label::Symbol('a'), "q1")
            .unwrap();
        assert_eq!(
            automaton.remove_transition("q0", Label::Symbol('a'), "q1"),
            Err(LanguageError::TransitionNotFound {
                from_state: "q0".to_string(),
                label: Label::Symbol('a'),
                target: "q1".to_string(),
            })
        );
        assert_eq!(automaton.transitions().count(), 0);
    }

    #[test]
    fn removing_a_state_drops_incident_transitions() {
        let mut automaton = Automaton::new(ab());
        automaton.add_states(["q0", "q1"]).unwrap();
        automaton
            .add_transition("q0", Label::Symbol('a'), "q1")
            .unwrap();
        automaton
            .add_transition("q1", Label::Symbol('b'), "q0")
            .unwrap();
        automaton.remove_state("q1").unwrap();
        assert!(!automaton.contains_state("q1"));
        assert_eq!(automaton.transitions().count(), 0);
        assert_eq!(
            automaton.remove_state("q1"),
            Err(LanguageError::UnknownState("q1".to_string()))
        );
    }

    #[test]
    fn determinism_and_completeness_predicates() {
        let automaton = crate::tests::ends_with_a_dfa();
        assert!(automaton.is_deterministic());
        assert!(automaton.is_complete());
        assert!(automaton.is_epsilon_free());

        let forked = crate::tests::forked_nfa();
        assert!(!forked.is_deterministic());
        assert!(!forked.is_complete());
    }

    #[test]
    fn reachability_queries() {
        let mut automaton = crate::tests::ends_with_a_dfa();
        automaton.add_state("limbo").unwrap();
        automaton
            .add_transition("limbo", Label::Symbol('a'), "q1")
            .unwrap();

        assert!(automaton.is_accessible("q1").unwrap());
        assert!(!automaton.is_accessible("limbo").unwrap());
        assert!(automaton.is_coaccessible("limbo").unwrap());
        assert!(automaton.is_useful("q0").unwrap());
        assert!(!automaton.is_useful("limbo").unwrap());
        assert_eq!(
            automaton.is_accessible("nope"),
            Err(LanguageError::UnknownState("nope".to_string()))
        );

        let trimmed = automaton.accessible_part();
        assert_eq!(trimmed.size(), 2);
        assert!(trimmed.is_complete());
        assert_eq!(trimmed.initial_state(), Some(&"q0".to_string()));
    }

    #[test]
    fn display_lists_the_five_tuple() {
        let rendered = crate::tests::ends_with_a_dfa().to_string();
        assert!(rendered.contains("States: {q0, q1}"));
        assert!(rendered.contains("Initial: q0"));
        assert!(rendered.contains("q0 --a--> q1"));
    }
}
