//! Minimization of deterministic complete automata by partition refinement.

use bit_set::BitSet;
use itertools::Itertools;
use tracing::{debug, trace};

use crate::{
    alphabet::Label,
    automaton::{Automaton, State, StateName},
    error::LanguageError,
    math,
};

impl Automaton {
    /// Computes the minimal deterministic complete automaton recognizing the same
    /// language, unique up to state renaming.
    ///
    /// The input must have an initial state and be deterministic and complete;
    /// anything else is a precondition violation that is reported, never silently
    /// corrected — callers determinize or complete explicitly first. Unreachable
    /// states are trimmed before refinement, so they never influence the result.
    ///
    /// Starting from the split into final and non-final states, a block is refined
    /// whenever two of its members transition into different blocks on some symbol,
    /// until the partition is stable. Output states are named after the sorted block
    /// contents, making the result a pure function of the partition.
    pub fn minimize(&self) -> Result<Automaton, LanguageError> {
        if self.initial_state().is_none() {
            return Err(LanguageError::MissingInitialState);
        }
        if !self.is_deterministic() || !self.is_complete() {
            return Err(LanguageError::NotDeterministicOrComplete);
        }

        let trimmed = self.accessible_part();
        let names: Vec<StateName> = trimmed.state_names().cloned().collect();
        let index: math::Map<&str, usize> = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();
        let symbols: Vec<char> = trimmed.alphabet().symbols().collect();

        // successor matrix; determinism and completeness guarantee uniqueness
        let mut successor: Vec<Vec<usize>> = Vec::with_capacity(names.len());
        for name in &names {
            let mut row = Vec::with_capacity(symbols.len());
            for &symbol in &symbols {
                let target = trimmed
                    .transitions_from(name, Label::Symbol(symbol))
                    .next()
                    .ok_or(LanguageError::NotDeterministicOrComplete)?;
                row.push(index[target.as_str()]);
            }
            successor.push(row);
        }

        let mut finals = BitSet::with_capacity(names.len());
        let mut ordinary = BitSet::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if trimmed.state(name).is_some_and(State::is_final) {
                finals.insert(i);
            } else {
                ordinary.insert(i);
            }
        }
        let mut blocks: Vec<BitSet> = [finals, ordinary]
            .into_iter()
            .filter(|block| !block.is_empty())
            .collect();
        let mut block_of = vec![0usize; names.len()];
        for (b, block) in blocks.iter().enumerate() {
            for i in block.iter() {
                block_of[i] = b;
            }
        }

        loop {
            let mut refined: Vec<BitSet> = Vec::new();
            let mut split = false;
            for block in &blocks {
                let mut groups: math::OrderedMap<Vec<usize>, BitSet> = math::OrderedMap::new();
                for i in block.iter() {
                    let signature: Vec<usize> =
                        successor[i].iter().map(|&t| block_of[t]).collect();
                    groups
                        .entry(signature)
                        .or_insert_with(|| BitSet::with_capacity(names.len()))
                        .insert(i);
                }
                if groups.len() > 1 {
                    split = true;
                }
                refined.extend(groups.into_values());
            }
            if !split {
                break;
            }
            blocks = refined;
            for (b, block) in blocks.iter().enumerate() {
                for i in block.iter() {
                    block_of[i] = b;
                }
            }
            trace!("refined partition into {} blocks", blocks.len());
        }

        let partition: math::Partition<StateName> =
            math::Partition::new(blocks.iter().map(|block| {
                block.iter().map(|i| names[i].clone()).collect::<Vec<_>>()
            }));
        debug!(
            "partition refinement grouped {} states into {} classes",
            names.len(),
            partition.size()
        );

        let class_of: math::Map<&StateName, usize> = partition
            .classes()
            .enumerate()
            .flat_map(|(c, class)| class.iter().map(move |member| (member, c)))
            .collect();
        let class_name = |c: usize| format!("{{{}}}", partition.class(c).iter().join(","));

        let mut out = Automaton::new(trimmed.alphabet().clone());
        for c in 0..partition.size() {
            out.add_state(class_name(c))?;
        }
        for (c, class) in partition.classes().enumerate() {
            let representative = match class.iter().next() {
                Some(representative) => representative,
                None => continue,
            };
            let name = class_name(c);
            if trimmed.state(representative).is_some_and(State::is_final) {
                out.add_final(&name)?;
            }
            if class
                .iter()
                .any(|member| trimmed.state(member).is_some_and(State::is_initial))
            {
                out.set_initial(&name)?;
            }
            for &symbol in &symbols {
                let target = trimmed
                    .transitions_from(representative, Label::Symbol(symbol))
                    .next()
                    .ok_or(LanguageError::NotDeterministicOrComplete)?;
                out.link(&name, Label::Symbol(symbol), &class_name(class_of[target]));
            }
        }
        Ok(out)
    }
}
