use std::collections::{BTreeMap, BTreeSet};

/// Type alias for sets, we use this to hide which type of `HashSet` we are actually using.
pub type Set<S> = fxhash::FxHashSet<S>;
/// Type alias for maps, we use this to hide which type of `HashMap` we are actually using.
pub type Map<K, V> = fxhash::FxHashMap<K, V>;

/// Set with a deterministic iteration order. Used wherever the iteration order feeds
/// into the naming of constructed states, so that repeated runs produce identical output.
pub type OrderedSet<S> = BTreeSet<S>;
/// Map with a deterministic iteration order, see [`OrderedSet`].
pub type OrderedMap<K, V> = BTreeMap<K, V>;

/// Represents a bijective mapping between `L` and `R`, that is a mapping which associates
/// each `L` with precisely one `R` and vice versa.
pub type Bijection<L, R> = bimap::BiBTreeMap<L, R>;

/// A partition of elements of type `I` into disjoint classes.
///
/// Classes are kept in a canonical order (sorted by their contents), so the class at
/// a given position is independent of the order in which the classes were supplied
/// and two partitions with the same classes are structurally equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition<I: Ord> {
    classes: Vec<BTreeSet<I>>,
}

impl<I: Ord> Partition<I> {
    /// Builds a partition from groups of elements. Empty groups are dropped and the
    /// classes are brought into canonical order.
    pub fn new<X: IntoIterator<Item = I>, Y: IntoIterator<Item = X>>(groups: Y) -> Self {
        let mut classes: Vec<BTreeSet<I>> = groups
            .into_iter()
            .map(|group| group.into_iter().collect::<BTreeSet<_>>())
            .filter(|class| !class.is_empty())
            .collect();
        classes.sort_unstable();
        Self { classes }
    }

    /// Returns the size of the partition, i.e. the number of classes.
    pub fn size(&self) -> usize {
        self.classes.len()
    }

    /// The class at the given position in canonical order.
    pub fn class(&self, index: usize) -> &BTreeSet<I> {
        &self.classes[index]
    }

    /// Iterates over the classes in canonical order.
    pub fn classes(&self) -> impl Iterator<Item = &BTreeSet<I>> {
        self.classes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::Partition;

    #[test]
    fn classes_are_canonically_ordered() {
        let left = Partition::new([vec![1, 2], vec![3], vec![]]);
        let right = Partition::new([vec![3], vec![2, 1]]);
        assert_eq!(left, right);
        assert_eq!(left.size(), 2);
        assert!(left.class(0).contains(&1));
        assert_eq!(left.classes().count(), 2);
    }
}
