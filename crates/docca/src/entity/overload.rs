//! Overload sets

use super::EntityId;

/// Position of an overload set in the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverloadSetId(pub(crate) usize);

/// Functions of one scope sharing name, access and kind.
///
/// A set is never empty. Functions with identical brief descriptions are
/// kept next to each other; otherwise declaration order is preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverloadSet {
    /// The scope declaring the functions
    pub scope: EntityId,
    functions: Vec<EntityId>,
}

impl OverloadSet {
    pub(crate) fn new(scope: EntityId, first: EntityId) -> Self {
        Self {
            scope,
            functions: vec![first],
        }
    }

    /// Functions in presentation order.
    pub fn functions(&self) -> &[EntityId] {
        &self.functions
    }

    /// The representative function.
    pub fn first(&self) -> EntityId {
        self.functions[0]
    }

    /// Number of functions.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Position of a function in the set.
    pub fn position(&self, function: EntityId) -> Option<usize> {
        self.functions.iter().position(|&f| f == function)
    }

    /// Add a function and restore the grouping order.
    ///
    /// `brief` gives the raw brief text of a function.
    pub(crate) fn push<'a>(&mut self, function: EntityId, brief: impl Fn(EntityId) -> &'a str) {
        self.functions.push(function);
        self.functions = grouped_order(&self.functions, brief);
    }

    /// Keep only the functions accepted by `keep`, preserving order.
    pub(crate) fn retain(&mut self, keep: impl FnMut(&EntityId) -> bool) {
        self.functions.retain(keep);
    }
}

/// Order functions so that equal briefs end up adjacent.
///
/// The list is built back to front: each function goes in front of the
/// first function already placed with the same brief, or at the very front
/// when there is none. Reversing the result restores declaration order for
/// distinct briefs.
fn grouped_order<'a>(functions: &[EntityId], brief: impl Fn(EntityId) -> &'a str) -> Vec<EntityId> {
    let mut backwards: Vec<(EntityId, &str)> = Vec::with_capacity(functions.len());
    for &function in functions {
        let key = brief(function);
        let n = backwards
            .iter()
            .position(|(_, other)| *other == key)
            .unwrap_or(0);
        backwards.insert(n, (function, key));
    }
    backwards.into_iter().rev().map(|(function, _)| function).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(briefs: &[&'static str]) -> Vec<usize> {
        let ids: Vec<EntityId> = (0..briefs.len()).map(EntityId).collect();
        let mut set = OverloadSet::new(EntityId(100), ids[0]);
        for &id in &ids[1..] {
            set.push(id, |f| briefs[f.0]);
        }
        set.functions().iter().map(|f| f.0).collect()
    }

    #[test]
    fn test_distinct_briefs_keep_declaration_order() {
        assert_eq!(order(&["a", "b"]), vec![0, 1]);
        assert_eq!(order(&["a", "b", "c"]), vec![0, 1, 2]);
    }

    #[test]
    fn test_equal_briefs_are_grouped() {
        assert_eq!(order(&["a", "a", "b"]), vec![0, 1, 2]);
        assert_eq!(order(&["a", "b", "a"]), vec![0, 2, 1]);
    }

    #[test]
    fn test_position() {
        let mut set = OverloadSet::new(EntityId(9), EntityId(1));
        set.push(EntityId(2), |_| "");
        assert_eq!(set.len(), 2);
        assert_eq!(set.first(), EntityId(1));
        assert_eq!(set.position(EntityId(2)), Some(1));
        assert_eq!(set.position(EntityId(3)), None);
    }
}
