use crate::models::Title;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Title → predecessor map for one search direction.
///
/// Written by the frontier that owns it and read concurrently by the opposite
/// frontier. The root maps to `None`. A title's predecessor is fixed by the first
/// insert that commits; later inserts for the same title are refused.
#[derive(Debug, Default)]
pub struct VisitedMap {
    predecessors: DashMap<Title, Option<Title>>,
}

impl VisitedMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a map holding only `root`.
    pub fn with_root(root: impl Into<Title>) -> Self {
        let map = Self::new();
        map.insert_root(root);
        map
    }

    pub fn insert_root(&self, root: impl Into<Title>) -> bool {
        self.insert_entry(root.into(), None)
    }

    /// Records `predecessor` for `title` unless the title is already present.
    /// Returns whether this call did the insert.
    pub fn insert_if_absent(&self, title: &str, predecessor: &str) -> bool {
        if self.predecessors.contains_key(title) {
            return false;
        }
        self.insert_entry(title.to_string(), Some(predecessor.to_string()))
    }

    fn insert_entry(&self, title: Title, predecessor: Option<Title>) -> bool {
        // The entry holds the shard write lock, so check and insert are one step.
        match self.predecessors.entry(title) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(predecessor);
                true
            }
        }
    }

    pub fn contains(&self, title: &str) -> bool {
        self.predecessors.contains_key(title)
    }

    /// `Some(None)` for the root, `None` for titles never visited.
    pub fn predecessor(&self, title: &str) -> Option<Option<Title>> {
        self.predecessors.get(title).map(|entry| entry.value().clone())
    }

    /// Follows predecessors from `title` back to the root, inclusive on both ends.
    /// Empty when `title` was never visited.
    pub fn chain(&self, title: &str) -> Vec<Title> {
        let mut chain = Vec::new();
        let mut current = self.contains(title).then(|| title.to_string());
        while let Some(node) = current {
            // First-insert-wins makes this a tree, but stay bounded regardless.
            if chain.len() > self.predecessors.len() {
                break;
            }
            current = self.predecessor(&node).flatten();
            chain.push(node);
        }
        chain
    }

    pub fn len(&self) -> usize {
        self.predecessors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predecessors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn new_map_is_empty() {
        let map = VisitedMap::new();
        assert!(map.is_empty());
        assert!(map.insert_root("A"));
        assert!(!map.is_empty());
    }

    #[test]
    fn root_has_no_predecessor() {
        let map = VisitedMap::with_root("A");
        assert_eq!(map.predecessor("A"), Some(None));
        assert_eq!(map.predecessor("B"), None);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn first_insert_wins() {
        let map = VisitedMap::with_root("A");
        assert!(map.insert_if_absent("B", "A"));
        assert!(!map.insert_if_absent("B", "C"));
        assert_eq!(map.predecessor("B"), Some(Some("A".to_string())));
    }

    #[test]
    fn root_is_never_overwritten() {
        let map = VisitedMap::with_root("A");
        assert!(!map.insert_if_absent("A", "B"));
        assert!(!map.insert_root("A"));
        assert_eq!(map.predecessor("A"), Some(None));
    }

    #[test]
    fn later_thread_cannot_replace_committed_predecessor() {
        let map = Arc::new(VisitedMap::with_root("root"));

        let first = {
            let map = Arc::clone(&map);
            thread::spawn(move || map.insert_if_absent("shared", "left"))
        };
        assert!(first.join().unwrap());

        let second = {
            let map = Arc::clone(&map);
            thread::spawn(move || map.insert_if_absent("shared", "right"))
        };
        assert!(!second.join().unwrap());

        assert_eq!(map.predecessor("shared"), Some(Some("left".to_string())));
        assert_eq!(map.chain("shared"), vec!["shared", "left"]);
    }

    #[test]
    fn concurrent_inserts_commit_exactly_one_predecessor() {
        for _ in 0..200 {
            let map = Arc::new(VisitedMap::with_root("root"));
            let barrier = Arc::new(Barrier::new(2));

            let handles: Vec<_> = ["left", "right"]
                .into_iter()
                .map(|pred| {
                    let map = Arc::clone(&map);
                    let barrier = Arc::clone(&barrier);
                    thread::spawn(move || {
                        barrier.wait();
                        (pred, map.insert_if_absent("shared", pred))
                    })
                })
                .collect();

            let results: Vec<(&str, bool)> =
                handles.into_iter().map(|h| h.join().unwrap()).collect();
            let winners: Vec<&str> = results
                .iter()
                .filter(|(_, won)| *won)
                .map(|(pred, _)| *pred)
                .collect();

            assert_eq!(winners.len(), 1);
            assert_eq!(
                map.predecessor("shared"),
                Some(Some(winners[0].to_string()))
            );
        }
    }

    #[test]
    fn chain_walks_to_root() {
        let map = VisitedMap::with_root("A");
        map.insert_if_absent("B", "A");
        map.insert_if_absent("M", "B");
        assert_eq!(map.chain("M"), vec!["M", "B", "A"]);
        assert_eq!(map.chain("A"), vec!["A"]);
    }

    #[test]
    fn chain_of_unknown_title_is_empty() {
        let map = VisitedMap::with_root("A");
        assert!(map.chain("Z").is_empty());
    }

    #[test]
    fn chain_stops_at_missing_predecessor() {
        let map = VisitedMap::new();
        map.insert_if_absent("M", "B");
        assert_eq!(map.chain("M"), vec!["M", "B"]);
    }
}
