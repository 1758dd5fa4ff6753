//! GameplayTagContainer - refcounted runtime tag multiset
//!
//! Observers are plain callbacks receiving a [`TagEvent`]. They are invoked
//! after the container has finished updating its counts and cannot reach the
//! container itself, so a handler never observes a half-applied mutation.
//! Owners that react by mutating the container (e.g. cancelling an ability
//! when a blocking tag arrives) queue the events from the observer and act on
//! the queue once the call has returned.

use crate::set::GameplayTagSet;
use crate::tag::GameplayTag;
use std::collections::BTreeMap;

/// Notification emitted by a [`GameplayTagContainer`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagEvent {
    /// Tag count went from 0 to 1
    Added(GameplayTag),
    /// Tag count went from 1 to 0
    Removed(GameplayTag),
    /// The set of present tags changed during the last call
    Changed,
}

/// Observer handle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(pub u64);

/// Tag observer callback
pub type TagObserver = Box<dyn Fn(&TagEvent) + Send + Sync>;

/// Reference-counted tag container owned by an ability system component
#[derive(Default)]
pub struct GameplayTagContainer {
    counts: BTreeMap<GameplayTag, u32>,
    observers: Vec<(ObserverId, TagObserver)>,
    next_observer_id: u64,
}

impl GameplayTagContainer {
    /// Create an empty container
    pub fn new() -> Self {
        Self {
            counts: BTreeMap::new(),
            observers: Vec::new(),
            next_observer_id: 1,
        }
    }

    /// Subscribe to tag events
    pub fn subscribe<F>(&mut self, handler: F) -> ObserverId
    where
        F: Fn(&TagEvent) + Send + Sync + 'static,
    {
        let id = ObserverId(self.next_observer_id.max(1));
        self.next_observer_id = id.0 + 1;
        self.observers.push((id, Box::new(handler)));
        id
    }

    /// Unsubscribe, returns false if the id was unknown
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer_id, _)| *observer_id != id);
        self.observers.len() != before
    }

    /// Add one reference to `tag`. Returns true on the 0 -> 1 transition.
    pub fn add_tag(&mut self, tag: &GameplayTag) -> bool {
        let added = self.increment(tag);
        if added {
            self.notify(&[TagEvent::Added(tag.clone()), TagEvent::Changed]);
        }
        added
    }

    /// Add one reference to every tag in `tags`. Returns the newly present tags.
    pub fn add_tags(&mut self, tags: &GameplayTagSet) -> Vec<GameplayTag> {
        let added: Vec<GameplayTag> = tags
            .iter()
            .filter(|tag| self.increment(tag))
            .cloned()
            .collect();
        self.notify_transitions(&added, TagEvent::Added);
        added
    }

    /// Drop one reference to `tag`. Returns true on the 1 -> 0 transition.
    /// Removing an absent tag is a no-op.
    pub fn remove_tag(&mut self, tag: &GameplayTag) -> bool {
        let removed = self.decrement(tag);
        if removed {
            self.notify(&[TagEvent::Removed(tag.clone()), TagEvent::Changed]);
        }
        removed
    }

    /// Drop one reference to every tag in `tags`. Returns the tags that disappeared.
    pub fn remove_tags(&mut self, tags: &GameplayTagSet) -> Vec<GameplayTag> {
        let removed: Vec<GameplayTag> = tags
            .iter()
            .filter(|tag| self.decrement(tag))
            .cloned()
            .collect();
        self.notify_transitions(&removed, TagEvent::Removed);
        removed
    }

    /// Remove every tag regardless of count
    pub fn clear(&mut self) -> Vec<GameplayTag> {
        let removed: Vec<GameplayTag> = std::mem::take(&mut self.counts).into_keys().collect();
        self.notify_transitions(&removed, TagEvent::Removed);
        removed
    }

    pub fn has_tag(&self, tag: &GameplayTag) -> bool {
        self.counts.contains_key(tag)
    }

    /// True if the container holds any tag of `tags` (true for an empty query)
    pub fn has_any_tags(&self, tags: &GameplayTagSet) -> bool {
        tags.is_empty() || tags.iter().any(|tag| self.has_tag(tag))
    }

    /// True if the container holds every tag of `tags` (true for an empty query)
    pub fn has_all_tags(&self, tags: &GameplayTagSet) -> bool {
        tags.iter().all(|tag| self.has_tag(tag))
    }

    /// True if the container holds none of `tags`
    pub fn has_none_tags(&self, tags: &GameplayTagSet) -> bool {
        !tags.iter().any(|tag| self.has_tag(tag))
    }

    /// Current reference count for `tag`
    pub fn tag_count(&self, tag: &GameplayTag) -> u32 {
        self.counts.get(tag).copied().unwrap_or(0)
    }

    /// Number of distinct present tags
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Present tags in name order
    pub fn tags(&self) -> impl Iterator<Item = &GameplayTag> {
        self.counts.keys()
    }

    /// Snapshot of the present tags
    pub fn to_set(&self) -> GameplayTagSet {
        self.counts.keys().cloned().collect()
    }

    fn increment(&mut self, tag: &GameplayTag) -> bool {
        let count = self.counts.entry(tag.clone()).or_insert(0);
        *count += 1;
        *count == 1
    }

    fn decrement(&mut self, tag: &GameplayTag) -> bool {
        match self.counts.get_mut(tag) {
            Some(count) if *count > 1 => {
                *count -= 1;
                false
            }
            Some(_) => {
                self.counts.remove(tag);
                true
            }
            None => false,
        }
    }

    fn notify_transitions(&self, tags: &[GameplayTag], make: fn(GameplayTag) -> TagEvent) {
        if tags.is_empty() || self.observers.is_empty() {
            return;
        }
        let mut events: Vec<TagEvent> = tags.iter().cloned().map(make).collect();
        events.push(TagEvent::Changed);
        self.notify(&events);
    }

    fn notify(&self, events: &[TagEvent]) {
        for event in events {
            for (_, observer) in &self.observers {
                observer(event);
            }
        }
    }
}

impl std::fmt::Debug for GameplayTagContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameplayTagContainer")
            .field("counts", &self.counts)
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn tag(name: &str) -> GameplayTag {
        GameplayTag::new(name).unwrap()
    }

    #[test]
    fn test_refcounted_add_remove() {
        let mut container = GameplayTagContainer::new();
        let added = Arc::new(AtomicUsize::new(0));
        let removed = Arc::new(AtomicUsize::new(0));
        let (a, r) = (added.clone(), removed.clone());
        container.subscribe(move |event| match event {
            TagEvent::Added(_) => {
                a.fetch_add(1, Ordering::SeqCst);
            }
            TagEvent::Removed(_) => {
                r.fetch_add(1, Ordering::SeqCst);
            }
            TagEvent::Changed => {}
        });

        let stun = tag("Buff.DeBuff.Stun");
        assert!(container.add_tag(&stun));
        assert!(!container.add_tag(&stun));
        assert_eq!(container.tag_count(&stun), 2);

        assert!(!container.remove_tag(&stun));
        assert!(container.has_tag(&stun));
        assert!(container.remove_tag(&stun));
        assert!(!container.has_tag(&stun));

        assert_eq!(added.load(Ordering::SeqCst), 1);
        assert_eq!(removed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut container = GameplayTagContainer::new();
        assert!(!container.remove_tag(&tag("Missing")));
        assert_eq!(container.tag_count(&tag("Missing")), 0);
        assert!(container.is_empty());
    }

    #[test]
    fn test_set_operations_report_transitions() {
        let mut container = GameplayTagContainer::new();
        let set = GameplayTagSet::from_names(["A", "B"]).unwrap();
        container.add_tag(&tag("A"));

        let added = container.add_tags(&set);
        assert_eq!(added, vec![tag("B")]);

        let removed = container.remove_tags(&set);
        assert_eq!(removed, vec![tag("B")]);
        assert!(container.has_tag(&tag("A")));
    }

    #[test]
    fn test_queries_and_vacuous_truth() {
        let mut container = GameplayTagContainer::new();
        container.add_tag(&tag("A"));
        let empty = GameplayTagSet::new();
        assert!(container.has_any_tags(&empty));
        assert!(container.has_all_tags(&empty));
        assert!(container.has_none_tags(&empty));

        let ab = GameplayTagSet::from_names(["A", "B"]).unwrap();
        assert!(container.has_any_tags(&ab));
        assert!(!container.has_all_tags(&ab));
        assert!(!container.has_none_tags(&ab));
    }

    #[test]
    fn test_changed_fires_once_per_call() {
        let mut container = GameplayTagContainer::new();
        let changed = Arc::new(AtomicUsize::new(0));
        let c = changed.clone();
        let id = container.subscribe(move |event| {
            if *event == TagEvent::Changed {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });

        container.add_tags(&GameplayTagSet::from_names(["A", "B", "C"]).unwrap());
        assert_eq!(changed.load(Ordering::SeqCst), 1);

        // Count-only change does not alter presence
        container.add_tag(&tag("A"));
        assert_eq!(changed.load(Ordering::SeqCst), 1);

        let cleared = container.clear();
        assert_eq!(cleared.len(), 3);
        assert_eq!(changed.load(Ordering::SeqCst), 2);

        assert!(container.unsubscribe(id));
        assert!(!container.unsubscribe(id));
    }
}
