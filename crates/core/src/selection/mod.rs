//! The selection state machine. Tracks which entities the player has
//! selected and which one has focus, and lets each entity veto being
//! selected or deselected.
//!
//! The coordinator doesn't own any entities. It stores keys, and every
//! operation takes a [SelectableStore] to look the entities up in. A key
//! that the store doesn't know about is considered dead (e.g. the unit was
//! destroyed), and gets quietly dropped from the selection.

mod context;

pub use self::context::{Modifiers, MouseButton, SelectionContext, SourceTag};

use crate::events::EventBus;
use fnv::FnvBuildHasher;
use indexmap::{IndexMap, IndexSet};
use log::{debug, trace};
use serde::Serialize;
use std::{
    collections::HashMap,
    fmt::Debug,
    hash::{BuildHasher, Hash},
};

/// Something the player can select
pub trait Selectable {
    /// Called when the player tries to select this entity. Return false to
    /// veto the selection.
    fn accept_select(&mut self, context: &SelectionContext) -> bool;

    /// Called when this entity is about to be deselected. Return false to
    /// veto. The veto is only honored when toggling a single entity; when
    /// the whole selection is replaced or cleared, the result is ignored.
    fn accept_deselect(&mut self) -> bool;

    /// Human-readable name, for logs and UI
    fn display_name(&self) -> String;
}

/// Somewhere to look up selectable entities by key
pub trait SelectableStore<K> {
    /// Get the entity for a key, or `None` if it's dead
    fn get_selectable(&mut self, key: &K) -> Option<&mut dyn Selectable>;

    fn is_alive(&self, key: &K) -> bool;
}

impl<K, V, S> SelectableStore<K> for HashMap<K, V, S>
where
    K: Eq + Hash,
    V: Selectable,
    S: BuildHasher,
{
    fn get_selectable(&mut self, key: &K) -> Option<&mut dyn Selectable> {
        self.get_mut(key).map(|value| value as &mut dyn Selectable)
    }

    fn is_alive(&self, key: &K) -> bool {
        self.contains_key(key)
    }
}

impl<K, V, S> SelectableStore<K> for IndexMap<K, V, S>
where
    K: Eq + Hash,
    V: Selectable,
    S: BuildHasher,
{
    fn get_selectable(&mut self, key: &K) -> Option<&mut dyn Selectable> {
        self.get_mut(key).map(|value| value as &mut dyn Selectable)
    }

    fn is_alive(&self, key: &K) -> bool {
        self.contains_key(key)
    }
}

/// A change in selection, published on [SelectionCoordinator::events]
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SelectionEvent<K> {
    /// Focus moved to a new entity (or was refreshed on the same one)
    Changed {
        previous: Option<K>,
        current: K,
        context: SelectionContext,
    },
    /// Nothing has focus anymore
    Cleared,
}

/// Owns the current selection. There are two pieces of state:
///
/// - The selected set: every entity that's currently selected
/// - The current entity: the one with focus, usually the one most recently
///   clicked. If there is a current entity, it's always in the selected set.
///
/// A non-additive select replaces the whole set, so afterwards there's
/// exactly one selected entity and it has focus. Additive selects grow the
/// set and move focus. Entities can veto being selected, in which case they
/// never end up in the set or in focus.
#[derive(Debug)]
pub struct SelectionCoordinator<K> {
    current: Option<K>,
    /// Ordered by selection time
    selected: IndexSet<K, FnvBuildHasher>,
    events: EventBus<SelectionEvent<K>>,
}

impl<K> SelectionCoordinator<K>
where
    K: Clone + Debug + Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            current: None,
            selected: IndexSet::default(),
            events: EventBus::new(),
        }
    }

    /// The entity with focus, if any
    pub fn current(&self) -> Option<&K> {
        self.current.as_ref()
    }

    /// Every selected entity, in the order they were selected
    pub fn selected(&self) -> impl Iterator<Item = &K> {
        self.selected.iter()
    }

    pub fn is_selected(&self, key: &K) -> bool {
        self.selected.contains(key)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// True when nothing is selected and nothing has focus
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty() && self.current.is_none()
    }

    /// Subscribe here to hear about selection changes
    pub fn events(&mut self) -> &mut EventBus<SelectionEvent<K>> {
        &mut self.events
    }

    /// Select an entity. What exactly happens depends on whether the input
    /// was additive (see [SelectionContext::additive]):
    ///
    /// - Non-additive: everything currently selected is deselected, then
    ///   `next` is selected on its own. If `next` vetoes, the selection ends
    ///   up empty.
    /// - Additive, `next` already selected: focus moves to `next`, the set
    ///   doesn't change.
    /// - Additive, `next` not selected: `next` is added to the set and
    ///   focused, unless it vetoes, in which case nothing changes.
    ///
    /// If `next` is dead, a non-additive select clears everything and an
    /// additive select does nothing.
    ///
    /// Returns true if `next` has focus afterwards.
    pub fn select<S>(
        &mut self,
        next: K,
        context: &SelectionContext,
        store: &mut S,
    ) -> bool
    where
        S: SelectableStore<K> + ?Sized,
    {
        self.prune(store);

        if !store.is_alive(&next) {
            trace!("Selection target {:?} is dead", next);
            if !context.is_additive() {
                self.clear(store);
            }
            return false;
        }

        let previous = self.current.clone();

        if context.is_additive() {
            if self.selected.contains(&next) {
                // Give the entity a chance to refresh, but it's already
                // selected so a veto doesn't mean anything
                Self::try_select(store, &next, context);
                self.focus(next, previous, context);
                return true;
            }
            if Self::try_select(store, &next, context) {
                self.selected.insert(next.clone());
                self.focus(next, previous, context);
                return true;
            }
            debug!("{:?} vetoed additive selection", next);
            return false;
        }

        self.deselect_all(store);
        if Self::try_select(store, &next, context) {
            self.selected.insert(next.clone());
            self.focus(next, previous, context);
            true
        } else {
            debug!("{:?} vetoed selection", next);
            self.current = None;
            self.events.publish(&SelectionEvent::Cleared);
            false
        }
    }

    /// Flip an entity's membership in the selected set. A selected entity
    /// gets deselected (unless it vetoes), and loses focus if it had it. An
    /// unselected entity gets selected and focused (unless it vetoes). Dead
    /// entities are ignored.
    ///
    /// Returns whether the entity is selected afterwards.
    pub fn toggle<S>(
        &mut self,
        key: K,
        context: &SelectionContext,
        store: &mut S,
    ) -> bool
    where
        S: SelectableStore<K> + ?Sized,
    {
        self.prune(store);
        if !store.is_alive(&key) {
            trace!("Toggle target {:?} is dead", key);
            return false;
        }

        if self.selected.contains(&key) {
            let accepted = store
                .get_selectable(&key)
                .map_or(false, |entity| entity.accept_deselect());
            if !accepted {
                debug!("{:?} vetoed deselection", key);
                return true;
            }
            self.selected.shift_remove(&key);
            if self.current.as_ref() == Some(&key) {
                self.current = None;
                self.events.publish(&SelectionEvent::Cleared);
            }
            false
        } else if Self::try_select(store, &key, context) {
            let previous = self.current.clone();
            self.selected.insert(key.clone());
            self.focus(key, previous, context);
            true
        } else {
            debug!("{:?} vetoed selection", key);
            false
        }
    }

    /// Deselect everything. Does nothing (and publishes nothing) if the
    /// selection is already empty.
    pub fn clear<S>(&mut self, store: &mut S)
    where
        S: SelectableStore<K> + ?Sized,
    {
        self.prune(store);
        if self.is_empty() {
            return;
        }
        self.deselect_all(store);
        self.current = None;
        debug!("Selection cleared");
        self.events.publish(&SelectionEvent::Cleared);
    }

    /// Drop any dead entities from the selection, without notifying anyone
    pub fn prune<S>(&mut self, store: &S)
    where
        S: SelectableStore<K> + ?Sized,
    {
        self.selected.retain(|key| store.is_alive(key));
        if let Some(current) = &self.current {
            if !store.is_alive(current) {
                trace!("Pruning dead focus {:?}", current);
                self.current = None;
            }
        }
    }

    /// Notify every selected entity that it's being deselected, and empty the
    /// set. Vetoes are ignored here.
    fn deselect_all<S>(&mut self, store: &mut S)
    where
        S: SelectableStore<K> + ?Sized,
    {
        for key in self.selected.drain(..) {
            if let Some(entity) = store.get_selectable(&key) {
                entity.accept_deselect();
            }
        }
    }

    fn try_select<S>(store: &mut S, key: &K, context: &SelectionContext) -> bool
    where
        S: SelectableStore<K> + ?Sized,
    {
        match store.get_selectable(key) {
            Some(entity) => {
                let accepted = entity.accept_select(context);
                trace!(
                    "{} {} selection",
                    entity.display_name(),
                    if accepted { "accepted" } else { "rejected" }
                );
                accepted
            }
            None => false,
        }
    }

    fn focus(&mut self, next: K, previous: Option<K>, context: &SelectionContext) {
        debug!("Focus {:?} -> {:?}", previous, next);
        self.current = Some(next.clone());
        self.events.publish(&SelectionEvent::Changed {
            previous,
            current: next,
            context: context.clone(),
        });
    }
}

impl<K> Default for SelectionCoordinator<K>
where
    K: Clone + Debug + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}
