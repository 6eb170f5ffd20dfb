//! Weaving: installing and removing interception on classes.
//!
//! [`Weaver::weave`] replaces a class's dispatch behavior with one that runs
//! every callable member through its [`Aspect`] (or the identity aspect when
//! the member has none). The class's pristine behavior is saved on the class
//! itself on first weave, so any number of re-weaves, through any number of
//! weavers, can be undone by a single [`Weaver::unweave`].

mod dispatch;
mod registry;

pub use dispatch::{DirectDispatch, Dispatch, Invocable, Resolved};
pub use registry::WeaveRegistry;

use dispatch::WovenDispatch;

use std::collections::hash_map;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::aspect::Aspect;
use crate::class::{Class, MemberRef};
use crate::config::WeaverConfig;
use crate::error::Result;
use crate::namespace::Namespace;

/// Mapping from class-level member identity to the aspect applied to it.
///
/// Keys may belong to any class; weaving a class only consults the keys
/// that identify its own members.
pub struct AdviceMap<T> {
    entries: HashMap<MemberRef<T>, Aspect<T>>,
}

impl<T> Default for AdviceMap<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> Clone for AdviceMap<T> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<T> std::fmt::Debug for AdviceMap<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl<T> AdviceMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A map with one entry.
    pub fn single(member: MemberRef<T>, aspect: Aspect<T>) -> Self {
        let mut map = Self::new();
        map.insert(member, aspect);
        map
    }

    /// Insert an entry, returning the aspect it replaced.
    pub fn insert(&mut self, member: MemberRef<T>, aspect: Aspect<T>) -> Option<Aspect<T>> {
        self.entries.insert(member, aspect)
    }

    pub fn get(&self, member: &MemberRef<T>) -> Option<&Aspect<T>> {
        self.entries.get(member)
    }

    pub fn contains(&self, member: &MemberRef<T>) -> bool {
        self.entries.contains_key(member)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, MemberRef<T>, Aspect<T>> {
        self.entries.iter()
    }

    /// Number of entries whose key belongs to `class`.
    pub fn count_for(&self, class: &Class<T>) -> usize {
        self.entries
            .keys()
            .filter(|member| member.belongs_to(class))
            .count()
    }
}

impl<T> From<HashMap<MemberRef<T>, Aspect<T>>> for AdviceMap<T> {
    fn from(entries: HashMap<MemberRef<T>, Aspect<T>>) -> Self {
        Self { entries }
    }
}

impl<T> FromIterator<(MemberRef<T>, Aspect<T>)> for AdviceMap<T> {
    fn from_iter<I: IntoIterator<Item = (MemberRef<T>, Aspect<T>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<T> Extend<(MemberRef<T>, Aspect<T>)> for AdviceMap<T> {
    fn extend<I: IntoIterator<Item = (MemberRef<T>, Aspect<T>)>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

impl<T> IntoIterator for AdviceMap<T> {
    type Item = (MemberRef<T>, Aspect<T>);
    type IntoIter = hash_map::IntoIter<MemberRef<T>, Aspect<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Installs and removes interception on classes.
///
/// A weaver owns the record of every class it has woven. Weaving and
/// unweaving through one weaver are serialized; calls on woven instances
/// only take a short read lock on their class and never contend with each
/// other.
pub struct Weaver<T> {
    registry: WeaveRegistry<T>,
    config: WeaverConfig,
}

impl<T> std::fmt::Debug for Weaver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Weaver")
            .field("config", &self.config)
            .field("woven", &self.registry.len())
            .finish()
    }
}

impl<T> Default for Weaver<T> {
    fn default() -> Self {
        Self {
            registry: WeaveRegistry::default(),
            config: WeaverConfig::default(),
        }
    }
}

impl<T: 'static> Weaver<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A weaver using the given settings.
    pub fn with_config(config: WeaverConfig) -> Self {
        Self {
            registry: WeaveRegistry::new(),
            config,
        }
    }

    pub fn config(&self) -> &WeaverConfig {
        &self.config
    }

    /// Weave `advice` into `class`.
    ///
    /// Re-weaving replaces the previous advice entirely; woven behaviors
    /// never stack.
    pub fn weave(&self, class: &Class<T>, advice: AdviceMap<T>) -> Result<()> {
        let advised = advice.count_for(class);
        let advice = Arc::new(advice);
        let config = self.config.clone();

        let first = self.registry.install(class, move |original| {
            Arc::new(WovenDispatch::new(original, advice, config))
        })?;

        debug!(
            class = %class.name(),
            advised,
            rewoven = !first,
            "Wove class"
        );
        Ok(())
    }

    /// Restore `class` to its behavior before the first weave.
    ///
    /// Works whichever weaver wove the class. Returns false if the class was
    /// not woven.
    pub fn unweave(&self, class: &Class<T>) -> Result<bool> {
        let restored = self.registry.restore(class)?;
        if restored {
            debug!(class = %class.name(), "Unwove class");
        }
        Ok(restored)
    }

    /// Restore every class this weaver has woven. Returns how many.
    pub fn unweave_all(&self) -> Result<usize> {
        let restored = self.registry.restore_all()?;
        info!(restored, "Unwove all classes");
        Ok(restored)
    }

    /// Weave `advice` into every class defined directly in `namespace`.
    ///
    /// Nested namespaces are not descended into. Returns the number of
    /// classes woven.
    pub fn weave_namespace(&self, namespace: &Namespace<T>, advice: AdviceMap<T>) -> Result<usize> {
        let mut woven = 0;
        for class in namespace.classes() {
            self.weave(class, advice.clone())?;
            woven += 1;
        }
        info!(namespace = %namespace.name(), woven, "Wove namespace");
        Ok(woven)
    }

    /// Returns true if this weaver wove `class` and it is still woven.
    pub fn is_woven(&self, class: &Class<T>) -> bool {
        self.registry.contains(class)
    }

    /// Every class currently woven by this weaver.
    pub fn woven_classes(&self) -> Vec<Class<T>> {
        self.registry.classes()
    }
}
