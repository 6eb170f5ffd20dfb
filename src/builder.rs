//! Fluent accumulation of advice from many call sites.
//!
//! [`AdviceBuilder`] collects hook contributions per target member into one
//! [`FlexibleAdvice`] each, then weaves them all in [`AdviceBuilder::apply`].
//!
//! # Example
//!
//! ```ignore
//! let deposit = account.member("deposit")?;
//! let withdraw = account.member("withdraw")?;
//!
//! AdviceBuilder::new()
//!     .add_prelude(&deposit, audit)
//!     .add_prelude(&withdraw, audit)
//!     .add_error_handler(&withdraw, |_, _, _| Ok(json!(0)))
//!     .apply(&weaver)?;
//! ```

use std::collections::HashMap;

use tracing::debug;

use crate::aspect::{Aspect, FlexibleAdvice};
use crate::class::{Args, Class, ClassId, MemberRef, Outcome, Proceed, Value};
use crate::error::{Fault, Result};
use crate::weaver::{AdviceMap, Weaver};

/// Accumulates advice per target member.
///
/// Contributions for a target that already has an entry are appended to it;
/// the first contribution creates the entry. Entries keep first-seen order.
pub struct AdviceBuilder<T> {
    entries: Vec<FlexibleAdvice<T>>,
    index: HashMap<MemberRef<T>, usize>,
}

impl<T> Default for AdviceBuilder<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T> Clone for AdviceBuilder<T> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            index: self.index.clone(),
        }
    }
}

impl<T> std::fmt::Debug for AdviceBuilder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdviceBuilder")
            .field("entries", &self.entries)
            .finish()
    }
}

impl<T: 'static> AdviceBuilder<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, target: &MemberRef<T>) -> &mut FlexibleAdvice<T> {
        let position = match self.index.get(target) {
            Some(&position) => position,
            None => {
                self.entries.push(FlexibleAdvice::new(target.clone()));
                self.index.insert(target.clone(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[position]
    }

    /// Append a prelude for `target`.
    pub fn add_prelude<F>(mut self, target: &MemberRef<T>, hook: F) -> Self
    where
        F: Fn(&MemberRef<T>, &mut T, &Args) -> std::result::Result<(), Fault>
            + Send
            + Sync
            + 'static,
    {
        self.entry(target).add_prelude(hook);
        self
    }

    /// Append an encore for `target`.
    pub fn add_encore<F>(mut self, target: &MemberRef<T>, hook: F) -> Self
    where
        F: Fn(&MemberRef<T>, &mut T, &Value) -> std::result::Result<(), Fault>
            + Send
            + Sync
            + 'static,
    {
        self.entry(target).add_encore(hook);
        self
    }

    /// Append an error handler for `target`.
    pub fn add_error_handler<F>(mut self, target: &MemberRef<T>, hook: F) -> Self
    where
        F: Fn(&MemberRef<T>, &mut T, &Fault) -> Outcome + Send + Sync + 'static,
    {
        self.entry(target).add_error_handler(hook);
        self
    }

    /// Append an around hook for `target`, nested inside earlier ones.
    pub fn add_around<F>(mut self, target: &MemberRef<T>, hook: F) -> Self
    where
        F: Fn(&dyn Proceed<T>, &mut T, Args) -> Outcome + Send + Sync + 'static,
    {
        self.entry(target).add_around(hook);
        self
    }

    /// Append every hook `aspect` supplies for `target`.
    ///
    /// An aspect with no hooks contributes nothing.
    pub fn add_advice(mut self, target: &MemberRef<T>, aspect: impl Into<Aspect<T>>) -> Self {
        let aspect = aspect.into();
        self.entry(target).absorb(&aspect);
        self
    }

    /// [`add_advice`](Self::add_advice) for each pair.
    pub fn add_dictionary_advice<I, A>(self, advice: I) -> Self
    where
        I: IntoIterator<Item = (MemberRef<T>, A)>,
        A: Into<Aspect<T>>,
    {
        advice
            .into_iter()
            .fold(self, |builder, (target, aspect)| builder.add_advice(&target, aspect))
    }

    /// Weave every accumulated entry into its target's owning class.
    ///
    /// All owners are resolved before anything is woven, so an unresolvable
    /// target leaves every class untouched. Each owning class is woven once
    /// with the entries of all its targets, which replaces whatever advice
    /// that class carried before.
    pub fn apply(&self, weaver: &Weaver<T>) -> Result<()> {
        if self.entries.is_empty() {
            debug!("Advice builder has no advice to apply");
            return Ok(());
        }

        let mut classes: Vec<(Class<T>, AdviceMap<T>)> = Vec::new();
        let mut positions: HashMap<ClassId, usize> = HashMap::new();

        for advice in &self.entries {
            let owner = advice.target().owner()?;
            let position = *positions.entry(owner.id()).or_insert_with(|| {
                classes.push((owner.clone(), AdviceMap::new()));
                classes.len() - 1
            });
            classes[position]
                .1
                .insert(advice.target().clone(), advice.to_aspect());
        }

        for (class, advice) in classes {
            debug!(class = %class.name(), targets = advice.len(), "Applying built advice");
            weaver.weave(&class, advice)?;
        }
        Ok(())
    }

    /// Targets with accumulated advice, in first-seen order.
    pub fn targets(&self) -> impl Iterator<Item = &MemberRef<T>> {
        self.entries.iter().map(FlexibleAdvice::target)
    }

    /// The accumulated advice for `target`, if any.
    pub fn advice_for(&self, target: &MemberRef<T>) -> Option<&FlexibleAdvice<T>> {
        self.index
            .get(target)
            .and_then(|&position| self.entries.get(position))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
