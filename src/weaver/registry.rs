//! Record of the classes a weaver has woven.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use super::Dispatch;
use crate::class::{Class, ClassId};
use crate::error::Result;

/// Classes woven through one weaver.
///
/// The pristine dispatch behavior itself is saved on the class, so every
/// weaver sharing a class restores the same original. The registry only
/// remembers which classes to visit on [`restore_all`](Self::restore_all).
pub struct WeaveRegistry<T> {
    classes: Mutex<HashMap<ClassId, Class<T>>>,
}

impl<T> Default for WeaveRegistry<T> {
    fn default() -> Self {
        Self {
            classes: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: 'static> WeaveRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the dispatch produced by `build` on `class` and record it.
    ///
    /// `build` receives the class's pristine behavior. Returns true if this
    /// call saved the pristine behavior.
    pub fn install<F>(&self, class: &Class<T>, build: F) -> Result<bool>
    where
        F: FnOnce(Arc<dyn Dispatch<T>>) -> Arc<dyn Dispatch<T>>,
    {
        let mut classes = self.classes.lock()?;
        let captured = class.weave_dispatch(build)?;
        if captured {
            debug!(class = %class.name(), "Captured original dispatch");
        }
        classes.insert(class.id(), class.clone());
        Ok(captured)
    }

    /// Reinstall the pristine behavior on `class` and forget it.
    ///
    /// Returns false if the class was not woven, by this or any other
    /// registry.
    pub fn restore(&self, class: &Class<T>) -> Result<bool> {
        let mut classes = self.classes.lock()?;
        classes.remove(&class.id());
        class.restore_dispatch()
    }

    /// Restore every recorded class. Returns how many were still woven.
    pub fn restore_all(&self) -> Result<usize> {
        let mut classes = self.classes.lock()?;
        let mut restored = 0;
        for (_, class) in classes.drain() {
            if class.restore_dispatch()? {
                restored += 1;
            }
        }
        Ok(restored)
    }
}

impl<T> WeaveRegistry<T> {
    /// Returns true if `class` was woven here and is still woven.
    pub fn contains(&self, class: &Class<T>) -> bool {
        self.classes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&class.id())
            && class.is_woven()
    }

    /// Number of recorded classes that are still woven.
    pub fn len(&self) -> usize {
        self.classes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|class| class.is_woven())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Recorded classes that are still woven.
    pub fn classes(&self) -> Vec<Class<T>> {
        self.classes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|class| class.is_woven())
            .cloned()
            .collect()
    }
}
