//! Namespaces: named groups of classes.
//!
//! A [`Namespace`] plays the role of a module: it holds the classes defined
//! directly in it and any nested namespaces. Namespace weaving only ever
//! reaches the direct classes.

use std::collections::BTreeMap;

use crate::class::Class;

/// A named collection of classes and child namespaces.
pub struct Namespace<T> {
    name: String,
    classes: BTreeMap<String, Class<T>>,
    children: BTreeMap<String, Namespace<T>>,
}

impl<T> std::fmt::Debug for Namespace<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Namespace")
            .field("name", &self.name)
            .field("classes", &self.classes.keys())
            .field("children", &self.children.keys())
            .finish()
    }
}

impl<T> Namespace<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            classes: BTreeMap::new(),
            children: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bind `class` under `name`, replacing any previous binding.
    pub fn add_class(&mut self, name: impl Into<String>, class: Class<T>) -> &mut Self {
        self.classes.insert(name.into(), class);
        self
    }

    /// Builder form of [`add_class`](Self::add_class).
    pub fn with_class(mut self, name: impl Into<String>, class: Class<T>) -> Self {
        self.add_class(name, class);
        self
    }

    /// Nest `child` under its own name.
    pub fn add_namespace(&mut self, child: Namespace<T>) -> &mut Self {
        self.children.insert(child.name.clone(), child);
        self
    }

    /// Builder form of [`add_namespace`](Self::add_namespace).
    pub fn with_namespace(mut self, child: Namespace<T>) -> Self {
        self.add_namespace(child);
        self
    }

    /// Classes defined directly in this namespace, in name order.
    pub fn classes(&self) -> impl Iterator<Item = &Class<T>> {
        self.classes.values()
    }

    /// Look up a direct class by its bound name.
    pub fn class(&self, name: &str) -> Option<&Class<T>> {
        self.classes.get(name)
    }

    /// Nested namespaces, in name order.
    pub fn namespaces(&self) -> impl Iterator<Item = &Namespace<T>> {
        self.children.values()
    }

    /// Look up a nested namespace.
    pub fn namespace(&self, name: &str) -> Option<&Namespace<T>> {
        self.children.get(name)
    }
}
