//! Classes, their members and instances.
//!
//! A [`Class`] is the unit the weaver operates on: an attribute table plus
//! the class's *active dispatch behavior*. An [`Instance`] is a proxy over
//! receiver state `T` that routes every attribute access through whatever
//! dispatch behavior its class currently has installed, so weaving and
//! unweaving take effect for existing instances immediately.
//!
//! Method bodies receive the bare receiver state, not the proxy, so a member
//! that calls a sibling member on the same receiver does not go through
//! advice.
//!
//! # Example
//!
//! ```ignore
//! struct Account { balance: i64 }
//!
//! let class = Class::builder("Account")
//!     .method("deposit", |acct: &mut Account, args| {
//!         acct.balance += args[0].as_i64().unwrap_or(0);
//!         Ok(json!(acct.balance))
//!     })
//!     .constant("currency", json!("EUR"))
//!     .build();
//!
//! let mut account = class.instantiate(Account { balance: 0 });
//! account.call("deposit", vec![json!(10)])?;
//! ```

mod member;

pub use member::{
    Args, Callable, FunctionFn, Member, MemberRef, MethodFn, Outcome, Proceed, Value,
};

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use uuid::Uuid;

use crate::error::{Fault, Result, WeaveError};
use crate::weaver::{DirectDispatch, Dispatch, Resolved};

/// Unique identity of a class definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(Uuid);

impl ClassId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named entry in a class's attribute table.
pub enum Attribute<T> {
    /// Instance method.
    Method(MethodFn<T>),
    /// Static function.
    Function(FunctionFn),
    /// Non-callable data attribute.
    Constant(Value),
}

impl<T> Attribute<T> {
    /// The callable behind this attribute, if any.
    pub fn callable(&self) -> Option<Callable<T>> {
        match self {
            Attribute::Method(f) => Some(Callable::Method(Arc::clone(f))),
            Attribute::Function(f) => Some(Callable::Function(Arc::clone(f))),
            Attribute::Constant(_) => None,
        }
    }

    /// Returns true for methods and functions.
    pub fn is_callable(&self) -> bool {
        !matches!(self, Attribute::Constant(_))
    }
}

impl<T> Clone for Attribute<T> {
    fn clone(&self) -> Self {
        match self {
            Attribute::Method(f) => Attribute::Method(Arc::clone(f)),
            Attribute::Function(f) => Attribute::Function(Arc::clone(f)),
            Attribute::Constant(v) => Attribute::Constant(v.clone()),
        }
    }
}

/// Builder for class definitions.
pub struct ClassBuilder<T> {
    name: String,
    attributes: BTreeMap<String, Attribute<T>>,
}

impl<T: 'static> ClassBuilder<T> {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Define an instance method.
    pub fn method<F>(mut self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut T, Args) -> Outcome + Send + Sync + 'static,
    {
        self.attributes
            .insert(name.into(), Attribute::Method(Arc::new(body)));
        self
    }

    /// Define a static function.
    pub fn function<F>(mut self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(Args) -> Outcome + Send + Sync + 'static,
    {
        self.attributes
            .insert(name.into(), Attribute::Function(Arc::new(body)));
        self
    }

    /// Define a non-callable data attribute.
    pub fn constant(mut self, name: impl Into<String>, value: Value) -> Self {
        self.attributes
            .insert(name.into(), Attribute::Constant(value));
        self
    }

    /// Finish the definition. The class starts unwoven.
    pub fn build(self) -> Class<T> {
        Class {
            inner: Arc::new(ClassInner {
                id: ClassId::new(),
                name: Arc::from(self.name.as_str()),
                attributes: self.attributes,
                dispatch: RwLock::new(DispatchSlot::new(Arc::new(DirectDispatch))),
            }),
        }
    }
}

pub(crate) struct ClassInner<T> {
    id: ClassId,
    name: Arc<str>,
    attributes: BTreeMap<String, Attribute<T>>,
    dispatch: RwLock<DispatchSlot<T>>,
}

/// Active dispatch behavior plus the pristine one saved while woven.
///
/// Both live under one lock, so the pristine behavior is captured exactly
/// once per class no matter how many weavers re-weave it.
struct DispatchSlot<T> {
    active: Arc<dyn Dispatch<T>>,
    pristine: Option<Arc<dyn Dispatch<T>>>,
}

impl<T> DispatchSlot<T> {
    fn new(active: Arc<dyn Dispatch<T>>) -> Self {
        Self {
            active,
            pristine: None,
        }
    }
}

/// Shared handle to a class definition.
pub struct Class<T> {
    pub(crate) inner: Arc<ClassInner<T>>,
}

impl<T> Clone for Class<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Class<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.inner.name)
            .field("id", &self.inner.id)
            .field("attributes", &self.inner.attributes.keys())
            .finish()
    }
}

impl<T> PartialEq for Class<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl<T> Eq for Class<T> {}

impl<T: 'static> Class<T> {
    /// Start defining a class.
    pub fn builder(name: impl Into<String>) -> ClassBuilder<T> {
        ClassBuilder::new(name)
    }

    /// Create an instance over the given receiver state.
    pub fn instantiate(&self, state: T) -> Instance<T> {
        Instance {
            class: self.clone(),
            state,
        }
    }

    /// Resolve a callable member to its class-level reference.
    ///
    /// Fails loudly for names that are missing or not callable.
    pub fn member(&self, name: &str) -> Result<MemberRef<T>> {
        self.resolve(name).map(|member| member.reference().clone())
    }

    /// Resolve a callable member to its reference and original callable.
    pub fn resolve(&self, name: &str) -> Result<Member<T>> {
        let attribute = self
            .inner
            .attributes
            .get(name)
            .ok_or_else(|| WeaveError::UnknownMember {
                class: self.name().to_string(),
                member: name.to_string(),
            })?;

        let callable = attribute.callable().ok_or_else(|| WeaveError::NotCallable {
            class: self.name().to_string(),
            member: name.to_string(),
        })?;

        Ok(Member::new(MemberRef::new(self, name), callable))
    }

    /// References to every callable member, in name order.
    pub fn members(&self) -> Vec<MemberRef<T>> {
        self.inner
            .attributes
            .iter()
            .filter(|(_, attribute)| attribute.is_callable())
            .map(|(name, _)| MemberRef::new(self, name))
            .collect()
    }

    /// The currently installed dispatch behavior.
    pub(crate) fn dispatch(&self) -> Arc<dyn Dispatch<T>> {
        let slot = self
            .inner
            .dispatch
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&slot.active)
    }

    /// Install the dispatch produced by `build`.
    ///
    /// `build` receives the pristine behavior: the active one on the first
    /// weave, the saved one on every later weave. Returns true if this call
    /// saved the pristine behavior.
    pub(crate) fn weave_dispatch<F>(&self, build: F) -> Result<bool>
    where
        F: FnOnce(Arc<dyn Dispatch<T>>) -> Arc<dyn Dispatch<T>>,
    {
        let mut slot = self.inner.dispatch.write()?;
        let captured = slot.pristine.is_none();
        let pristine = match &slot.pristine {
            Some(pristine) => Arc::clone(pristine),
            None => Arc::clone(&slot.active),
        };
        slot.active = build(Arc::clone(&pristine));
        slot.pristine = Some(pristine);
        Ok(captured)
    }

    /// Reinstall the saved pristine behavior.
    ///
    /// Returns false if the class was not woven.
    pub(crate) fn restore_dispatch(&self) -> Result<bool> {
        let mut slot = self.inner.dispatch.write()?;
        match slot.pristine.take() {
            Some(pristine) => {
                slot.active = pristine;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl<T> Class<T> {
    /// Unique class identity.
    pub fn id(&self) -> ClassId {
        self.inner.id
    }

    /// Class name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Raw attribute lookup that bypasses dispatch.
    pub fn attribute(&self, name: &str) -> Option<&Attribute<T>> {
        self.inner.attributes.get(name)
    }

    /// Returns true while the class has advice woven in.
    pub fn is_woven(&self) -> bool {
        self.inner
            .dispatch
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .pristine
            .is_some()
    }
}

/// An object: receiver state plus the class it dispatches through.
pub struct Instance<T> {
    class: Class<T>,
    state: T,
}

impl<T: 'static> Instance<T> {
    /// Access an attribute through the class's active dispatch behavior.
    pub fn get(&self, name: &str) -> std::result::Result<Resolved<T>, Fault> {
        self.class.dispatch().get_attribute(&self.class, name)
    }

    /// Call a member through the class's active dispatch behavior.
    pub fn call(&mut self, name: &str, args: Args) -> Outcome {
        match self.get(name)? {
            Resolved::Callable(call) => call(&mut self.state, args),
            Resolved::Value(_) => Err(Fault::type_error(self.class.name(), name)),
        }
    }
}

impl<T> Instance<T> {
    /// The instance's class.
    pub fn class(&self) -> &Class<T> {
        &self.class
    }

    /// Receiver state.
    pub fn state(&self) -> &T {
        &self.state
    }

    /// Mutable receiver state.
    pub fn state_mut(&mut self) -> &mut T {
        &mut self.state
    }

    /// Consume the instance, returning its state.
    pub fn into_state(self) -> T {
        self.state
    }
}

impl<T: fmt::Debug> fmt::Debug for Instance<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.class.name())
            .field("state", &self.state)
            .finish()
    }
}
