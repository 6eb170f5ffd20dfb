//! Member references and resolved callables.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

use super::{Class, ClassId, ClassInner};
use crate::error::{Fault, Result, WeaveError};

/// Dynamic argument/result value passed through intercepted calls.
pub type Value = serde_json::Value;

/// Positional call arguments.
pub type Args = Vec<Value>;

/// Result of an intercepted call.
pub type Outcome = std::result::Result<Value, Fault>;

/// Instance method body: receives the receiver state explicitly.
pub type MethodFn<T> = Arc<dyn Fn(&mut T, Args) -> Outcome + Send + Sync>;

/// Static function body: fully bound, no receiver.
pub type FunctionFn = Arc<dyn Fn(Args) -> Outcome + Send + Sync>;

/// The callable part of a class attribute.
pub enum Callable<T> {
    /// Instance method; the receiver is supplied on invocation.
    Method(MethodFn<T>),
    /// Static function; the receiver is omitted on invocation.
    Function(FunctionFn),
}

impl<T> Clone for Callable<T> {
    fn clone(&self) -> Self {
        match self {
            Callable::Method(f) => Callable::Method(Arc::clone(f)),
            Callable::Function(f) => Callable::Function(Arc::clone(f)),
        }
    }
}

impl<T> Callable<T> {
    /// Invoke, supplying `receiver` only to instance methods.
    pub fn call(&self, receiver: &mut T, args: Args) -> Outcome {
        match self {
            Callable::Method(f) => f(receiver, args),
            Callable::Function(f) => f(args),
        }
    }

    /// Returns true for instance methods.
    pub fn is_method(&self) -> bool {
        matches!(self, Callable::Method(_))
    }
}

/// Class-level identity of a callable member.
///
/// Two references are equal iff they name the same member on the same class,
/// regardless of which instance the member was reached through. The owning
/// class is held weakly so advice tables never keep classes alive.
pub struct MemberRef<T> {
    class_id: ClassId,
    class_name: Arc<str>,
    name: Arc<str>,
    owner: Weak<ClassInner<T>>,
}

impl<T> MemberRef<T> {
    pub(crate) fn new(class: &Class<T>, name: &str) -> Self {
        Self {
            class_id: class.id(),
            class_name: Arc::clone(&class.inner.name),
            name: Arc::from(name),
            owner: Arc::downgrade(&class.inner),
        }
    }

    /// Identifier of the owning class.
    pub fn class_id(&self) -> ClassId {
        self.class_id
    }

    /// Name of the owning class.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Member name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if this member is defined on `class`.
    pub fn belongs_to(&self, class: &Class<T>) -> bool {
        self.class_id == class.id()
    }

    /// Resolve the owning class.
    ///
    /// Fails with [`WeaveError::UnresolvedOwner`] once the class has been
    /// dropped.
    pub fn owner(&self) -> Result<Class<T>> {
        self.owner
            .upgrade()
            .map(|inner| Class { inner })
            .ok_or_else(|| WeaveError::UnresolvedOwner {
                member: self.to_string(),
            })
    }
}

impl<T> Clone for MemberRef<T> {
    fn clone(&self) -> Self {
        Self {
            class_id: self.class_id,
            class_name: Arc::clone(&self.class_name),
            name: Arc::clone(&self.name),
            owner: Weak::clone(&self.owner),
        }
    }
}

impl<T> PartialEq for MemberRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.class_id == other.class_id && self.name == other.name
    }
}

impl<T> Eq for MemberRef<T> {}

impl<T> Hash for MemberRef<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.class_id.hash(state);
        self.name.hash(state);
    }
}

impl<T> fmt::Debug for MemberRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberRef")
            .field("class", &self.class_name)
            .field("class_id", &self.class_id)
            .field("name", &self.name)
            .finish()
    }
}

impl<T> fmt::Display for MemberRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.class_name, self.name)
    }
}

/// The next layer of a call: either the original member or an around hook
/// wrapping it.
///
/// Around hooks receive one of these and decide whether, when and how many
/// times to proceed.
pub trait Proceed<T> {
    /// Invoke this layer.
    fn proceed(&self, context: &mut T, args: Args) -> Outcome;

    /// The member ultimately being called.
    fn member(&self) -> &MemberRef<T>;
}

/// A member reference resolved to its callable.
pub struct Member<T> {
    reference: MemberRef<T>,
    callable: Callable<T>,
}

impl<T> Member<T> {
    pub(crate) fn new(reference: MemberRef<T>, callable: Callable<T>) -> Self {
        Self {
            reference,
            callable,
        }
    }

    /// Class-level identity used as the advice key.
    pub fn reference(&self) -> &MemberRef<T> {
        &self.reference
    }

    /// Returns true for instance methods.
    pub fn is_method(&self) -> bool {
        self.callable.is_method()
    }

    /// Call the original member directly, bypassing any advice.
    pub fn invoke(&self, context: &mut T, args: Args) -> Outcome {
        self.callable.call(context, args)
    }
}

impl<T> Clone for Member<T> {
    fn clone(&self) -> Self {
        Self {
            reference: self.reference.clone(),
            callable: self.callable.clone(),
        }
    }
}

impl<T> fmt::Debug for Member<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("reference", &self.reference)
            .field("is_method", &self.is_method())
            .finish()
    }
}

impl<T> Proceed<T> for Member<T> {
    fn proceed(&self, context: &mut T, args: Args) -> Outcome {
        self.invoke(context, args)
    }

    fn member(&self) -> &MemberRef<T> {
        &self.reference
    }
}
