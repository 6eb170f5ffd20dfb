//! Aspects: units of cross-cutting behavior.
//!
//! An [`Aspect`] carries up to four optional hooks. The dispatcher tests each
//! slot for presence before running it, so an aspect supplies only the
//! capabilities it needs:
//!
//! | slot             | runs                          | may change the result |
//! |------------------|-------------------------------|-----------------------|
//! | `prelude`        | before the call               | no                    |
//! | `around`         | instead of the direct call    | yes                   |
//! | `encore`         | after a successful call       | no                    |
//! | `error_handling` | when any of the above fails   | yes (replacement)     |
//!
//! # Example
//!
//! ```ignore
//! let audit = Aspect::new()
//!     .with_prelude(|member, ctx: &mut Account, args| {
//!         ctx.audit.push(format!("{} {:?}", member, args));
//!         Ok(())
//!     })
//!     .with_error_handler(|_, _, fault| {
//!         if fault.is("Overdrawn") { Ok(json!(0)) } else { Err(fault.clone()) }
//!     });
//! ```

mod flexible;
mod identity;

pub use flexible::FlexibleAdvice;
pub use identity::IdentityAspect;

use std::fmt;
use std::sync::Arc;

use crate::class::{Args, MemberRef, Outcome, Proceed, Value};
use crate::error::Fault;

/// Hook run before the call. Side effects only.
pub type PreludeFn<T> =
    Arc<dyn Fn(&MemberRef<T>, &mut T, &Args) -> Result<(), Fault> + Send + Sync>;

/// Hook that replaces direct invocation. Receives the next layer.
pub type AroundFn<T> = Arc<dyn Fn(&dyn Proceed<T>, &mut T, Args) -> Outcome + Send + Sync>;

/// Hook run after a successful call. Sees the result, cannot replace it.
pub type EncoreFn<T> =
    Arc<dyn Fn(&MemberRef<T>, &mut T, &Value) -> Result<(), Fault> + Send + Sync>;

/// Hook run on failure. `Ok` is the replacement result, `Err` re-raises.
pub type ErrorHandlerFn<T> =
    Arc<dyn Fn(&MemberRef<T>, &mut T, &Fault) -> Outcome + Send + Sync>;

/// A set of optional hooks applied around a member call.
pub struct Aspect<T> {
    prelude: Option<PreludeFn<T>>,
    around: Option<AroundFn<T>>,
    encore: Option<EncoreFn<T>>,
    error_handling: Option<ErrorHandlerFn<T>>,
}

impl<T> Default for Aspect<T> {
    fn default() -> Self {
        Self {
            prelude: None,
            around: None,
            encore: None,
            error_handling: None,
        }
    }
}

impl<T> Clone for Aspect<T> {
    fn clone(&self) -> Self {
        Self {
            prelude: self.prelude.clone(),
            around: self.around.clone(),
            encore: self.encore.clone(),
            error_handling: self.error_handling.clone(),
        }
    }
}

impl<T> fmt::Debug for Aspect<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aspect")
            .field("prelude", &self.prelude.is_some())
            .field("around", &self.around.is_some())
            .field("encore", &self.encore.is_some())
            .field("error_handling", &self.error_handling.is_some())
            .finish()
    }
}

impl<T: 'static> Aspect<T> {
    /// An aspect with no capabilities.
    pub fn new() -> Self {
        Self::default()
    }

    /// The neutral aspect used for unadvised members.
    pub fn identity() -> Self {
        IdentityAspect.into()
    }

    /// Set the prelude hook.
    pub fn with_prelude<F>(mut self, hook: F) -> Self
    where
        F: Fn(&MemberRef<T>, &mut T, &Args) -> Result<(), Fault> + Send + Sync + 'static,
    {
        self.prelude = Some(Arc::new(hook));
        self
    }

    /// Set the around hook.
    pub fn with_around<F>(mut self, hook: F) -> Self
    where
        F: Fn(&dyn Proceed<T>, &mut T, Args) -> Outcome + Send + Sync + 'static,
    {
        self.around = Some(Arc::new(hook));
        self
    }

    /// Set the encore hook.
    pub fn with_encore<F>(mut self, hook: F) -> Self
    where
        F: Fn(&MemberRef<T>, &mut T, &Value) -> Result<(), Fault> + Send + Sync + 'static,
    {
        self.encore = Some(Arc::new(hook));
        self
    }

    /// Set the error-handling hook.
    pub fn with_error_handler<F>(mut self, hook: F) -> Self
    where
        F: Fn(&MemberRef<T>, &mut T, &Fault) -> Outcome + Send + Sync + 'static,
    {
        self.error_handling = Some(Arc::new(hook));
        self
    }

    /// Aspect exposing only a prelude.
    pub fn prelude_only<F>(hook: F) -> Self
    where
        F: Fn(&MemberRef<T>, &mut T, &Args) -> Result<(), Fault> + Send + Sync + 'static,
    {
        Self::new().with_prelude(hook)
    }

    /// Aspect exposing only an around hook.
    pub fn around_only<F>(hook: F) -> Self
    where
        F: Fn(&dyn Proceed<T>, &mut T, Args) -> Outcome + Send + Sync + 'static,
    {
        Self::new().with_around(hook)
    }

    /// Aspect exposing only an encore.
    pub fn encore_only<F>(hook: F) -> Self
    where
        F: Fn(&MemberRef<T>, &mut T, &Value) -> Result<(), Fault> + Send + Sync + 'static,
    {
        Self::new().with_encore(hook)
    }

    /// Aspect exposing only an error handler.
    pub fn error_handler_only<F>(hook: F) -> Self
    where
        F: Fn(&MemberRef<T>, &mut T, &Fault) -> Outcome + Send + Sync + 'static,
    {
        Self::new().with_error_handler(hook)
    }

    /// Around-only aspect that runs `pre`, calls the original with the same
    /// arguments, runs `post` on the result and returns it.
    pub fn around_from<P, E>(pre: P, post: E) -> Self
    where
        P: Fn(&MemberRef<T>, &mut T, &Args) -> Result<(), Fault> + Send + Sync + 'static,
        E: Fn(&MemberRef<T>, &mut T, &Value) -> Result<(), Fault> + Send + Sync + 'static,
    {
        Self::around_only(move |next, ctx, args| {
            pre(next.member(), ctx, &args)?;
            let result = next.proceed(ctx, args)?;
            post(next.member(), ctx, &result)?;
            Ok(result)
        })
    }
}

impl<T> Aspect<T> {
    pub fn prelude(&self) -> Option<&PreludeFn<T>> {
        self.prelude.as_ref()
    }

    pub fn around(&self) -> Option<&AroundFn<T>> {
        self.around.as_ref()
    }

    pub fn encore(&self) -> Option<&EncoreFn<T>> {
        self.encore.as_ref()
    }

    pub fn error_handling(&self) -> Option<&ErrorHandlerFn<T>> {
        self.error_handling.as_ref()
    }

    /// Returns true if no hook is present.
    pub fn is_empty(&self) -> bool {
        self.prelude.is_none()
            && self.around.is_none()
            && self.encore.is_none()
            && self.error_handling.is_none()
    }
}
