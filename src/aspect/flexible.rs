//! Advice aggregated from many contributions to one member.
//!
//! [`FlexibleAdvice`] keeps ordered lists of contributed hooks for a single
//! target member and composes them into one effective [`Aspect`]:
//!
//! - preludes and encores run in registration order; the first failure stops
//!   the sequence and is routed to error handling by the dispatcher
//! - error handlers run in registration order; with none registered the fault
//!   is re-raised. A handler returning `Err` re-raises immediately, otherwise
//!   the last handler's value becomes the call's replacement result
//! - around hooks nest like an onion: the first registered is outermost and
//!   the original member is the innermost layer. With none registered the
//!   composed aspect has no around capability at all

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::{Aspect, AroundFn, EncoreFn, ErrorHandlerFn, PreludeFn};
use crate::class::{Args, MemberRef, Outcome, Proceed};
use crate::error::{Fault, Result};
use crate::weaver::{AdviceMap, Weaver};

/// Ordered hook contributions for one target member.
pub struct FlexibleAdvice<T> {
    target: MemberRef<T>,
    preludes: Vec<PreludeFn<T>>,
    encores: Vec<EncoreFn<T>>,
    error_handlers: Vec<ErrorHandlerFn<T>>,
    arounds: Vec<AroundFn<T>>,
}

impl<T> fmt::Debug for FlexibleAdvice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlexibleAdvice")
            .field("target", &self.target)
            .field("preludes", &self.preludes.len())
            .field("encores", &self.encores.len())
            .field("error_handlers", &self.error_handlers.len())
            .field("arounds", &self.arounds.len())
            .finish()
    }
}

impl<T> Clone for FlexibleAdvice<T> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            preludes: self.preludes.clone(),
            encores: self.encores.clone(),
            error_handlers: self.error_handlers.clone(),
            arounds: self.arounds.clone(),
        }
    }
}

impl<T: 'static> FlexibleAdvice<T> {
    /// Empty advice for `target`.
    pub fn new(target: MemberRef<T>) -> Self {
        Self {
            target,
            preludes: Vec::new(),
            encores: Vec::new(),
            error_handlers: Vec::new(),
            arounds: Vec::new(),
        }
    }

    /// The member this advice applies to.
    pub fn target(&self) -> &MemberRef<T> {
        &self.target
    }

    /// Append a prelude hook.
    pub fn add_prelude<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&MemberRef<T>, &mut T, &Args) -> std::result::Result<(), Fault>
            + Send
            + Sync
            + 'static,
    {
        self.preludes.push(Arc::new(hook));
        self
    }

    /// Append an encore hook.
    pub fn add_encore<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&MemberRef<T>, &mut T, &Value) -> std::result::Result<(), Fault>
            + Send
            + Sync
            + 'static,
    {
        self.encores.push(Arc::new(hook));
        self
    }

    /// Append an error handler.
    pub fn add_error_handler<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&MemberRef<T>, &mut T, &Fault) -> Outcome + Send + Sync + 'static,
    {
        self.error_handlers.push(Arc::new(hook));
        self
    }

    /// Append an around hook. Later hooks nest inside earlier ones.
    pub fn add_around<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&dyn Proceed<T>, &mut T, Args) -> Outcome + Send + Sync + 'static,
    {
        self.arounds.push(Arc::new(hook));
        self
    }

    /// Append every hook `aspect` supplies. Absent hooks contribute nothing.
    pub fn absorb(&mut self, aspect: &Aspect<T>) {
        if let Some(hook) = aspect.prelude() {
            self.preludes.push(Arc::clone(hook));
        }
        if let Some(hook) = aspect.encore() {
            self.encores.push(Arc::clone(hook));
        }
        if let Some(hook) = aspect.error_handling() {
            self.error_handlers.push(Arc::clone(hook));
        }
        if let Some(hook) = aspect.around() {
            self.arounds.push(Arc::clone(hook));
        }
    }

    /// Number of contributions per slot: (preludes, arounds, encores, error handlers).
    pub fn counts(&self) -> (usize, usize, usize, usize) {
        (
            self.preludes.len(),
            self.arounds.len(),
            self.encores.len(),
            self.error_handlers.len(),
        )
    }

    /// Compose the contributions into a single aspect.
    pub fn to_aspect(&self) -> Aspect<T> {
        let preludes: Arc<[PreludeFn<T>]> = self.preludes.clone().into();
        let encores: Arc<[EncoreFn<T>]> = self.encores.clone().into();
        let handlers: Arc<[ErrorHandlerFn<T>]> = self.error_handlers.clone().into();

        let mut aspect = Aspect::new()
            .with_prelude(move |member, ctx, args| {
                preludes.iter().try_for_each(|hook| hook(member, ctx, args))
            })
            .with_encore(move |member, ctx, result| {
                encores.iter().try_for_each(|hook| hook(member, ctx, result))
            })
            .with_error_handler(move |member, ctx, fault| {
                handle_in_order(&handlers, member, ctx, fault)
            });

        if !self.arounds.is_empty() {
            let arounds: Arc<[AroundFn<T>]> = self.arounds.clone().into();
            aspect = aspect.with_around(move |next, ctx, args| {
                Layer {
                    pending: &arounds,
                    innermost: next,
                }
                .proceed(ctx, args)
            });
        }

        aspect
    }

    /// Weave this advice into the class owning its target.
    ///
    /// Fails if the owning class can no longer be determined.
    pub fn apply(&self, weaver: &Weaver<T>) -> Result<()> {
        let owner = self.target.owner()?;
        debug!(member = %self.target, "Applying flexible advice");
        weaver.weave(&owner, AdviceMap::single(self.target.clone(), self.to_aspect()))
    }
}

impl<T: 'static> From<FlexibleAdvice<T>> for Aspect<T> {
    fn from(advice: FlexibleAdvice<T>) -> Self {
        advice.to_aspect()
    }
}

impl<T: 'static> From<&FlexibleAdvice<T>> for Aspect<T> {
    fn from(advice: &FlexibleAdvice<T>) -> Self {
        advice.to_aspect()
    }
}

fn handle_in_order<T>(
    handlers: &[ErrorHandlerFn<T>],
    member: &MemberRef<T>,
    ctx: &mut T,
    fault: &Fault,
) -> Outcome {
    if handlers.is_empty() {
        return Err(fault.clone());
    }

    let mut replacement = Value::Null;
    for handler in handlers {
        replacement = handler(member, ctx, fault)?;
    }
    Ok(replacement)
}

/// One layer of a nested around chain.
///
/// `pending` holds the around hooks not yet entered, outermost first.
struct Layer<'a, T> {
    pending: &'a [AroundFn<T>],
    innermost: &'a dyn Proceed<T>,
}

impl<T> Proceed<T> for Layer<'_, T> {
    fn proceed(&self, context: &mut T, args: Args) -> Outcome {
        match self.pending.split_first() {
            None => self.innermost.proceed(context, args),
            Some((hook, rest)) => {
                let next = Layer {
                    pending: rest,
                    innermost: self.innermost,
                };
                hook(&next, context, args)
            }
        }
    }

    fn member(&self) -> &MemberRef<T> {
        self.innermost.member()
    }
}
