//! Dispatch behaviors: how a class resolves attribute access.
//!
//! Every class has exactly one active [`Dispatch`]. Unwoven classes use
//! [`DirectDispatch`]; weaving installs a [`WovenDispatch`] that wraps each
//! interceptable member in the advice protocol.

use std::sync::Arc;

use tracing::trace;

use super::AdviceMap;
use crate::aspect::Aspect;
use crate::class::{Args, Attribute, Class, Member, Outcome, Value};
use crate::config::WeaverConfig;
use crate::error::Fault;

/// A callable returned by attribute access, bound to nothing but ready to
/// receive the instance state.
pub type Invocable<T> = Arc<dyn Fn(&mut T, Args) -> Outcome + Send + Sync>;

/// Result of attribute access.
pub enum Resolved<T> {
    /// A data attribute, returned unchanged.
    Value(Value),
    /// A callable attribute, possibly wrapped in advice.
    Callable(Invocable<T>),
}

impl<T> Resolved<T> {
    /// Returns true for callables.
    pub fn is_callable(&self) -> bool {
        matches!(self, Resolved::Callable(_))
    }
}

/// How a class resolves attribute access on its instances.
pub trait Dispatch<T>: Send + Sync {
    /// Resolve `name` on an instance of `class`.
    fn get_attribute(&self, class: &Class<T>, name: &str) -> Result<Resolved<T>, Fault>;

    /// Returns true if this behavior intercepts calls.
    fn is_woven(&self) -> bool {
        false
    }
}

/// The pristine dispatch behavior: attributes are returned as defined.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectDispatch;

impl<T: 'static> Dispatch<T> for DirectDispatch {
    fn get_attribute(&self, class: &Class<T>, name: &str) -> Result<Resolved<T>, Fault> {
        let attribute = class
            .attribute(name)
            .ok_or_else(|| Fault::attribute_error(class.name(), name))?;

        Ok(match attribute {
            Attribute::Constant(value) => Resolved::Value(value.clone()),
            Attribute::Method(f) => Resolved::Callable(Arc::clone(f)),
            Attribute::Function(f) => {
                let f = Arc::clone(f);
                Resolved::Callable(Arc::new(move |_: &mut T, args: Args| f(args)))
            }
        })
    }
}

/// The interception dispatcher installed by weaving.
///
/// Attribute lookup is delegated to the class's saved original behavior.
/// Reserved names and non-callables pass through untouched; every other
/// callable is wrapped so that calls run the advice protocol for the
/// member's class-level identity.
pub(crate) struct WovenDispatch<T> {
    original: Arc<dyn Dispatch<T>>,
    advice: Arc<AdviceMap<T>>,
    identity: Aspect<T>,
    config: WeaverConfig,
}

impl<T: 'static> WovenDispatch<T> {
    pub(crate) fn new(
        original: Arc<dyn Dispatch<T>>,
        advice: Arc<AdviceMap<T>>,
        config: WeaverConfig,
    ) -> Self {
        Self {
            original,
            advice,
            identity: Aspect::identity(),
            config,
        }
    }
}

impl<T: 'static> Dispatch<T> for WovenDispatch<T> {
    fn get_attribute(&self, class: &Class<T>, name: &str) -> Result<Resolved<T>, Fault> {
        let resolved = self.original.get_attribute(class, name)?;

        if self.config.is_reserved(name) || !resolved.is_callable() {
            return Ok(resolved);
        }

        let member = class
            .resolve(name)
            .map_err(|_| Fault::attribute_error(class.name(), name))?;

        let aspect = self
            .advice
            .get(member.reference())
            .cloned()
            .unwrap_or_else(|| self.identity.clone());

        let trace_calls = self.config.trace_calls;
        Ok(Resolved::Callable(Arc::new(move |ctx: &mut T, args: Args| {
            if trace_calls {
                trace!(member = %member.reference(), args = args.len(), "Intercepted call");
            }
            intercept(&member, &aspect, ctx, args)
        })))
    }

    fn is_woven(&self) -> bool {
        true
    }
}

/// Run one call through the advice protocol.
///
/// Prelude, around-or-direct call and encore share one failure boundary;
/// any fault raised there goes to the aspect's error handler when present,
/// and propagates unchanged otherwise.
fn intercept<T>(
    member: &Member<T>,
    aspect: &Aspect<T>,
    ctx: &mut T,
    args: Args,
) -> Outcome {
    match run_hooks(member, aspect, ctx, args) {
        Ok(result) => Ok(result),
        Err(fault) => match aspect.error_handling() {
            Some(handler) => handler(member.reference(), ctx, &fault),
            None => Err(fault),
        },
    }
}

fn run_hooks<T>(member: &Member<T>, aspect: &Aspect<T>, ctx: &mut T, args: Args) -> Outcome {
    let key = member.reference();

    if let Some(prelude) = aspect.prelude() {
        prelude(key, ctx, &args)?;
    }

    let result = match aspect.around() {
        Some(around) => around(member, ctx, args)?,
        None => member.invoke(ctx, args)?,
    };

    if let Some(encore) = aspect.encore() {
        encore(key, ctx, &result)?;
    }

    Ok(result)
}
