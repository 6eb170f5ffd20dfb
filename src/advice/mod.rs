//! Ready-made aspects for common cross-cutting concerns.
//!
//! Every constructor here returns an ordinary [`Aspect`](crate::Aspect) built
//! through the public hook API, so stock advice composes with user advice
//! through [`AdviceBuilder`](crate::AdviceBuilder) like any other aspect.
//!
//! ```ignore
//! let deposit = account.member("deposit")?;
//!
//! AdviceBuilder::new()
//!     .add_advice(&deposit, advice::logging(Level::INFO))
//!     .add_advice(&deposit, advice::instrumented("accounts"))
//!     .add_advice(&deposit, advice::retry(config.retry.clone()))
//!     .apply(&weaver)?;
//! ```
//!
//! # Available Advice
//!
//! - [`logging`] - `tracing` events before, after and on failure of a call
//! - [`instrumented`] - call counters and durations through `metrics`
//! - [`retry`] - re-invokes failed calls with exponential backoff
//! - [`lossy`] - probabilistic fault injection (feature `lossy`)
//! - [`validate`] - rejects calls whose arguments fail a predicate

mod instrumented;
mod logging;
#[cfg(feature = "lossy")]
mod lossy;
mod retry;
mod validation;

pub use instrumented::instrumented;
pub use logging::logging;
#[cfg(feature = "lossy")]
pub use lossy::{lossy, LossyAdvice, LossyConfig, LossyStats, MemberTally};
pub use retry::{retry, RetryConfig};
pub use validation::validate;
