//! asp - aspect-oriented interception for object methods.
//!
//! Cross-cutting behavior (logging, auditing, retries, fault injection,
//! validation) is written once as an [`Aspect`] and attached to class
//! members at runtime, without editing the members themselves.
//!
//! - [`class`]: classes, members and the instance proxies calls go through
//! - [`aspect`]: the four-hook aspect model and composed flexible advice
//! - [`builder`]: fluent accumulation of advice from many call sites
//! - [`weaver`]: installing and exactly restoring interception per class
//! - [`advice`]: ready-made aspects for common concerns
//!
//! # Example
//!
//! ```ignore
//! let weaver = Weaver::new();
//! let deposit = account.member("deposit")?;
//!
//! AdviceBuilder::new()
//!     .add_prelude(&deposit, |member, _, args| {
//!         info!(%member, ?args, "depositing");
//!         Ok(())
//!     })
//!     .apply(&weaver)?;
//!
//! account.instantiate(Account::default()).call("deposit", vec![json!(5)])?;
//! weaver.unweave(&account)?;
//! ```

pub mod advice;
pub mod aspect;
pub mod builder;
pub mod class;
pub mod config;
pub mod error;
pub mod namespace;
pub mod utils;
pub mod weaver;

pub use aspect::{Aspect, FlexibleAdvice, IdentityAspect};
pub use builder::AdviceBuilder;
pub use class::{Args, Class, Instance, MemberRef, Outcome, Proceed, Value};
pub use config::{Config, WeaverConfig};
pub use error::{Fault, WeaveError};
pub use namespace::Namespace;
pub use weaver::{AdviceMap, Weaver};
