//! Fault injection advice.
//!
//! Fails calls to the advised members with a configurable probability
//! instead of invoking them, raising a fault of a configurable kind. Useful
//! for exercising retry and error-handling advice woven around the same
//! members.
//!
//! ```ignore
//! let lossy = LossyAdvice::new(LossyConfig::new(0.1).with_fault("Unavailable", "backend down"));
//! let sync = account.member("sync")?;
//!
//! weaver.weave(&account, AdviceMap::single(sync.clone(), lossy.aspect()))?;
//! // ...
//! let tally = lossy.stats().tally(&sync);
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use rand::Rng;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::aspect::Aspect;
use crate::class::MemberRef;
use crate::error::{kinds, Fault};

/// How often to fail calls and what to fail them with.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LossyConfig {
    /// Probability of failing a call, 0.0 to 1.0.
    pub failure_rate: f64,
    /// Kind of the injected fault.
    pub fault_kind: String,
    /// Message of the injected fault. Defaults to naming the member.
    pub message: Option<String>,
    /// Whether to log injected failures.
    pub log_failures: bool,
}

impl Default for LossyConfig {
    fn default() -> Self {
        Self {
            failure_rate: 0.0,
            fault_kind: kinds::INJECTED_FAULT.to_string(),
            message: None,
            log_failures: true,
        }
    }
}

impl LossyConfig {
    /// Fail calls with probability `rate`, clamped to 0.0..=1.0.
    pub fn new(rate: f64) -> Self {
        Self {
            failure_rate: rate.clamp(0.0, 1.0),
            ..Self::default()
        }
    }

    /// Inject faults of `kind` carrying `message`.
    pub fn with_fault(mut self, kind: impl Into<String>, message: impl Into<String>) -> Self {
        self.fault_kind = kind.into();
        self.message = Some(message.into());
        self
    }

    pub fn is_lossy(&self) -> bool {
        self.failure_rate > 0.0
    }

    fn fault<T>(&self, member: &MemberRef<T>) -> Fault {
        let message = match &self.message {
            Some(message) => message.clone(),
            None => format!("injected failure in {}", member),
        };
        Fault::new(self.fault_kind.clone(), message)
    }
}

/// Calls seen and failures injected for one member.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemberTally {
    pub calls: u64,
    pub injected: u64,
}

impl MemberTally {
    /// Fraction of calls that were failed.
    pub fn failure_rate(&self) -> f64 {
        if self.calls == 0 {
            0.0
        } else {
            self.injected as f64 / self.calls as f64
        }
    }
}

/// Injection tallies per advised member.
pub struct LossyStats<T> {
    tallies: Mutex<HashMap<MemberRef<T>, MemberTally>>,
}

impl<T> Default for LossyStats<T> {
    fn default() -> Self {
        Self {
            tallies: Mutex::new(HashMap::new()),
        }
    }
}

impl<T> LossyStats<T> {
    fn record(&self, member: &MemberRef<T>, injected: bool) {
        let mut tallies = self.tallies.lock().unwrap_or_else(PoisonError::into_inner);
        let tally = tallies.entry(member.clone()).or_default();
        tally.calls += 1;
        if injected {
            tally.injected += 1;
        }
    }

    /// Tally for `member`; zero if it was never called.
    pub fn tally(&self, member: &MemberRef<T>) -> MemberTally {
        self.tallies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(member)
            .copied()
            .unwrap_or_default()
    }

    /// Sum over every member.
    pub fn total(&self) -> MemberTally {
        self.tallies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .fold(MemberTally::default(), |sum, tally| MemberTally {
                calls: sum.calls + tally.calls,
                injected: sum.injected + tally.injected,
            })
    }

    /// Members that have been called at least once.
    pub fn members(&self) -> Vec<MemberRef<T>> {
        self.tallies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

/// Fault injector whose aspects share one set of per-member tallies.
pub struct LossyAdvice<T> {
    config: LossyConfig,
    stats: Arc<LossyStats<T>>,
}

impl<T> Clone for LossyAdvice<T> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<T: 'static> LossyAdvice<T> {
    pub fn new(config: LossyConfig) -> Self {
        if config.is_lossy() {
            warn!(
                failure_rate = config.failure_rate,
                fault = %config.fault_kind,
                "Fault injection enabled"
            );
        }

        Self {
            config,
            stats: Arc::new(LossyStats::default()),
        }
    }

    pub fn stats(&self) -> &LossyStats<T> {
        &self.stats
    }

    pub fn config(&self) -> &LossyConfig {
        &self.config
    }

    /// Around-only aspect that fails calls per this injector's config.
    pub fn aspect(&self) -> Aspect<T> {
        let config = self.config.clone();
        let stats = Arc::clone(&self.stats);

        Aspect::around_only(move |next, ctx, args| {
            let member = next.member();
            let inject = should_fail(config.failure_rate);
            stats.record(member, inject);

            if inject {
                if config.log_failures {
                    debug!(%member, kind = %config.fault_kind, "Injected fault");
                }
                return Err(config.fault(member));
            }
            next.proceed(ctx, args)
        })
    }
}

fn should_fail(rate: f64) -> bool {
    if rate <= 0.0 {
        return false;
    }
    if rate >= 1.0 {
        return true;
    }
    rand::rng().random::<f64>() < rate
}

/// Aspect failing calls with the configured probability.
///
/// Use [`LossyAdvice`] to read the per-member tallies.
pub fn lossy<T: 'static>(config: LossyConfig) -> Aspect<T> {
    LossyAdvice::new(config).aspect()
}
