//! Logging advice.

use tracing::{debug, error, info, trace, warn, Level};

use crate::aspect::Aspect;

macro_rules! event_at {
    ($level:expr, $($arg:tt)+) => {
        if $level == Level::ERROR {
            error!($($arg)+)
        } else if $level == Level::WARN {
            warn!($($arg)+)
        } else if $level == Level::INFO {
            info!($($arg)+)
        } else if $level == Level::DEBUG {
            debug!($($arg)+)
        } else {
            trace!($($arg)+)
        }
    };
}

/// Aspect that logs each call to its member.
///
/// Calls and results are logged at `level`. Failures are always logged at
/// `WARN` and passed on unchanged, so error handlers registered alongside
/// still see them.
pub fn logging<T: 'static>(level: Level) -> Aspect<T> {
    Aspect::around_only(move |next, ctx, args| {
        let member = next.member().clone();
        event_at!(level, member = %member, args = args.len(), "Calling");

        let result = next.proceed(ctx, args);
        match &result {
            Ok(value) => event_at!(level, member = %member, result = %value, "Returned"),
            Err(fault) => {
                warn!(member = %member, kind = fault.kind(), error = %fault, "Call failed")
            }
        }
        result
    })
}
