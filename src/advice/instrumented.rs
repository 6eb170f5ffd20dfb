//! Metrics instrumentation advice.
//!
//! Emits call counters and latencies through the `metrics` facade without
//! touching the advised member. Nothing is recorded unless the application
//! installs a recorder.

use std::time::Instant;

use metrics::{counter, histogram};

use crate::aspect::Aspect;

/// Aspect that records metrics for every call to its member.
///
/// Emits, labelled by `label` and by member (`Class.member`):
/// - `asp_calls_total` - completed calls
/// - `asp_call_errors_total` - failed calls (also labelled by fault kind)
/// - `asp_call_duration_seconds` - call latency, failures included
///
/// # Example
///
/// ```ignore
/// let aspect = advice::instrumented::<Account>("accounts");
/// ```
pub fn instrumented<T: 'static>(label: &'static str) -> Aspect<T> {
    Aspect::around_only(move |next, ctx, args| {
        let member = next.member().to_string();
        let start = Instant::now();

        let result = next.proceed(ctx, args);

        histogram!(
            "asp_call_duration_seconds",
            "member" => member.clone(),
            "label" => label
        )
        .record(start.elapsed().as_secs_f64());

        counter!(
            "asp_calls_total",
            "member" => member.clone(),
            "label" => label
        )
        .increment(1);

        if let Err(ref fault) = result {
            counter!(
                "asp_call_errors_total",
                "member" => member,
                "label" => label,
                "kind" => fault.kind().to_string()
            )
            .increment(1);
        }

        result
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::class::Class;
    use crate::error::Fault;
    use crate::weaver::{AdviceMap, Weaver};

    struct Store;

    fn store_class() -> Class<Store> {
        Class::builder("Store")
            .method("get", |_: &mut Store, args| {
                Ok(args.into_iter().next().unwrap_or(json!(null)))
            })
            .method("put", |_: &mut Store, _| {
                Err(Fault::new("Unavailable", "store offline"))
            })
            .build()
    }

    fn woven_store() -> Class<Store> {
        let class = store_class();
        let weaver = Weaver::new();
        let advice: AdviceMap<Store> = class
            .members()
            .into_iter()
            .map(|member| (member, instrumented("mock")))
            .collect();
        weaver.weave(&class, advice).unwrap();
        // Dropping the weaver leaves the class woven.
        class
    }

    #[test]
    fn test_instrumented_delegates_to_inner() {
        let class = woven_store();
        let mut store = class.instantiate(Store);

        let result = store.call("get", vec![json!("key")]).unwrap();
        assert_eq!(result, json!("key"));
    }

    #[test]
    fn test_instrumented_preserves_errors() {
        let class = woven_store();
        let mut store = class.instantiate(Store);

        let fault = store.call("put", vec![]).unwrap_err();
        assert!(fault.is("Unavailable"));
    }
}
