//! Step definition modules for Cucumber feature tests.

pub mod advice_builder;
pub mod weaving;

use std::collections::HashMap;

use asp::{Aspect, Class, Fault, MemberRef, Value};
use serde_json::json;

/// Receiver state shared by every scenario class.
#[derive(Debug, Default)]
pub struct Target {
    pub count: i64,
    pub handled: i64,
    pub trail: Vec<String>,
}

/// A class with the members the scenarios exercise.
pub fn target_class(name: &str) -> Class<Target> {
    Class::builder(name)
        .method("increment_count", |t: &mut Target, _| {
            t.count += 1;
            Ok(json!(t.count))
        })
        .method("get_count", |t: &mut Target, _| Ok(json!(t.count)))
        .method("raise_exception", |_: &mut Target, _| {
            Err(Fault::new("RuntimeError", "raised on purpose"))
        })
        .method("__peek", |t: &mut Target, _| Ok(json!(t.count)))
        .constant("label", json!("target"))
        .build()
}

/// Prelude that bumps the receiver's count before the call.
pub fn counting_prelude() -> Aspect<Target> {
    Aspect::prelude_only(|_, t: &mut Target, _| {
        t.count += 1;
        Ok(())
    })
}

/// Resolve `"Class.member"` against the scenario's classes.
pub fn resolve(classes: &HashMap<String, Class<Target>>, path: &str) -> MemberRef<Target> {
    let (class, member) = path
        .split_once('.')
        .unwrap_or_else(|| panic!("expected Class.member, got {}", path));
    classes
        .get(class)
        .unwrap_or_else(|| panic!("unknown class {}", class))
        .member(member)
        .unwrap()
}

pub fn as_int(value: &Value) -> i64 {
    value
        .as_i64()
        .unwrap_or_else(|| panic!("expected integer result, got {}", value))
}
