//! Weaver step definitions.

use std::collections::HashMap;

use asp::{AdviceMap, Aspect, Class, Instance, Namespace, Outcome, Weaver};
use cucumber::{given, then, when, World};
use serde_json::json;

use super::{as_int, counting_prelude, resolve, target_class, Target};

/// Test context for weaving scenarios.
#[derive(Debug, World)]
#[world(init = Self::new)]
pub struct WeavingWorld {
    weaver: Weaver<Target>,
    second: Weaver<Target>,
    classes: HashMap<String, Class<Target>>,
    namespace: Option<Namespace<Target>>,
    instance: Option<Instance<Target>>,
    outcome: Option<Outcome>,
}

impl WeavingWorld {
    fn new() -> Self {
        Self {
            weaver: Weaver::new(),
            second: Weaver::new(),
            classes: HashMap::new(),
            namespace: None,
            instance: None,
            outcome: None,
        }
    }

    fn class(&self, name: &str) -> &Class<Target> {
        self.classes
            .get(name)
            .unwrap_or_else(|| panic!("unknown class {}", name))
    }

    fn weave_single(&self, class: &str, member: &str, aspect: Aspect<Target>) {
        let class = self.class(class);
        let member = class.member(member).unwrap();
        self.weaver
            .weave(class, AdviceMap::single(member, aspect))
            .unwrap();
    }

    fn outcome(&self) -> &Outcome {
        self.outcome.as_ref().expect("no call was made")
    }
}

// --- Given steps ---

#[given(expr = "a class {string}")]
async fn given_class(world: &mut WeavingWorld, name: String) {
    let class = target_class(&name);
    world.classes.insert(name, class);
}

#[given(expr = "a {string} instance")]
async fn given_instance(world: &mut WeavingWorld, class: String) {
    world.instance = Some(world.class(&class).instantiate(Target::default()));
}

#[given(expr = "{string} is woven with an empty advice mapping")]
async fn given_woven_empty(world: &mut WeavingWorld, class: String) {
    world
        .weaver
        .weave(world.class(&class), AdviceMap::new())
        .unwrap();
}

#[given(expr = "{string} is woven with a counting prelude on {string}")]
async fn given_woven_counting(world: &mut WeavingWorld, class: String, member: String) {
    world.weave_single(&class, &member, counting_prelude());
}

#[given(expr = "{string} is woven {int} times with a counting prelude on {string}")]
async fn given_woven_repeatedly(world: &mut WeavingWorld, class: String, times: u32, member: String) {
    for _ in 0..times {
        world.weave_single(&class, &member, counting_prelude());
    }
}

#[given(expr = "{string} is woven with a recovering error handler on {string}")]
async fn given_woven_recovering(world: &mut WeavingWorld, class: String, member: String) {
    let aspect = Aspect::error_handler_only(|_, _: &mut Target, _| Ok(json!("recovered")));
    world.weave_single(&class, &member, aspect);
}

#[given(expr = "{string} is woven {int} times with a recovering error handler on {string}")]
async fn given_woven_recovering_repeatedly(
    world: &mut WeavingWorld,
    class: String,
    times: u32,
    member: String,
) {
    for _ in 0..times {
        let aspect = Aspect::error_handler_only(|_, _: &mut Target, _| Ok(json!("recovered")));
        world.weave_single(&class, &member, aspect);
    }
}

#[given(expr = "{string} is woven by a second weaver with an empty advice mapping")]
async fn given_woven_by_second(world: &mut WeavingWorld, class: String) {
    world
        .second
        .weave(world.class(&class), AdviceMap::new())
        .unwrap();
}

#[given(expr = "a namespace containing {string} and {string} with a child namespace containing {string}")]
async fn given_namespace(world: &mut WeavingWorld, first: String, second: String, nested: String) {
    let child = Namespace::new("inner").with_class(nested.clone(), world.class(&nested).clone());
    let namespace = Namespace::new("pkg")
        .with_class(first.clone(), world.class(&first).clone())
        .with_class(second.clone(), world.class(&second).clone())
        .with_namespace(child);
    world.namespace = Some(namespace);
}

// --- When steps ---

#[when(expr = "I call {string} on a new {string} instance")]
async fn when_call_new(world: &mut WeavingWorld, member: String, class: String) {
    let mut instance = world.class(&class).instantiate(Target::default());
    world.outcome = Some(instance.call(&member, vec![]));
    world.instance = Some(instance);
}

#[when(expr = "I call {string} on that instance")]
async fn when_call_existing(world: &mut WeavingWorld, member: String) {
    let instance = world.instance.as_mut().expect("no instance");
    world.outcome = Some(instance.call(&member, vec![]));
}

#[when(expr = "{string} is unwoven")]
async fn when_unwoven(world: &mut WeavingWorld, class: String) {
    assert!(world.weaver.unweave(world.class(&class)).unwrap());
}

#[when(expr = "{string} is unwoven by the second weaver")]
async fn when_unwoven_by_second(world: &mut WeavingWorld, class: String) {
    world.second.unweave(world.class(&class)).unwrap();
}

#[when("every class is unwoven")]
async fn when_all_unwoven(world: &mut WeavingWorld) {
    world.weaver.unweave_all().unwrap();
}

#[when(expr = "the namespace is woven with a counting prelude on {string}")]
async fn when_namespace_woven(world: &mut WeavingWorld, path: String) {
    let member = resolve(&world.classes, &path);
    let namespace = world.namespace.as_ref().expect("no namespace");
    world
        .weaver
        .weave_namespace(namespace, AdviceMap::single(member, counting_prelude()))
        .unwrap();
}

// --- Then steps ---

#[then(expr = "the call returns {int}")]
async fn then_returns_int(world: &mut WeavingWorld, expected: i64) {
    let value = world.outcome().as_ref().unwrap();
    assert_eq!(as_int(value), expected);
}

#[then(expr = "the call returns {string}")]
async fn then_returns_string(world: &mut WeavingWorld, expected: String) {
    assert_eq!(world.outcome().as_ref().unwrap(), &json!(expected));
}

#[then(expr = "the call raises {string}")]
async fn then_raises(world: &mut WeavingWorld, kind: String) {
    let fault = world.outcome().as_ref().unwrap_err();
    assert_eq!(fault.kind(), kind);
}

#[then(expr = "the instance count is {int}")]
async fn then_instance_count(world: &mut WeavingWorld, expected: i64) {
    let instance = world.instance.as_ref().expect("no instance");
    assert_eq!(instance.state().count, expected);
}

#[then(expr = "{string} is woven")]
async fn then_woven(world: &mut WeavingWorld, class: String) {
    assert!(world.weaver.is_woven(world.class(&class)));
}

#[then(expr = "{string} is not woven")]
async fn then_not_woven(world: &mut WeavingWorld, class: String) {
    let class = world.class(&class);
    assert!(!world.weaver.is_woven(class));
    assert!(!class.is_woven());
}
