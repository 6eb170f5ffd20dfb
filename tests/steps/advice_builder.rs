//! AdviceBuilder step definitions.

use std::collections::HashMap;

use asp::{AdviceBuilder, Class, Instance, Outcome, Value, WeaveError, Weaver};
use cucumber::{given, then, when, World};

use super::{resolve, target_class, Target};

/// Test context for advice builder scenarios.
#[derive(Debug, World)]
#[world(init = Self::new)]
pub struct AdviceBuilderWorld {
    weaver: Weaver<Target>,
    classes: HashMap<String, Class<Target>>,
    builder: Option<AdviceBuilder<Target>>,
    applied: Option<Result<(), WeaveError>>,
    instance: Option<Instance<Target>>,
    outcome: Option<Outcome>,
}

impl AdviceBuilderWorld {
    fn new() -> Self {
        Self {
            weaver: Weaver::new(),
            classes: HashMap::new(),
            builder: None,
            applied: None,
            instance: None,
            outcome: None,
        }
    }

    fn extend<F>(&mut self, f: F)
    where
        F: FnOnce(AdviceBuilder<Target>) -> AdviceBuilder<Target>,
    {
        let builder = self.builder.take().expect("no advice builder");
        self.builder = Some(f(builder));
    }

    fn state(&self) -> &Target {
        self.instance.as_ref().expect("no instance").state()
    }
}

// --- Given steps ---

#[given(expr = "a class {string}")]
async fn given_class(world: &mut AdviceBuilderWorld, name: String) {
    let class = target_class(&name);
    world.classes.insert(name, class);
}

#[given("an advice builder")]
async fn given_builder(world: &mut AdviceBuilderWorld) {
    world.builder = Some(AdviceBuilder::new());
}

#[given(expr = "a counting prelude on {string}")]
async fn given_counting_prelude(world: &mut AdviceBuilderWorld, path: String) {
    let target = resolve(&world.classes, &path);
    world.extend(|builder| {
        builder.add_prelude(&target, |_, t: &mut Target, _| {
            t.count += 1;
            Ok(())
        })
    });
}

#[given(expr = "a counting encore on {string}")]
async fn given_counting_encore(world: &mut AdviceBuilderWorld, path: String) {
    let target = resolve(&world.classes, &path);
    world.extend(|builder| {
        builder.add_encore(&target, |_, t: &mut Target, _| {
            t.count += 1;
            Ok(())
        })
    });
}

#[given(expr = "a prelude recording {string} on {string}")]
async fn given_recording_prelude(world: &mut AdviceBuilderWorld, label: String, path: String) {
    let target = resolve(&world.classes, &path);
    world.extend(|builder| {
        builder.add_prelude(&target, move |_, t: &mut Target, _| {
            t.trail.push(label.clone());
            Ok(())
        })
    });
}

#[given(expr = "an around hook adding {int} and doubling on {string}")]
async fn given_around(world: &mut AdviceBuilderWorld, addend: i64, path: String) {
    let target = resolve(&world.classes, &path);
    world.extend(|builder| {
        builder.add_around(&target, move |next, t: &mut Target, args| {
            t.count += addend;
            next.proceed(t, args)?;
            t.count *= 2;
            Ok(Value::from(t.count))
        })
    });
}

#[given(expr = "a counting error handler on {string}")]
async fn given_counting_handler(world: &mut AdviceBuilderWorld, path: String) {
    let target = resolve(&world.classes, &path);
    world.extend(|builder| {
        builder.add_error_handler(&target, |_, t: &mut Target, _| {
            t.handled += 1;
            Ok(Value::Null)
        })
    });
}

#[given("a counting prelude on a member of a dropped class")]
async fn given_dropped_owner(world: &mut AdviceBuilderWorld) {
    let target = target_class("Transient").member("increment_count").unwrap();
    world.extend(|builder| builder.add_prelude(&target, |_, _: &mut Target, _| Ok(())));
}

// --- When steps ---

#[when("the builder is applied")]
async fn when_applied(world: &mut AdviceBuilderWorld) {
    let builder = world.builder.as_ref().expect("no advice builder");
    world.applied = Some(builder.apply(&world.weaver));
}

#[when(expr = "I call {string} on a new {string} instance")]
async fn when_call_new(world: &mut AdviceBuilderWorld, member: String, class: String) {
    if let Some(applied) = &world.applied {
        assert!(applied.is_ok(), "apply failed: {:?}", applied);
    }
    let mut instance = world
        .classes
        .get(&class)
        .unwrap_or_else(|| panic!("unknown class {}", class))
        .instantiate(Target::default());
    world.outcome = Some(instance.call(&member, vec![]));
    world.instance = Some(instance);
}

// --- Then steps ---

#[then(expr = "the instance count is {int}")]
async fn then_count(world: &mut AdviceBuilderWorld, expected: i64) {
    assert_eq!(world.state().count, expected);
}

#[then(expr = "the handled count is {int}")]
async fn then_handled(world: &mut AdviceBuilderWorld, expected: i64) {
    assert_eq!(world.state().handled, expected);
}

#[then(expr = "the recorded trail is {string}")]
async fn then_trail(world: &mut AdviceBuilderWorld, expected: String) {
    assert_eq!(world.state().trail.join(","), expected);
}

#[then("the call succeeds")]
async fn then_succeeds(world: &mut AdviceBuilderWorld) {
    let outcome = world.outcome.as_ref().expect("no call was made");
    assert!(outcome.is_ok(), "call failed: {:?}", outcome);
}

#[then("applying fails because the owner cannot be determined")]
async fn then_unresolved_owner(world: &mut AdviceBuilderWorld) {
    let applied = world.applied.as_ref().expect("builder was not applied");
    assert!(matches!(applied, Err(WeaveError::UnresolvedOwner { .. })));
}
