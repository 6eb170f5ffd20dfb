//! The neutral aspect.

use super::Aspect;

/// Aspect resolved for members that have no advice.
///
/// Prelude and encore do nothing, errors are re-raised unchanged and there is
/// deliberately no around hook, so the dispatcher calls the original member
/// directly. A call through the identity aspect is indistinguishable from an
/// unwoven call.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityAspect;

impl<T: 'static> From<IdentityAspect> for Aspect<T> {
    fn from(_: IdentityAspect) -> Self {
        Aspect::new()
            .with_prelude(|_, _, _| Ok(()))
            .with_encore(|_, _, _| Ok(()))
            .with_error_handler(|_, _, fault| Err(fault.clone()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::class::Class;
    use crate::error::Fault;

    struct Unit;

    #[test]
    fn test_identity_has_no_around() {
        let aspect: Aspect<Unit> = IdentityAspect.into();
        assert!(aspect.around().is_none());
        assert!(aspect.prelude().is_some());
        assert!(aspect.encore().is_some());
        assert!(aspect.error_handling().is_some());
    }

    #[test]
    fn test_identity_hooks_are_neutral() {
        let class: Class<Unit> = Class::builder("Unit")
            .method("noop", |_: &mut Unit, _| Ok(json!(null)))
            .build();
        let member = class.member("noop").unwrap();
        let aspect = Aspect::<Unit>::identity();
        let mut ctx = Unit;

        let prelude = aspect.prelude().unwrap();
        assert!(prelude(&member, &mut ctx, &vec![json!(1)]).is_ok());

        let encore = aspect.encore().unwrap();
        assert!(encore(&member, &mut ctx, &json!("result")).is_ok());
    }

    #[test]
    fn test_identity_error_handling_reraises_unchanged() {
        let class: Class<Unit> = Class::builder("Unit")
            .method("noop", |_: &mut Unit, _| Ok(json!(null)))
            .build();
        let member = class.member("noop").unwrap();
        let aspect = Aspect::<Unit>::identity();

        let fault = Fault::new("KeyError", "missing key");
        let handler = aspect.error_handling().unwrap();
        let raised = handler(&member, &mut Unit, &fault).unwrap_err();
        assert_eq!(raised, fault);
    }
}
