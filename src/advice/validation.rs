//! Argument validation advice.

use crate::aspect::Aspect;
use crate::class::Args;
use crate::error::Fault;

/// Prelude-only aspect rejecting calls whose arguments fail `predicate`.
///
/// A rejected call raises a `ValidationError` fault carrying `message`
/// before the member runs; the fault goes through error handling like any
/// other.
pub fn validate<T, P>(predicate: P, message: impl Into<String>) -> Aspect<T>
where
    T: 'static,
    P: Fn(&Args) -> bool + Send + Sync + 'static,
{
    let message = message.into();
    Aspect::prelude_only(move |member, _, args| {
        if predicate(args) {
            Ok(())
        } else {
            Err(Fault::validation(format!("{}: {}", member, message)))
        }
    })
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::class::Class;
    use crate::error::kinds;
    use crate::weaver::{AdviceMap, Weaver};

    #[derive(Default)]
    struct Account {
        balance: i64,
    }

    fn account_class() -> Class<Account> {
        Class::builder("Account")
            .method("deposit", |a: &mut Account, args| {
                a.balance += args.first().and_then(Value::as_i64).unwrap_or(0);
                Ok(json!(a.balance))
            })
            .build()
    }

    fn positive_amount(args: &Args) -> bool {
        args.first().and_then(Value::as_i64).is_some_and(|n| n > 0)
    }

    fn woven() -> Class<Account> {
        let class = account_class();
        let aspect = validate(positive_amount, "amount must be positive");
        Weaver::new()
            .weave(
                &class,
                AdviceMap::single(class.member("deposit").unwrap(), aspect),
            )
            .unwrap();
        class
    }

    #[test]
    fn test_valid_arguments_pass() {
        let class = woven();
        let mut account = class.instantiate(Account::default());
        assert_eq!(account.call("deposit", vec![json!(5)]).unwrap(), json!(5));
    }

    #[test]
    fn test_invalid_arguments_rejected_before_call() {
        let class = woven();
        let mut account = class.instantiate(Account::default());

        let fault = account.call("deposit", vec![json!(-5)]).unwrap_err();

        assert!(fault.is(kinds::VALIDATION_ERROR));
        assert_eq!(
            fault.message(),
            "Account.deposit: amount must be positive"
        );
        assert_eq!(account.state().balance, 0);
    }
}
