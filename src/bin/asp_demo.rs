//! asp-demo: weave advice into a small account model
//!
//! Defines an `Account` class, weaves logging, validation, retry and error
//! handling advice into it through the advice builder, makes a few calls and
//! then unweaves, showing that the class is back to its original behavior.
//!
//! ## Configuration
//! - weaver.trace_calls: trace every intercepted call (default: false)
//! - retry.max_times: retries for the flaky `sync` member (default: 3)
//!
//! Run with `ASP_LOG=debug` to see the weaver's own events.

use clap::Parser;
use serde_json::{json, Value};
use tracing::{error, info, Level};

use asp::advice;
use asp::config::Config;
use asp::utils::bootstrap::init_tracing;
use asp::{AdviceBuilder, Class, Fault, Weaver};

/// Weave advice into a small account model.
#[derive(Parser, Debug)]
#[command(name = "asp-demo", version, about)]
struct Cli {
    /// Configuration file (YAML)
    #[arg(short, long)]
    config: Option<String>,
}

#[derive(Debug, Default)]
struct Account {
    balance: i64,
    sync_attempts: u32,
}

fn amount(args: &[Value]) -> i64 {
    args.first().and_then(Value::as_i64).unwrap_or(0)
}

fn account_class() -> Class<Account> {
    Class::builder("Account")
        .method("deposit", |acct: &mut Account, args| {
            acct.balance += amount(&args);
            Ok(json!(acct.balance))
        })
        .method("withdraw", |acct: &mut Account, args| {
            let requested = amount(&args);
            if requested > acct.balance {
                return Err(Fault::new(
                    "Overdrawn",
                    format!("balance {} < {}", acct.balance, requested),
                ));
            }
            acct.balance -= requested;
            Ok(json!(acct.balance))
        })
        .method("sync", |acct: &mut Account, _| {
            acct.sync_attempts += 1;
            if acct.sync_attempts < 3 {
                return Err(Fault::new("Unavailable", "ledger offline"));
            }
            Ok(json!("synced"))
        })
        .constant("currency", json!("EUR"))
        .build()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    let config = Config::load(cli.config.as_deref()).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    let account = account_class();
    let weaver = Weaver::with_config(config.weaver.clone());

    let deposit = account.member("deposit")?;
    let withdraw = account.member("withdraw")?;
    let sync = account.member("sync")?;

    AdviceBuilder::new()
        .add_advice(&deposit, advice::logging(Level::INFO))
        .add_advice(
            &deposit,
            advice::validate(|args| amount(args) > 0, "deposit must be positive"),
        )
        .add_advice(&withdraw, advice::logging(Level::INFO))
        .add_error_handler(&withdraw, |member, acct: &mut Account, fault| {
            if fault.is("Overdrawn") {
                info!(%member, %fault, "Refused withdrawal");
                Ok(json!(acct.balance))
            } else {
                Err(fault.clone())
            }
        })
        .add_advice(&sync, advice::retry(config.retry.clone().retry_on(["Unavailable"])))
        .add_advice(&sync, advice::instrumented("demo"))
        .apply(&weaver)?;

    info!(woven = weaver.woven_classes().len(), "Advice applied");

    let mut acct = account.instantiate(Account::default());
    info!(result = %acct.call("deposit", vec![json!(100)])?, "deposit 100");
    info!(result = %acct.call("withdraw", vec![json!(250)])?, "withdraw 250");

    match acct.call("deposit", vec![json!(-5)]) {
        Ok(result) => info!(%result, "deposit -5"),
        Err(fault) => info!(%fault, "deposit -5 rejected"),
    }

    match acct.call("sync", vec![]) {
        Ok(result) => info!(%result, attempts = acct.state().sync_attempts, "sync"),
        Err(fault) => error!(%fault, attempts = acct.state().sync_attempts, "sync failed"),
    }

    weaver.unweave(&account)?;
    info!("Unwove Account");

    match acct.call("withdraw", vec![json!(250)]) {
        Ok(result) => info!(%result, "withdraw 250"),
        Err(fault) => info!(%fault, "withdraw 250 raised without advice"),
    }

    info!(state = ?acct.state(), "Final account state");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_config_flag() {
        let cli = Cli::try_parse_from(["asp-demo", "--config", "asp.yaml"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some("asp.yaml"));

        let cli = Cli::try_parse_from(["asp-demo", "-c", "other.yaml"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some("other.yaml"));
    }

    #[test]
    fn test_cli_without_config() {
        let cli = Cli::try_parse_from(["asp-demo"]).unwrap();
        assert_eq!(cli.config, None);
    }

    #[test]
    fn test_unwoven_withdraw_raises_overdrawn() {
        let mut acct = account_class().instantiate(Account::default());
        let fault = acct.call("withdraw", vec![json!(1)]).unwrap_err();
        assert!(fault.is("Overdrawn"));
    }
}
