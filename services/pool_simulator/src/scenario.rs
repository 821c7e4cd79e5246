//! Scripted pool session
//!
//! Deploys a pool over two in-memory tokens on a manual clock and plays a fixed
//! script: two providers deposit, a trader swaps back and forth, the admin collects
//! fees and exercises the pause switch, and one provider exits. Expected rejections are
//! recorded rather than aborting the run.

use amm_math::{units, Decimal, U256};
use anyhow::{Context, Result};
use pool_config::PoolConfig;
use position_pool::{
    AccessController, AccessEvent, AccountId, Clock, FungibleToken, InMemoryToken, LedgerEvent,
    LiquidityPool, ManualClock, PoolDeployment, PoolEvent, PoolResult, PoolState, PositionLedger,
    SystemClock,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Seconds between scripted steps
const STEP_SECS: u64 = 15;

/// Deadline slack granted to every scripted call
const DEADLINE_SLACK_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct ScenarioSettings {
    /// Whole tokens each provider deposits on each side
    pub liquidity: u64,
    /// Whole tokens sold per swap
    pub swap_amount: u64,
    /// Number of swaps, alternating direction
    pub swaps: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rejection {
    pub operation: &'static str,
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub config: PoolConfig,
    pub pool_events: Vec<PoolEvent>,
    pub ledger_events: Vec<LedgerEvent>,
    pub access_events: Vec<AccessEvent>,
    pub rejections: Vec<Rejection>,
    pub final_state: PoolState,
    pub final_rate: Decimal,
}

struct Actors {
    admin: AccountId,
    treasury: AccountId,
    alice: AccountId,
    carol: AccountId,
    trader: AccountId,
}

impl Actors {
    fn new() -> Self {
        Self {
            admin: AccountId::from_low_u64(0x01),
            treasury: AccountId::from_low_u64(0x02),
            alice: AccountId::from_low_u64(0x10),
            carol: AccountId::from_low_u64(0x11),
            trader: AccountId::from_low_u64(0x20),
        }
    }
}

/// Play the script against a fresh deployment and return its journal
pub fn run(config: &PoolConfig, settings: &ScenarioSettings) -> Result<SessionReport> {
    let actors = Actors::new();
    let decimals = config.token_decimals;
    let pool_address = AccountId::from_low_u64(0x1000);

    let access = AccessController::new(actors.admin).shared();
    let ledger = PositionLedger::new(access.clone()).shared();
    ledger
        .write()
        .set_pool_authorization(actors.admin, pool_address, true)
        .context("Failed to authorize pool on the position ledger")?;

    let token0 = InMemoryToken::new(AccountId::from_low_u64(0xA0), "USDA", decimals).shared();
    let token1 = InMemoryToken::new(AccountId::from_low_u64(0xB0), "USDB", decimals).shared();
    let clock = ManualClock::new(SystemClock.now());

    let mut pool = LiquidityPool::new(
        PoolDeployment {
            address: pool_address,
            token0: token0.clone(),
            token1: token1.clone(),
            access: access.clone(),
            ledger: ledger.clone(),
            clock: Arc::new(clock.clone()),
        },
        config,
    )
    .context("Failed to deploy pool")?;

    let liquidity = units(settings.liquidity, decimals)?;
    let swap_amount = units(settings.swap_amount, decimals)?;
    let trader_budget = swap_amount
        .checked_mul(U256::from(settings.swaps.max(1)))
        .context("Trader budget overflows")?;

    for (account, amount) in [
        (actors.alice, liquidity),
        (actors.carol, liquidity),
        (actors.trader, trader_budget),
    ] {
        for token in [&token0, &token1] {
            token.mint(account, amount)?;
            token.approve(account, pool_address, U256::MAX)?;
        }
    }

    let deadline = |clock: &ManualClock| clock.now() + DEADLINE_SLACK_SECS;
    let mut rejections = Vec::new();

    // Providers deposit
    let alice_position = pool
        .add_liquidity(actors.alice, liquidity, liquidity, U256::zero(), U256::zero(), deadline(&clock))
        .context("Seed deposit failed")?;
    clock.advance(STEP_SECS);
    pool.add_liquidity(actors.carol, liquidity, liquidity, U256::zero(), U256::zero(), deadline(&clock))
        .context("Second deposit failed")?;

    // Trader alternates direction
    for step in 0..settings.swaps {
        clock.advance(STEP_SECS);
        let zero_for_one = step % 2 == 0;
        let result = if zero_for_one {
            pool.swap0to1(actors.trader, swap_amount, U256::zero(), deadline(&clock))
        } else {
            pool.swap1to0(actors.trader, swap_amount, U256::zero(), deadline(&clock))
        };
        record(&mut rejections, "swap", result);
    }

    // Admin sweeps fees, then checks the pause switch holds
    clock.advance(STEP_SECS);
    record(&mut rejections, "collectFees", pool.collect_fees(actors.admin, actors.treasury));
    record(&mut rejections, "setPaused", pool.set_paused(actors.admin, true));
    record(
        &mut rejections,
        "swap",
        pool.swap0to1(actors.trader, swap_amount, U256::zero(), deadline(&clock)),
    );
    record(&mut rejections, "setPaused", pool.set_paused(actors.admin, false));

    // Stale deadline and unprivileged admin call are both refused
    record(
        &mut rejections,
        "swap",
        pool.swap0to1(actors.trader, swap_amount, U256::zero(), clock.now() - 60),
    );
    record(&mut rejections, "setSwapFee", pool.set_swap_fee(actors.trader, 0));

    // First provider exits
    clock.advance(STEP_SECS);
    record(
        &mut rejections,
        "removeLiquidity",
        pool.remove_liquidity(actors.alice, alice_position, U256::zero(), U256::zero(), deadline(&clock)),
    );

    let (fees_to_treasury0, fees_to_treasury1) = (
        token0.balance_of(actors.treasury),
        token1.balance_of(actors.treasury),
    );
    info!(
        swaps = settings.swaps,
        rejections = rejections.len(),
        %fees_to_treasury0,
        %fees_to_treasury1,
        "Scenario complete"
    );

    let final_rate = pool.get_rate()?;
    let final_state = pool.state().clone();
    let pool_events = pool.take_events();
    let ledger_events = ledger.write().take_events();
    let access_events = access.write().take_events();

    Ok(SessionReport {
        config: config.clone(),
        pool_events,
        ledger_events,
        access_events,
        rejections,
        final_state,
        final_rate,
    })
}

fn record<T>(rejections: &mut Vec<Rejection>, operation: &'static str, result: PoolResult<T>) {
    if let Err(err) = result {
        warn!(operation, code = err.code(), %err, "Operation rejected");
        rejections.push(Rejection {
            operation,
            code: err.code(),
            message: err.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ScenarioSettings {
        ScenarioSettings {
            liquidity: 50_000,
            swap_amount: 100,
            swaps: 4,
        }
    }

    #[test]
    fn test_scenario_records_expected_rejections() {
        let report = run(&PoolConfig::default(), &settings()).unwrap();

        let codes: Vec<_> = report.rejections.iter().map(|r| r.code).collect();
        assert_eq!(codes, vec!["OperationsPaused", "DeadlineExpired", "CallerNotAdmin"]);
    }

    #[test]
    fn test_scenario_journal_shape() {
        let report = run(&PoolConfig::default(), &settings()).unwrap();

        let swaps = report
            .pool_events
            .iter()
            .filter(|event| matches!(event, PoolEvent::Swap { .. }))
            .count();
        assert_eq!(swaps, 4);
        assert!(report
            .pool_events
            .iter()
            .any(|event| matches!(event, PoolEvent::FeesCollected { .. })));
        assert!(report
            .pool_events
            .iter()
            .any(|event| matches!(event, PoolEvent::RemoveLiquidity { .. })));

        // Fees were swept, so nothing is left accrued
        assert!(report.final_state.accumulated_fee0.is_zero());
        assert!(report.final_state.accumulated_fee1.is_zero());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["poolEvents"][0]["event"], "AddLiquidity");
        assert!(json["finalState"]["reserve0"].is_string());
    }
}
