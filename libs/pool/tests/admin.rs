//! Admin-gated pool operations and role management

mod common;

use amm_math::U256;
use common::*;
use position_pool::{
    AccessController, AccountId, FungibleToken, InMemoryToken, PoolError, PoolEvent,
};

#[test]
fn test_non_admin_calls_rejected() {
    let mut h = Harness::new();
    h.seed(alice(), 1_000);

    let attempts = [
        h.pool.set_swap_fee(alice(), 10),
        h.pool.set_paused(alice(), true),
        h.pool.set_max_price_deviation(alice(), 20),
        h.pool.set_amplification_parameter(alice(), 500),
        h.pool.collect_fees(alice(), alice()).map(|_| ()),
        h.pool
            .update_access_manager(alice(), AccessController::new(alice()).shared()),
    ];
    for attempt in attempts {
        assert_eq!(attempt, Err(PoolError::CallerNotAdmin(alice())));
    }

    let err = h
        .pool
        .emergency_withdraw(alice(), &*h.token0, alice(), tokens(1))
        .unwrap_err();
    assert_eq!(err.code(), "CallerNotAdmin");

    // Nothing changed
    assert_eq!(h.pool.swap_fee(), 30);
    assert!(!h.pool.paused());
    assert_eq!(h.pool.max_price_deviation(), 50);
    assert_eq!(h.pool.amplification(), 100);

    // The original controller still governs the pool
    assert!(!h.pool.events().contains(&PoolEvent::AccessManagerUpdated { by: alice() }));
    h.pool.set_swap_fee(admin(), 25).unwrap();
}

#[test]
fn test_admin_setters_apply() {
    let mut h = Harness::new();

    h.pool.set_swap_fee(admin(), 4).unwrap();
    h.pool.set_max_price_deviation(admin(), 200).unwrap();
    h.pool.set_amplification_parameter(admin(), 2_000).unwrap();
    h.pool.set_paused(admin(), true).unwrap();

    assert_eq!(h.pool.swap_fee(), 4);
    assert_eq!(h.pool.max_price_deviation(), 200);
    assert_eq!(h.pool.amplification(), 2_000);
    assert!(h.pool.paused());

    assert_eq!(
        h.pool.take_events(),
        vec![
            PoolEvent::SwapFeeUpdated { old_fee_bps: 30, new_fee_bps: 4 },
            PoolEvent::MaxPriceDeviationUpdated { old_permille: 50, new_permille: 200 },
            PoolEvent::AmplificationUpdated { old_value: 100, new_value: 2_000 },
            PoolEvent::PausedSet { paused: true, by: admin() },
        ]
    );
}

#[test]
fn test_setter_bounds() {
    let mut h = Harness::new();

    assert_eq!(h.pool.set_swap_fee(admin(), 101).unwrap_err().code(), "InvalidParameter");
    h.pool.set_swap_fee(admin(), 100).unwrap();
    h.pool.set_swap_fee(admin(), 0).unwrap();

    assert_eq!(h.pool.set_max_price_deviation(admin(), 0).unwrap_err().code(), "InvalidParameter");
    assert_eq!(h.pool.set_max_price_deviation(admin(), 201).unwrap_err().code(), "InvalidParameter");
    h.pool.set_max_price_deviation(admin(), 1).unwrap();

    assert_eq!(
        h.pool.set_amplification_parameter(admin(), 0).unwrap_err().code(),
        "InvalidParameter"
    );
    h.pool.set_amplification_parameter(admin(), 1).unwrap();
}

#[test]
fn test_zero_fee_swaps_accrue_nothing() {
    let mut h = Harness::new();
    h.seed(alice(), 1_000);
    h.pool.set_swap_fee(admin(), 0).unwrap();
    h.fund(bob(), 10);
    let deadline = h.deadline();

    h.pool.swap0to1(bob(), tokens(10), U256::zero(), deadline).unwrap();
    assert_eq!(h.pool.get_accumulated_fees(), (U256::zero(), U256::zero()));
}

#[test]
fn test_granted_admin_gains_and_loses_rights() {
    let mut h = Harness::new();

    h.access.write().grant_admin_role(admin(), carol()).unwrap();
    h.pool.set_swap_fee(carol(), 12).unwrap();
    assert_eq!(h.pool.swap_fee(), 12);

    h.access.write().revoke_admin_role(carol(), carol()).unwrap();
    assert_eq!(
        h.pool.set_swap_fee(carol(), 13),
        Err(PoolError::CallerNotAdmin(carol()))
    );
}

#[test]
fn test_collect_fees_pays_and_zeroes() {
    let mut h = Harness::new();
    h.seed(alice(), 10_000);
    h.fund(bob(), 1_000);
    let deadline = h.deadline();

    h.pool.swap0to1(bob(), tokens(500), U256::zero(), deadline).unwrap();
    h.pool.swap1to0(bob(), tokens(300), U256::zero(), deadline).unwrap();
    let (fee0, fee1) = h.pool.get_accumulated_fees();
    assert!(fee0 > U256::zero() && fee1 > U256::zero());
    let reserves = h.pool.get_balances();

    let collected = h.pool.collect_fees(admin(), carol()).unwrap();
    assert_eq!(collected, (fee0, fee1));
    assert_eq!(h.balances_of(carol()), (fee0, fee1));
    assert_eq!(h.pool.get_accumulated_fees(), (U256::zero(), U256::zero()));
    assert_eq!(h.pool.get_balances(), reserves);
    assert_eq!(h.pool.held_balances(), reserves);

    assert_eq!(
        h.pool.events().last(),
        Some(&PoolEvent::FeesCollected {
            recipient: carol(),
            amount0: fee0,
            amount1: fee1,
        })
    );
}

#[test]
fn test_collect_fees_to_zero_address_rejected() {
    let mut h = Harness::new();
    let err = h.pool.collect_fees(admin(), AccountId::ZERO).unwrap_err();
    assert_eq!(err.code(), "InvalidParameter");
}

#[test]
fn test_emergency_withdraw_bypasses_accounting() {
    let mut h = Harness::new();
    h.seed(alice(), 1_000);
    let reserves = h.pool.get_balances();

    h.pool
        .emergency_withdraw(admin(), &*h.token1, carol(), tokens(400))
        .unwrap();

    assert_eq!(h.pool.get_balances(), reserves);
    assert_eq!(h.token1.balance_of(carol()), tokens(400));
    assert_eq!(h.pool.held_balances(), (tokens(1_000), tokens(600)));

    // Works while paused too
    h.pool.set_paused(admin(), true).unwrap();
    h.pool
        .emergency_withdraw(admin(), &*h.token0, carol(), tokens(1))
        .unwrap();
    assert_eq!(h.token0.balance_of(carol()), tokens(1));
}

#[test]
fn test_emergency_withdraw_recovers_foreign_tokens() {
    let mut h = Harness::new();
    let stray = InMemoryToken::new(AccountId::from_low_u64(0xC0), "STRAY", 6);
    stray.mint(pool_address(), U256::from(5_000_000u64)).unwrap();

    h.pool
        .emergency_withdraw(admin(), &stray, carol(), U256::from(5_000_000u64))
        .unwrap();
    assert_eq!(stray.balance_of(carol()), U256::from(5_000_000u64));
    assert_eq!(
        h.pool.events().last(),
        Some(&PoolEvent::EmergencyWithdrawal {
            token: stray.id(),
            recipient: carol(),
            amount: U256::from(5_000_000u64),
        })
    );

    let err = h
        .pool
        .emergency_withdraw(admin(), &stray, carol(), U256::one())
        .unwrap_err();
    assert_eq!(err.code(), "TransferFailed");
}

#[test]
fn test_access_manager_replacement_moves_control() {
    let mut h = Harness::new();
    let new_root = AccountId::from_low_u64(0x99);
    let replacement = AccessController::new(new_root).shared();

    h.pool
        .update_access_manager(admin(), replacement)
        .unwrap();

    // The old admin is stranded; the new controller's admin is in charge
    assert_eq!(
        h.pool.set_paused(admin(), true),
        Err(PoolError::CallerNotAdmin(admin()))
    );
    h.pool.set_paused(new_root, true).unwrap();
    assert!(h.pool.events().contains(&PoolEvent::AccessManagerUpdated { by: admin() }));
}

#[test]
fn test_amplification_changes_pricing() {
    let mut h = Harness::new();
    h.seed(alice(), 10_000);

    let low = h.pool.quote(tokens(2_000), true).unwrap().amount_out;
    h.pool.set_amplification_parameter(admin(), 5_000).unwrap();
    let high = h.pool.quote(tokens(2_000), true).unwrap().amount_out;

    // A flatter curve gives less slippage on a balanced pool
    assert!(high > low);
}
