//! Pool Conservation Property Tests
//!
//! Random sequences of deposits, withdrawals and swaps. Whatever succeeds or fails, the
//! tokens the pool holds always equal its reserves plus uncollected fees, no tokens are
//! created or destroyed, and a failed operation leaves the pool state untouched.

mod common;

use amm_math::U256;
use common::*;
use position_pool::{AccountId, FungibleToken, PoolState, PositionId};
use proptest::prelude::*;

const FUNDING: u64 = 1_000_000;

#[derive(Debug, Clone)]
enum Op {
    Add { who: usize, amount0: u64, skew_permille: u64 },
    Decrease { who: usize, pick: usize, percent: u64 },
    Remove { who: usize, pick: usize },
    Swap { who: usize, amount: u64, zero_for_one: bool },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..3, 1u64..20_000, 950u64..1_050).prop_map(|(who, amount0, skew_permille)| Op::Add {
            who,
            amount0,
            skew_permille,
        }),
        (0usize..3, 0usize..8, 1u64..=100).prop_map(|(who, pick, percent)| Op::Decrease {
            who,
            pick,
            percent,
        }),
        (0usize..3, 0usize..8).prop_map(|(who, pick)| Op::Remove { who, pick }),
        (0usize..3, 1u64..5_000, any::<bool>()).prop_map(|(who, amount, zero_for_one)| Op::Swap {
            who,
            amount,
            zero_for_one,
        }),
    ]
}

fn accounts() -> [AccountId; 3] {
    [alice(), bob(), carol()]
}

fn pick_position(h: &Harness, owner: AccountId, pick: usize) -> Option<PositionId> {
    let owned = h.ledger.read().tokens_of_owner(owner);
    if owned.is_empty() {
        None
    } else {
        Some(owned[pick % owned.len()])
    }
}

fn apply(h: &mut Harness, op: &Op) -> bool {
    let deadline = h.deadline();
    match *op {
        Op::Add { who, amount0, skew_permille } => {
            let amount0 = tokens(amount0);
            let amount1 = amount0 * U256::from(skew_permille) / U256::from(1_000u16);
            h.pool
                .add_liquidity(accounts()[who], amount0, amount1, U256::zero(), U256::zero(), deadline)
                .is_ok()
        }
        Op::Decrease { who, pick, percent } => {
            let owner = accounts()[who];
            let Some(id) = pick_position(h, owner, pick) else {
                return false;
            };
            let Ok(position) = h.pool.get_position_info(id) else {
                return false;
            };
            let amount0 = position.amount0 * U256::from(percent) / U256::from(100u8);
            let amount1 = position.amount1 * U256::from(percent) / U256::from(100u8);
            h.pool
                .decrease_liquidity(owner, id, amount0, amount1, U256::zero(), U256::zero(), deadline)
                .is_ok()
        }
        Op::Remove { who, pick } => {
            let owner = accounts()[who];
            let Some(id) = pick_position(h, owner, pick) else {
                return false;
            };
            h.pool
                .remove_liquidity(owner, id, U256::zero(), U256::zero(), deadline)
                .is_ok()
        }
        Op::Swap { who, amount, zero_for_one } => {
            let caller = accounts()[who];
            let amount = tokens(amount);
            let result = if zero_for_one {
                h.pool.swap0to1(caller, amount, U256::zero(), deadline)
            } else {
                h.pool.swap1to0(caller, amount, U256::zero(), deadline)
            };
            result.is_ok()
        }
    }
}

fn total_supply(h: &Harness) -> (U256, U256) {
    (h.token0.total_supply(), h.token1.total_supply())
}

fn tracked_total(h: &Harness) -> (U256, U256) {
    let mut total = h.pool.held_balances();
    for account in accounts() {
        total.0 += h.token0.balance_of(account);
        total.1 += h.token1.balance_of(account);
    }
    total
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_holdings_match_accounting(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut h = Harness::new();
        for account in accounts() {
            h.fund(account, FUNDING);
        }
        let supply = total_supply(&h);

        for op in &ops {
            let before: PoolState = h.pool.state().clone();
            let succeeded = apply(&mut h, op);
            if !succeeded {
                prop_assert_eq!(h.pool.state(), &before, "failed {:?} changed state", op);
            }

            let state = h.pool.state();
            let (held0, held1) = h.pool.held_balances();
            prop_assert_eq!(held0, state.reserve0 + state.accumulated_fee0);
            prop_assert_eq!(held1, state.reserve1 + state.accumulated_fee1);
            prop_assert_eq!(tracked_total(&h), supply);
        }
    }

    #[test]
    fn prop_positions_never_exceed_deposits_without_swaps(
        deposits in prop::collection::vec((0usize..3, 1u64..10_000), 1..12),
    ) {
        let mut h = Harness::new();
        for account in accounts() {
            h.fund(account, FUNDING);
        }
        let deadline = h.deadline();

        let mut ids = Vec::new();
        for (who, amount) in &deposits {
            let owner = accounts()[*who];
            let id = h.pool
                .add_liquidity(owner, tokens(*amount), tokens(*amount), U256::zero(), U256::zero(), deadline)
                .unwrap();
            ids.push((owner, id));
        }

        // Without swaps every position comes back exactly
        for (owner, id) in ids {
            let position = h.pool.get_position_info(id).unwrap();
            let returned = h.pool
                .remove_liquidity(owner, id, U256::zero(), U256::zero(), deadline)
                .unwrap();
            prop_assert_eq!(returned, (position.amount0, position.amount1));
        }
        prop_assert_eq!(h.pool.get_balances(), (U256::zero(), U256::zero()));
        for account in accounts() {
            prop_assert_eq!(h.token0.balance_of(account), tokens(FUNDING));
            prop_assert_eq!(h.token1.balance_of(account), tokens(FUNDING));
        }
    }
}
