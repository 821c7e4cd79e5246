//! Liquidity Pool Engine
//!
//! Owns the reserves, fee accumulators and parameters of one two-asset StableSwap pool
//! and drives the position ledger for every liquidity change.
//!
//! ## Operation Shape
//!
//! ```text
//! guards (deadline, pause, role) → sizing with the invariant math → token dry runs
//!   → state effects + ledger effects → token settlement → event
//! ```
//!
//! Every mutator takes `&mut self`, so a token callback can never re-enter the pool
//! mid-operation. Settlement runs last; if a token refuses a movement that passed its
//! dry run, the pool restores its state checkpoint and the ledger checkpoint and refunds
//! whatever it already pulled, so the operation still aborts as a whole.

use amm_math::{
    to_decimal, AmmPool, Decimal, MathError, ReservePricing, StableSwapMath, SwapQuote, U256,
};
use pool_config::{
    PoolConfig, MAX_DEADLINE_WINDOW_SECS, MAX_PRICE_DEVIATION_PERMILLE, MAX_SWAP_FEE_BPS,
    MIN_PRICE_DEVIATION_PERMILLE,
};
use tracing::{debug, error, info, warn};

use crate::access::SharedAccess;
use crate::clock::SharedClock;
use crate::error::{PoolError, PoolResult};
use crate::events::PoolEvent;
use crate::ledger::{LedgerCheckpoint, LedgerError, Position, SharedLedger};
use crate::state::PoolState;
use crate::token::{FungibleToken, SharedToken, TokenError};
use crate::types::{AccountId, PositionId, TokenId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Token0,
    Token1,
}

/// A planned token movement between the pool and an account
#[derive(Debug, Clone, Copy)]
enum Movement {
    Pull {
        side: Side,
        from: AccountId,
        amount: U256,
    },
    Push {
        side: Side,
        to: AccountId,
        amount: U256,
    },
}

/// Collaborators a pool is deployed with
pub struct PoolDeployment {
    pub address: AccountId,
    pub token0: SharedToken,
    pub token1: SharedToken,
    pub access: SharedAccess,
    pub ledger: SharedLedger,
    pub clock: SharedClock,
}

pub struct LiquidityPool {
    address: AccountId,
    token0: SharedToken,
    token1: SharedToken,
    decimals: u8,
    state: PoolState,
    access: SharedAccess,
    ledger: SharedLedger,
    clock: SharedClock,
    events: Vec<PoolEvent>,
}

impl LiquidityPool {
    /// Deploy an empty pool
    ///
    /// The pool still needs the ledger admin to authorize its address before liquidity
    /// can be added.
    pub fn new(deployment: PoolDeployment, config: &PoolConfig) -> PoolResult<Self> {
        config
            .validate()
            .map_err(|err| PoolError::invalid("config", err.to_string()))?;
        if deployment.address.is_zero() {
            return Err(PoolError::invalid("address", "pool address must be non-zero"));
        }
        if deployment.token0.id() == deployment.token1.id() {
            return Err(PoolError::invalid("tokens", "pool tokens must differ"));
        }
        for token in [&deployment.token0, &deployment.token1] {
            if token.decimals() != config.token_decimals {
                warn!(
                    token = %token.id(),
                    decimals = token.decimals(),
                    configured = config.token_decimals,
                    "Token decimals differ from configuration"
                );
            }
        }

        info!(
            pool = %deployment.address,
            token0 = %deployment.token0.id(),
            token1 = %deployment.token1.id(),
            fee_bps = config.swap_fee_bps,
            amplification = config.amplification,
            "Liquidity pool deployed"
        );

        Ok(Self {
            address: deployment.address,
            token0: deployment.token0,
            token1: deployment.token1,
            decimals: config.token_decimals,
            state: PoolState::new(config),
            access: deployment.access,
            ledger: deployment.ledger,
            clock: deployment.clock,
            events: Vec::new(),
        })
    }

    // ---------------------------------------------------------------------
    // Liquidity
    // ---------------------------------------------------------------------

    /// Deposit both tokens and mint a new position owned by `caller`
    ///
    /// Against a non-empty pool the deposit must sit within the price-deviation limit of
    /// the reserve ratio; the side above the ratio is scaled down before the minimum
    /// check, and only the scaled amounts are pulled.
    pub fn add_liquidity(
        &mut self,
        caller: AccountId,
        amount0: U256,
        amount1: U256,
        min_amount0: U256,
        min_amount1: U256,
        deadline: u64,
    ) -> PoolResult<PositionId> {
        self.guard(deadline)?;
        self.ensure_authorized()?;
        let (used0, used1) = self.size_deposit(amount0, amount1, min_amount0, min_amount1)?;

        let moves = [
            Movement::Pull { side: Side::Token0, from: caller, amount: used0 },
            Movement::Pull { side: Side::Token1, from: caller, amount: used1 },
        ];
        self.preflight(&moves)?;

        let reserve0 = checked_add(self.state.reserve0, used0, "add: reserve0")?;
        let reserve1 = checked_add(self.state.reserve1, used1, "add: reserve1")?;

        let snapshot = self.state.clone();
        let checkpoint = self.ledger.read().checkpoint(None);
        self.state.reserve0 = reserve0;
        self.state.reserve1 = reserve1;

        let now = self.clock.now();
        let minted = self
            .ledger
            .write()
            .mint(self.address, caller, self.tokens(), (used0, used1), now);
        let token_id = match minted {
            Ok(token_id) => token_id,
            Err(err) => {
                self.state = snapshot;
                return Err(err.into());
            }
        };

        self.settle(&moves, snapshot, Some(checkpoint))?;

        self.events.push(PoolEvent::AddLiquidity {
            owner: caller,
            token_id,
            amount0: used0,
            amount1: used1,
        });
        info!(
            pool = %self.address,
            owner = %caller,
            %token_id,
            amount0 = %self.human(used0),
            amount1 = %self.human(used1),
            "Liquidity added"
        );
        Ok(token_id)
    }

    /// Deposit more into an existing position
    ///
    /// The caller must own the position or be approved for it, and pays for the
    /// deposit. Returns the amounts actually pulled.
    #[allow(clippy::too_many_arguments)]
    pub fn increase_liquidity(
        &mut self,
        caller: AccountId,
        token_id: PositionId,
        amount0: U256,
        amount1: U256,
        min_amount0: U256,
        min_amount1: U256,
        deadline: u64,
    ) -> PoolResult<(U256, U256)> {
        self.guard(deadline)?;
        self.ensure_authorized()?;
        let position = self.position_for(token_id)?;
        if !self.ledger.read().is_approved_or_owner(caller, token_id)? {
            return Err(PoolError::NotPositionOwner { caller, token_id });
        }
        let (used0, used1) = self.size_deposit(amount0, amount1, min_amount0, min_amount1)?;

        let moves = [
            Movement::Pull { side: Side::Token0, from: caller, amount: used0 },
            Movement::Pull { side: Side::Token1, from: caller, amount: used1 },
        ];
        self.preflight(&moves)?;

        let reserve0 = checked_add(self.state.reserve0, used0, "increase: reserve0")?;
        let reserve1 = checked_add(self.state.reserve1, used1, "increase: reserve1")?;
        let position0 = checked_add(position.amount0, used0, "increase: position0")?;
        let position1 = checked_add(position.amount1, used1, "increase: position1")?;

        let snapshot = self.state.clone();
        let checkpoint = self.ledger.read().checkpoint(Some(token_id));
        self.state.reserve0 = reserve0;
        self.state.reserve1 = reserve1;
        self.update_position(token_id, position0, position1, &snapshot)?;

        self.settle(&moves, snapshot, Some(checkpoint))?;

        self.events.push(PoolEvent::IncreaseLiquidity {
            token_id,
            amount0: used0,
            amount1: used1,
        });
        info!(
            pool = %self.address,
            %caller,
            %token_id,
            amount0 = %self.human(used0),
            amount1 = %self.human(used1),
            "Liquidity increased"
        );
        Ok((used0, used1))
    }

    /// Withdraw part of a position to its owner
    ///
    /// Requested amounts are capped at what the position holds. Returns the amounts
    /// paid out.
    #[allow(clippy::too_many_arguments)]
    pub fn decrease_liquidity(
        &mut self,
        caller: AccountId,
        token_id: PositionId,
        amount0: U256,
        amount1: U256,
        min_amount0: U256,
        min_amount1: U256,
        deadline: u64,
    ) -> PoolResult<(U256, U256)> {
        self.guard(deadline)?;
        self.ensure_authorized()?;
        let position = self.owned_position(caller, token_id)?;

        let out0 = amount0.min(position.amount0);
        let out1 = amount1.min(position.amount1);
        if out0.is_zero() && out1.is_zero() {
            return Err(PoolError::invalid("amounts", "nothing to withdraw"));
        }
        if ReservePricing::exceeds_deviation(
            out0,
            out1,
            self.state.reserve0,
            self.state.reserve1,
            self.state.max_price_deviation_permille,
        )? {
            debug!(%token_id, %out0, %out1, "Withdrawal ratio rejected");
            return Err(PoolError::PriceDeviationTooHigh {
                max_permille: self.state.max_price_deviation_permille,
            });
        }
        check_minimums(out0, out1, min_amount0, min_amount1)?;
        self.check_reserves(out0, out1)?;

        let moves = [
            Movement::Push { side: Side::Token0, to: caller, amount: out0 },
            Movement::Push { side: Side::Token1, to: caller, amount: out1 },
        ];
        self.preflight(&moves)?;

        let snapshot = self.state.clone();
        let checkpoint = self.ledger.read().checkpoint(Some(token_id));
        self.state.reserve0 -= out0;
        self.state.reserve1 -= out1;
        self.update_position(
            token_id,
            position.amount0 - out0,
            position.amount1 - out1,
            &snapshot,
        )?;

        self.settle(&moves, snapshot, Some(checkpoint))?;

        self.events.push(PoolEvent::DecreaseLiquidity {
            token_id,
            amount0: out0,
            amount1: out1,
        });
        info!(
            pool = %self.address,
            owner = %caller,
            %token_id,
            amount0 = %self.human(out0),
            amount1 = %self.human(out1),
            "Liquidity decreased"
        );
        Ok((out0, out1))
    }

    /// Pay out a whole position to its owner and burn it
    pub fn remove_liquidity(
        &mut self,
        caller: AccountId,
        token_id: PositionId,
        min_amount0: U256,
        min_amount1: U256,
        deadline: u64,
    ) -> PoolResult<(U256, U256)> {
        self.guard(deadline)?;
        self.ensure_authorized()?;
        let position = self.owned_position(caller, token_id)?;
        let (out0, out1) = (position.amount0, position.amount1);

        check_minimums(out0, out1, min_amount0, min_amount1)?;
        self.check_reserves(out0, out1)?;

        let moves = [
            Movement::Push { side: Side::Token0, to: caller, amount: out0 },
            Movement::Push { side: Side::Token1, to: caller, amount: out1 },
        ];
        self.preflight(&moves)?;

        let snapshot = self.state.clone();
        let checkpoint = self.ledger.read().checkpoint(Some(token_id));
        self.state.reserve0 -= out0;
        self.state.reserve1 -= out1;
        let burnt = self.ledger.write().burn(self.address, token_id);
        if let Err(err) = burnt {
            self.state = snapshot;
            return Err(err.into());
        }

        self.settle(&moves, snapshot, Some(checkpoint))?;

        self.events.push(PoolEvent::RemoveLiquidity {
            token_id,
            amount0: out0,
            amount1: out1,
        });
        info!(
            pool = %self.address,
            owner = %caller,
            %token_id,
            amount0 = %self.human(out0),
            amount1 = %self.human(out1),
            "Liquidity removed"
        );
        Ok((out0, out1))
    }

    // ---------------------------------------------------------------------
    // Swaps
    // ---------------------------------------------------------------------

    /// Sell exactly `amount_in` of token0 for token1
    pub fn swap0to1(
        &mut self,
        caller: AccountId,
        amount_in: U256,
        min_amount_out: U256,
        deadline: u64,
    ) -> PoolResult<U256> {
        self.swap(caller, amount_in, min_amount_out, deadline, true)
    }

    /// Sell exactly `amount_in` of token1 for token0
    pub fn swap1to0(
        &mut self,
        caller: AccountId,
        amount_in: U256,
        min_amount_out: U256,
        deadline: u64,
    ) -> PoolResult<U256> {
        self.swap(caller, amount_in, min_amount_out, deadline, false)
    }

    fn swap(
        &mut self,
        caller: AccountId,
        amount_in: U256,
        min_amount_out: U256,
        deadline: u64,
        zero_for_one: bool,
    ) -> PoolResult<U256> {
        self.guard(deadline)?;
        if amount_in.is_zero() {
            return Err(PoolError::invalid("amountIn", "swap input must be non-zero"));
        }

        let quote = self.state.curve().quote(amount_in, zero_for_one)?;
        if quote.amount_out < min_amount_out {
            debug!(amount_out = %quote.amount_out, %min_amount_out, "Swap output below minimum");
            return Err(PoolError::OutputBelowMinimum {
                amount_out: quote.amount_out,
                min_amount_out,
            });
        }
        if quote.amount_out.is_zero() {
            return Err(PoolError::invalid("amountIn", "swap output rounds to zero"));
        }

        let (side_in, side_out) = if zero_for_one {
            (Side::Token0, Side::Token1)
        } else {
            (Side::Token1, Side::Token0)
        };
        let moves = [
            Movement::Pull { side: side_in, from: caller, amount: amount_in },
            Movement::Push { side: side_out, to: caller, amount: quote.amount_out },
        ];
        self.preflight(&moves)?;

        let snapshot = self.state.clone();
        self.apply_swap(&quote, zero_for_one)?;
        self.settle(&moves, snapshot, None)?;

        self.events.push(PoolEvent::Swap {
            caller,
            amount_in,
            amount_out: quote.amount_out,
            zero_for_one,
        });
        info!(
            pool = %self.address,
            %caller,
            zero_for_one,
            amount_in = %self.human(amount_in),
            amount_out = %self.human(quote.amount_out),
            fee = %self.human(quote.fee),
            "Swap executed"
        );
        Ok(quote.amount_out)
    }

    fn apply_swap(&mut self, quote: &SwapQuote, zero_for_one: bool) -> PoolResult<()> {
        let state = &mut self.state;
        let (reserve_in, reserve_out, fee_in) = if zero_for_one {
            (&mut state.reserve0, &mut state.reserve1, &mut state.accumulated_fee0)
        } else {
            (&mut state.reserve1, &mut state.reserve0, &mut state.accumulated_fee1)
        };

        let new_in = checked_add(*reserve_in, quote.net_amount_in, "swap: reserve in")?;
        let new_out = reserve_out
            .checked_sub(quote.amount_out)
            .ok_or(MathError::Underflow { context: "swap: reserve out" })?;
        let new_fee = checked_add(*fee_in, quote.fee, "swap: fee accumulator")?;

        *reserve_in = new_in;
        *reserve_out = new_out;
        *fee_in = new_fee;
        Ok(())
    }

    /// Output of swapping `amount_in` against arbitrary balances with this pool's
    /// amplification and fee
    pub fn calculate_swap_output(
        &self,
        balance0: U256,
        balance1: U256,
        amount_in: U256,
        zero_for_one: bool,
    ) -> PoolResult<U256> {
        let quote = StableSwapMath::calculate_swap_output(
            balance0,
            balance1,
            amount_in,
            zero_for_one,
            self.state.amplification_coefficient,
            self.state.swap_fee_bps,
        )?;
        Ok(quote.amount_out)
    }

    // ---------------------------------------------------------------------
    // Views
    // ---------------------------------------------------------------------

    pub fn get_balances(&self) -> (U256, U256) {
        (self.state.reserve0, self.state.reserve1)
    }

    /// `reserve1 / reserve0`, zero for an empty pool
    pub fn get_rate(&self) -> PoolResult<Decimal> {
        Ok(self.state.curve().rate()?)
    }

    pub fn get_accumulated_fees(&self) -> (U256, U256) {
        (self.state.accumulated_fee0, self.state.accumulated_fee1)
    }

    pub fn get_position_info(&self, token_id: PositionId) -> PoolResult<Position> {
        self.position_for(token_id)
    }

    pub fn swap_fee(&self) -> u16 {
        self.state.swap_fee_bps
    }

    pub fn max_price_deviation(&self) -> u16 {
        self.state.max_price_deviation_permille
    }

    pub fn paused(&self) -> bool {
        self.state.paused
    }

    pub fn amplification(&self) -> u64 {
        self.state.amplification_coefficient
    }

    /// Preview a swap against the live reserves
    pub fn quote(&self, amount_in: U256, zero_for_one: bool) -> PoolResult<SwapQuote> {
        Ok(self.state.curve().quote(amount_in, zero_for_one)?)
    }

    /// Current invariant `D`, zero for an empty pool
    pub fn invariant(&self) -> PoolResult<U256> {
        if self.state.is_empty() {
            return Ok(U256::zero());
        }
        Ok(self.state.curve().invariant()?)
    }

    pub fn address(&self) -> AccountId {
        self.address
    }

    pub fn tokens(&self) -> (TokenId, TokenId) {
        (self.token0.id(), self.token1.id())
    }

    pub fn state(&self) -> &PoolState {
        &self.state
    }

    /// What the token ledgers say the pool actually holds
    pub fn held_balances(&self) -> (U256, U256) {
        (
            self.token0.balance_of(self.address),
            self.token1.balance_of(self.address),
        )
    }

    pub fn events(&self) -> &[PoolEvent] {
        &self.events
    }

    /// Drain the event journal
    pub fn take_events(&mut self) -> Vec<PoolEvent> {
        std::mem::take(&mut self.events)
    }

    // ---------------------------------------------------------------------
    // Administration
    // ---------------------------------------------------------------------

    pub fn set_swap_fee(&mut self, caller: AccountId, fee_bps: u16) -> PoolResult<()> {
        self.require_admin(caller)?;
        if fee_bps > MAX_SWAP_FEE_BPS {
            return Err(PoolError::invalid(
                "swapFeeBps",
                format!("{} exceeds maximum {}", fee_bps, MAX_SWAP_FEE_BPS),
            ));
        }
        let old_fee_bps = std::mem::replace(&mut self.state.swap_fee_bps, fee_bps);
        self.events.push(PoolEvent::SwapFeeUpdated {
            old_fee_bps,
            new_fee_bps: fee_bps,
        });
        info!(pool = %self.address, by = %caller, old_fee_bps, fee_bps, "Swap fee updated");
        Ok(())
    }

    pub fn set_max_price_deviation(&mut self, caller: AccountId, permille: u16) -> PoolResult<()> {
        self.require_admin(caller)?;
        if !(MIN_PRICE_DEVIATION_PERMILLE..=MAX_PRICE_DEVIATION_PERMILLE).contains(&permille) {
            return Err(PoolError::invalid(
                "maxPriceDeviationPermille",
                format!(
                    "{} outside [{}, {}]",
                    permille, MIN_PRICE_DEVIATION_PERMILLE, MAX_PRICE_DEVIATION_PERMILLE
                ),
            ));
        }
        let old_permille =
            std::mem::replace(&mut self.state.max_price_deviation_permille, permille);
        self.events.push(PoolEvent::MaxPriceDeviationUpdated {
            old_permille,
            new_permille: permille,
        });
        info!(pool = %self.address, by = %caller, old_permille, permille, "Max price deviation updated");
        Ok(())
    }

    pub fn set_amplification_parameter(&mut self, caller: AccountId, amplification: u64) -> PoolResult<()> {
        self.require_admin(caller)?;
        if amplification == 0 {
            return Err(PoolError::invalid("amplification", "must be positive"));
        }
        let old_value =
            std::mem::replace(&mut self.state.amplification_coefficient, amplification);
        self.events.push(PoolEvent::AmplificationUpdated {
            old_value,
            new_value: amplification,
        });
        info!(pool = %self.address, by = %caller, old_value, amplification, "Amplification updated");
        Ok(())
    }

    /// Pausing blocks liquidity changes and swaps; reserves are left untouched
    pub fn set_paused(&mut self, caller: AccountId, paused: bool) -> PoolResult<()> {
        self.require_admin(caller)?;
        self.state.paused = paused;
        self.events.push(PoolEvent::PausedSet { paused, by: caller });
        if paused {
            warn!(pool = %self.address, by = %caller, "Pool paused");
        } else {
            info!(pool = %self.address, by = %caller, "Pool unpaused");
        }
        Ok(())
    }

    /// Point admin checks at a different access controller
    ///
    /// If `caller` holds no admin role in the new controller, admin control of this pool
    /// passes entirely to the new controller's admins.
    pub fn update_access_manager(&mut self, caller: AccountId, access: SharedAccess) -> PoolResult<()> {
        self.require_admin(caller)?;
        if !access.read().is_admin(caller) {
            warn!(pool = %self.address, by = %caller, "New access manager does not list the caller as admin");
        }
        self.access = access;
        self.events.push(PoolEvent::AccessManagerUpdated { by: caller });
        info!(pool = %self.address, by = %caller, "Access manager updated");
        Ok(())
    }

    /// Send all accumulated swap fees to `recipient` and zero the accumulators
    pub fn collect_fees(&mut self, caller: AccountId, recipient: AccountId) -> PoolResult<(U256, U256)> {
        self.require_admin(caller)?;
        if recipient.is_zero() {
            return Err(PoolError::invalid("recipient", "must be non-zero"));
        }
        let (fee0, fee1) = self.get_accumulated_fees();

        let moves = [
            Movement::Push { side: Side::Token0, to: recipient, amount: fee0 },
            Movement::Push { side: Side::Token1, to: recipient, amount: fee1 },
        ];
        self.preflight(&moves)?;

        let snapshot = self.state.clone();
        self.state.accumulated_fee0 = U256::zero();
        self.state.accumulated_fee1 = U256::zero();
        self.settle(&moves, snapshot, None)?;

        self.events.push(PoolEvent::FeesCollected {
            recipient,
            amount0: fee0,
            amount1: fee1,
        });
        info!(
            pool = %self.address,
            by = %caller,
            %recipient,
            amount0 = %self.human(fee0),
            amount1 = %self.human(fee1),
            "Fees collected"
        );
        Ok((fee0, fee1))
    }

    /// Move `amount` of any token the pool holds to `recipient`, bypassing reserve and
    /// fee accounting
    pub fn emergency_withdraw(
        &mut self,
        caller: AccountId,
        token: &dyn FungibleToken,
        recipient: AccountId,
        amount: U256,
    ) -> PoolResult<()> {
        self.require_admin(caller)?;
        if recipient.is_zero() {
            return Err(PoolError::invalid("recipient", "must be non-zero"));
        }
        token.transfer(self.address, recipient, amount)?;

        self.events.push(PoolEvent::EmergencyWithdrawal {
            token: token.id(),
            recipient,
            amount,
        });
        warn!(
            pool = %self.address,
            by = %caller,
            token = %token.id(),
            %recipient,
            %amount,
            "Emergency withdrawal"
        );
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Guards
    // ---------------------------------------------------------------------

    fn require_admin(&self, caller: AccountId) -> PoolResult<()> {
        if self.access.read().is_admin(caller) {
            Ok(())
        } else {
            warn!(pool = %self.address, %caller, "Admin call rejected");
            Err(PoolError::CallerNotAdmin(caller))
        }
    }

    fn guard(&self, deadline: u64) -> PoolResult<()> {
        let now = self.clock.now();
        if deadline < now {
            debug!(deadline, now, "Deadline expired");
            return Err(PoolError::DeadlineExpired { deadline, now });
        }
        let latest = now.saturating_add(MAX_DEADLINE_WINDOW_SECS);
        if deadline > latest {
            debug!(deadline, latest, "Deadline too far");
            return Err(PoolError::DeadlineTooFar { deadline, latest });
        }
        if self.state.paused {
            debug!(pool = %self.address, "Operation rejected while paused");
            return Err(PoolError::OperationsPaused);
        }
        Ok(())
    }

    fn ensure_authorized(&self) -> PoolResult<()> {
        if self.ledger.read().is_pool_authorized(self.address) {
            Ok(())
        } else {
            Err(LedgerError::NotAuthorizedPool(self.address).into())
        }
    }

    /// Live position belonging to this pool's token pair
    fn position_for(&self, token_id: PositionId) -> PoolResult<Position> {
        let position = self.ledger.read().get_position_info(token_id)?;
        if (position.token0, position.token1) != self.tokens() {
            return Err(LedgerError::PositionNotFound(token_id).into());
        }
        Ok(position)
    }

    fn owned_position(&self, caller: AccountId, token_id: PositionId) -> PoolResult<Position> {
        let position = self.position_for(token_id)?;
        if position.owner != caller {
            return Err(PoolError::NotPositionOwner { caller, token_id });
        }
        Ok(position)
    }

    /// Amounts a deposit contributes after the deviation, ratio and minimum checks
    fn size_deposit(
        &self,
        amount0: U256,
        amount1: U256,
        min_amount0: U256,
        min_amount1: U256,
    ) -> PoolResult<(U256, U256)> {
        if amount0.is_zero() || amount1.is_zero() {
            return Err(PoolError::invalid("amounts", "both liquidity amounts must be non-zero"));
        }
        let (reserve0, reserve1) = self.get_balances();
        if ReservePricing::exceeds_deviation(
            amount0,
            amount1,
            reserve0,
            reserve1,
            self.state.max_price_deviation_permille,
        )? {
            debug!(%amount0, %amount1, %reserve0, %reserve1, "Deposit ratio rejected");
            return Err(PoolError::PriceDeviationTooHigh {
                max_permille: self.state.max_price_deviation_permille,
            });
        }

        let (used0, used1) = ReservePricing::proportional_amounts(amount0, amount1, reserve0, reserve1)?;
        check_minimums(used0, used1, min_amount0, min_amount1)?;
        if used0.is_zero() || used1.is_zero() {
            return Err(PoolError::invalid("amounts", "deposit rounds to zero on one side"));
        }
        Ok((used0, used1))
    }

    /// Reserves must cover the withdrawal and may not be left empty on one side only
    fn check_reserves(&self, amount0: U256, amount1: U256) -> PoolResult<()> {
        let (reserve0, reserve1) = self.get_balances();
        let stranded = amount0 <= reserve0
            && amount1 <= reserve1
            && (reserve0 == amount0) != (reserve1 == amount1);
        if stranded {
            warn!(
                pool = %self.address,
                %amount0,
                %amount1,
                %reserve0,
                %reserve1,
                "Withdrawal would empty one reserve only"
            );
            return Err(PoolError::InsufficientReserves { amount0, amount1 });
        }
        if amount0 > reserve0 || amount1 > reserve1 {
            warn!(
                pool = %self.address,
                %amount0,
                %amount1,
                %reserve0,
                %reserve1,
                "Withdrawal exceeds reserves"
            );
            return Err(PoolError::InsufficientReserves { amount0, amount1 });
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Settlement
    // ---------------------------------------------------------------------

    fn token(&self, side: Side) -> &dyn FungibleToken {
        match side {
            Side::Token0 => self.token0.as_ref(),
            Side::Token1 => self.token1.as_ref(),
        }
    }

    /// Dry-run every movement so a refusal aborts before any state changes
    fn preflight(&self, moves: &[Movement]) -> PoolResult<()> {
        for movement in moves {
            let checked = match *movement {
                Movement::Pull { side, from, amount } if !amount.is_zero() => self
                    .token(side)
                    .check_transfer_from(self.address, from, self.address, amount),
                Movement::Push { side, to, amount } if !amount.is_zero() => {
                    self.token(side).check_transfer(self.address, to, amount)
                }
                _ => Ok(()),
            };
            if let Err(err) = checked {
                debug!(pool = %self.address, %err, "Token dry run refused");
                return Err(err.into());
            }
        }
        Ok(())
    }

    fn update_position(
        &mut self,
        token_id: PositionId,
        amount0: U256,
        amount1: U256,
        snapshot: &PoolState,
    ) -> PoolResult<()> {
        let updated = self
            .ledger
            .write()
            .update_position(self.address, token_id, amount0, amount1);
        if let Err(err) = updated {
            self.state = snapshot.clone();
            return Err(err.into());
        }
        Ok(())
    }

    /// Execute the planned movements in order, unwinding everything on the first failure
    fn settle(
        &mut self,
        moves: &[Movement],
        snapshot: PoolState,
        checkpoint: Option<LedgerCheckpoint>,
    ) -> PoolResult<()> {
        let mut completed = Vec::with_capacity(moves.len());
        for movement in moves {
            match self.execute(movement) {
                Ok(true) => completed.push(*movement),
                Ok(false) => {}
                Err(err) => {
                    error!(pool = %self.address, %err, "Token settlement failed, unwinding");
                    self.unwind(&completed, snapshot, checkpoint);
                    return Err(err.into());
                }
            }
        }
        Ok(())
    }

    /// Perform one movement; `Ok(false)` when there was nothing to move
    fn execute(&self, movement: &Movement) -> Result<bool, TokenError> {
        match *movement {
            Movement::Pull { amount, .. } | Movement::Push { amount, .. } if amount.is_zero() => Ok(false),
            Movement::Pull { side, from, amount } => self
                .token(side)
                .transfer_from(self.address, from, self.address, amount)
                .map(|_| true),
            Movement::Push { side, to, amount } => {
                self.token(side).transfer(self.address, to, amount).map(|_| true)
            }
        }
    }

    fn unwind(&mut self, completed: &[Movement], snapshot: PoolState, checkpoint: Option<LedgerCheckpoint>) {
        self.state = snapshot;
        if let Some(checkpoint) = checkpoint {
            self.ledger.write().restore(checkpoint);
        }
        for movement in completed.iter().rev() {
            match *movement {
                Movement::Pull { side, from, amount } => {
                    if let Err(err) = self.token(side).transfer(self.address, from, amount) {
                        error!(pool = %self.address, %from, %amount, %err, "Refund failed");
                    }
                }
                Movement::Push { to, amount, .. } => {
                    error!(pool = %self.address, %to, %amount, "Delivered tokens cannot be recalled");
                }
            }
        }
    }

    /// Amount in whole tokens for log output
    fn human(&self, amount: U256) -> String {
        to_decimal(amount, self.decimals)
            .map(|value| value.to_string())
            .unwrap_or_else(|_| amount.to_string())
    }
}

fn checked_add(a: U256, b: U256, context: &'static str) -> PoolResult<U256> {
    a.checked_add(b)
        .ok_or_else(|| MathError::Overflow { context }.into())
}

fn check_minimums(amount0: U256, amount1: U256, min_amount0: U256, min_amount1: U256) -> PoolResult<()> {
    if amount0 < min_amount0 || amount1 < min_amount1 {
        debug!(%amount0, %amount1, %min_amount0, %min_amount1, "Amounts below minimum");
        return Err(PoolError::AmountsBelowMinimum {
            amount0,
            amount1,
            min_amount0,
            min_amount1,
        });
    }
    Ok(())
}
