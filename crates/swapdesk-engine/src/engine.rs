//! The engine: single-writer state machine over an offer book and a ledger.
//!
//! ## Transactions
//!
//! Every mutating call runs through `Engine::transact`. The engine state
//! and the ledger are copied, the operation runs against the copies, and the
//! copies replace the originals only if the operation returns `Ok`. The
//! events the operation produced are committed with them. A failed call,
//! including one element of a batch or a permit redemption, leaves no trace.
//!
//! Staging copies the whole `DeskState` (book, registry, roles) and the
//! whole ledger on every call, so per-call cost grows linearly with book
//! and ledger size. A ledger backed by persistent or copy-on-write maps
//! keeps the copy cheap without touching the engine.
//!
//! A multi-threaded host wraps the engine in a mutex or feeds it from a
//! single queue; nothing in here suspends.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use swapdesk_ledger::Ledger;
use swapdesk_types::{
    AccountId, Amount, EngineConfig, Event, EventRecord, NewOffer, Offer, OfferId, OfferView,
    Fill, Period, Price, Result, Role, SignedPermit, SwapdeskError, TokenId, TokenInfo, TokenType,
    TradeIntent,
};

use crate::access::AccessControl;
use crate::book::OfferBook;
use crate::events::EventLog;
use crate::pricing::PriceScale;
use crate::registry::TokenRegistry;
use crate::settlement;

/// Fixed parameters of an engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Settings {
    pub engine_account: AccountId,
    pub max_batch_len: usize,
}

/// Everything a call may mutate besides the ledger.
#[derive(Debug, Clone)]
pub(crate) struct DeskState {
    pub period: Period,
    pub access: AccessControl,
    pub registry: TokenRegistry,
    pub book: OfferBook,
    pub fee_bps: u16,
    pub paused: bool,
}

/// Staged copy of engine state and ledger for one call.
pub(crate) struct Txn<L> {
    pub settings: Settings,
    pub state: DeskState,
    pub ledger: L,
    pub events: Vec<Event>,
}

impl<L: Ledger> Txn<L> {
    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn ensure_running(&self) -> Result<()> {
        if self.state.paused {
            return Err(SwapdeskError::ContractPaused);
        }
        Ok(())
    }

    /// Validate the shape of parallel batch inputs. Returns the common length.
    pub fn check_batch(&self, lengths: &[usize]) -> Result<usize> {
        let len = lengths.first().copied().unwrap_or(0);
        if lengths.iter().any(|&l| l != len) {
            return Err(SwapdeskError::LengthMismatch {
                lengths: lengths.to_vec(),
            });
        }
        if len > self.settings.max_batch_len {
            return Err(SwapdeskError::BatchTooLarge {
                len,
                max: self.settings.max_batch_len,
            });
        }
        Ok(len)
    }
}

/// The offer book and settlement engine.
pub struct Engine<L> {
    settings: Settings,
    state: DeskState,
    ledger: L,
    log: EventLog,
}

impl<L: Ledger + Clone> Engine<L> {
    /// Create an engine at height 0 with the given genesis timestamp.
    pub fn new(config: &EngineConfig, ledger: L, genesis: DateTime<Utc>) -> Result<Self> {
        config.validate()?;
        let engine = Self {
            settings: Settings {
                engine_account: config.engine_account,
                max_batch_len: config.max_batch_len,
            },
            state: DeskState {
                period: Period::genesis(genesis),
                access: AccessControl::new(config.admin, config.moderator),
                registry: TokenRegistry::new(),
                book: OfferBook::new(),
                fee_bps: config.fee_bps,
                paused: false,
            },
            ledger,
            log: EventLog::new(),
        };
        tracing::info!(
            engine_account = %config.engine_account.short(),
            admin = %config.admin.short(),
            fee_bps = config.fee_bps,
            max_batch_len = config.max_batch_len,
            "Engine initialized"
        );
        Ok(engine)
    }

    /// Run `op` against a staged copy and commit it on success.
    fn transact<T>(&mut self, op: impl FnOnce(&mut Txn<L>) -> Result<T>) -> Result<T> {
        let mut txn = Txn {
            settings: self.settings,
            state: self.state.clone(),
            ledger: self.ledger.clone(),
            events: Vec::new(),
        };
        let output = op(&mut txn)?;
        let Txn {
            state,
            ledger,
            events,
            ..
        } = txn;
        self.state = state;
        self.ledger = ledger;
        self.log.commit(self.state.period.height, events);
        Ok(output)
    }

    // =================================================================
    // Settlement periods
    // =================================================================

    #[must_use]
    pub fn period(&self) -> Period {
        self.state.period
    }

    /// Close the current period and open the next one.
    pub fn begin_period(&mut self, timestamp: DateTime<Utc>) -> Period {
        self.state.period = self.state.period.next(timestamp);
        tracing::debug!(
            height = self.state.period.height.0,
            timestamp = %self.state.period.timestamp,
            "Period opened"
        );
        self.state.period
    }

    // =================================================================
    // Token registry
    // =================================================================

    /// Admin-only. `tokens[i]` gets `types[i]`.
    pub fn set_whitelist(
        &mut self,
        caller: &AccountId,
        tokens: &[TokenId],
        types: &[TokenType],
    ) -> Result<()> {
        self.transact(|txn| txn.set_whitelist(caller, tokens, types))?;
        tracing::info!(admin = %caller.short(), tokens = tokens.len(), "Whitelist updated");
        Ok(())
    }

    #[must_use]
    pub fn is_whitelisted(&self, token: &TokenId) -> bool {
        self.state.registry.is_whitelisted(token)
    }

    #[must_use]
    pub fn token_type(&self, token: &TokenId) -> TokenType {
        self.state.registry.token_type(token)
    }

    /// Whitelisted tokens with their types, in token order.
    #[must_use]
    pub fn whitelisted_tokens(&self) -> Vec<(TokenId, TokenType)> {
        self.state
            .registry
            .whitelisted()
            .map(|(token, ty)| (token.clone(), ty))
            .collect()
    }

    /// Ledger metadata of a token.
    pub fn token_info(&self, token: &TokenId) -> Result<TokenInfo> {
        self.ledger.token_info(token)
    }

    // =================================================================
    // Offer book
    // =================================================================

    pub fn create_offer(&mut self, caller: &AccountId, params: NewOffer) -> Result<OfferId> {
        let id = self.transact(|txn| txn.create_offer(caller, params))?;
        let private = self.state.book.get(id).is_ok_and(Offer::is_private);
        tracing::info!(offer = %id, seller = %caller.short(), private, "Offer created");
        Ok(id)
    }

    /// Create one offer per index, all or nothing.
    pub fn create_offer_batch(
        &mut self,
        caller: &AccountId,
        sell_tokens: &[TokenId],
        buy_tokens: &[TokenId],
        reserved_buyers: &[Option<AccountId>],
        prices: &[Price],
        amounts: &[Amount],
    ) -> Result<Vec<OfferId>> {
        let ids = self.transact(|txn| {
            let len = txn.check_batch(&[
                sell_tokens.len(),
                buy_tokens.len(),
                reserved_buyers.len(),
                prices.len(),
                amounts.len(),
            ])?;
            (0..len)
                .map(|i| {
                    let params = NewOffer {
                        sell_token: sell_tokens[i].clone(),
                        buy_token: buy_tokens[i].clone(),
                        reserved_buyer: reserved_buyers[i],
                        price: prices[i],
                        amount: amounts[i],
                    };
                    txn.create_offer(caller, params)
                })
                .collect::<Result<Vec<_>>>()
        })?;
        tracing::info!(seller = %caller.short(), count = ids.len(), "Offer batch created");
        Ok(ids)
    }

    /// Redeem `permit` for the sell token, then create the offer.
    pub fn create_offer_with_permit(
        &mut self,
        caller: &AccountId,
        params: NewOffer,
        permit: &SignedPermit,
    ) -> Result<OfferId> {
        let id = self.transact(|txn| {
            let token = params.sell_token.clone();
            txn.with_permit(caller, permit, &token, |txn| txn.create_offer(caller, params))
        })?;
        tracing::info!(offer = %id, seller = %caller.short(), "Offer created with permit");
        Ok(id)
    }

    /// Seller-only. An amount of zero removes the offer.
    pub fn update_offer(
        &mut self,
        caller: &AccountId,
        offer_id: OfferId,
        price: Price,
        amount: Amount,
    ) -> Result<()> {
        self.transact(|txn| txn.update_offer(caller, offer_id, price, amount))?;
        tracing::info!(offer = %offer_id, price, amount, "Offer updated");
        Ok(())
    }

    pub fn update_offer_batch(
        &mut self,
        caller: &AccountId,
        offer_ids: &[OfferId],
        prices: &[Price],
        amounts: &[Amount],
    ) -> Result<()> {
        self.transact(|txn| {
            let len = txn.check_batch(&[offer_ids.len(), prices.len(), amounts.len()])?;
            (0..len).try_for_each(|i| txn.update_offer(caller, offer_ids[i], prices[i], amounts[i]))
        })?;
        tracing::info!(seller = %caller.short(), count = offer_ids.len(), "Offer batch updated");
        Ok(())
    }

    /// Redeem `permit` for the offer's sell token, then update the offer.
    pub fn update_offer_with_permit(
        &mut self,
        caller: &AccountId,
        offer_id: OfferId,
        price: Price,
        amount: Amount,
        permit: &SignedPermit,
    ) -> Result<()> {
        self.transact(|txn| {
            let token = txn.state.book.get(offer_id)?.sell_token.clone();
            txn.with_permit(caller, permit, &token, |txn| {
                txn.update_offer(caller, offer_id, price, amount)
            })
        })?;
        tracing::info!(offer = %offer_id, price, amount, "Offer updated with permit");
        Ok(())
    }

    /// Seller-only.
    pub fn delete_offer(&mut self, caller: &AccountId, offer_id: OfferId) -> Result<()> {
        self.transact(|txn| txn.delete_offer(caller, offer_id))?;
        tracing::info!(offer = %offer_id, "Offer deleted");
        Ok(())
    }

    pub fn delete_offer_batch(&mut self, caller: &AccountId, offer_ids: &[OfferId]) -> Result<()> {
        self.transact(|txn| {
            txn.check_batch(&[offer_ids.len()])?;
            offer_ids
                .iter()
                .try_for_each(|id| txn.delete_offer(caller, *id))
        })?;
        tracing::info!(seller = %caller.short(), count = offer_ids.len(), "Offer batch deleted");
        Ok(())
    }

    /// Admin moderation override.
    pub fn delete_offer_by_admin(&mut self, caller: &AccountId, offer_id: OfferId) -> Result<()> {
        self.transact(|txn| txn.delete_offer_by_admin(caller, offer_id))?;
        tracing::info!(offer = %offer_id, admin = %caller.short(), "Offer deleted by admin");
        Ok(())
    }

    /// `min(allowance, balance, amount)`: what the seller can deliver now.
    pub fn preview_available(&self, offer_id: OfferId) -> Result<Amount> {
        let offer = self.state.book.get(offer_id)?;
        Ok(settlement::available(
            &self.ledger,
            &self.settings.engine_account,
            offer,
        ))
    }

    /// `buy_token` owed for `sell_amount` of the offer at its current price.
    pub fn price_preview(&self, offer_id: OfferId, sell_amount: Amount) -> Result<Amount> {
        let offer = self.state.book.get(offer_id)?;
        let buy_amount = settlement::quote(&self.ledger, offer, sell_amount)?;
        tracing::debug!(offer = %offer_id, sell_amount, buy_amount, "Price preview");
        Ok(buy_amount)
    }

    /// Offer terms with available liquidity.
    pub fn show_offer(&self, offer_id: OfferId) -> Result<OfferView> {
        let offer = self.state.book.get(offer_id)?;
        Ok(OfferView {
            id: offer.id,
            sell_token: offer.sell_token.clone(),
            buy_token: offer.buy_token.clone(),
            seller: offer.seller,
            reserved_buyer: offer.reserved_buyer,
            price: offer.price,
            available: settlement::available(&self.ledger, &self.settings.engine_account, offer),
        })
    }

    /// The stored record, not clamped by liquidity.
    pub fn get_initial_offer(&self, offer_id: OfferId) -> Result<Offer> {
        self.state.book.get(offer_id).cloned()
    }

    /// Number of offer ids ever assigned.
    #[must_use]
    pub fn get_offer_count(&self) -> u64 {
        self.state.book.count()
    }

    /// Offers currently in the book, in id order.
    pub fn offers(&self) -> impl Iterator<Item = &Offer> {
        self.state.book.iter()
    }

    /// Number of offers currently in the book.
    #[must_use]
    pub fn active_offer_count(&self) -> usize {
        self.state.book.active()
    }

    /// A seller's open offers, in id order.
    pub fn offers_by_seller<'a>(
        &'a self,
        seller: &'a AccountId,
    ) -> impl Iterator<Item = &'a Offer> + 'a {
        self.state.book.by_seller(seller)
    }

    /// An offer's price as a decimal amount of `buy_token` per `sell_token`.
    pub fn display_price(&self, offer_id: OfferId) -> Result<Decimal> {
        let offer = self.state.book.get(offer_id)?;
        let scale = PriceScale::from_info(
            &self.ledger.token_info(&offer.sell_token)?,
            &self.ledger.token_info(&offer.buy_token)?,
        );
        scale.display_price(offer.price)
    }

    // =================================================================
    // Settlement
    // =================================================================

    /// Accept `amount` of the offer at the `price` the caller observed.
    pub fn buy(
        &mut self,
        caller: &AccountId,
        offer_id: OfferId,
        price: Price,
        amount: Amount,
    ) -> Result<Fill> {
        let intent = TradeIntent {
            offer_id,
            expected_price: price,
            amount,
        };
        self.transact(|txn| txn.buy(caller, intent))
            .inspect(log_fill)
            .inspect_err(|e| log_rejected(caller, offer_id, e))
    }

    /// Accept several offers, all or nothing.
    pub fn buy_offer_batch(
        &mut self,
        caller: &AccountId,
        offer_ids: &[OfferId],
        prices: &[Price],
        amounts: &[Amount],
    ) -> Result<Vec<Fill>> {
        self.transact(|txn| {
            let len = txn.check_batch(&[offer_ids.len(), prices.len(), amounts.len()])?;
            (0..len)
                .map(|i| {
                    txn.buy(
                        caller,
                        TradeIntent {
                            offer_id: offer_ids[i],
                            expected_price: prices[i],
                            amount: amounts[i],
                        },
                    )
                })
                .collect::<Result<Vec<_>>>()
        })
        .inspect(|fills| fills.iter().for_each(log_fill))
        .inspect_err(|e| {
            tracing::warn!(buyer = %caller.short(), batch = offer_ids.len(), error = %e, "Batch buy rejected");
        })
    }

    /// Redeem `permit` for the offer's buy token, then buy.
    pub fn buy_with_permit(
        &mut self,
        caller: &AccountId,
        offer_id: OfferId,
        price: Price,
        amount: Amount,
        permit: &SignedPermit,
    ) -> Result<Fill> {
        let intent = TradeIntent {
            offer_id,
            expected_price: price,
            amount,
        };
        self.transact(|txn| {
            let token = txn.state.book.get(offer_id)?.buy_token.clone();
            txn.with_permit(caller, permit, &token, |txn| txn.buy(caller, intent))
        })
        .inspect(log_fill)
        .inspect_err(|e| log_rejected(caller, offer_id, e))
    }

    // =================================================================
    // Administrative controls
    // =================================================================

    /// Admin-only. Basis points, `0..=10_000`. Not applied to trades.
    pub fn set_fee(&mut self, caller: &AccountId, fee_bps: u16) -> Result<()> {
        let old = self.transact(|txn| txn.set_fee(caller, fee_bps))?;
        tracing::info!(old, new = fee_bps, "Fee changed");
        Ok(())
    }

    #[must_use]
    pub fn fee(&self) -> u16 {
        self.state.fee_bps
    }

    pub fn pause(&mut self, caller: &AccountId) -> Result<()> {
        self.transact(|txn| txn.pause(caller))?;
        tracing::info!(admin = %caller.short(), "Engine paused");
        Ok(())
    }

    pub fn unpause(&mut self, caller: &AccountId) -> Result<()> {
        self.transact(|txn| txn.unpause(caller))?;
        tracing::info!(admin = %caller.short(), "Engine unpaused");
        Ok(())
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    /// Moderator or Admin. Sweep the engine account's whole `token` balance
    /// to the caller and return the amount.
    pub fn save_lost_tokens(&mut self, caller: &AccountId, token: &TokenId) -> Result<Amount> {
        let amount = self.transact(|txn| txn.save_lost_tokens(caller, token))?;
        tracing::info!(token = %token, to = %caller.short(), amount, "Lost tokens recovered");
        Ok(amount)
    }

    /// Admin-only. Returns `true` if the role was newly granted.
    pub fn grant_role(&mut self, caller: &AccountId, role: Role, account: AccountId) -> Result<bool> {
        let changed = self.transact(|txn| txn.grant_role(caller, role, account))?;
        if changed {
            tracing::info!(%role, account = %account.short(), "Role granted");
        }
        Ok(changed)
    }

    /// Admin-only. Returns `true` if the role was held.
    pub fn revoke_role(&mut self, caller: &AccountId, role: Role, account: AccountId) -> Result<bool> {
        let changed = self.transact(|txn| txn.revoke_role(caller, role, account))?;
        if changed {
            tracing::info!(%role, account = %account.short(), "Role revoked");
        }
        Ok(changed)
    }

    #[must_use]
    pub fn has_role(&self, role: Role, account: &AccountId) -> bool {
        self.state.access.has_role(role, account)
    }

    /// Holders of `role`, in account order.
    #[must_use]
    pub fn role_members(&self, role: Role) -> Vec<AccountId> {
        self.state.access.members(role)
    }

    // =================================================================
    // Events and ledger access
    // =================================================================

    /// Committed events not yet taken.
    #[must_use]
    pub fn events(&self) -> &[EventRecord] {
        self.log.records()
    }

    pub fn take_events(&mut self) -> Vec<EventRecord> {
        self.log.drain()
    }

    #[must_use]
    pub fn engine_account(&self) -> AccountId {
        self.settings.engine_account
    }

    #[must_use]
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Direct ledger access for actions clients take outside the engine
    /// (approvals, deposits, mistaken transfers to the engine account).
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }
}

fn log_fill(fill: &Fill) {
    tracing::info!(
        offer = %fill.offer_id,
        seller = %fill.seller.short(),
        buyer = %fill.buyer.short(),
        amount = fill.amount,
        buy_amount = fill.buy_amount,
        remaining = fill.remaining,
        "Offer accepted"
    );
}

fn log_rejected(buyer: &AccountId, offer_id: OfferId, error: &SwapdeskError) {
    tracing::warn!(
        offer = %offer_id,
        buyer = %buyer.short(),
        error = %error,
        "Buy rejected"
    );
}
