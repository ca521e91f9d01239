//! Price / effective-cost store
//!
//! Item id → (price, tradeable) lookup with the budget-arithmetic
//! "effective price" rule: owned or untradeable items cost 0.
//! Grounded on the teacher's `net/session.rs` and `game/player.rs` use
//! of `dashmap`/`parking_lot` for a process-wide read-mostly map.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// A single high/low price quote as fetched from an external price
/// source (`spec.md` §6, "Price source interface").
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RawPriceQuote {
    pub high: Option<u64>,
    pub high_time: Option<i64>,
    pub low: Option<u64>,
    pub low_time: Option<i64>,
}

/// Boundary trait for the external price source. Implementors perform
/// whatever HTTP call is appropriate for their host; the store only
/// needs the resulting quotes.
pub trait PriceSource {
    fn fetch(&self) -> std::result::Result<HashMap<u32, RawPriceQuote>, String>;
}

#[derive(Debug, Clone, Copy)]
struct PriceEntry {
    price: Option<u64>,
    tradeable: bool,
}

/// Outcome of a `fetch_and_load`/`refresh` call. Per `spec.md` §7, a
/// failed fetch is a value, not a propagated error: "no partial commit
/// on failure".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceFetchOutcome {
    pub success: bool,
    pub error: Option<String>,
    pub item_count: usize,
}

/// Process-wide price store. `PriceStore::global()` is the real
/// singleton; `PriceStore::new()` is for isolated tests.
pub struct PriceStore {
    prices: DashMap<u32, PriceEntry>,
    last_fetch: RwLock<Option<DateTime<Utc>>>,
}

impl Default for PriceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceStore {
    pub fn new() -> Self {
        Self {
            prices: DashMap::new(),
            last_fetch: RwLock::new(None),
        }
    }

    /// The process-wide singleton, initialized once and then read-mostly
    /// (`spec.md` §5).
    pub fn global() -> &'static PriceStore {
        static INSTANCE: Lazy<PriceStore> = Lazy::new(PriceStore::new);
        &INSTANCE
    }

    /// Set a single item's price. `price = None` implies untradeable
    /// unless `tradeable` is explicitly `Some(true)`.
    pub fn set_price(&self, id: u32, price: Option<u64>, tradeable: Option<bool>) {
        let tradeable = tradeable.unwrap_or_else(|| price.is_some());
        self.prices.insert(id, PriceEntry { price, tradeable });
    }

    /// Bulk load; each value is `(price, tradeable)`.
    pub fn set_prices(&self, entries: &HashMap<u32, (Option<u64>, Option<bool>)>) {
        for (&id, &(price, tradeable)) in entries {
            self.set_price(id, price, tradeable);
        }
    }

    pub fn set_untradeable(&self, id: u32) {
        self.prices.insert(
            id,
            PriceEntry {
                price: None,
                tradeable: false,
            },
        );
    }

    pub fn clear(&self) {
        self.prices.clear();
        *self.last_fetch.write() = None;
    }

    pub fn last_fetch_timestamp(&self) -> Option<DateTime<Utc>> {
        *self.last_fetch.read()
    }

    /// Stored price: 0 for untradeable items, `None` for unknown,
    /// otherwise the stored price.
    pub fn get_price(&self, id: u32) -> Option<u64> {
        match self.prices.get(&id) {
            Some(entry) if !entry.tradeable => Some(0),
            Some(entry) => entry.price,
            None => None,
        }
    }

    /// The price the engine uses in budget arithmetic: 0 if `owned`,
    /// else [`Self::get_price`].
    pub fn effective_price(&self, id: u32, owned: bool) -> Option<u64> {
        if owned {
            Some(0)
        } else {
            self.get_price(id)
        }
    }

    /// Whether `id`'s effective price fits under `cap`. Unknown prices
    /// pass unless `exclude_unknown` is set.
    pub fn within_budget(&self, id: u32, cap: u64, owned: bool, exclude_unknown: bool) -> bool {
        match self.effective_price(id, owned) {
            Some(price) => price <= cap,
            None => !exclude_unknown,
        }
    }

    /// Clears the store, fetches from `source`, and loads the result. On
    /// failure the store is left cleared and a `{success: false, ...}`
    /// outcome is returned — no partial commit (`spec.md` §4.2, §7).
    pub fn fetch_and_load(&self, source: &dyn PriceSource, use_mid_price: bool) -> PriceFetchOutcome {
        self.clear();
        match source.fetch() {
            Ok(quotes) => {
                let count = quotes.len();
                for (id, quote) in quotes {
                    let (price, tradeable) = resolve_quote(quote, use_mid_price);
                    self.set_price(id, price, Some(tradeable));
                }
                *self.last_fetch.write() = Some(Utc::now());
                PriceFetchOutcome {
                    success: true,
                    error: None,
                    item_count: count,
                }
            }
            Err(err) => PriceFetchOutcome {
                success: false,
                error: Some(err),
                item_count: 0,
            },
        }
    }

    /// Alias for [`Self::fetch_and_load`], matching `spec.md`'s naming.
    pub fn refresh(&self, source: &dyn PriceSource, use_mid_price: bool) -> PriceFetchOutcome {
        self.fetch_and_load(source, use_mid_price)
    }
}

/// Resolve a raw high/low quote into `(price, tradeable)` per
/// `spec.md` §4.2's loader rules.
fn resolve_quote(quote: RawPriceQuote, use_mid_price: bool) -> (Option<u64>, bool) {
    match (quote.high, quote.low) {
        (Some(high), Some(low)) if use_mid_price => (Some((high + low) / 2), true),
        (Some(high), Some(_)) => (Some(high), true),
        (Some(side), None) | (None, Some(side)) => (Some(side), true),
        (None, None) => (None, true),
    }
}
