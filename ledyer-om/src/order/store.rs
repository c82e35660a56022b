//! Order store abstraction.

use std::{collections::BTreeMap, path::Path};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    error::{LedyerError, Result},
    money::Currency,
    order::OrderItem,
};

/// Read access to an e-commerce order, plus the one mutation the mapper needs.
///
/// Implementations wrap whatever the shop keeps orders in. The mapper only reads
/// through this trait after asking the store to refresh its cached totals.
pub trait OrderStore {
    /// Recomputes shipping, taxes and totals from the item stream.
    ///
    /// # Errors
    ///
    /// Returns [`LedyerError::DataError`] if the order state cannot be totalled.
    fn recalculate_totals(&mut self) -> Result<()>;

    /// Returns the item stream.
    fn items(&self) -> &[OrderItem];

    /// Returns the order total including tax, in major units.
    fn total(&self) -> Decimal;

    /// Returns the total tax, in major units.
    fn total_tax(&self) -> Decimal;

    /// Returns the ISO 4217 currency code.
    fn currency(&self) -> &str;

    /// Looks up a tax rate (in percent) by rate id.
    fn tax_rate(&self, rate_id: &str) -> Option<Decimal>;
}

/// Order held entirely in memory.
///
/// Deserializes from the JSON an order export produces and serves as the default
/// [`OrderStore`] for the command-line tool and for tests.
///
/// # Examples
///
/// ```
/// use ledyer_om::order::{InMemoryOrder, OrderStore};
///
/// let mut order = InMemoryOrder::from_json(r#"{
///     "currency": "SEK",
///     "items": [
///         {"type": "merchandise", "name": "Mug", "quantity": 2,
///          "subtotal": "10.00", "subtotal_tax": "0.60", "total": "10.00", "total_tax": "0.60"}
///     ]
/// }"#)?;
///
/// order.recalculate_totals()?;
/// assert_eq!(order.total().to_string(), "10.60");
/// # Ok::<(), ledyer_om::LedyerError>(())
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryOrder {
    /// ISO 4217 currency code.
    pub currency: String,
    /// Item stream.
    #[serde(default)]
    pub items: Vec<OrderItem>,
    /// Tax rates in percent, keyed by rate id.
    #[serde(default)]
    pub tax_rates: BTreeMap<String, Decimal>,
    /// Cached order total, refreshed by [`OrderStore::recalculate_totals`].
    #[serde(default)]
    pub total: Decimal,
    /// Cached tax total, refreshed by [`OrderStore::recalculate_totals`].
    #[serde(default)]
    pub total_tax: Decimal,
}

impl InMemoryOrder {
    /// Creates an empty order in `currency`.
    #[must_use]
    pub fn new(currency: impl Into<String>) -> Self {
        Self { currency: currency.into(), ..Self::default() }
    }

    /// Appends an item to the stream.
    #[must_use]
    pub fn with_item(mut self, item: OrderItem) -> Self {
        self.items.push(item);
        self
    }

    /// Registers a tax rate in percent.
    #[must_use]
    pub fn with_tax_rate(mut self, rate_id: impl Into<String>, percent: Decimal) -> Self {
        self.tax_rates.insert(rate_id.into(), percent);
        self
    }

    /// Parses an order from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`LedyerError::DataError`] if the JSON does not describe an order.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| LedyerError::DataError(format!("invalid order JSON: {e}")))
    }

    /// Reads an order from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| LedyerError::DataError(format!("cannot read order file: {e}")))?;
        Self::from_json(&content)
    }
}

impl OrderStore for InMemoryOrder {
    fn recalculate_totals(&mut self) -> Result<()> {
        Currency::new(&self.currency)?;

        let mut total = Decimal::ZERO;
        let mut total_tax = Decimal::ZERO;

        for item in &self.items {
            let (amount, tax) = match item {
                OrderItem::Merchandise(line) => (line.total, line.total_tax),
                OrderItem::Shipping(line) => (line.total, line.total_tax),
                OrderItem::Fee(line) => (line.total, line.total_tax),
                // Line totals already include coupon discounts.
                OrderItem::Coupon(_) | OrderItem::Tax(_) => continue,
            };
            total = total
                .checked_add(amount)
                .and_then(|sum| sum.checked_add(tax))
                .ok_or_else(|| LedyerError::DataError("order total overflows".to_owned()))?;
            total_tax = total_tax
                .checked_add(tax)
                .ok_or_else(|| LedyerError::DataError("order tax overflows".to_owned()))?;
        }

        self.total = total;
        self.total_tax = total_tax;
        Ok(())
    }

    fn items(&self) -> &[OrderItem] {
        &self.items
    }

    fn total(&self) -> Decimal {
        self.total
    }

    fn total_tax(&self) -> Decimal {
        self.total_tax
    }

    fn currency(&self) -> &str {
        &self.currency
    }

    fn tax_rate(&self, rate_id: &str) -> Option<Decimal> {
        self.tax_rates.get(rate_id).copied()
    }
}
