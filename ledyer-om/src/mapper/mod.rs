//! Order to Ledyer order-line mapping.
//!
//! [`OrderLineMapper`] turns an order's item stream into Ledyer order lines and
//! aggregate totals. Amounts are converted to minor units with round-half-up at the
//! order currency's scale; no floating point is involved.
//!
//! # Line rules
//!
//! | Item        | Type                     | Quantity   | Unit price                          |
//! |-------------|--------------------------|------------|-------------------------------------|
//! | Merchandise | `physical` / `digital`   | item (≥ 1) | (subtotal + subtotal tax) / qty     |
//! | Shipping    | `shippingFee`            | 1          | total + total tax                   |
//! | Fee         | `surcharge`              | 1          | total + total tax                   |
//! | Coupon      | `discount`               | 1          | discount                            |
//!
//! Only merchandise lines pass through the [`OrderLineFilter`].
//!
//! Merchandise totals are already net of coupons, so the coupon's reduction reaches
//! Ledyer through `unitDiscountAmount` and the order totals. The `discount` line
//! carries the coupon amount as a positive figure and is not part of those totals:
//! the order lines excluding `discount` lines sum to `totalAmount`.
//!
//! # Examples
//!
//! ```
//! use ledyer_om::{
//!     mapper::OrderLineMapper,
//!     order::{InMemoryOrder, MerchandiseItem, OrderItem},
//! };
//! use rust_decimal::Decimal;
//!
//! let mut order = InMemoryOrder::new("SEK").with_item(OrderItem::Merchandise(MerchandiseItem {
//!     name: "Mug".to_owned(),
//!     quantity: 2,
//!     subtotal: Decimal::new(1000, 2),
//!     subtotal_tax: Decimal::new(60, 2),
//!     total: Decimal::new(1000, 2),
//!     total_tax: Decimal::new(60, 2),
//!     ..MerchandiseItem::default()
//! }));
//!
//! let mapped = OrderLineMapper::new().map_order(&mut order)?;
//! assert_eq!(mapped.order_lines[0].unit_price, 530);
//! assert_eq!(mapped.order_lines[0].total_amount, 1060);
//! assert_eq!(mapped.totals.total_amount, 1060);
//! # Ok::<(), ledyer_om::LedyerError>(())
//! ```

mod filter;
mod lines;

use std::fmt;

use rust_decimal::Decimal;
use tracing::{debug, instrument};

pub use filter::OrderLineFilter;
pub use lines::{CapturePayload, EditOrderPayload, MappedOrder, OrderLine, OrderLineType, OrderTotals};

use crate::{
    error::Result,
    money::{Currency, round_percent},
    order::{CouponItem, FeeItem, MerchandiseItem, OrderStore, ShippingItem, TaxBreakdown},
};

/// Maximum length of `reference` and `description`, in characters.
pub const MAX_TEXT_LENGTH: usize = 200;

/// Maps orders to Ledyer order lines.
///
/// The mapper holds no order state; it can be shared and reused across orders.
#[derive(Default)]
pub struct OrderLineMapper {
    filter: Option<Box<dyn OrderLineFilter>>,
}

impl fmt::Debug for OrderLineMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderLineMapper")
            .field("filter", &self.filter.as_ref().map(|_| "OrderLineFilter"))
            .finish()
    }
}

impl OrderLineMapper {
    /// Creates a mapper without a line filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a closure as the merchandise line filter.
    ///
    /// # Examples
    ///
    /// ```
    /// use ledyer_om::mapper::{OrderLineMapper, OrderLineType};
    ///
    /// // Report every merchandise line as digital.
    /// let mapper = OrderLineMapper::new().with_filter(|mut line, _item| {
    ///     line.line_type = OrderLineType::Digital;
    ///     Some(line)
    /// });
    /// ```
    #[must_use]
    pub fn with_filter<F>(self, filter: F) -> Self
    where
        F: Fn(OrderLine, &MerchandiseItem) -> Option<OrderLine> + Send + Sync + 'static,
    {
        self.with_line_filter(filter)
    }

    /// Installs an [`OrderLineFilter`] implementation as the merchandise line filter.
    #[must_use]
    pub fn with_line_filter<T: OrderLineFilter + 'static>(mut self, filter: T) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Maps an order to Ledyer order lines and totals.
    ///
    /// Asks the store to recalculate its totals first so that cached amounts match the
    /// item stream.
    ///
    /// # Errors
    ///
    /// Returns [`LedyerError::DataError`](crate::LedyerError::DataError) if the totals
    /// cannot be recalculated, the currency is unknown, or an amount overflows.
    #[instrument(skip_all, fields(currency = order.currency(), items = order.items().len()))]
    pub fn map_order<S: OrderStore + ?Sized>(&self, order: &mut S) -> Result<MappedOrder> {
        order.recalculate_totals()?;

        let currency = Currency::new(order.currency())?;
        let order = &*order;
        let totals = compute_totals(order, &currency)?;

        let mut order_lines = Vec::new();

        for item in order.items().iter().filter_map(|item| item.as_merchandise()) {
            let line = merchandise_line(order, &currency, item)?;
            match &self.filter {
                Some(filter) => match filter.filter(line, item) {
                    Some(line) => order_lines.push(line),
                    None => debug!(name = %item.name, "merchandise line dropped by filter"),
                },
                None => order_lines.push(line),
            }
        }

        for item in order.items().iter().filter_map(|item| item.as_shipping()) {
            order_lines.push(shipping_line(order, &currency, item)?);
        }

        for item in order.items().iter().filter_map(|item| item.as_fee()) {
            order_lines.push(fee_line(order, &currency, item)?);
        }

        for item in order.items().iter().filter_map(|item| item.as_coupon()) {
            order_lines.push(coupon_line(&currency, item)?);
        }

        debug!(
            lines = order_lines.len(),
            total_amount = totals.total_amount,
            total_vat_amount = totals.total_vat_amount,
            "order mapped"
        );

        Ok(MappedOrder { order_lines, totals })
    }
}

fn compute_totals<S: OrderStore + ?Sized>(order: &S, currency: &Currency) -> Result<OrderTotals> {
    let total_amount = currency.to_minor(order.total())?;
    let total_vat_amount = currency.to_minor(order.total_tax())?;
    Ok(OrderTotals {
        total_amount,
        total_amount_excl_vat: total_amount - total_vat_amount,
        total_vat_amount,
    })
}

fn merchandise_line<S: OrderStore + ?Sized>(
    order: &S,
    currency: &Currency,
    item: &MerchandiseItem,
) -> Result<OrderLine> {
    let quantity = item.quantity.max(1);

    let unit_price = currency.divide_to_minor(item.subtotal + item.subtotal_tax, quantity)?;

    let unit_discount_amount = if item.subtotal > item.total {
        let discount = item.subtotal + item.subtotal_tax - item.total - item.total_tax;
        currency.divide_to_minor(discount, quantity)?
    } else {
        0
    };

    Ok(OrderLine {
        line_type: merchandise_type(item),
        reference: truncate(&merchandise_reference(item)),
        description: description(&item.name),
        quantity,
        unit_price,
        unit_discount_amount,
        vat: vat_rate(order, &item.taxes),
        total_amount: currency.to_minor(item.total + item.total_tax)?,
        total_vat_amount: currency.to_minor(item.total_tax)?,
    })
}

fn shipping_line<S: OrderStore + ?Sized>(
    order: &S,
    currency: &Currency,
    item: &ShippingItem,
) -> Result<OrderLine> {
    let reference = format!("{}:{}", item.method_id, item.instance_id);
    charge_line(
        OrderLineType::ShippingFee,
        &reference,
        &item.name,
        currency,
        item.total,
        item.total_tax,
        vat_rate(order, &item.taxes),
    )
}

fn fee_line<S: OrderStore + ?Sized>(
    order: &S,
    currency: &Currency,
    item: &FeeItem,
) -> Result<OrderLine> {
    charge_line(
        OrderLineType::Surcharge,
        "Fee",
        &item.name,
        currency,
        item.total,
        item.total_tax,
        vat_rate(order, &item.taxes),
    )
}

/// Builds a single-unit line whose unit price is the undivided taxed total.
fn charge_line(
    line_type: OrderLineType,
    reference: &str,
    name: &str,
    currency: &Currency,
    total: Decimal,
    total_tax: Decimal,
    vat: u8,
) -> Result<OrderLine> {
    let total_amount = currency.to_minor(total + total_tax)?;
    Ok(OrderLine {
        line_type,
        reference: truncate(reference),
        description: description(name),
        quantity: 1,
        unit_price: total_amount,
        unit_discount_amount: 0,
        vat,
        total_amount,
        total_vat_amount: currency.to_minor(total_tax)?,
    })
}

/// Positive amounts; the reduction is already in the merchandise lines.
fn coupon_line(currency: &Currency, item: &CouponItem) -> Result<OrderLine> {
    let discount = currency.to_minor(item.discount)?;
    Ok(OrderLine {
        line_type: OrderLineType::Discount,
        reference: "Discount".to_owned(),
        description: description(&item.name),
        quantity: 1,
        unit_price: discount,
        unit_discount_amount: 0,
        vat: 0,
        total_amount: discount,
        total_vat_amount: currency.to_minor(item.discount_tax)?,
    })
}

fn merchandise_type(item: &MerchandiseItem) -> OrderLineType {
    match item.variant.as_ref().or(item.product.as_ref()) {
        Some(product) if !product.is_virtual => OrderLineType::Physical,
        _ => OrderLineType::Digital,
    }
}

/// Variant SKU, then product SKU, then product id, then the item name.
fn merchandise_reference(item: &MerchandiseItem) -> String {
    item.variant
        .as_ref()
        .and_then(|variant| variant.non_empty_sku())
        .or_else(|| item.product.as_ref().and_then(|product| product.non_empty_sku()))
        .or_else(|| {
            item.product
                .as_ref()
                .or(item.variant.as_ref())
                .map(|product| product.id.as_str())
                .filter(|id| !id.is_empty())
        })
        .unwrap_or(&item.name)
        .to_owned()
}

/// Percent of the first order tax rate the breakdown has an entry for, else 0.
fn vat_rate<S: OrderStore + ?Sized>(order: &S, taxes: &TaxBreakdown) -> u8 {
    order
        .items()
        .iter()
        .filter_map(|item| item.as_tax())
        .find(|tax| matches!(taxes.get(&tax.rate_id), Some(Some(_))))
        .and_then(|tax| order.tax_rate(&tax.rate_id))
        .map_or(0, round_percent)
}

fn description(name: &str) -> String {
    truncate(strip_tags(name).trim())
}

/// Truncates to [`MAX_TEXT_LENGTH`] characters.
fn truncate(text: &str) -> String {
    text.chars().take(MAX_TEXT_LENGTH).collect()
}

fn strip_tags(text: &str) -> String {
    let mut stripped = String::with_capacity(text.len());
    let mut in_tag = false;
    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => stripped.push(ch),
            _ => {}
        }
    }
    stripped
}
