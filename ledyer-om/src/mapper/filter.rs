//! Merchandise line filter hook.

use crate::{mapper::OrderLine, order::MerchandiseItem};

/// Rewrites or drops a merchandise line after it has been built.
///
/// Returning `None` removes the line from the mapped order. Closures with the matching
/// signature implement this trait.
///
/// # Examples
///
/// ```
/// use ledyer_om::{
///     mapper::{OrderLine, OrderLineFilter},
///     order::MerchandiseItem,
/// };
///
/// /// Drops free sample lines.
/// struct SkipFreeSamples;
///
/// impl OrderLineFilter for SkipFreeSamples {
///     fn filter(&self, line: OrderLine, _item: &MerchandiseItem) -> Option<OrderLine> {
///         (line.total_amount != 0).then_some(line)
///     }
/// }
/// ```
pub trait OrderLineFilter: Send + Sync {
    /// Returns the line to keep, or `None` to drop it.
    fn filter(&self, line: OrderLine, item: &MerchandiseItem) -> Option<OrderLine>;
}

impl<F> OrderLineFilter for F
where
    F: Fn(OrderLine, &MerchandiseItem) -> Option<OrderLine> + Send + Sync,
{
    fn filter(&self, line: OrderLine, item: &MerchandiseItem) -> Option<OrderLine> {
        self(line, item)
    }
}
