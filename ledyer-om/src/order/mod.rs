//! E-commerce order model.
//!
//! The shop's order lives outside this crate. [`OrderStore`] is the seam the mapper
//! reads through; [`OrderItem`] replaces duck-typed item access with one variant per
//! item kind.

mod items;
mod store;

pub use items::{
    CouponItem, FeeItem, MerchandiseItem, OrderItem, ProductRef, ShippingItem, TaxBreakdown,
    TaxItem,
};
pub use store::{InMemoryOrder, OrderStore};
