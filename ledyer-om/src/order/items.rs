//! Order item variants.
//!
//! An order's item stream mixes merchandise, shipping, fees, coupons and tax
//! records. Each kind carries only the fields that exist for it.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-rate tax breakdown of a single item.
///
/// Keys are tax-rate ids; `None` marks a rate that is registered on the item but was
/// not applied.
pub type TaxBreakdown = BTreeMap<String, Option<Decimal>>;

/// One entry of an order's item stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderItem {
    /// A purchased product.
    Merchandise(MerchandiseItem),
    /// A shipping method charged on the order.
    Shipping(ShippingItem),
    /// An extra fee (handling, invoice fee, ...).
    Fee(FeeItem),
    /// An applied coupon.
    Coupon(CouponItem),
    /// A tax rate used by the order.
    Tax(TaxItem),
}

impl OrderItem {
    /// Returns the merchandise payload, if this is a merchandise item.
    #[must_use]
    pub const fn as_merchandise(&self) -> Option<&MerchandiseItem> {
        match self {
            Self::Merchandise(item) => Some(item),
            _ => None,
        }
    }

    /// Returns the shipping payload, if this is a shipping item.
    #[must_use]
    pub const fn as_shipping(&self) -> Option<&ShippingItem> {
        match self {
            Self::Shipping(item) => Some(item),
            _ => None,
        }
    }

    /// Returns the fee payload, if this is a fee item.
    #[must_use]
    pub const fn as_fee(&self) -> Option<&FeeItem> {
        match self {
            Self::Fee(item) => Some(item),
            _ => None,
        }
    }

    /// Returns the coupon payload, if this is a coupon item.
    #[must_use]
    pub const fn as_coupon(&self) -> Option<&CouponItem> {
        match self {
            Self::Coupon(item) => Some(item),
            _ => None,
        }
    }

    /// Returns the tax payload, if this is a tax item.
    #[must_use]
    pub const fn as_tax(&self) -> Option<&TaxItem> {
        match self {
            Self::Tax(item) => Some(item),
            _ => None,
        }
    }
}

/// Catalog product (or variant) referenced by a merchandise item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductRef {
    /// Store product identifier.
    pub id: String,
    /// Stock keeping unit, if the store has one.
    #[serde(default)]
    pub sku: Option<String>,
    /// Virtual products are not shipped.
    #[serde(default)]
    pub is_virtual: bool,
}

impl ProductRef {
    /// Returns the SKU unless it is missing or blank.
    #[must_use]
    pub fn non_empty_sku(&self) -> Option<&str> {
        self.sku.as_deref().filter(|sku| !sku.trim().is_empty())
    }
}

/// A purchased product line.
///
/// `subtotal` is the pre-discount line amount, `total` the amount after discounts;
/// both exclude tax.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MerchandiseItem {
    /// Display name.
    pub name: String,
    /// Ordered quantity; zero is treated as one.
    #[serde(default)]
    pub quantity: u32,
    /// Line amount before discounts, excluding tax.
    pub subtotal: Decimal,
    /// Tax on `subtotal`.
    #[serde(default)]
    pub subtotal_tax: Decimal,
    /// Line amount after discounts, excluding tax.
    pub total: Decimal,
    /// Tax on `total`.
    #[serde(default)]
    pub total_tax: Decimal,
    /// Tax breakdown by rate id.
    #[serde(default)]
    pub taxes: TaxBreakdown,
    /// Parent product; `None` when it was deleted from the catalog.
    #[serde(default)]
    pub product: Option<ProductRef>,
    /// Purchased variant of `product`.
    #[serde(default)]
    pub variant: Option<ProductRef>,
}

/// A shipping line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShippingItem {
    /// Display name.
    pub name: String,
    /// Shipping method identifier (e.g. `flat_rate`).
    #[serde(default)]
    pub method_id: String,
    /// Shipping method instance identifier.
    #[serde(default)]
    pub instance_id: String,
    /// Shipping cost, excluding tax.
    pub total: Decimal,
    /// Tax on `total`.
    #[serde(default)]
    pub total_tax: Decimal,
    /// Tax breakdown by rate id.
    #[serde(default)]
    pub taxes: TaxBreakdown,
}

/// A fee line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeeItem {
    /// Display name.
    pub name: String,
    /// Fee amount, excluding tax.
    pub total: Decimal,
    /// Tax on `total`.
    #[serde(default)]
    pub total_tax: Decimal,
    /// Tax breakdown by rate id.
    #[serde(default)]
    pub taxes: TaxBreakdown,
}

/// An applied coupon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CouponItem {
    /// Coupon code.
    pub name: String,
    /// Discount granted, excluding tax.
    pub discount: Decimal,
    /// Tax portion of the discount.
    #[serde(default)]
    pub discount_tax: Decimal,
}

/// A tax rate applied somewhere on the order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaxItem {
    /// Tax-rate id, matching the keys of item tax breakdowns.
    pub rate_id: String,
    /// Display label (e.g. `VAT 25%`).
    #[serde(default)]
    pub label: String,
}
