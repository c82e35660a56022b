//! Ledyer order-line schema.

use serde::{Deserialize, Serialize};

/// Kind of a Ledyer order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderLineType {
    /// Shipped goods.
    Physical,
    /// Virtual goods and lines without a catalog product.
    Digital,
    /// Shipping cost.
    ShippingFee,
    /// Fees added on top of the goods.
    Surcharge,
    /// Coupon discount.
    Discount,
}

/// One line of a Ledyer order. All amounts are integer minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    /// Line kind.
    #[serde(rename = "type")]
    pub line_type: OrderLineType,
    /// Merchant reference, at most 200 characters.
    pub reference: String,
    /// Human-readable description, at most 200 characters.
    pub description: String,
    /// Quantity, always positive.
    pub quantity: u32,
    /// Price per unit including tax.
    pub unit_price: i64,
    /// Discount per unit including tax.
    pub unit_discount_amount: i64,
    /// VAT rate in percent.
    pub vat: u8,
    /// Line total including tax, after discounts.
    pub total_amount: i64,
    /// Tax part of `total_amount`.
    pub total_vat_amount: i64,
}

/// Aggregate order amounts in minor units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    /// Order total including tax.
    pub total_amount: i64,
    /// Order total excluding tax.
    pub total_amount_excl_vat: i64,
    /// Tax part of the order total.
    pub total_vat_amount: i64,
}

/// Body of an order-lines edit request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditOrderPayload {
    /// Replacement order lines.
    pub order_lines: Vec<OrderLine>,
    /// Order total including tax.
    pub total_order_amount: i64,
    /// Order total excluding tax.
    pub total_order_amount_excl_vat: i64,
    /// Tax part of the order total.
    pub total_order_vat_amount: i64,
}

/// Body of a capture request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturePayload {
    /// Captured order lines.
    pub order_lines: Vec<OrderLine>,
    /// Amount to capture including tax.
    pub total_capture_amount: i64,
}

/// Result of mapping an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedOrder {
    /// Order lines in item-stream order: merchandise, shipping, fees, coupons.
    pub order_lines: Vec<OrderLine>,
    /// Aggregate totals.
    pub totals: OrderTotals,
}

impl MappedOrder {
    /// Builds the body of an order-lines edit request.
    #[must_use]
    pub fn into_edit_payload(self) -> EditOrderPayload {
        EditOrderPayload {
            order_lines: self.order_lines,
            total_order_amount: self.totals.total_amount,
            total_order_amount_excl_vat: self.totals.total_amount_excl_vat,
            total_order_vat_amount: self.totals.total_vat_amount,
        }
    }

    /// Builds the body of a capture request.
    #[must_use]
    pub fn into_capture_payload(self) -> CapturePayload {
        CapturePayload {
            order_lines: self.order_lines,
            total_capture_amount: self.totals.total_amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn shipping_line() -> OrderLine {
        OrderLine {
            line_type: OrderLineType::ShippingFee,
            reference: "flat_rate:3".to_owned(),
            description: "Post".to_owned(),
            quantity: 1,
            unit_price: 500,
            unit_discount_amount: 0,
            vat: 25,
            total_amount: 500,
            total_vat_amount: 100,
        }
    }

    #[test]
    fn test_order_line_wire_format() {
        let value = serde_json::to_value(shipping_line()).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "shippingFee",
                "reference": "flat_rate:3",
                "description": "Post",
                "quantity": 1,
                "unitPrice": 500,
                "unitDiscountAmount": 0,
                "vat": 25,
                "totalAmount": 500,
                "totalVatAmount": 100
            })
        );
    }

    #[test]
    fn test_edit_and_capture_payloads() {
        let mapped = MappedOrder {
            order_lines: vec![shipping_line()],
            totals: OrderTotals { total_amount: 500, total_amount_excl_vat: 400, total_vat_amount: 100 },
        };

        let edit = serde_json::to_value(mapped.clone().into_edit_payload()).unwrap();
        assert_eq!(edit["totalOrderAmount"], 500);
        assert_eq!(edit["totalOrderAmountExclVat"], 400);
        assert_eq!(edit["totalOrderVatAmount"], 100);
        assert_eq!(edit["orderLines"].as_array().unwrap().len(), 1);

        let capture = serde_json::to_value(mapped.into_capture_payload()).unwrap();
        assert_eq!(capture["totalCaptureAmount"], 500);
        assert!(capture.get("totalOrderAmount").is_none());
    }
}
