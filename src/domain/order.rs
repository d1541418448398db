use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Canceled,
    Returned,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Canceled => "canceled",
            OrderStatus::Returned => "returned",
        }
    }

    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "canceled" => Ok(OrderStatus::Canceled),
            "returned" => Ok(OrderStatus::Returned),
            other => Err(DomainError::Internal(format!(
                "Unknown order status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Refunded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    CreditCard,
    Paypal,
    CashOnDelivery,
    BankTransfer,
}

/// Shipping address block. Every field is required at order creation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShippingDetails {
    pub address: String,
    pub city: String,
    pub province: String,
    pub country: String,
    pub postal_code: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[schema(value_type = String)]
    pub payment_amount: BigDecimal,
}

/// Record a completed payment and advance the order to processing.
///
/// One-way: there is no rejection or refund counter-transition, and the
/// transition applies regardless of the order's prior status.
pub fn mark_paid(
    payment: &mut PaymentDetails,
    status: &mut OrderStatus,
    order_total: &BigDecimal,
    transaction_id: Option<String>,
    amount: Option<BigDecimal>,
) {
    payment.payment_status = PaymentStatus::Completed;
    payment.transaction_id = transaction_id;
    payment.payment_amount = amount.unwrap_or_else(|| order_total.clone());
    *status = OrderStatus::Processing;
}

/// Advance the order to delivered.
pub fn mark_delivered(status: &mut OrderStatus) {
    *status = OrderStatus::Delivered;
}

/// An order can plausibly go out for delivery only from these states; used
/// for diagnostics when an operator force-delivers an order.
pub fn is_eligible_for_delivery(status: OrderStatus) -> bool {
    matches!(status, OrderStatus::Processing | OrderStatus::Shipped)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    fn payment() -> PaymentDetails {
        PaymentDetails {
            payment_method: PaymentMethod::CreditCard,
            payment_status: PaymentStatus::Pending,
            transaction_id: None,
            payment_amount: dec("100"),
        }
    }

    #[test]
    fn mark_paid_completes_payment_and_moves_to_processing() {
        let mut p = payment();
        let mut status = OrderStatus::Pending;

        mark_paid(
            &mut p,
            &mut status,
            &dec("100"),
            Some("txn-42".to_string()),
            None,
        );

        assert_eq!(p.payment_status, PaymentStatus::Completed);
        assert_eq!(p.transaction_id.as_deref(), Some("txn-42"));
        assert_eq!(p.payment_amount, dec("100"));
        assert_eq!(status, OrderStatus::Processing);
    }

    #[test]
    fn mark_paid_amount_falls_back_to_order_total() {
        let mut p = payment();
        p.payment_amount = dec("0");
        let mut status = OrderStatus::Pending;

        mark_paid(&mut p, &mut status, &dec("250"), None, None);

        assert_eq!(p.payment_amount, dec("250"));
        assert!(p.transaction_id.is_none());
    }

    #[test]
    fn mark_paid_override_amount_wins() {
        let mut p = payment();
        let mut status = OrderStatus::Pending;

        mark_paid(&mut p, &mut status, &dec("250"), None, Some(dec("240")));

        assert_eq!(p.payment_amount, dec("240"));
    }

    #[test]
    fn mark_paid_applies_regardless_of_prior_status() {
        let mut p = payment();
        let mut status = OrderStatus::Delivered;

        mark_paid(&mut p, &mut status, &dec("10"), None, None);

        assert_eq!(status, OrderStatus::Processing);
    }

    #[test]
    fn mark_delivered_sets_delivered() {
        let mut status = OrderStatus::Processing;
        mark_delivered(&mut status);
        assert_eq!(status, OrderStatus::Delivered);
    }

    #[test]
    fn delivery_eligibility_covers_processing_and_shipped() {
        assert!(is_eligible_for_delivery(OrderStatus::Processing));
        assert!(is_eligible_for_delivery(OrderStatus::Shipped));
        assert!(!is_eligible_for_delivery(OrderStatus::Pending));
        assert!(!is_eligible_for_delivery(OrderStatus::Delivered));
        assert!(!is_eligible_for_delivery(OrderStatus::Canceled));
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Canceled,
            OrderStatus::Returned,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()).expect("parse"), status);
        }
        assert!(OrderStatus::parse("refunded").is_err());
    }

    #[test]
    fn payment_method_uses_kebab_case_wire_names() {
        let json = serde_json::to_string(&PaymentMethod::CashOnDelivery).expect("serialize");
        assert_eq!(json, "\"cash-on-delivery\"");
        let back: PaymentMethod = serde_json::from_str("\"bank-transfer\"").expect("deserialize");
        assert_eq!(back, PaymentMethod::BankTransfer);
    }
}
