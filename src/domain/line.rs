use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::errors::DomainError;

/// A priced line item as carried by carts and order snapshots.
///
/// `price` is the unit price recorded when the line was first added and is
/// never rewritten afterwards. `total_price` is recomputed on every merge
/// using the unit price in effect at that moment, so a mid-session catalog
/// price change shows up in the recomputed total but not in the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: Uuid,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub price: BigDecimal,
    #[schema(value_type = String)]
    pub total_price: BigDecimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub customization_details: Option<serde_json::Value>,
}

/// Merge a quantity of a product into the line list.
///
/// An existing line keeps its recorded unit price snapshot but has its total
/// recomputed from the merged quantity and the current `unit_price`; a new
/// product gets a fresh line.
pub fn merge_line(
    lines: &mut Vec<LineItem>,
    product_id: Uuid,
    quantity: i32,
    unit_price: &BigDecimal,
) -> Result<(), DomainError> {
    if quantity < 1 {
        return Err(DomainError::InvalidInput(format!(
            "Quantity must be at least 1, got {quantity}"
        )));
    }

    match lines.iter_mut().find(|l| l.product_id == product_id) {
        Some(line) => {
            line.quantity += quantity;
            line.total_price = unit_price * BigDecimal::from(line.quantity);
        }
        None => lines.push(LineItem {
            product_id,
            quantity,
            price: unit_price.clone(),
            total_price: unit_price * BigDecimal::from(quantity),
            customization_details: None,
        }),
    }
    Ok(())
}

/// Remove the line for `product_id`, failing when it is not present.
pub fn remove_line(lines: &mut Vec<LineItem>, product_id: Uuid) -> Result<(), DomainError> {
    let before = lines.len();
    lines.retain(|l| l.product_id != product_id);
    if lines.len() == before {
        return Err(DomainError::NotFound(
            "Product not found in the cart".to_string(),
        ));
    }
    Ok(())
}

/// Sum of the line totals.
pub fn lines_total(lines: &[LineItem]) -> BigDecimal {
    lines
        .iter()
        .fold(BigDecimal::from(0), |acc, l| acc + &l.total_price)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    #[test]
    fn merge_appends_new_line_with_snapshot_and_total() {
        let mut lines = Vec::new();
        let id = Uuid::new_v4();
        merge_line(&mut lines, id, 2, &dec("1200")).expect("merge failed");

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(lines[0].price, dec("1200"));
        assert_eq!(lines[0].total_price, dec("2400"));
    }

    #[test]
    fn merge_same_product_twice_sums_quantities() {
        let mut lines = Vec::new();
        let id = Uuid::new_v4();
        merge_line(&mut lines, id, 2, &dec("10")).expect("merge failed");
        merge_line(&mut lines, id, 3, &dec("10")).expect("merge failed");

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 5);
        assert_eq!(lines[0].total_price, dec("50"));
    }

    #[test]
    fn merge_keeps_unit_price_snapshot_but_recomputes_total() {
        let mut lines = Vec::new();
        let id = Uuid::new_v4();
        merge_line(&mut lines, id, 1, &dec("10")).expect("merge failed");
        // Catalog price changed to 12 before the second add.
        merge_line(&mut lines, id, 1, &dec("12")).expect("merge failed");

        assert_eq!(lines[0].price, dec("10"), "snapshot is not rewritten");
        assert_eq!(lines[0].total_price, dec("24"), "total uses the fresh price");
    }

    #[test]
    fn merge_rejects_zero_quantity() {
        let mut lines = Vec::new();
        let err = merge_line(&mut lines, Uuid::new_v4(), 0, &dec("10"))
            .expect_err("zero quantity must be rejected");
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn remove_missing_product_is_not_found() {
        let mut lines = Vec::new();
        merge_line(&mut lines, Uuid::new_v4(), 1, &dec("5")).expect("merge failed");

        let err = remove_line(&mut lines, Uuid::new_v4()).expect_err("must fail");
        assert!(matches!(err, DomainError::NotFound(_)));
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn remove_drops_only_the_matching_line() {
        let mut lines = Vec::new();
        let keep = Uuid::new_v4();
        let drop = Uuid::new_v4();
        merge_line(&mut lines, keep, 1, &dec("5")).expect("merge failed");
        merge_line(&mut lines, drop, 2, &dec("7")).expect("merge failed");

        remove_line(&mut lines, drop).expect("remove failed");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].product_id, keep);
    }

    #[test]
    fn lines_total_sums_all_totals() {
        let mut lines = Vec::new();
        merge_line(&mut lines, Uuid::new_v4(), 2, &dec("10")).expect("merge failed");
        merge_line(&mut lines, Uuid::new_v4(), 1, &dec("5.50")).expect("merge failed");
        assert_eq!(lines_total(&lines), dec("25.50"));
    }

    #[test]
    fn lines_total_of_empty_list_is_zero() {
        assert_eq!(lines_total(&[]), BigDecimal::from(0));
    }
}
