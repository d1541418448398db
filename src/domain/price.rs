use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Composite product price. The catalog always stores both parts; a product
/// without customization work simply carries a zero `customization`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductPrice {
    #[schema(value_type = String)]
    pub base: BigDecimal,
    #[schema(value_type = String)]
    pub customization: BigDecimal,
}

/// Resolve the effective unit price of a product.
///
/// This is the single place where the composite price collapses to a scalar;
/// cart and order code never look at the parts.
pub fn unit_price(price: &ProductPrice) -> BigDecimal {
    &price.base + &price.customization
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    #[test]
    fn unit_price_sums_base_and_customization() {
        let price = ProductPrice {
            base: dec("1000"),
            customization: dec("200"),
        };
        assert_eq!(unit_price(&price), dec("1200"));
    }

    #[test]
    fn unit_price_with_zero_customization_is_base() {
        let price = ProductPrice {
            base: dec("49.99"),
            customization: dec("0"),
        };
        assert_eq!(unit_price(&price), dec("49.99"));
    }
}
