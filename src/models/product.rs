use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::schema::products;

/// Catalog tags carried over from the tailoring shop this service fronts.
pub const CATEGORIES: [&str; 20] = [
    "Shalwar Kameez",
    "Kurta",
    "Sherwani",
    "Lehenga",
    "Gown",
    "Maxi",
    "Suit",
    "Shirt",
    "Pant",
    "Jacket",
    "Other",
    "Fabric",
    "Buttons",
    "Zippers",
    "Thread",
    "Lining",
    "Embroidery Material",
    "Lace",
    "Beads",
    "Sequins",
];

pub fn validate_category(category: &str) -> Result<(), DomainError> {
    if CATEGORIES.contains(&category) {
        return Ok(());
    }
    Err(DomainError::InvalidInput(format!(
        "Invalid category '{category}'"
    )))
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductImage {
    pub url: String,
    pub alt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomizationExtra {
    #[serde(rename = "type")]
    pub extra_type: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct Customizations {
    #[serde(default)]
    pub fabric: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub extras: Vec<CustomizationExtra>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub price_base: BigDecimal,
    pub price_customization: BigDecimal,
    pub description: Option<String>,
    pub images: Value,
    pub measurements: Value,
    pub customizations: Value,
    pub in_stock: bool,
    pub lead_time_days: i32,
    pub reviews: Value,
    pub num_reviews: i32,
    pub rating_average: f64,
    pub rating_count: i32,
    pub sales_count: i32,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = products)]
pub struct NewProduct {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub price_base: BigDecimal,
    pub price_customization: BigDecimal,
    pub description: Option<String>,
    pub images: Value,
    pub measurements: Value,
    pub customizations: Value,
    pub in_stock: bool,
    pub lead_time_days: i32,
    pub created_by: Uuid,
}

/// Partial update written by the update endpoint. `None` fields are left
/// untouched; `updated_at` is always stamped by the handler.
#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = products)]
pub struct ProductChangeset {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price_base: Option<BigDecimal>,
    pub price_customization: Option<BigDecimal>,
    pub description: Option<String>,
    pub images: Option<Value>,
    pub measurements: Option<Value>,
    pub customizations: Option<Value>,
    pub in_stock: Option<bool>,
    pub lead_time_days: Option<i32>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_categories_validate() {
        assert!(validate_category("Kurta").is_ok());
        assert!(validate_category("Embroidery Material").is_ok());
    }

    #[test]
    fn unknown_category_is_rejected() {
        let err = validate_category("Electronics").expect_err("must fail");
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn customization_extra_uses_type_key_on_the_wire() {
        let extra = CustomizationExtra {
            extra_type: "Embroidery".to_string(),
            description: "sleeve work".to_string(),
        };
        let json = serde_json::to_value(&extra).expect("serialize");
        assert_eq!(json["type"], "Embroidery");
    }
}
