use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::schema::carts;

/// One cart row per user. Line items and the saved-for-later list are JSONB
/// documents so a cart mutation is a single-row write.
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = carts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Value,
    pub saved_for_later: Value,
    pub total_amount: BigDecimal,
    pub discount_code: Option<String>,
    pub discount_amount: BigDecimal,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = carts)]
pub struct NewCart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Value,
    pub total_amount: BigDecimal,
}
