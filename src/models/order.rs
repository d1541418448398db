use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::schema::orders;

/// An order row. `items` is the creation-time snapshot and is never
/// rewritten; `shipping` and `payment` are JSONB sub-documents. Orders are
/// never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Value,
    pub total_amount: BigDecimal,
    pub shipping: Value,
    pub payment: Value,
    pub order_status: String,
    pub delivery_date: Option<DateTime<Utc>>,
    pub tracking_number: Option<String>,
    pub is_gift: bool,
    pub gift_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrder {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Value,
    pub total_amount: BigDecimal,
    pub shipping: Value,
    pub payment: Value,
    pub order_status: String,
    pub is_gift: bool,
    pub gift_message: Option<String>,
}
