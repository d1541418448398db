use std::collections::HashMap;
use std::str::FromStr;

use actix_web::{web, HttpRequest, HttpResponse};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{self, Role};
use crate::db::DbPool;
use crate::domain::line::{lines_total, LineItem};
use crate::domain::order::{
    is_eligible_for_delivery, mark_delivered, mark_paid, OrderStatus, PaymentDetails,
    PaymentMethod, PaymentStatus, ShippingDetails,
};
use crate::domain::price::ProductPrice;
use crate::errors::AppError;
use crate::handlers::products::increment_sales_count;
use crate::models::order::{NewOrder, Order};
use crate::models::product::Product;
use crate::models::user::User;
use crate::schema::{orders, products, users};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    /// Decimal price as a string to avoid floating-point issues, e.g. "9.99"
    pub price: String,
    pub total_price: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetailsRequest {
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub products: Vec<OrderLineRequest>,
    pub shipping_details: ShippingDetails,
    pub payment_details: PaymentDetailsRequest,
    #[serde(default)]
    pub is_gift: bool,
    #[serde(default)]
    pub gift_message: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayOrderRequest {
    #[serde(default)]
    pub transaction_id: Option<String>,
    /// Decimal amount as a string; falls back to the order total.
    #[serde(default)]
    pub payment_amount: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: Uuid,
    pub user: Uuid,
    pub products: Vec<LineItem>,
    #[schema(value_type = String)]
    pub total_amount: BigDecimal,
    pub shipping_details: ShippingDetails,
    pub payment_details: PaymentDetails,
    pub order_status: OrderStatus,
    pub delivery_date: Option<DateTime<Utc>>,
    pub tracking_number: Option<String>,
    pub is_gift: bool,
    pub gift_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserRef {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductRef {
    pub id: Uuid,
    pub name: String,
    pub price: ProductPrice,
}

/// A line item with its product reference expanded for display. `product`
/// is null when the product has since been deleted from the catalog.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpandedLineItem {
    pub product: Option<ProductRef>,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub price: BigDecimal,
    #[schema(value_type = String)]
    pub total_price: BigDecimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpandedOrderResponse {
    pub id: Uuid,
    pub user: UserRef,
    pub products: Vec<ExpandedLineItem>,
    #[schema(value_type = String)]
    pub total_amount: BigDecimal,
    pub shipping_details: ShippingDetails,
    pub payment_details: PaymentDetails,
    pub order_status: OrderStatus,
    pub delivery_date: Option<DateTime<Utc>>,
    pub tracking_number: Option<String>,
    pub is_gift: bool,
    pub gift_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ── Conversions ──────────────────────────────────────────────────────────────

fn order_response(order: Order) -> Result<OrderResponse, AppError> {
    Ok(OrderResponse {
        id: order.id,
        user: order.user_id,
        products: serde_json::from_value(order.items)?,
        total_amount: order.total_amount,
        shipping_details: serde_json::from_value(order.shipping)?,
        payment_details: serde_json::from_value(order.payment)?,
        order_status: OrderStatus::parse(&order.order_status)?,
        delivery_date: order.delivery_date,
        tracking_number: order.tracking_number,
        is_gift: order.is_gift,
        gift_message: order.gift_message,
        created_at: order.created_at,
        updated_at: order.updated_at,
    })
}

/// Expand owner and product references the way the storefront displays
/// them: owner as name/email, each line's product as name plus price.
fn expand_order(conn: &mut PgConnection, order: Order) -> Result<ExpandedOrderResponse, AppError> {
    let lines: Vec<LineItem> = serde_json::from_value(order.items)?;

    let owner = users::table
        .find(order.user_id)
        .select(User::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::Internal(format!("Owner of order {} is missing", order.id)))?;

    let ids: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();
    let referenced: Vec<Product> = products::table
        .filter(products::id.eq_any(&ids))
        .select(Product::as_select())
        .load(conn)?;
    let by_id: HashMap<Uuid, Product> = referenced.into_iter().map(|p| (p.id, p)).collect();

    let line_views = lines
        .into_iter()
        .map(|l| ExpandedLineItem {
            product: by_id.get(&l.product_id).map(|p| ProductRef {
                id: p.id,
                name: p.name.clone(),
                price: ProductPrice {
                    base: p.price_base.clone(),
                    customization: p.price_customization.clone(),
                },
            }),
            quantity: l.quantity,
            price: l.price,
            total_price: l.total_price,
        })
        .collect();

    Ok(ExpandedOrderResponse {
        id: order.id,
        user: UserRef {
            id: owner.id,
            name: owner.name,
            email: owner.email,
        },
        products: line_views,
        total_amount: order.total_amount,
        shipping_details: serde_json::from_value(order.shipping)?,
        payment_details: serde_json::from_value(order.payment)?,
        order_status: OrderStatus::parse(&order.order_status)?,
        delivery_date: order.delivery_date,
        tracking_number: order.tracking_number,
        is_gift: order.is_gift,
        gift_message: order.gift_message,
        created_at: order.created_at,
        updated_at: order.updated_at,
    })
}

fn parse_price(label: &str, value: &str) -> Result<BigDecimal, AppError> {
    BigDecimal::from_str(value)
        .map_err(|e| AppError::InvalidArgument(format!("Invalid {label} '{value}': {e}")))
}

fn find_order(conn: &mut PgConnection, id: Uuid) -> Result<Order, AppError> {
    orders::table
        .find(id)
        .select(Order::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /api/v1/orders/addOrderItems
///
/// Creates an order from the submitted line items. The total (and the
/// payment amount) is the sum of the submitted line totals; no re-pricing
/// against the catalog happens here.
#[utoipa::path(
    post,
    path = "/api/v1/orders/addOrderItems",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderResponse),
        (status = 400, description = "No products in the order"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    pool: web::Data<DbPool>,
    req: HttpRequest,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let token = auth::bearer_token(&req)?;
    let body = body.into_inner();

    if body.products.is_empty() {
        return Err(AppError::InvalidArgument(
            "No products in the order".to_string(),
        ));
    }

    let lines: Vec<LineItem> = body
        .products
        .iter()
        .map(|l| {
            if l.quantity < 1 {
                return Err(AppError::InvalidArgument(format!(
                    "Quantity must be at least 1, got {}",
                    l.quantity
                )));
            }
            Ok(LineItem {
                product_id: l.product_id,
                quantity: l.quantity,
                price: parse_price("price", &l.price)?,
                total_price: parse_price("totalPrice", &l.total_price)?,
                customization_details: None,
            })
        })
        .collect::<Result<_, _>>()?;

    let total = lines_total(&lines);
    let payment = PaymentDetails {
        payment_method: body.payment_details.payment_method,
        payment_status: PaymentStatus::Pending,
        transaction_id: body.payment_details.transaction_id,
        payment_amount: total.clone(),
    };

    let order = web::block(move || {
        let mut conn = pool.get()?;
        let user = auth::authenticate(&mut conn, &token)?;

        let order = diesel::insert_into(orders::table)
            .values(&NewOrder {
                id: Uuid::new_v4(),
                user_id: user.id,
                items: serde_json::to_value(&lines)?,
                total_amount: total,
                shipping: serde_json::to_value(&body.shipping_details)?,
                payment: serde_json::to_value(&payment)?,
                order_status: OrderStatus::Pending.as_str().to_string(),
                is_gift: body.is_gift,
                gift_message: body.gift_message,
            })
            .returning(Order::as_returning())
            .get_result(&mut conn)?;

        Ok::<_, AppError>(order)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(order_response(order)?))
}

/// GET /api/v1/orders/myorders
#[utoipa::path(
    get,
    path = "/api/v1/orders/myorders",
    responses(
        (status = 200, description = "The caller's orders", body = [OrderResponse]),
    ),
    tag = "orders"
)]
pub async fn get_my_orders(
    pool: web::Data<DbPool>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let token = auth::bearer_token(&req)?;

    let rows = web::block(move || {
        let mut conn = pool.get()?;
        let user = auth::authenticate(&mut conn, &token)?;

        let rows = orders::table
            .filter(orders::user_id.eq(user.id))
            .order(orders::created_at.desc())
            .select(Order::as_select())
            .load(&mut conn)?;

        Ok::<_, AppError>(rows)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    let responses: Vec<OrderResponse> = rows
        .into_iter()
        .map(order_response)
        .collect::<Result<_, _>>()?;
    Ok(HttpResponse::Ok().json(responses))
}

/// GET /api/v1/orders/{id}
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = ExpandedOrderResponse),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    pool: web::Data<DbPool>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let token = auth::bearer_token(&req)?;
    let order_id = path.into_inner();

    let expanded = web::block(move || {
        let mut conn = pool.get()?;
        auth::authenticate(&mut conn, &token)?;

        let order = find_order(&mut conn, order_id)?;
        expand_order(&mut conn, order)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(expanded))
}

/// PUT /api/v1/orders/{id}/pay
///
/// Records the payment and advances the order to processing. Sales counts
/// for the ordered products are bumped afterwards on a best-effort basis; a
/// failure there is logged and never surfaces to the paying request.
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/pay",
    request_body = PayOrderRequest,
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order marked as paid", body = OrderResponse),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn pay_order(
    pool: web::Data<DbPool>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: Option<web::Json<PayOrderRequest>>,
) -> Result<HttpResponse, AppError> {
    let token = auth::bearer_token(&req)?;
    let order_id = path.into_inner();
    let body = body.map(web::Json::into_inner).unwrap_or_default();

    let amount = body
        .payment_amount
        .as_deref()
        .map(|raw| parse_price("paymentAmount", raw))
        .transpose()?;

    let order = web::block(move || {
        let mut conn = pool.get()?;
        auth::authenticate(&mut conn, &token)?;

        let order = find_order(&mut conn, order_id)?;

        let mut payment: PaymentDetails = serde_json::from_value(order.payment.clone())?;
        let mut status = OrderStatus::parse(&order.order_status)?;
        mark_paid(
            &mut payment,
            &mut status,
            &order.total_amount,
            body.transaction_id,
            amount,
        );

        let updated = diesel::update(orders::table.find(order.id))
            .set((
                orders::payment.eq(serde_json::to_value(&payment)?),
                orders::order_status.eq(status.as_str()),
                orders::updated_at.eq(Utc::now()),
            ))
            .returning(Order::as_returning())
            .get_result(&mut conn)?;

        // One sale per line item, outside any transaction: a miss here must
        // not fail the payment.
        let lines: Vec<LineItem> = serde_json::from_value(updated.items.clone())?;
        for line in &lines {
            if let Err(e) = increment_sales_count(&mut conn, line.product_id) {
                log::warn!(
                    "Failed to update sales count for product {}: {}",
                    line.product_id,
                    e
                );
            }
        }

        Ok::<_, AppError>(updated)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(order_response(order)?))
}

/// PUT /api/v1/orders/{id}/deliver
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/deliver",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order marked as delivered", body = OrderResponse),
        (status = 403, description = "Caller is not an administrator"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn deliver_order(
    pool: web::Data<DbPool>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let token = auth::bearer_token(&req)?;
    let order_id = path.into_inner();

    let order = web::block(move || {
        let mut conn = pool.get()?;
        let user = auth::authenticate(&mut conn, &token)?;
        user.require_role(Role::Admin)?;

        let order = find_order(&mut conn, order_id)?;

        let mut status = OrderStatus::parse(&order.order_status)?;
        if !is_eligible_for_delivery(status) {
            log::warn!(
                "Order {} delivered from status '{}'",
                order.id,
                status.as_str()
            );
        }
        mark_delivered(&mut status);

        let updated = diesel::update(orders::table.find(order.id))
            .set((
                orders::order_status.eq(status.as_str()),
                orders::delivery_date.eq(Some(Utc::now())),
                orders::updated_at.eq(Utc::now()),
            ))
            .returning(Order::as_returning())
            .get_result(&mut conn)?;

        Ok::<_, AppError>(updated)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(order_response(order)?))
}

/// GET /api/v1/orders
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    responses(
        (status = 200, description = "All orders", body = [ExpandedOrderResponse]),
        (status = 403, description = "Caller is not an administrator"),
    ),
    tag = "orders"
)]
pub async fn get_all_orders(
    pool: web::Data<DbPool>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let token = auth::bearer_token(&req)?;

    let expanded = web::block(move || {
        let mut conn = pool.get()?;
        let user = auth::authenticate(&mut conn, &token)?;
        user.require_role(Role::Admin)?;

        let rows = orders::table
            .order(orders::created_at.desc())
            .select(Order::as_select())
            .load(&mut conn)?;

        rows.into_iter()
            .map(|order| expand_order(&mut conn, order))
            .collect::<Result<Vec<_>, _>>()
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(expanded))
}
