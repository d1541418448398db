use actix_web::{web, HttpRequest, HttpResponse};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth;
use crate::db::DbPool;
use crate::domain::cart::{apply_discount, discount_percent, recompute_total};
use crate::domain::line::{merge_line, remove_line, LineItem};
use crate::domain::price::{unit_price, ProductPrice};
use crate::errors::AppError;
use crate::models::cart::{Cart, NewCart};
use crate::models::product::Product;
use crate::schema::{carts, products};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartEntryRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddProductsRequest {
    pub products: Vec<CartEntryRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplyCouponRequest {
    pub coupon_code: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub id: Uuid,
    pub user: Uuid,
    pub products: Vec<LineItem>,
    pub saved_for_later: Vec<LineItem>,
    #[schema(value_type = String)]
    pub total_amount: BigDecimal,
    pub discount_code: Option<String>,
    #[schema(value_type = String)]
    pub discount_amount: BigDecimal,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn cart_response(cart: Cart) -> Result<CartResponse, AppError> {
    Ok(CartResponse {
        id: cart.id,
        user: cart.user_id,
        products: serde_json::from_value(cart.items)?,
        saved_for_later: serde_json::from_value(cart.saved_for_later)?,
        total_amount: cart.total_amount,
        discount_code: cart.discount_code,
        discount_amount: cart.discount_amount,
        expires_at: cart.expires_at,
        created_at: cart.created_at,
        updated_at: cart.updated_at,
    })
}

fn find_cart(conn: &mut PgConnection, user_id: Uuid) -> Result<Option<Cart>, AppError> {
    Ok(carts::table
        .filter(carts::user_id.eq(user_id))
        .select(Cart::as_select())
        .first(conn)
        .optional()?)
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /api/v1/cart/add-product
///
/// Adds line items to the caller's cart, creating the cart on first use.
/// Quantities for a product already in the cart are merged into its line.
/// The cart total is re-derived from the lines before the row is written.
#[utoipa::path(
    post,
    path = "/api/v1/cart/add-product",
    request_body = AddProductsRequest,
    responses(
        (status = 201, description = "Cart updated", body = CartResponse),
        (status = 400, description = "No products provided"),
        (status = 404, description = "A referenced product does not exist"),
    ),
    tag = "cart"
)]
pub async fn add_products(
    pool: web::Data<DbPool>,
    req: HttpRequest,
    body: web::Json<AddProductsRequest>,
) -> Result<HttpResponse, AppError> {
    let token = auth::bearer_token(&req)?;
    let body = body.into_inner();

    if body.products.is_empty() {
        return Err(AppError::InvalidArgument("No products provided".to_string()));
    }

    let cart = web::block(move || {
        let mut conn = pool.get()?;
        let user = auth::authenticate(&mut conn, &token)?;

        let existing = find_cart(&mut conn, user.id)?;
        let (cart_id, mut lines, discount_amount, is_new) = match &existing {
            Some(cart) => (
                cart.id,
                serde_json::from_value::<Vec<LineItem>>(cart.items.clone())?,
                cart.discount_amount.clone(),
                false,
            ),
            None => (Uuid::new_v4(), Vec::new(), BigDecimal::from(0), true),
        };

        for entry in &body.products {
            let product = products::table
                .filter(products::id.eq(entry.product_id))
                .select(Product::as_select())
                .first(&mut conn)
                .optional()?;
            let Some(product) = product else {
                return Err(AppError::NotFound(format!(
                    "Product with ID {} not found",
                    entry.product_id
                )));
            };

            let unit = unit_price(&ProductPrice {
                base: product.price_base,
                customization: product.price_customization,
            });
            merge_line(&mut lines, entry.product_id, entry.quantity, &unit)?;
        }

        let total = recompute_total(&lines, &discount_amount);
        let items = serde_json::to_value(&lines)?;

        let cart = if is_new {
            diesel::insert_into(carts::table)
                .values(&NewCart {
                    id: cart_id,
                    user_id: user.id,
                    items,
                    total_amount: total,
                })
                .returning(Cart::as_returning())
                .get_result(&mut conn)?
        } else {
            diesel::update(carts::table.filter(carts::id.eq(cart_id)))
                .set((
                    carts::items.eq(items),
                    carts::total_amount.eq(total),
                    carts::updated_at.eq(Utc::now()),
                ))
                .returning(Cart::as_returning())
                .get_result(&mut conn)?
        };

        Ok::<_, AppError>(cart)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(cart_response(cart)?))
}

/// POST /api/v1/cart/apply-coupon
///
/// Resolves the coupon's discount percentage and takes it off the current
/// total. The discount is computed from the total as it stands, so applying
/// a coupon twice compounds; this mirrors the storefront's behavior.
#[utoipa::path(
    post,
    path = "/api/v1/cart/apply-coupon",
    request_body = ApplyCouponRequest,
    responses(
        (status = 200, description = "Coupon applied", body = CartResponse),
        (status = 404, description = "Cart not found"),
    ),
    tag = "cart"
)]
pub async fn apply_coupon(
    pool: web::Data<DbPool>,
    req: HttpRequest,
    body: web::Json<ApplyCouponRequest>,
) -> Result<HttpResponse, AppError> {
    let token = auth::bearer_token(&req)?;
    let code = body.into_inner().coupon_code;

    let cart = web::block(move || {
        let mut conn = pool.get()?;
        let user = auth::authenticate(&mut conn, &token)?;

        let Some(cart) = find_cart(&mut conn, user.id)? else {
            return Err(AppError::NotFound("Cart not found".to_string()));
        };

        let percent = discount_percent(&code);
        let (discount, total) = apply_discount(&cart.total_amount, percent);

        let cart = diesel::update(carts::table.filter(carts::id.eq(cart.id)))
            .set((
                carts::discount_code.eq(&code),
                carts::discount_amount.eq(discount),
                carts::total_amount.eq(total),
                carts::updated_at.eq(Utc::now()),
            ))
            .returning(Cart::as_returning())
            .get_result(&mut conn)?;

        Ok::<_, AppError>(cart)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(cart_response(cart)?))
}

/// DELETE /api/v1/cart/remove/{productId}
///
/// The id is validated syntactically before any lookup happens.
#[utoipa::path(
    delete,
    path = "/api/v1/cart/remove/{productId}",
    params(
        ("productId" = String, Path, description = "Product UUID to remove"),
    ),
    responses(
        (status = 200, description = "Product removed", body = CartResponse),
        (status = 400, description = "Malformed product id"),
        (status = 404, description = "Cart or product not found"),
    ),
    tag = "cart"
)]
pub async fn remove_product(
    pool: web::Data<DbPool>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let token = auth::bearer_token(&req)?;
    let product_id = Uuid::parse_str(&path.into_inner())
        .map_err(|_| AppError::InvalidArgument("Invalid Product ID format".to_string()))?;

    let cart = web::block(move || {
        let mut conn = pool.get()?;
        let user = auth::authenticate(&mut conn, &token)?;

        let Some(cart) = find_cart(&mut conn, user.id)? else {
            return Err(AppError::NotFound("Cart not found".to_string()));
        };

        let mut lines: Vec<LineItem> = serde_json::from_value(cart.items.clone())?;
        remove_line(&mut lines, product_id)?;

        let total = recompute_total(&lines, &cart.discount_amount);
        let items = serde_json::to_value(&lines)?;

        let cart = diesel::update(carts::table.filter(carts::id.eq(cart.id)))
            .set((
                carts::items.eq(items),
                carts::total_amount.eq(total),
                carts::updated_at.eq(Utc::now()),
            ))
            .returning(Cart::as_returning())
            .get_result(&mut conn)?;

        Ok::<_, AppError>(cart)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Product removed from cart",
        "cart": cart_response(cart)?,
    })))
}
