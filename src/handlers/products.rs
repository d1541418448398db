use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{self, Role};
use crate::db::DbPool;
use crate::domain::filter::{
    default_sort, pagination, parse_filters, parse_sort, Cmp, FilterExpr, SortField, SortKey,
    StrMatch, RESERVED_KEYS,
};
use crate::domain::price::ProductPrice;
use crate::domain::review::{add_review, mean_rating, validate_rating, Review};
use crate::errors::AppError;
use crate::models::product::{
    validate_category, Customizations, NewProduct, Product, ProductChangeset, ProductImage,
};
use crate::schema::products;
use crate::uploads::{self, UploadForm};
use crate::AppConfig;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub in_stock: bool,
    pub lead_time: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Ratings {
    pub average: f64,
    pub count: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub price: ProductPrice,
    pub description: Option<String>,
    pub images: Vec<ProductImage>,
    pub measurements: BTreeMap<String, f64>,
    pub customizations: Customizations,
    pub availability: Availability,
    pub reviews: Vec<Review>,
    pub num_reviews: i32,
    pub ratings: Ratings,
    pub sales_count: i32,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn product_response(product: Product) -> Result<ProductResponse, AppError> {
    Ok(ProductResponse {
        id: product.id,
        name: product.name,
        category: product.category,
        price: ProductPrice {
            base: product.price_base,
            customization: product.price_customization,
        },
        description: product.description,
        images: serde_json::from_value(product.images)?,
        measurements: serde_json::from_value(product.measurements)?,
        customizations: serde_json::from_value(product.customizations)?,
        availability: Availability {
            in_stock: product.in_stock,
            lead_time: product.lead_time_days,
        },
        reviews: serde_json::from_value(product.reviews)?,
        num_reviews: product.num_reviews,
        ratings: Ratings {
            average: product.rating_average,
            count: product.rating_count,
        },
        sales_count: product.sales_count,
        created_by: product.created_by,
        created_at: product.created_at,
        updated_at: product.updated_at,
    })
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PriceRequest {
    /// Decimal price as a string to avoid floating-point issues, e.g. "9.99"
    pub base: Option<String>,
    pub customization: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRequest {
    pub in_stock: Option<bool>,
    pub lead_time: Option<i32>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<PriceRequest>,
    pub description: Option<String>,
    pub images: Option<Vec<ProductImage>>,
    pub measurements: Option<BTreeMap<String, f64>>,
    pub customizations: Option<Customizations>,
    pub availability: Option<AvailabilityRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReviewRequest {
    pub rating: i32,
    pub comment: String,
}

// ── Form and changeset assembly ──────────────────────────────────────────────

fn parse_price_field(label: &str, value: &str) -> Result<BigDecimal, AppError> {
    BigDecimal::from_str(value)
        .map_err(|_| AppError::InvalidArgument(format!("Invalid {label} '{value}'")))
}

/// Assemble an insertable product from a multipart submission. Nested values
/// arrive as bracketed keys (`price[base]`, `measurements[chest]`, ...).
fn build_new_product(form: &UploadForm, created_by: Uuid) -> Result<NewProduct, AppError> {
    let field = |name: &str| form.fields.get(name).map(String::as_str).filter(|v| !v.is_empty());

    let name = field("name")
        .ok_or_else(|| AppError::InvalidArgument("Product name is required".to_string()))?;
    let category = field("category")
        .ok_or_else(|| AppError::InvalidArgument("Category is required".to_string()))?;
    validate_category(category)?;

    let price_base = field("price[base]")
        .ok_or_else(|| AppError::InvalidArgument("Base price is required".to_string()))
        .and_then(|v| parse_price_field("base price", v))?;
    let price_customization = field("price[customization]")
        .map(|v| parse_price_field("customization price", v))
        .transpose()?
        .unwrap_or_else(|| BigDecimal::from(0));

    let mut measurements = BTreeMap::new();
    for (key, value) in &form.fields {
        if let Some(dimension) = key
            .strip_prefix("measurements[")
            .and_then(|rest| rest.strip_suffix(']'))
        {
            let parsed: f64 = value.parse().map_err(|_| {
                AppError::InvalidArgument(format!(
                    "Invalid measurement '{value}' for '{dimension}'"
                ))
            })?;
            measurements.insert(dimension.to_string(), parsed);
        }
    }
    if measurements.is_empty() {
        return Err(AppError::InvalidArgument(
            "Measurements are required".to_string(),
        ));
    }

    let alt = field("imageAlt").unwrap_or("Product image");
    let images: Vec<ProductImage> = form
        .image_urls
        .iter()
        .map(|url| ProductImage {
            url: url.clone(),
            alt: alt.to_string(),
        })
        .collect();

    let in_stock = field("availability[inStock]")
        .map(|v| {
            v.parse::<bool>().map_err(|_| {
                AppError::InvalidArgument(format!("Invalid boolean '{v}' for 'inStock'"))
            })
        })
        .transpose()?
        .unwrap_or(true);
    let lead_time_days = field("availability[leadTime]")
        .map(|v| {
            v.parse::<i32>().map_err(|_| {
                AppError::InvalidArgument(format!("Invalid number '{v}' for 'leadTime'"))
            })
        })
        .transpose()?
        .unwrap_or(7);

    let customizations = Customizations {
        fabric: field("customizations[fabric]").map(str::to_string),
        color: field("customizations[color]").map(str::to_string),
        pattern: field("customizations[pattern]").map(str::to_string),
        extras: Vec::new(),
    };

    Ok(NewProduct {
        id: Uuid::new_v4(),
        name: name.to_string(),
        category: category.to_string(),
        price_base,
        price_customization,
        description: field("description").map(str::to_string),
        images: serde_json::to_value(images)?,
        measurements: serde_json::to_value(measurements)?,
        customizations: serde_json::to_value(customizations)?,
        in_stock,
        lead_time_days,
        created_by,
    })
}

fn build_changeset(body: UpdateProductRequest) -> Result<ProductChangeset, AppError> {
    if let Some(category) = &body.category {
        validate_category(category)?;
    }
    if let Some(measurements) = &body.measurements {
        if measurements.is_empty() {
            return Err(AppError::InvalidArgument(
                "Measurements are required".to_string(),
            ));
        }
    }

    let (price_base, price_customization) = match &body.price {
        Some(price) => (
            price
                .base
                .as_deref()
                .map(|v| parse_price_field("base price", v))
                .transpose()?,
            price
                .customization
                .as_deref()
                .map(|v| parse_price_field("customization price", v))
                .transpose()?,
        ),
        None => (None, None),
    };

    let (in_stock, lead_time_days) = match &body.availability {
        Some(availability) => (availability.in_stock, availability.lead_time),
        None => (None, None),
    };

    Ok(ProductChangeset {
        name: body.name,
        category: body.category,
        price_base,
        price_customization,
        description: body.description,
        images: body.images.map(serde_json::to_value).transpose()?,
        measurements: body.measurements.map(serde_json::to_value).transpose()?,
        customizations: body.customizations.map(serde_json::to_value).transpose()?,
        in_stock,
        lead_time_days,
        updated_at: Some(Utc::now()),
    })
}

// ── Query assembly ───────────────────────────────────────────────────────────

type ProductQuery<'a> = products::BoxedQuery<'a, Pg>;

fn apply_filters(mut query: ProductQuery<'_>, filters: Vec<FilterExpr>) -> ProductQuery<'_> {
    macro_rules! cmp_filter {
        ($query:expr, $col:expr, $cmp:expr, $value:expr) => {
            match $cmp {
                Cmp::Eq => $query.filter($col.eq($value)),
                Cmp::Gte => $query.filter($col.ge($value)),
                Cmp::Lte => $query.filter($col.le($value)),
                Cmp::Gt => $query.filter($col.gt($value)),
                Cmp::Lt => $query.filter($col.lt($value)),
            }
        };
    }

    for filter in filters {
        query = match filter {
            FilterExpr::Price(cmp, value) => {
                cmp_filter!(query, products::price_base, cmp, value)
            }
            FilterExpr::Category(StrMatch::Eq(value)) => {
                query.filter(products::category.eq(value))
            }
            FilterExpr::Category(StrMatch::In(values)) => {
                query.filter(products::category.eq_any(values))
            }
            FilterExpr::InStock(value) => query.filter(products::in_stock.eq(value)),
            FilterExpr::LeadTime(cmp, value) => {
                cmp_filter!(query, products::lead_time_days, cmp, value)
            }
            FilterExpr::SalesCount(cmp, value) => {
                cmp_filter!(query, products::sales_count, cmp, value)
            }
            FilterExpr::NumReviews(cmp, value) => {
                cmp_filter!(query, products::num_reviews, cmp, value)
            }
            FilterExpr::Rating(cmp, value) => {
                cmp_filter!(query, products::rating_average, cmp, value)
            }
        };
    }
    query
}

fn apply_sort<'a>(mut query: ProductQuery<'a>, keys: &[SortKey]) -> ProductQuery<'a> {
    macro_rules! order_by {
        ($query:expr, $col:expr, $descending:expr, $first:expr) => {
            match ($descending, $first) {
                (true, true) => $query.order($col.desc()),
                (true, false) => $query.then_order_by($col.desc()),
                (false, true) => $query.order($col.asc()),
                (false, false) => $query.then_order_by($col.asc()),
            }
        };
    }

    for (i, key) in keys.iter().enumerate() {
        let first = i == 0;
        query = match key.field {
            SortField::Price => order_by!(query, products::price_base, key.descending, first),
            SortField::CreatedAt => order_by!(query, products::created_at, key.descending, first),
            SortField::SalesCount => order_by!(query, products::sales_count, key.descending, first),
            SortField::NumReviews => order_by!(query, products::num_reviews, key.descending, first),
            SortField::Rating => order_by!(query, products::rating_average, key.descending, first),
            SortField::LeadTime => order_by!(query, products::lead_time_days, key.descending, first),
        };
    }
    query
}

fn find_product(conn: &mut PgConnection, id: Uuid) -> Result<Product, AppError> {
    products::table
        .find(id)
        .select(Product::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}

/// Bump a product's sales counter by one. Callers on the payment path treat
/// this as best-effort and only log failures.
pub fn increment_sales_count(conn: &mut PgConnection, product_id: Uuid) -> Result<(), AppError> {
    let updated = diesel::update(products::table.find(product_id))
        .set(products::sales_count.eq(products::sales_count + 1))
        .execute(conn)?;
    if updated == 0 {
        return Err(AppError::NotFound("Product not found".to_string()));
    }
    Ok(())
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /api/v1/products/create-product
///
/// Admin-only multipart endpoint: up to 5 images plus bracketed text fields.
/// The caller is authenticated and role-checked before any file is accepted.
#[utoipa::path(
    post,
    path = "/api/v1/products/create-product",
    responses(
        (status = 201, description = "Product created"),
        (status = 400, description = "Invalid field or file"),
        (status = 403, description = "Caller is not an administrator"),
    ),
    tag = "products"
)]
pub async fn create_product(
    pool: web::Data<DbPool>,
    req: HttpRequest,
    payload: Multipart,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let token = auth::bearer_token(&req)?;

    let admin = {
        let pool = pool.clone();
        let token = token.clone();
        web::block(move || {
            let mut conn = pool.get()?;
            let user = auth::authenticate(&mut conn, &token)?;
            user.require_role(Role::Admin)?;
            Ok::<_, AppError>(user)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??
    };

    let form = uploads::read_form(payload, config.upload_dir.clone()).await?;
    let new_product = build_new_product(&form, admin.id)?;

    let product = web::block(move || {
        let mut conn = pool.get()?;
        let product = diesel::insert_into(products::table)
            .values(&new_product)
            .returning(Product::as_returning())
            .get_result(&mut conn)?;
        Ok::<_, AppError>(product)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Product created successfully",
        "data": product_response(product)?,
    })))
}

/// GET /api/v1/products/get-all-products
///
/// Listing with the `field[op]=value` filter grammar, `sort=` and
/// pagination. Filter fields and operators are allow-listed; anything else
/// is a 400 rather than an opaque pass-through to the database.
#[utoipa::path(
    get,
    path = "/api/v1/products/get-all-products",
    params(
        ("price[gte]" = Option<String>, Query, description = "Example filter: base price at least"),
        ("category" = Option<String>, Query, description = "Exact category, or category[in]=a,b"),
        ("sort" = Option<String>, Query, description = "Comma-separated fields, '-' for descending"),
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 10, max 100)"),
    ),
    responses(
        (status = 200, description = "Filtered product page"),
        (status = 400, description = "Unknown filter field or operator"),
    ),
    tag = "products"
)]
pub async fn get_products(
    pool: web::Data<DbPool>,
    req: HttpRequest,
    query: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, AppError> {
    let token = auth::bearer_token(&req)?;
    let raw = query.into_inner();

    let page = raw.get("page").and_then(|v| v.parse().ok());
    let limit = raw.get("limit").and_then(|v| v.parse().ok());
    let paging = pagination(page, limit);

    let sort = match raw.get("sort") {
        Some(spec) => parse_sort(spec)?,
        None => default_sort(),
    };

    let filter_pairs: Vec<(String, String)> = raw
        .into_iter()
        .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
        .collect();
    let filters = parse_filters(&filter_pairs)?;

    let rows = web::block(move || {
        let mut conn = pool.get()?;
        auth::authenticate(&mut conn, &token)?;

        let query = apply_sort(
            apply_filters(products::table.into_boxed(), filters),
            &sort,
        );
        let rows: Vec<Product> = query
            .limit(paging.limit)
            .offset(paging.offset())
            .load(&mut conn)?;

        Ok::<_, AppError>(rows)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    let data: Vec<ProductResponse> = rows
        .into_iter()
        .map(product_response)
        .collect::<Result<_, _>>()?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "count": data.len(),
        "data": data,
    })))
}

/// GET /api/v1/products/get-product/{id}
#[utoipa::path(
    get,
    path = "/api/v1/products/get-product/{id}",
    params(
        ("id" = Uuid, Path, description = "Product UUID"),
    ),
    responses(
        (status = 200, description = "Product found"),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn get_product(
    pool: web::Data<DbPool>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let token = auth::bearer_token(&req)?;
    let product_id = path.into_inner();

    let product = web::block(move || {
        let mut conn = pool.get()?;
        auth::authenticate(&mut conn, &token)?;
        find_product(&mut conn, product_id)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": product_response(product)?,
    })))
}

/// PUT /api/v1/products/update-product/{id}
#[utoipa::path(
    put,
    path = "/api/v1/products/update-product/{id}",
    request_body = UpdateProductRequest,
    params(
        ("id" = Uuid, Path, description = "Product UUID"),
    ),
    responses(
        (status = 200, description = "Product updated"),
        (status = 403, description = "Caller is not an administrator"),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn update_product(
    pool: web::Data<DbPool>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<UpdateProductRequest>,
) -> Result<HttpResponse, AppError> {
    let token = auth::bearer_token(&req)?;
    let product_id = path.into_inner();
    let changeset = build_changeset(body.into_inner())?;

    let product = web::block(move || {
        let mut conn = pool.get()?;
        let user = auth::authenticate(&mut conn, &token)?;
        user.require_role(Role::Admin)?;

        diesel::update(products::table.find(product_id))
            .set(&changeset)
            .returning(Product::as_returning())
            .get_result(&mut conn)
            .optional()?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Product updated successfully",
        "data": product_response(product)?,
    })))
}

/// DELETE /api/v1/products/delete-product/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/products/delete-product/{id}",
    params(
        ("id" = Uuid, Path, description = "Product UUID"),
    ),
    responses(
        (status = 200, description = "Product deleted"),
        (status = 403, description = "Caller is not an administrator"),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn delete_product(
    pool: web::Data<DbPool>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let token = auth::bearer_token(&req)?;
    let product_id = path.into_inner();

    web::block(move || {
        let mut conn = pool.get()?;
        let user = auth::authenticate(&mut conn, &token)?;
        user.require_role(Role::Admin)?;

        let deleted = diesel::delete(products::table.find(product_id)).execute(&mut conn)?;
        if deleted == 0 {
            return Err(AppError::NotFound("Product not found".to_string()));
        }
        Ok::<_, AppError>(())
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Product deleted successfully",
    })))
}

/// POST /api/v1/products/{id}/review
///
/// Appends a review and recomputes the rating aggregate. At most one review
/// per user per product.
#[utoipa::path(
    post,
    path = "/api/v1/products/{id}/review",
    request_body = CreateReviewRequest,
    params(
        ("id" = Uuid, Path, description = "Product UUID"),
    ),
    responses(
        (status = 201, description = "Review added"),
        (status = 400, description = "Rating out of range or product already reviewed"),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn create_review(
    pool: web::Data<DbPool>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<CreateReviewRequest>,
) -> Result<HttpResponse, AppError> {
    let token = auth::bearer_token(&req)?;
    let product_id = path.into_inner();
    let body = body.into_inner();
    validate_rating(body.rating)?;

    web::block(move || {
        let mut conn = pool.get()?;
        let user = auth::authenticate(&mut conn, &token)?;

        let product = find_product(&mut conn, product_id)?;

        let mut reviews: Vec<Review> = serde_json::from_value(product.reviews)?;
        add_review(
            &mut reviews,
            Review {
                user: user.id,
                name: user.name,
                rating: body.rating,
                comment: body.comment,
                created_at: Utc::now(),
            },
        )?;

        let average = mean_rating(&reviews);
        let count = reviews.len() as i32;

        diesel::update(products::table.find(product.id))
            .set((
                products::reviews.eq(serde_json::to_value(&reviews)?),
                products::num_reviews.eq(count),
                products::rating_average.eq(average),
                products::rating_count.eq(count),
                products::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok::<_, AppError>(())
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(json!({ "message": "Review added" })))
}

/// GET /api/v1/products/top-ten-products
///
/// The three best-rated products. The storefront route name predates the
/// cut to three results.
#[utoipa::path(
    get,
    path = "/api/v1/products/top-ten-products",
    responses(
        (status = 200, description = "Top products by average rating"),
    ),
    tag = "products"
)]
pub async fn top_products(
    pool: web::Data<DbPool>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let token = auth::bearer_token(&req)?;

    let rows = web::block(move || {
        let mut conn = pool.get()?;
        auth::authenticate(&mut conn, &token)?;

        let rows = products::table
            .order(products::rating_average.desc())
            .limit(3)
            .select(Product::as_select())
            .load(&mut conn)?;
        Ok::<_, AppError>(rows)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    let data: Vec<ProductResponse> = rows
        .into_iter()
        .map(product_response)
        .collect::<Result<_, _>>()?;
    Ok(HttpResponse::Ok().json(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form_with(entries: &[(&str, &str)], images: &[&str]) -> UploadForm {
        UploadForm {
            fields: entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            image_urls: images.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn minimal_form() -> UploadForm {
        form_with(
            &[
                ("name", "Silk Kurta"),
                ("category", "Kurta"),
                ("price[base]", "1000"),
                ("measurements[chest]", "40"),
            ],
            &["/uploads/1_kurta.png"],
        )
    }

    #[test]
    fn builds_product_from_bracketed_fields() {
        let mut form = minimal_form();
        form.fields
            .insert("price[customization]".to_string(), "200".to_string());
        form.fields
            .insert("measurements[waist]".to_string(), "32".to_string());
        form.fields
            .insert("customizations[fabric]".to_string(), "silk".to_string());

        let owner = Uuid::new_v4();
        let product = build_new_product(&form, owner).expect("build failed");

        assert_eq!(product.name, "Silk Kurta");
        assert_eq!(product.category, "Kurta");
        assert_eq!(product.price_base, BigDecimal::from(1000));
        assert_eq!(product.price_customization, BigDecimal::from(200));
        assert_eq!(product.created_by, owner);
        assert_eq!(product.measurements["chest"], 40.0);
        assert_eq!(product.measurements["waist"], 32.0);
        assert_eq!(product.customizations["fabric"], "silk");
        assert_eq!(product.images[0]["url"], "/uploads/1_kurta.png");
        assert_eq!(product.images[0]["alt"], "Product image");
        assert!(product.in_stock);
        assert_eq!(product.lead_time_days, 7);
    }

    #[test]
    fn missing_name_is_rejected() {
        let mut form = minimal_form();
        form.fields.remove("name");
        assert!(matches!(
            build_new_product(&form, Uuid::new_v4()),
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[test]
    fn unknown_category_is_rejected() {
        let mut form = minimal_form();
        form.fields
            .insert("category".to_string(), "Electronics".to_string());
        assert!(build_new_product(&form, Uuid::new_v4()).is_err());
    }

    #[test]
    fn missing_measurements_are_rejected() {
        let mut form = minimal_form();
        form.fields.remove("measurements[chest]");
        let err = build_new_product(&form, Uuid::new_v4()).expect_err("must fail");
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[test]
    fn image_alt_applies_to_every_image() {
        let mut form = form_with(
            &[
                ("name", "Silk Kurta"),
                ("category", "Kurta"),
                ("price[base]", "1000"),
                ("measurements[chest]", "40"),
                ("imageAlt", "Front view"),
            ],
            &["/uploads/a.png", "/uploads/b.png"],
        );
        form.fields
            .insert("availability[inStock]".to_string(), "false".to_string());
        form.fields
            .insert("availability[leadTime]".to_string(), "14".to_string());

        let product = build_new_product(&form, Uuid::new_v4()).expect("build failed");
        assert_eq!(product.images[0]["alt"], "Front view");
        assert_eq!(product.images[1]["alt"], "Front view");
        assert!(!product.in_stock);
        assert_eq!(product.lead_time_days, 14);
    }

    #[test]
    fn changeset_rejects_empty_measurements() {
        let body = UpdateProductRequest {
            measurements: Some(BTreeMap::new()),
            ..Default::default()
        };
        assert!(matches!(
            build_changeset(body),
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[test]
    fn changeset_parses_partial_price() {
        let body = UpdateProductRequest {
            price: Some(PriceRequest {
                base: Some("1500".to_string()),
                customization: None,
            }),
            ..Default::default()
        };
        let changeset = build_changeset(body).expect("build failed");
        assert_eq!(changeset.price_base, Some(BigDecimal::from(1500)));
        assert_eq!(changeset.price_customization, None);
        assert!(changeset.updated_at.is_some(), "updated_at always stamped");
    }

    #[test]
    fn changeset_validates_category() {
        let body = UpdateProductRequest {
            category: Some("Electronics".to_string()),
            ..Default::default()
        };
        assert!(build_changeset(body).is_err());
    }
}
