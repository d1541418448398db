//! Allow-listed catalog query grammar.
//!
//! The listing endpoint accepts `field[op]=value` pairs (`?price[gte]=100`),
//! a `sort=field,-field2` key, and `page`/`limit`. Keys are parsed into
//! typed expressions here; anything outside the allow-list is rejected
//! instead of being forwarded to the database.

use std::str::FromStr;

use bigdecimal::BigDecimal;

use super::errors::DomainError;

/// Comparison operators accepted by the grammar (`field[gte]=...` etc.;
/// a bare `field=...` means equality).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmp {
    Eq,
    Gte,
    Lte,
    Gt,
    Lt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrMatch {
    Eq(String),
    In(Vec<String>),
}

/// A single parsed filter. The field determines the value type: `price`
/// compares against the base price as a decimal, `category` matches tags,
/// the counters are integers.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    Price(Cmp, BigDecimal),
    Category(StrMatch),
    InStock(bool),
    LeadTime(Cmp, i32),
    SalesCount(Cmp, i32),
    NumReviews(Cmp, i32),
    Rating(Cmp, f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Price,
    CreatedAt,
    SalesCount,
    NumReviews,
    Rating,
    LeadTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub descending: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

/// Keys consumed by sorting/pagination rather than filtering.
pub const RESERVED_KEYS: [&str; 3] = ["sort", "page", "limit"];

fn split_key(key: &str) -> Result<(&str, Option<&str>), DomainError> {
    match key.find('[') {
        None => Ok((key, None)),
        Some(open) => {
            if !key.ends_with(']') {
                return Err(DomainError::InvalidInput(format!(
                    "Malformed filter key '{key}'"
                )));
            }
            Ok((&key[..open], Some(&key[open + 1..key.len() - 1])))
        }
    }
}

fn parse_cmp(field: &str, op: Option<&str>) -> Result<Cmp, DomainError> {
    match op {
        None => Ok(Cmp::Eq),
        Some("gte") => Ok(Cmp::Gte),
        Some("lte") => Ok(Cmp::Lte),
        Some("gt") => Ok(Cmp::Gt),
        Some("lt") => Ok(Cmp::Lt),
        Some(other) => Err(DomainError::InvalidInput(format!(
            "Unsupported operator '{other}' for field '{field}'"
        ))),
    }
}

fn parse_decimal(field: &str, value: &str) -> Result<BigDecimal, DomainError> {
    BigDecimal::from_str(value)
        .map_err(|_| DomainError::InvalidInput(format!("Invalid number '{value}' for '{field}'")))
}

fn parse_int(field: &str, value: &str) -> Result<i32, DomainError> {
    value
        .parse()
        .map_err(|_| DomainError::InvalidInput(format!("Invalid number '{value}' for '{field}'")))
}

fn parse_float(field: &str, value: &str) -> Result<f64, DomainError> {
    value
        .parse()
        .map_err(|_| DomainError::InvalidInput(format!("Invalid number '{value}' for '{field}'")))
}

/// Parse filter pairs into typed expressions. Reserved keys must already be
/// stripped by the caller. Unknown fields and operators fail the request.
pub fn parse_filters(pairs: &[(String, String)]) -> Result<Vec<FilterExpr>, DomainError> {
    let mut filters = Vec::with_capacity(pairs.len());

    for (key, value) in pairs {
        let (field, op) = split_key(key)?;
        let expr = match field {
            "price" => FilterExpr::Price(parse_cmp(field, op)?, parse_decimal(field, value)?),
            "category" => match op {
                None => FilterExpr::Category(StrMatch::Eq(value.clone())),
                Some("in") => FilterExpr::Category(StrMatch::In(
                    value.split(',').map(|s| s.trim().to_string()).collect(),
                )),
                Some(other) => {
                    return Err(DomainError::InvalidInput(format!(
                        "Unsupported operator '{other}' for field 'category'"
                    )))
                }
            },
            "inStock" => match op {
                None => FilterExpr::InStock(value.parse().map_err(|_| {
                    DomainError::InvalidInput(format!("Invalid boolean '{value}' for 'inStock'"))
                })?),
                Some(other) => {
                    return Err(DomainError::InvalidInput(format!(
                        "Unsupported operator '{other}' for field 'inStock'"
                    )))
                }
            },
            "leadTime" => FilterExpr::LeadTime(parse_cmp(field, op)?, parse_int(field, value)?),
            "salesCount" => FilterExpr::SalesCount(parse_cmp(field, op)?, parse_int(field, value)?),
            "numReviews" => FilterExpr::NumReviews(parse_cmp(field, op)?, parse_int(field, value)?),
            "rating" => FilterExpr::Rating(parse_cmp(field, op)?, parse_float(field, value)?),
            other => {
                return Err(DomainError::InvalidInput(format!(
                    "Unsupported filter field '{other}'"
                )))
            }
        };
        filters.push(expr);
    }

    Ok(filters)
}

/// Parse `sort=price,-createdAt` style specs. A `-` prefix sorts descending.
pub fn parse_sort(raw: &str) -> Result<Vec<SortKey>, DomainError> {
    raw.split(',')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (name, descending) = match part.strip_prefix('-') {
                Some(rest) => (rest, true),
                None => (part, false),
            };
            let field = match name {
                "price" => SortField::Price,
                "createdAt" => SortField::CreatedAt,
                "salesCount" => SortField::SalesCount,
                "numReviews" => SortField::NumReviews,
                "rating" => SortField::Rating,
                "leadTime" => SortField::LeadTime,
                other => {
                    return Err(DomainError::InvalidInput(format!(
                        "Unsupported sort field '{other}'"
                    )))
                }
            };
            Ok(SortKey { field, descending })
        })
        .collect()
}

/// Newest first, matching the source listing's default.
pub fn default_sort() -> Vec<SortKey> {
    vec![SortKey {
        field: SortField::CreatedAt,
        descending: true,
    }]
}

pub fn pagination(page: Option<i64>, limit: Option<i64>) -> Pagination {
    Pagination {
        page: page.unwrap_or(1).max(1),
        limit: limit.unwrap_or(10).clamp(1, 100),
    }
}
