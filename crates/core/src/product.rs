//! Catalog products.
//!
//! Covers the product record itself, create/update input validation, listing
//! filters and pagination, and normalization of loosely typed bulk-upload
//! rows (spreadsheet exports where numbers arrive as strings and lists as
//! comma-separated text).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DomainError;
use crate::types::{Price, ProductId};

/// Category used when a row does not name one.
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

/// `createdBy` of products inserted through bulk upload.
pub const BULK_CREATOR: &str = "bulk-upload";

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub brandname: String,
    pub price: Price,
    pub images: Vec<String>,
    pub sizes: Vec<String>,
    pub color: String,
    pub category: String,
    pub stock: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub ratings: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount: Decimal,
    pub is_featured: bool,
    pub is_active: bool,
    pub is_popular: bool,
    pub is_new: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated product that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub brandname: String,
    pub price: Price,
    pub images: Vec<String>,
    pub sizes: Vec<String>,
    pub color: String,
    pub category: String,
    pub stock: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub ratings: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount: Decimal,
    pub is_featured: bool,
    pub is_active: bool,
    pub is_popular: bool,
    pub is_new: bool,
    pub created_by: String,
}

/// Short form embedded in cart lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub image: Option<String>,
}

impl Product {
    /// Attach storage-assigned identity to a new product.
    #[must_use]
    pub fn from_new(id: ProductId, new: NewProduct, at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name,
            description: new.description,
            brandname: new.brandname,
            price: new.price,
            images: new.images,
            sizes: new.sizes,
            color: new.color,
            category: new.category,
            stock: new.stock,
            ratings: new.ratings,
            discount: new.discount,
            is_featured: new.is_featured,
            is_active: new.is_active,
            is_popular: new.is_popular,
            is_new: new.is_new,
            created_by: new.created_by,
            created_at: at,
            updated_at: at,
        }
    }

    #[must_use]
    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            id: self.id,
            name: self.name.clone(),
            price: self.price,
            image: self.images.first().cloned(),
        }
    }
}

impl NewProduct {
    /// Range and presence checks shared by every way a product is created.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] listing every violated rule.
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut problems = Vec::new();
        if self.name.trim().is_empty() {
            problems.push("name is required");
        }
        if self.price.is_negative() {
            problems.push("price must not be negative");
        }
        if self.price > Price::MAX {
            problems.push("price must not exceed 9999999999.99");
        }
        if self.price.has_fractional_cents() {
            problems.push("price must have at most 2 decimal places");
        }
        if self.ratings < Decimal::ZERO || self.ratings > Decimal::from(5) {
            problems.push("ratings must be between 0 and 5");
        }
        if self.discount < Decimal::ZERO || self.discount > Decimal::ONE_HUNDRED {
            problems.push("discount must be between 0 and 100");
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(format!(
                "Validation failed: {}",
                problems.join("; ")
            )))
        }
    }
}

/// Create or update body. Every field is optional; creation requires
/// `name` and `price`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub brandname: Option<String>,
    pub price: Option<Price>,
    pub images: Option<Vec<String>>,
    pub sizes: Option<Vec<String>>,
    pub color: Option<String>,
    pub category: Option<String>,
    pub stock: Option<u32>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub ratings: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub discount: Option<Decimal>,
    pub is_featured: Option<bool>,
    pub is_active: Option<bool>,
    pub is_popular: Option<bool>,
    pub is_new: Option<bool>,
    pub created_by: Option<String>,
}

impl ProductInput {
    /// Build a new product, filling defaults for absent fields.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] if `name` or `price` is missing or
    /// a value is out of range.
    pub fn into_new(self, default_creator: &str) -> Result<NewProduct, DomainError> {
        let (Some(name), Some(price)) = (self.name, self.price) else {
            return Err(DomainError::validation("name and price are required"));
        };
        let product = NewProduct {
            name: name.trim().to_owned(),
            description: self.description.unwrap_or_default(),
            brandname: self.brandname.unwrap_or_default(),
            price,
            images: self.images.unwrap_or_default(),
            sizes: self.sizes.unwrap_or_default(),
            color: self.color.unwrap_or_default(),
            category: self
                .category
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_owned()),
            stock: self.stock.unwrap_or(0),
            ratings: self.ratings.unwrap_or_default(),
            discount: self.discount.unwrap_or_default(),
            is_featured: self.is_featured.unwrap_or(false),
            is_active: self.is_active.unwrap_or(true),
            is_popular: self.is_popular.unwrap_or(false),
            is_new: self.is_new.unwrap_or(false),
            created_by: self
                .created_by
                .unwrap_or_else(|| default_creator.to_owned()),
        };
        product.validate()?;
        Ok(product)
    }

    /// Merge the present fields into `product`. Nothing changes on error.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] if the merged product is invalid.
    pub fn apply_to(self, product: &mut Product, at: DateTime<Utc>) -> Result<(), DomainError> {
        let merged = NewProduct {
            name: self.name.map_or_else(|| product.name.clone(), |n| n.trim().to_owned()),
            description: self.description.unwrap_or_else(|| product.description.clone()),
            brandname: self.brandname.unwrap_or_else(|| product.brandname.clone()),
            price: self.price.unwrap_or(product.price),
            images: self.images.unwrap_or_else(|| product.images.clone()),
            sizes: self.sizes.unwrap_or_else(|| product.sizes.clone()),
            color: self.color.unwrap_or_else(|| product.color.clone()),
            category: self.category.unwrap_or_else(|| product.category.clone()),
            stock: self.stock.unwrap_or(product.stock),
            ratings: self.ratings.unwrap_or(product.ratings),
            discount: self.discount.unwrap_or(product.discount),
            is_featured: self.is_featured.unwrap_or(product.is_featured),
            is_active: self.is_active.unwrap_or(product.is_active),
            is_popular: self.is_popular.unwrap_or(product.is_popular),
            is_new: self.is_new.unwrap_or(product.is_new),
            created_by: self.created_by.unwrap_or_else(|| product.created_by.clone()),
        };
        merged.validate()?;
        *product = Product {
            created_at: product.created_at,
            ..Product::from_new(product.id, merged, at)
        };
        Ok(())
    }
}

/// Price ordering for filtered listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    PriceAsc,
    PriceDesc,
    /// Unrecognized values leave the store's natural order.
    #[default]
    #[serde(other)]
    Unsorted,
}

/// Query parameters of the filter endpoint. Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    pub brandname: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "blank_decimal")]
    pub min_price: Option<Decimal>,
    #[serde(default, deserialize_with = "blank_decimal")]
    pub max_price: Option<Decimal>,
    pub search: Option<String>,
    #[serde(default)]
    pub sort_by: SortBy,
}

/// `minPrice=` arrives as an empty string from search forms.
fn blank_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse().map(Some).map_err(serde::de::Error::custom)
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

impl ProductFilter {
    #[must_use]
    pub fn brandname(&self) -> Option<&str> {
        non_empty(self.brandname.as_ref())
    }

    #[must_use]
    pub fn size(&self) -> Option<&str> {
        non_empty(self.size.as_ref())
    }

    #[must_use]
    pub fn color(&self) -> Option<&str> {
        non_empty(self.color.as_ref())
    }

    #[must_use]
    pub fn category(&self) -> Option<&str> {
        non_empty(self.category.as_ref())
    }

    #[must_use]
    pub fn search(&self) -> Option<&str> {
        non_empty(self.search.as_ref())
    }

    /// Whether `product` passes every present criterion.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        let price = product.price.amount();
        self.brandname().is_none_or(|b| product.brandname == b)
            && self.size().is_none_or(|s| product.sizes.iter().any(|size| size == s))
            && self.color().is_none_or(|c| product.color == c)
            && self.category().is_none_or(|c| product.category == c)
            && self.min_price.is_none_or(|min| price >= min)
            && self.max_price.is_none_or(|max| price <= max)
            && self.search().is_none_or(|needle| {
                product.name.to_lowercase().contains(&needle.to_lowercase())
            })
    }

    /// Apply the requested ordering in place (stable).
    pub fn sort(&self, products: &mut [Product]) {
        match self.sort_by {
            SortBy::PriceAsc => products.sort_by_key(|p| p.price),
            SortBy::PriceDesc => products.sort_by(|a, b| b.price.cmp(&a.price)),
            SortBy::Unsorted => {}
        }
    }
}

/// `page`/`limit` query parameters of the list endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Pagination {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl Pagination {
    /// Default page size.
    pub const DEFAULT_LIMIT: u32 = 10;
    /// Largest page a client may request.
    pub const MAX_LIMIT: u32 = 100;

    /// Page size, clamped to `1..=MAX_LIMIT`.
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    /// Rows to skip. Page numbers start at 1; 0 is treated as 1.
    #[must_use]
    pub fn offset(&self) -> u64 {
        let page = self.page.unwrap_or(1).max(1);
        u64::from(page - 1) * u64::from(self.limit())
    }
}

/// Result of a bulk upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkReport {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub errors: Option<Vec<String>>,
}

/// Normalize and validate every row. Invalid rows are reported, not fatal.
///
/// Row numbers in messages are 1-based.
#[must_use]
pub fn prepare_bulk(rows: &[Value]) -> (Vec<NewProduct>, BulkReport) {
    let mut valid = Vec::with_capacity(rows.len());
    let mut errors = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        match normalize_row(row) {
            Ok(product) => valid.push(product),
            Err(message) => errors.push(format!("Product {}: {message}", index + 1)),
        }
    }

    let report = BulkReport {
        total: rows.len(),
        successful: valid.len(),
        failed: errors.len(),
        errors: (!errors.is_empty()).then_some(errors),
    };
    (valid, report)
}

/// Turn one loosely typed row into a validated product.
///
/// # Errors
///
/// Returns a message describing the first problem found.
pub fn normalize_row(row: &Value) -> Result<NewProduct, String> {
    let Value::Object(fields) = row else {
        return Err("Row is not an object".to_owned());
    };
    let field = |name: &str| fields.get(name).filter(|v| !is_blank(v));

    let (Some(name), Some(price)) = (field("name").and_then(text), field("price")) else {
        return Err("Missing required fields (name or price)".to_owned());
    };
    let price = decimal(price)
        .map(Price::new)
        .ok_or_else(|| format!("Invalid price '{}'", display(price)))?;

    let stock = match field("stock") {
        None => 0,
        Some(value) => decimal(value)
            .filter(|d| d.fract().is_zero())
            .and_then(|d| d.to_u32())
            .ok_or_else(|| format!("Invalid stock '{}'", display(value)))?,
    };
    let number = |name: &str| -> Result<Decimal, String> {
        field(name).map_or(Ok(Decimal::ZERO), |value| {
            decimal(value).ok_or_else(|| format!("Invalid {name} '{}'", display(value)))
        })
    };
    let flag = |name: &str, default: bool| -> Result<bool, String> {
        field(name).map_or(Ok(default), |value| {
            boolean(value).ok_or_else(|| format!("Invalid {name} '{}'", display(value)))
        })
    };

    let product = NewProduct {
        name,
        description: field("description").and_then(text).unwrap_or_default(),
        brandname: field("brandname").and_then(text).unwrap_or_default(),
        price,
        images: field("images").map(list).unwrap_or_default(),
        sizes: field("sizes").map(list).unwrap_or_default(),
        color: field("color").and_then(text).unwrap_or_default(),
        category: field("category")
            .and_then(text)
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_owned()),
        stock,
        ratings: number("ratings")?,
        discount: number("discount")?,
        is_featured: flag("isFeatured", false)?,
        is_active: flag("isActive", true)?,
        is_popular: flag("isPopular", false)?,
        is_new: flag("isNew", false)?,
        created_by: field("createdBy")
            .and_then(text)
            .unwrap_or_else(|| BULK_CREATOR.to_owned()),
    };

    product
        .validate()
        .map_err(|err| err.to_string().replacen("Validation failed:", "Validation failed -", 1))?;
    Ok(product)
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_owned()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn display(value: &Value) -> String {
    text(value).unwrap_or_else(|| value.to_string())
}

fn decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => n.to_string().parse().ok(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn boolean(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        _ => None,
    }
}

fn list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(text).filter(|s| !s.is_empty()).collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect(),
        other => text(other).into_iter().collect(),
    }
}
