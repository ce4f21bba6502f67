//! Storefront browsing: listing, product pages, reviews and watched products.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::database::models::{Observation, Product, ProductStatus, Review};
use crate::database::queries::products::ProductFilter;
use crate::database::queries::{observations, products, reviews};
use crate::errors::{AppError, AppResult};

pub const MAX_COMMENT_LEN: usize = 2000;

/// Query string of the listing page.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ListingQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub page: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingPage {
    pub products: Vec<Product>,
    pub categories: Vec<String>,
    pub query: String,
    pub category: String,
    pub page: i64,
    pub total_pages: i64,
    pub total: i64,
}

pub fn listing(conn: &Connection, query: &ListingQuery, page_size: i64) -> AppResult<ListingPage> {
    let filter = ProductFilter {
        query: query.q.trim().to_string(),
        category: query.category.trim().to_string(),
    };
    let total = products::count(conn, &filter)?;
    let total_pages = ((total + page_size - 1) / page_size).max(1);
    let page = query.page.unwrap_or(1).clamp(1, total_pages);

    Ok(ListingPage {
        products: products::list(conn, &filter, page_size, (page - 1) * page_size)?,
        categories: products::categories(conn)?,
        query: filter.query,
        category: filter.category,
        page,
        total_pages,
        total,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    pub product: Product,
    pub reviews: Vec<Review>,
    pub average_rating: Option<f64>,
    pub observing: bool,
}

/// A listed product; archived and unknown ids are both `NotFound`.
pub fn listed_product(conn: &Connection, id: i64) -> AppResult<Product> {
    match products::find(conn, id)? {
        Some(product) if product.status != ProductStatus::Archived => Ok(product),
        _ => Err(AppError::NotFound),
    }
}

pub fn detail(conn: &Connection, id: i64, viewer: Option<i64>) -> AppResult<ProductDetail> {
    let product = listed_product(conn, id)?;
    let observing = match viewer {
        Some(user_id) => observations::is_observing(conn, user_id, id)?,
        None => false,
    };
    Ok(ProductDetail {
        reviews: reviews::list_for_product(conn, id)?,
        average_rating: reviews::average_rating(conn, id)?,
        observing,
        product,
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewForm {
    pub rating: i64,
    #[serde(default)]
    pub comment: String,
}

/// Store the user's review, replacing an earlier one for the same product.
pub fn submit_review(
    conn: &Connection,
    product_id: i64,
    user_id: i64,
    form: &ReviewForm,
) -> AppResult<()> {
    listed_product(conn, product_id)?;
    if !(1..=5).contains(&form.rating) {
        return Err(AppError::validation("Rating must be between 1 and 5"));
    }
    let comment = form.comment.trim();
    if comment.chars().count() > MAX_COMMENT_LEN {
        return Err(AppError::validation(format!(
            "Comments are limited to {MAX_COMMENT_LEN} characters"
        )));
    }
    reviews::upsert(conn, product_id, user_id, form.rating, comment)?;
    Ok(())
}

pub fn observe(conn: &Connection, user_id: i64, product_id: i64) -> AppResult<()> {
    let product = listed_product(conn, product_id)?;
    observations::observe(conn, user_id, product_id, product.price_cents)?;
    Ok(())
}

pub fn unobserve(conn: &Connection, user_id: i64, product_id: i64) -> AppResult<()> {
    observations::unobserve(conn, user_id, product_id)?;
    Ok(())
}

pub fn observed(conn: &Connection, user_id: i64) -> AppResult<Vec<Observation>> {
    Ok(observations::list_for_user(conn, user_id)?)
}

pub fn acknowledge(conn: &Connection, user_id: i64) -> AppResult<usize> {
    Ok(observations::acknowledge(conn, user_id)?)
}
