//! Seed the catalog from a YAML file.
//!
//! The file holds a list of product rows in the same loose shape the
//! bulk upload endpoint accepts (`sizes` may be a list or a comma separated
//! string, `price` a number or a string). Invalid rows are reported and
//! skipped.

use std::path::Path;

use serde_json::Value;
use stride_api::db::{self, PgStore, Store};
use stride_core::product::prepare_bulk;
use tracing::{error, info};

use super::{CommandError, database_url};

/// Insert products from `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, if no row is
/// valid, or if the database insert fails.
pub async fn products(file_path: &str) -> Result<(), CommandError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading products from file");

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CommandError::Read {
            path: file_path.to_string(),
            source,
        })?;
    let rows = parse_rows(&content)?;

    // Validate before connecting to the database
    let (products, report) = prepare_bulk(&rows);
    for message in report.errors.iter().flatten() {
        error!("  - {message}");
    }
    if products.is_empty() {
        return Err(CommandError::Invalid(format!(
            "no valid products in {file_path} ({} rows)",
            report.total
        )));
    }

    let pool = db::create_pool(&database_url()?).await?;
    info!("Connected to database");

    let inserted = PgStore::new(pool).insert_products(products).await?;

    info!("Seeding complete!");
    info!("  Rows read: {}", report.total);
    info!("  Products inserted: {inserted}");
    info!("  Rows skipped: {}", report.failed);

    Ok(())
}

/// Parse a YAML sequence of rows into JSON values.
fn parse_rows(content: &str) -> Result<Vec<Value>, CommandError> {
    let rows: Vec<Value> = serde_yaml::from_str(content)?;
    if rows.is_empty() {
        return Err(CommandError::Invalid("product list is empty".to_string()));
    }
    Ok(rows)
}
