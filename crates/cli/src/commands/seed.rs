//! Seed the catalog from a YAML file.
//!
//! The file is a list of products using the same fields as the admin API:
//!
//! ```yaml
//! - title: Hollow Depths
//!   description: A hand-drawn metroidvania.
//!   genre: Metroidvania
//!   platform: Switch
//!   price: "24.99"
//!   stock: 40
//!   coverImageUrl: https://cdn.example.com/hollow-depths.jpg
//! ```
//!
//! Products whose title already exists (case-insensitive) are skipped, so
//! the command can be re-run safely.

use std::path::Path;

use tracing::{error, info};

use gamevault_storefront::db::ProductRepository;
use gamevault_storefront::models::ProductInput;
use gamevault_storefront::models::product::NewProduct;

use super::connect;

/// Outcome of a seeding run.
#[derive(Debug, Default)]
pub struct SeedSummary {
    pub inserted: usize,
    pub skipped: usize,
}

/// Seed products from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, any entry is invalid, or a
/// database operation fails. Nothing is written when validation fails.
pub async fn products(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading products from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let products = parse_catalog(&content)?;
    info!(products = products.len(), "Catalog validated");

    let pool = connect().await?;
    let repo = ProductRepository::new(&pool);

    let mut summary = SeedSummary::default();
    for product in &products {
        if repo.find_by_title(&product.title).await?.is_some() {
            summary.skipped += 1;
            continue;
        }
        let created = repo.create(product).await?;
        info!(id = %created.id, title = %created.title, "Product inserted");
        summary.inserted += 1;
    }

    info!("Seeding complete!");
    info!("  Products inserted: {}", summary.inserted);
    info!("  Products skipped (already exist): {}", summary.skipped);
    Ok(())
}

/// Parse and validate every entry, reporting all failures at once.
fn parse_catalog(content: &str) -> Result<Vec<NewProduct>, Box<dyn std::error::Error>> {
    let inputs: Vec<ProductInput> = serde_yaml::from_str(content)?;

    let mut products = Vec::with_capacity(inputs.len());
    let mut errors = Vec::new();
    for (index, input) in inputs.into_iter().enumerate() {
        let title = input.title.clone();
        match input.validate() {
            Ok(product) => products.push(product),
            Err(e) => errors.push(format!("entry {} ({title}): {e}", index + 1)),
        }
    }

    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }
    Ok(products)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_catalog() {
        let yaml = r#"
- title: Hollow Depths
  description: A hand-drawn metroidvania.
  genre: Metroidvania
  platform: Switch
  price: "24.99"
  stock: 40
  screenshotUrls:
    - https://cdn.example.com/hd-1.jpg
- title: Star Freight
  price: "59.99"
"#;
        let products = parse_catalog(yaml).unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].title, "Hollow Depths");
        assert_eq!(products[0].screenshot_urls.len(), 1);
        assert_eq!(products[1].stock, 0);
    }

    #[test]
    fn test_parse_catalog_reports_invalid_entries() {
        let yaml = r#"
- title: ""
  price: "10.00"
- title: Cheap
  price: "-1"
"#;
        let err = parse_catalog(yaml).unwrap_err();
        assert_eq!(err.to_string(), "2 validation errors found");
    }
}
