//! Read-only product catalog.
//!
//! Loaded once at startup from a JSON array of product records and shared
//! across requests; lookups are id-keyed only.

use crate::models::Product;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

#[derive(Clone)]
pub struct Catalog {
    products: Arc<HashMap<String, Product>>,
}

impl Catalog {
    /// Load the catalog from a JSON file containing an array of products.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog at {}", path.display()))?;
        let products: Vec<Product> = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse catalog at {}", path.display()))?;

        let products = products
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect::<HashMap<_, _>>();

        Ok(Self {
            products: Arc::new(products),
        })
    }

    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.get(id)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
