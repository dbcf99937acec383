use serde::Deserialize;

use crate::models::Product;

/// Catalog listing query. `page` is 1-based; the wire format the backend
/// expects is skip/limit, produced by [`CatalogQuery::to_params`].
#[derive(Debug, Clone)]
pub struct CatalogQuery {
    pub page: i64,
    pub page_size: i64,
    pub product_type: Option<String>,
    pub search: Option<String>,
}

impl CatalogQuery {
    pub fn new(page_size: i64) -> Self {
        Self {
            page: 1,
            page_size: page_size.clamp(1, 100),
            product_type: None,
            search: None,
        }
    }

    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let page = self.page.max(1);
        let mut params = vec![
            ("skip", ((page - 1) * self.page_size).to_string()),
            ("limit", self.page_size.to_string()),
        ];
        if let Some(product_type) = &self.product_type {
            params.push(("product_type", product_type.clone()));
        }
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }
        params
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProductPage {
    pub items: Vec<Product>,
    pub total: i64,
}
