use super::product::{Product, ProductId};

/// The last product list fetched from the backend.
///
/// A failed refresh never touches this; the previous list stays on screen.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
    loaded: bool,
}

impl Catalog {
    pub fn replace(&mut self, products: Vec<Product>) {
        self.products = products;
        self.loaded = true;
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn find(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Whether at least one fetch has succeeded.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for category in self.products.iter().filter_map(|p| p.category.as_ref()) {
            if !seen.contains(category) {
                seen.push(category.clone());
            }
        }
        seen
    }
}
