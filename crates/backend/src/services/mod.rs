//! Domain services over the gateway.
//!
//! Each service owns one collection's business rules. They all share the
//! same [`Gateway`](crate::Gateway) so cached reads and invalidation stay
//! coherent across the storefront and admin binaries.

pub mod catalog;
pub mod orders;
pub mod profiles;
pub mod settings;

pub use catalog::{CatalogError, CatalogService, NewProduct, ProductFilter, ProductSort, UpdateProduct};
pub use orders::{CheckoutItem, CheckoutRequest, OrderError, OrderFilter, OrderService};
pub use profiles::{ProfileError, ProfileService};
pub use settings::{SettingsError, SettingsService, SettingsUpdate};

/// One page of a client-side paginated listing.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total matching items before slicing.
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

impl<T> Page<T> {
    pub const DEFAULT_PAGE_SIZE: usize = 20;
    pub const MAX_PAGE_SIZE: usize = 100;

    /// Slice a fully filtered list into one page. Pages are 1-based;
    /// out-of-range pages come back empty rather than erroring.
    #[must_use]
    pub fn slice(items: Vec<T>, page: Option<usize>, page_size: Option<usize>) -> Self {
        let page = page.unwrap_or(1).max(1);
        let page_size = page_size
            .unwrap_or(Self::DEFAULT_PAGE_SIZE)
            .clamp(1, Self::MAX_PAGE_SIZE);

        let total = items.len();
        let start = (page - 1).saturating_mul(page_size);
        let items: Vec<T> = items
            .into_iter()
            .skip(start)
            .take(page_size)
            .collect();

        Self {
            items,
            total,
            page,
            page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_one_based_pages() {
        let page = Page::slice((1..=25).collect::<Vec<_>>(), Some(2), Some(10));
        assert_eq!(page.items, (11..=20).collect::<Vec<_>>());
        assert_eq!(page.total, 25);
    }

    #[test]
    fn out_of_range_page_is_empty() {
        let page = Page::slice(vec![1, 2, 3], Some(9), Some(10));
        assert!(page.items.is_empty());
        assert_eq!(page.total, 3);
    }

    #[test]
    fn page_size_is_clamped() {
        let page = Page::slice((1..=300).collect::<Vec<_>>(), Some(1), Some(1000));
        assert_eq!(page.items.len(), Page::<i32>::MAX_PAGE_SIZE);
    }
}
