//! Menu item cache
//!
//! Incremental order events often carry bare `{id}` menu item references.
//! The cache holds the first full snapshot seen per id and backfills later
//! partial references from it; a cached full item is never replaced by a
//! sparser payload. Process-lifetime: cleared only by explicit manual
//! refresh.

use dashmap::DashMap;

use shared::models::{MenuItem, MenuItemRef, Order, OrderItem};

#[derive(Debug, Default)]
pub struct MenuItemCache {
    items: DashMap<i64, MenuItem>,
}

impl MenuItemCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a full snapshot, keeping any existing entry.
    pub fn record(&self, item: MenuItem) {
        self.items.entry(item.id).or_insert(item);
    }

    pub fn get(&self, id: i64) -> Option<MenuItem> {
        self.items.get(&id).map(|e| e.clone())
    }

    /// Backfill one order line: a cached full item wins over whatever the
    /// payload carried; an uncached full reference populates the cache.
    pub fn enrich(&self, item: &mut OrderItem) {
        if let Some(cached) = self.get(item.menu_item.id) {
            item.menu_item = MenuItemRef::from(cached);
        } else if let Some(full) = item.menu_item.as_full() {
            self.record(full);
        }
    }

    /// Backfill every line of an order.
    pub fn enrich_order(&self, order: &mut Order) {
        for item in &mut order.items {
            self.enrich(item);
        }
    }

    /// Manual refresh drops everything.
    pub fn clear(&self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full(id: i64, name: &str, price: f64) -> MenuItem {
        MenuItem {
            id,
            name: name.into(),
            price,
            category: Some("Mains".into()),
            description: None,
            image_url: None,
            available: true,
        }
    }

    fn line(menu_item: MenuItemRef) -> OrderItem {
        OrderItem {
            menu_item,
            quantity: 1,
            instructions: String::new(),
        }
    }

    #[test]
    fn partial_reference_is_backfilled_from_cache() {
        let cache = MenuItemCache::new();
        cache.record(full(7, "Ramen", 12.5));

        let mut item = line(MenuItemRef::placeholder(7));
        cache.enrich(&mut item);
        assert_eq!(item.menu_item.name.as_deref(), Some("Ramen"));
        assert_eq!(item.menu_item.price, Some(12.5));
    }

    #[test]
    fn full_reference_populates_the_cache() {
        let cache = MenuItemCache::new();
        let mut item = line(MenuItemRef::from(full(3, "Udon", 11.0)));
        cache.enrich(&mut item);
        assert_eq!(cache.get(3).unwrap().name, "Udon");
    }

    #[test]
    fn cached_item_is_never_downgraded() {
        let cache = MenuItemCache::new();
        cache.record(full(7, "Ramen", 12.5));

        // A newer payload with different data does not replace the entry,
        let mut item = line(MenuItemRef::from(full(7, "R.", 0.0)));
        cache.enrich(&mut item);
        // and the line itself is rewritten from the cached snapshot.
        assert_eq!(item.menu_item.name.as_deref(), Some("Ramen"));
        assert_eq!(cache.get(7).unwrap().name, "Ramen");
    }

    #[test]
    fn unknown_partial_reference_stays_partial() {
        let cache = MenuItemCache::new();
        let mut item = line(MenuItemRef::placeholder(99));
        cache.enrich(&mut item);
        assert!(item.menu_item.is_partial());
        assert!(cache.is_empty());
    }

    #[test]
    fn clear_empties_the_cache() {
        let cache = MenuItemCache::new();
        cache.record(full(1, "Tea", 2.0));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
