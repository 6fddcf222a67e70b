//! Bounded read-through product cache for the serving layer.
//!
//! Holds the products of the most recent inference so a follow-up detail
//! lookup avoids a catalog round trip. A convenience, never a correctness
//! dependency: it is cleared on every inference and safe to drop entirely.

use std::collections::HashMap;
use std::collections::VecDeque;

use advisor_core::domain::product::Product;

pub struct ProductCache {
    capacity: usize,
    entries: HashMap<String, Product>,
    order: VecDeque<String>,
}

impl ProductCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn insert(&mut self, product: Product) {
        let id = product.id.as_str().to_string();
        if self.entries.insert(id.clone(), product).is_none() {
            self.order.push_back(id);
        }
        while self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.entries.remove(&evicted);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Product> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str) -> Product {
        Product::placeholder(id)
    }

    #[test]
    fn oldest_entry_is_evicted_at_capacity() {
        let mut cache = ProductCache::new(2);
        cache.insert(product("a"));
        cache.insert(product("b"));
        cache.insert(product("c"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn reinserting_an_id_does_not_grow_the_cache() {
        let mut cache = ProductCache::new(2);
        cache.insert(product("a"));
        cache.insert(product("a"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_empties_everything() {
        let mut cache = ProductCache::new(4);
        cache.insert(product("a"));
        cache.clear();
        assert!(cache.is_empty());
    }
}
