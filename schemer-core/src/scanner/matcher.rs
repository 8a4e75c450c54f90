//! Joining metadata rows onto the table list.
//!
//! Every reader delivers rows in provider order, the same order the table
//! list was built in, so a forward-only cursor joins a whole stream in one
//! pass.

use super::tree::TableSlot;
use crate::models::TableKey;

/// Anything the matchers can compare against a lookup key
pub trait Keyed {
    fn key(&self) -> &TableKey;
}

impl Keyed for TableKey {
    fn key(&self) -> &TableKey {
        self
    }
}

impl Keyed for TableSlot {
    fn key(&self) -> &TableKey {
        &self.key
    }
}

/// Forward-only cursor over a list sorted in provider order.
///
/// Lookups must arrive in non-decreasing order. A key the cursor has already
/// moved past is not found again, even though it is in the list.
#[derive(Debug)]
pub struct SequentialMatcher<'a, T> {
    items: &'a [T],
    cursor: usize,
}

impl<'a, T: Keyed> SequentialMatcher<'a, T> {
    pub fn new(items: &'a [T]) -> Self {
        Self { items, cursor: 0 }
    }

    /// Current cursor position
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Scans forward from the cursor for an exact match.
    ///
    /// On success the cursor rests on the match, so repeated lookups of the
    /// same key keep succeeding. A miss leaves the cursor unchanged.
    pub fn sequential_find(&mut self, catalog: &str, schema: &str, name: &str) -> Option<&'a T> {
        let items = self.items;
        let offset = items[self.cursor..].iter().position(|item| {
            let key = item.key();
            key.name == name && key.schema == schema && key.catalog == catalog
        })?;
        self.cursor += offset;
        Some(&items[self.cursor])
    }
}

/// Case-insensitive scan of the whole list, no cursor.
pub fn find_table<'a, T: Keyed>(
    items: &'a [T],
    catalog: &str,
    schema: &str,
    name: &str,
) -> Option<&'a T> {
    items
        .iter()
        .find(|item| item.key().eq_ignore_case(catalog, schema, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> Vec<TableKey> {
        vec![
            TableKey::new("sales", "dbo", "customers"),
            TableKey::new("sales", "dbo", "orders"),
            TableKey::new("sales", "hr", "staff"),
        ]
    }

    #[test]
    fn test_sequential_find_in_order() {
        let keys = keys();
        let mut matcher = SequentialMatcher::new(&keys);

        let found = matcher.sequential_find("sales", "dbo", "customers");
        assert_eq!(found.map(|k| k.name.as_str()), Some("customers"));
        // Repeated lookups of the current key stay put
        assert!(matcher.sequential_find("sales", "dbo", "customers").is_some());
        assert_eq!(matcher.position(), 0);

        assert!(matcher.sequential_find("sales", "hr", "staff").is_some());
        assert_eq!(matcher.position(), 2);
    }

    #[test]
    fn test_sequential_find_does_not_look_back() {
        let keys = keys();
        let mut matcher = SequentialMatcher::new(&keys);

        // Found while the cursor is before it
        assert!(matcher.sequential_find("sales", "dbo", "orders").is_some());
        assert!(matcher.sequential_find("sales", "hr", "staff").is_some());

        // Passed: not found even though it exists
        assert!(matcher.sequential_find("sales", "dbo", "orders").is_none());
        assert!(find_table(&keys, "sales", "dbo", "orders").is_some());
    }

    #[test]
    fn test_miss_leaves_cursor() {
        let keys = keys();
        let mut matcher = SequentialMatcher::new(&keys);
        assert!(matcher.sequential_find("sales", "dbo", "orders").is_some());
        assert!(matcher.sequential_find("sales", "dbo", "invoices").is_none());
        assert_eq!(matcher.position(), 1);
        assert!(matcher.sequential_find("sales", "dbo", "orders").is_some());
    }

    #[test]
    fn test_sequential_find_is_case_sensitive() {
        let keys = keys();
        let mut matcher = SequentialMatcher::new(&keys);
        assert!(matcher.sequential_find("sales", "dbo", "Customers").is_none());
        assert!(find_table(&keys, "SALES", "DBO", "Customers").is_some());
    }

    #[test]
    fn test_empty_list() {
        let keys: Vec<TableKey> = Vec::new();
        let mut matcher = SequentialMatcher::new(&keys);
        assert!(matcher.sequential_find("sales", "dbo", "orders").is_none());
        assert!(find_table(&keys, "sales", "dbo", "orders").is_none());
    }
}
