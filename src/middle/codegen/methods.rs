//! Static method dispatch

use indexmap::IndexMap;

/// Function index of every method, keyed by struct and dispatch slot.
///
/// Slots are assigned by the checker in declaration order, so a call site
/// resolves to a function index without looking at method names.
#[derive(Debug, Default, Clone)]
pub struct MethodTable {
    structs: IndexMap<String, Vec<u32>>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the function implementing `slot` of `struct_name`. Slots
    /// must be registered in order.
    pub fn insert(
        &mut self,
        struct_name: &str,
        slot: usize,
        function: u32,
    ) {
        let slots = self.structs.entry(struct_name.to_string()).or_default();
        if slots.len() <= slot {
            slots.resize(slot + 1, u32::MAX);
        }
        slots[slot] = function;
    }

    pub fn get(
        &self,
        struct_name: &str,
        slot: usize,
    ) -> Option<u32> {
        self.structs
            .get(struct_name)
            .and_then(|slots| slots.get(slot))
            .copied()
            .filter(|index| *index != u32::MAX)
    }

    /// Number of registered methods
    pub fn len(&self) -> usize {
        self.structs.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_slot() {
        let mut table = MethodTable::new();
        table.insert("Point", 0, 20);
        table.insert("Point", 1, 21);
        table.insert("Line", 0, 22);
        assert_eq!(table.get("Point", 1), Some(21));
        assert_eq!(table.get("Line", 0), Some(22));
        assert_eq!(table.get("Line", 1), None);
        assert_eq!(table.get("Circle", 0), None);
        assert_eq!(table.len(), 3);
    }
}
