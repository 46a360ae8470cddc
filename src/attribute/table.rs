use heapless::Vec;

use crate::Error;

/// A fixed capacity, insertion ordered table of attributes.
///
/// The index an attribute is pushed at is its handle for the lifetime of the table.
#[derive(Debug, Clone)]
pub struct AttributeTable<A, const MAX: usize> {
    attributes: Vec<A, MAX>,
}

impl<A, const MAX: usize> Default for AttributeTable<A, MAX> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, const MAX: usize> AttributeTable<A, MAX> {
    /// Create an empty table.
    pub const fn new() -> Self {
        Self { attributes: Vec::new() }
    }

    /// Append an attribute, returning its index.
    pub fn push(&mut self, attribute: A) -> Result<u16, Error> {
        let index = self.attributes.len();
        if self.attributes.push(attribute).is_err() {
            warn!("[table] no space for more attributes, capacity {}", MAX);
            return Err(Error::CapacityExceeded);
        }
        Ok(index as u16)
    }

    pub fn get(&self, index: usize) -> Option<&A> {
        self.attributes.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut A> {
        self.attributes.get_mut(index)
    }

    pub fn iter(&self) -> core::slice::Iter<'_, A> {
        self.attributes.iter()
    }

    pub fn iter_mut(&mut self) -> core::slice::IterMut<'_, A> {
        self.attributes.iter_mut()
    }

    pub fn as_slice(&self) -> &[A] {
        &self.attributes
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        MAX
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_insertion_order() {
        let mut table: AttributeTable<u8, 3> = AttributeTable::new();
        assert_eq!(table.push(10), Ok(0));
        assert_eq!(table.push(11), Ok(1));
        assert_eq!(table.get(1), Some(&11));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn push_beyond_capacity_is_reported() {
        let mut table: AttributeTable<u8, 2> = AttributeTable::new();
        table.push(1).unwrap();
        table.push(2).unwrap();
        assert_eq!(table.push(3), Err(Error::CapacityExceeded));
        assert_eq!(table.as_slice(), &[1, 2]);
    }
}
