//! Configuration for pageindex trees.

use super::error::{Error, Result};

/// Branching-factor parameter used when none is given.
///
/// With order 3 every page holds at most 6 entries, and every page
/// except the root holds at least 3.
pub const DEFAULT_ORDER: usize = 3;

/// Smallest order a tree can be built with.
pub const MIN_ORDER: usize = 1;

/// Flat-integer stand-in for "no object".
///
/// The API reports absence with `Option::None`. This constant exists for
/// callers that store object ids in plain integer columns.
pub const ABSENT_OBJECT_ID: i64 = -1;

/// Shape of a B-tree index, fixed at construction.
///
/// # Example
/// ```
/// use pageindex::IndexConfig;
///
/// let config = IndexConfig::new(4).unique(false);
/// assert_eq!(config.max_entries(), 8);
/// assert_eq!(config.min_entries(), 4);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexConfig {
    /// Branching factor. Pages split once they exceed `2 * order` entries.
    pub order: usize,

    /// Reject duplicate keys when true, allow multi-valued keys otherwise.
    pub unique: bool,
}

impl IndexConfig {
    /// Create a unique-key configuration with the given order.
    pub fn new(order: usize) -> Self {
        Self {
            order,
            unique: true,
        }
    }

    /// Set whether keys must be unique.
    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Check that the configuration describes a usable tree.
    ///
    /// # Errors
    /// - `Error::InvalidOrder` if `order` is below [`MIN_ORDER`]
    pub fn validate(&self) -> Result<()> {
        if self.order < MIN_ORDER {
            return Err(Error::InvalidOrder(self.order));
        }
        Ok(())
    }

    /// Most entries a page may hold after an operation completes.
    #[inline]
    pub fn max_entries(&self) -> usize {
        2 * self.order
    }

    /// Fewest entries a non-root page may hold after an operation completes.
    #[inline]
    pub fn min_entries(&self) -> usize {
        self.order
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ORDER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = IndexConfig::default();
        assert_eq!(config.order, DEFAULT_ORDER);
        assert!(config.unique);
        assert_eq!(config.max_entries(), 6);
        assert_eq!(config.min_entries(), 3);
    }

    #[test]
    fn test_builder() {
        let config = IndexConfig::new(2).unique(false);
        assert_eq!(config.order, 2);
        assert!(!config.unique);
    }

    #[test]
    fn test_validate_rejects_zero_order() {
        let err = IndexConfig::new(0).validate().unwrap_err();
        assert!(matches!(err, Error::InvalidOrder(0)));

        assert!(IndexConfig::new(MIN_ORDER).validate().is_ok());
    }
}
