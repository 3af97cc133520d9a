//! Error types for the LRU index

use std::fmt;

/// Returned when an index is constructed with a capacity of zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidCapacity;

impl fmt::Display for InvalidCapacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "index capacity must be greater than zero")
    }
}

impl std::error::Error for InvalidCapacity {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_capacity_display() {
        let err = InvalidCapacity;
        assert_eq!(
            format!("{}", err),
            "index capacity must be greater than zero"
        );
    }

    #[test]
    fn test_error_is_debug() {
        let debug_str = format!("{:?}", InvalidCapacity);
        assert!(debug_str.contains("InvalidCapacity"));
    }
}
