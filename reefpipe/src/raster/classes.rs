//! Explicit fine-to-coarse class mapping.
//!
//! The segmentation model emits one probability band per fine class;
//! published products aggregate those into a handful of coarse benthic
//! classes. The mapping is an explicit ordered value validated at
//! construction, so band ordering never depends on the iteration order of
//! some lookup table.

use thiserror::Error;

/// Errors from constructing a [`ClassMapping`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassMappingError {
    /// No pairs given
    #[error("class mapping is empty")]
    Empty,

    /// Fine indices must be exactly 0..n with no gaps or repeats
    #[error("fine class indices are not contiguous from 0: {0:?}")]
    NonContiguousFine(Vec<usize>),

    /// The designated reef code is not any pair's coarse code
    #[error("reef code {0} does not appear in the mapping")]
    MissingReefCode(u8),
}

/// Ordered many-to-few mapping from fine model classes to coarse codes.
///
/// Fine class `i` corresponds to probability band `i` of the model output.
/// Coarse output bands are ordered by ascending coarse code. One coarse
/// code is designated as "reef"; its presence in a classification decides
/// whether a quad publishes reef products at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMapping {
    /// `(fine_index, coarse_code)` pairs sorted by fine index
    pairs: Vec<(usize, u8)>,
    /// Distinct coarse codes, ascending
    coarse_codes: Vec<u8>,
    reef_code: u8,
}

impl ClassMapping {
    pub fn new(mut pairs: Vec<(usize, u8)>, reef_code: u8) -> Result<Self, ClassMappingError> {
        if pairs.is_empty() {
            return Err(ClassMappingError::Empty);
        }
        pairs.sort_by_key(|&(fine, _)| fine);
        let fine: Vec<usize> = pairs.iter().map(|&(f, _)| f).collect();
        if fine.iter().enumerate().any(|(i, &f)| f != i) {
            return Err(ClassMappingError::NonContiguousFine(fine));
        }
        let mut coarse_codes: Vec<u8> = pairs.iter().map(|&(_, c)| c).collect();
        coarse_codes.sort_unstable();
        coarse_codes.dedup();
        if !coarse_codes.contains(&reef_code) {
            return Err(ClassMappingError::MissingReefCode(reef_code));
        }
        Ok(Self {
            pairs,
            coarse_codes,
            reef_code,
        })
    }

    /// Default benthic mapping: nine fine model classes folded into five
    /// coarse codes.
    ///
    /// | fine | meaning          | coarse |
    /// |------|------------------|--------|
    /// | 0    | land             | 0      |
    /// | 1    | deep water       | 10     |
    /// | 2    | turbid water     | 10     |
    /// | 3    | sand             | 11     |
    /// | 4    | rubble           | 11     |
    /// | 5    | seagrass         | 12     |
    /// | 6    | macroalgae       | 12     |
    /// | 7    | coral            | 20     |
    /// | 8    | coralline algae  | 20     |
    ///
    /// Coarse code 20 is the reef class.
    pub fn default_benthic() -> Self {
        Self::new(
            vec![
                (0, 0),
                (1, 10),
                (2, 10),
                (3, 11),
                (4, 11),
                (5, 12),
                (6, 12),
                (7, 20),
                (8, 20),
            ],
            20,
        )
        .expect("default mapping is valid")
    }

    /// Number of fine classes (= model probability bands).
    pub fn fine_count(&self) -> usize {
        self.pairs.len()
    }

    /// Distinct coarse codes in ascending order (= coarse band order).
    pub fn coarse_codes(&self) -> &[u8] {
        &self.coarse_codes
    }

    pub fn coarse_count(&self) -> usize {
        self.coarse_codes.len()
    }

    /// Coarse code for a fine class index.
    pub fn coarse_of(&self, fine: usize) -> Option<u8> {
        self.pairs.get(fine).map(|&(_, c)| c)
    }

    /// Position of a coarse code in the coarse band order.
    pub fn coarse_band_index(&self, code: u8) -> Option<usize> {
        self.coarse_codes.iter().position(|&c| c == code)
    }

    /// The coarse code designated as reef.
    pub fn reef_code(&self) -> u8 {
        self.reef_code
    }

    /// Band index of the reef class in coarse products.
    pub fn reef_band_index(&self) -> usize {
        self.coarse_band_index(self.reef_code)
            .expect("validated at construction")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_benthic_shape() {
        let mapping = ClassMapping::default_benthic();
        assert_eq!(mapping.fine_count(), 9);
        assert_eq!(mapping.coarse_codes(), &[0, 10, 11, 12, 20]);
        assert_eq!(mapping.reef_code(), 20);
        assert_eq!(mapping.reef_band_index(), 4);
        assert_eq!(mapping.coarse_of(4), Some(11));
    }

    #[test]
    fn test_band_order_independent_of_pair_order() {
        let a = ClassMapping::new(vec![(0, 7), (1, 3), (2, 7)], 7).unwrap();
        let b = ClassMapping::new(vec![(2, 7), (0, 7), (1, 3)], 7).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.coarse_codes(), &[3, 7]);
        assert_eq!(a.coarse_band_index(7), Some(1));
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(
            ClassMapping::new(vec![], 0).unwrap_err(),
            ClassMappingError::Empty
        );
    }

    #[test]
    fn test_rejects_gap_in_fine_indices() {
        let err = ClassMapping::new(vec![(0, 1), (2, 1)], 1).unwrap_err();
        assert!(matches!(err, ClassMappingError::NonContiguousFine(_)));
    }

    #[test]
    fn test_rejects_duplicate_fine_index() {
        let err = ClassMapping::new(vec![(0, 1), (0, 2), (1, 2)], 1).unwrap_err();
        assert!(matches!(err, ClassMappingError::NonContiguousFine(_)));
    }

    #[test]
    fn test_rejects_missing_reef_code() {
        let err = ClassMapping::new(vec![(0, 1), (1, 2)], 9).unwrap_err();
        assert_eq!(err, ClassMappingError::MissingReefCode(9));
    }
}
