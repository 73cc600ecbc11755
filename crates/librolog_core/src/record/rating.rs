use serde::{Deserialize, Serialize};

/// Star rating of a finished book, always within `1..=5`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Returns `None` if `value` lies outside of `1..=5`.
    #[must_use]
    #[inline]
    pub const fn new(value: u8) -> Option<Self> {
        if value >= Self::MIN && value <= Self::MAX {
            Some(Self(value))
        } else {
            None
        }
    }

    #[must_use]
    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Renders the rating as five stars, filled up to the rating value.
    #[must_use]
    #[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
    pub fn stars(self) -> String {
        (Self::MIN..=Self::MAX)
            .map(|star| if star <= self.0 { '★' } else { '☆' })
            .collect()
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RatingError {
    #[error("rating must be between 1 and 5, got {0}")]
    OutOfRange(u8),
}

impl TryFrom<u8> for Rating {
    type Error = RatingError;

    #[inline]
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(RatingError::OutOfRange(value))
    }
}

impl From<Rating> for u8 {
    #[inline]
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "Tests are predefined and guaranteed to be Some/Ok"
)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn accepts_one_to_five() {
        let accepted = (0..=7)
            .filter_map(Rating::new)
            .map(Rating::get)
            .collect::<Vec<u8>>();
        assert_eq!(accepted, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn rejects_out_of_range_on_deserialize() {
        assert_eq!(serde_json::from_str::<Rating>("4").unwrap(), Rating(4));
        assert!(serde_json::from_str::<Rating>("0").is_err());
        assert!(serde_json::from_str::<Rating>("6").is_err());
    }

    #[test]
    fn serializes_as_plain_number() {
        assert_eq!(serde_json::to_string(&Rating(3)).unwrap(), "3");
    }

    #[test]
    fn stars() {
        assert_eq!(Rating(2).stars(), "★★☆☆☆");
    }
}
