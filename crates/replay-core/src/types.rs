//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// A calendar month outside 1-12.
    #[error("month must be between 1 and 12, got {value}")]
    MonthOutOfRange { value: u32 },

    /// Invalid granularity value.
    #[error("invalid granularity: {value}")]
    InvalidGranularity { value: String },

    /// Invalid metric value.
    #[error("invalid metric: {value}")]
    InvalidMetric { value: String },
}

/// Aggregation resolution for bucketed series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One bucket per calendar month.
    Month,
    /// One bucket per calendar year.
    Year,
}

impl Granularity {
    /// String representation, matching the dataset keys used by the store.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Granularity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            _ => Err(ValidationError::InvalidGranularity {
                value: s.to_string(),
            }),
        }
    }
}

/// Which bucketed statistic a view is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Play counts per bucket.
    Counts,
    /// Summed listening time per bucket.
    Times,
    /// Distinct songs heard per bucket.
    #[serde(rename = "uq_songs")]
    UniqueSongs,
    /// Distinct artists heard per bucket.
    #[serde(rename = "uq_artists")]
    UniqueArtists,
}

impl Metric {
    /// String representation, matching the dataset keys used by the store.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Counts => "counts",
            Self::Times => "times",
            Self::UniqueSongs => "uq_songs",
            Self::UniqueArtists => "uq_artists",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Metric {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "counts" => Ok(Self::Counts),
            "times" => Ok(Self::Times),
            "uq_songs" => Ok(Self::UniqueSongs),
            "uq_artists" => Ok(Self::UniqueArtists),
            _ => Err(ValidationError::InvalidMetric {
                value: s.to_string(),
            }),
        }
    }
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated track identifier.
    ///
    /// Track IDs must be non-empty strings. They address song documents in
    /// the store (`songs/{track_id}`).
    TrackId, "track ID"
);

define_string_id!(
    /// A validated artist identifier.
    ///
    /// Artist IDs must be non-empty strings. They address artist documents
    /// in the store (`artists/{artist_id}`).
    ArtistId, "artist ID"
);
