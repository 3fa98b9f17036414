//! Validated tour requests.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::interest::Interests;

/// A validated request for one tour.
///
/// Only constructed through [`TourRequest::new`] (or deserialization, which
/// runs the same checks): the location is non-empty after trimming, at least
/// one interest is selected and the duration is positive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTourRequest")]
pub struct TourRequest {
    location: String,
    interests: Interests,
    duration_minutes: u32,
}

#[derive(Deserialize)]
struct RawTourRequest {
    location: String,
    interests: Interests,
    duration_minutes: u32,
}

impl TryFrom<RawTourRequest> for TourRequest {
    type Error = Error;

    fn try_from(raw: RawTourRequest) -> Result<Self> {
        Self::new(raw.location, raw.interests, raw.duration_minutes)
    }
}

impl TourRequest {
    /// Validates and builds a request. The location is stored trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if the location is blank, no interest
    /// is selected, or the duration is zero.
    pub fn new(
        location: impl Into<String>,
        interests: Interests,
        duration_minutes: u32,
    ) -> Result<Self> {
        let location = location.into();
        let location = location.trim();
        if location.is_empty() {
            return Err(Error::invalid_request("location must not be empty"));
        }
        if interests.is_empty() {
            return Err(Error::invalid_request("select at least one interest"));
        }
        if duration_minutes == 0 {
            return Err(Error::invalid_request(
                "duration must be at least one minute",
            ));
        }
        Ok(Self {
            location: location.to_owned(),
            interests,
            duration_minutes,
        })
    }

    /// Builds a request from user-facing interest labels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] for unknown labels or any check
    /// performed by [`TourRequest::new`].
    pub fn from_labels<I, S>(
        location: impl Into<String>,
        labels: I,
        duration_minutes: u32,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(location, Interests::from_labels(labels)?, duration_minutes)
    }

    /// The tour location.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// The selected interests, in domain order.
    #[must_use]
    pub const fn interests(&self) -> &Interests {
        &self.interests
    }

    /// Requested length in minutes.
    #[must_use]
    pub const fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }
}
