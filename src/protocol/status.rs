//! Domain status derived from transport status codes.

use serde::{Deserialize, Serialize};

/// Three-way classification of a reply, decoupled from the numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    /// The operation succeeded (200 or 201).
    Success,
    /// The addressed resource does not exist (404).
    NotFound,
    /// Any other outcome.
    Failure,
}

impl ResponseStatus {
    /// Map a transport status code to its domain status.
    ///
    /// Total over every code: anything that is not 200, 201 or 404 is a failure.
    ///
    /// # Example
    ///
    /// ```
    /// use configwire_client::protocol::ResponseStatus;
    ///
    /// assert_eq!(ResponseStatus::from_code(201), ResponseStatus::Success);
    /// assert_eq!(ResponseStatus::from_code(404), ResponseStatus::NotFound);
    /// assert_eq!(ResponseStatus::from_code(503), ResponseStatus::Failure);
    /// ```
    pub fn from_code(code: u16) -> Self {
        match code {
            200 | 201 => ResponseStatus::Success,
            404 => ResponseStatus::NotFound,
            _ => ResponseStatus::Failure,
        }
    }

    /// Check if this status is a success.
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, ResponseStatus::Success)
    }
}

impl From<u16> for ResponseStatus {
    fn from(code: u16) -> Self {
        Self::from_code(code)
    }
}
