//! Best-effort results that keep a partial value next to an error.
//!
//! A translation domain whose template generator failed still has a language
//! list; a documentation unit whose renderer failed still has an edge list and
//! credits. [`Outcome`] carries both so the caller decides whether to keep the
//! partial value, instead of an error path that silently drops it.

use serde::{Serialize, Serializer};

use super::SweepError;

/// A value that may be partial, paired with the error that made it partial.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome<T> {
    value: Option<T>,
    #[serde(serialize_with = "serialize_error", skip_serializing_if = "Option::is_none")]
    error: Option<SweepError>,
}

fn serialize_error<S: Serializer>(error: &Option<SweepError>, s: S) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => s.serialize_str(&e.to_string()),
        None => s.serialize_none(),
    }
}

impl<T> Outcome<T> {
    /// A complete value with no error.
    pub const fn ok(value: T) -> Self {
        Self {
            value: Some(value),
            error: None,
        }
    }

    /// A best-effort value that is missing whatever `error` prevented.
    pub const fn partial(value: T, error: SweepError) -> Self {
        Self {
            value: Some(value),
            error: Some(error),
        }
    }

    /// No value at all.
    pub const fn failed(error: SweepError) -> Self {
        Self {
            value: None,
            error: Some(error),
        }
    }

    pub const fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub const fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub const fn error(&self) -> Option<&SweepError> {
        self.error.as_ref()
    }

    /// Splits into the partial value and the error.
    pub fn into_parts(self) -> (Option<T>, Option<SweepError>) {
        (self.value, self.error)
    }

    /// Strict view: any error wins over the partial value.
    pub fn into_result(self) -> Result<T, SweepError> {
        match (self.value, self.error) {
            (_, Some(error)) => Err(error),
            (Some(value), None) => Ok(value),
            (None, None) => Err(SweepError::Other {
                message: "outcome carried neither value nor error".to_string(),
            }),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: self.value.map(f),
            error: self.error,
        }
    }
}

impl<T> From<Result<T, SweepError>> for Outcome<T> {
    fn from(result: Result<T, SweepError>) -> Self {
        match result {
            Ok(value) => Self::ok(value),
            Err(error) => Self::failed(error),
        }
    }
}
