// Uniform result shape returned to callers

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// The only shape the envelope layer hands back to callers, regardless of
/// whether the failure came from the network, the crypto layer, or the
/// server. Exactly one variant; serializes as
/// `{"success":true,"data":…}` or `{"success":false,"error":"…"}`.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome<T> {
    Success { data: T },
    Failure { error: String },
}

impl<T> CallOutcome<T> {
    pub fn success(data: T) -> Self {
        CallOutcome::Success { data }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        CallOutcome::Failure { error: error.into() }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CallOutcome::Success { .. })
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            CallOutcome::Success { data } => Some(data),
            CallOutcome::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            CallOutcome::Success { .. } => None,
            CallOutcome::Failure { error } => Some(error),
        }
    }

    pub fn into_result(self) -> Result<T, String> {
        match self {
            CallOutcome::Success { data } => Ok(data),
            CallOutcome::Failure { error } => Err(error),
        }
    }
}

impl<T: Serialize> Serialize for CallOutcome<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CallOutcome", 2)?;
        match self {
            CallOutcome::Success { data } => {
                state.serialize_field("success", &true)?;
                state.serialize_field("data", data)?;
            }
            CallOutcome::Failure { error } => {
                state.serialize_field("success", &false)?;
                state.serialize_field("error", error)?;
            }
        }
        state.end()
    }
}
