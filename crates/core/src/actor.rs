//! Acting-user identity threaded through every mutating call.

use serde::Serialize;

use crate::error::CoreError;
use crate::types::DbId;

/// The user on whose behalf a mutation runs. Recorded in `modified_by` /
/// `assigned_by` audit fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ActingUser(DbId);

impl ActingUser {
    /// Wrap a user id. Non-positive ids cannot refer to a stored user.
    pub fn new(user_id: DbId) -> Result<Self, CoreError> {
        if user_id <= 0 {
            return Err(CoreError::PreconditionFailed(format!(
                "Acting user id must be positive, got {user_id}"
            )));
        }
        Ok(Self(user_id))
    }

    /// Convert an optional identity into a required one.
    pub fn require(user_id: Option<DbId>) -> Result<Self, CoreError> {
        match user_id {
            Some(id) => Self::new(id),
            None => Err(CoreError::PreconditionFailed(
                "An acting user is required for this operation".to_string(),
            )),
        }
    }

    pub fn id(self) -> DbId {
        self.0
    }
}
