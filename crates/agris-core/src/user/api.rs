//! Profile API trait.

use super::model::Profile;
use crate::auth::SessionIdentity;
use crate::error::Result;
use async_trait::async_trait;

/// An abstract interface to the backend profile endpoint.
///
/// Implementations authenticate with the identity's access token and return
/// the augmentation record for that user.
#[async_trait]
pub trait ProfileApi: Send + Sync {
    /// Fetches the backend profile for the given identity.
    ///
    /// # Returns
    ///
    /// - `Ok(Profile)`: the augmentation record
    /// - `Err(_)`: transport or API failure (callers treat this as
    ///   non-fatal; the identity stays authenticated on provider fields)
    async fn fetch_profile(&self, identity: &SessionIdentity) -> Result<Profile>;
}
