//! Public error types for storemap.
//!
//! Store adapters produce [`StoreError`] with a closed [`ErrorKind`]. Everything the user
//! sees is a [`Failure`] or a [`ValidationError`], both of which render as the exact message
//! shown in a toast or dialog.

mod store;

pub use store::{ErrorKind, StoreError};

use storemap_proto::StorefrontId;
use thiserror::Error;

/// Client-side check that failed before any request was sent.
///
/// Returned from: `StorefrontDraft::validate`, `EditForm::submit`, `ImageForm::validate`,
/// and the coordinator when handed an empty intent
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Title must not be empty.")]
    EmptyTitle,

    #[error("Description must not be empty.")]
    EmptyDescription,

    #[error("You must select a category.")]
    MissingCategory,

    #[error("Location has not been set.")]
    LocationNotSet,

    /// A storefront intent with no fields
    #[error("Nothing has been changed for publishing.")]
    EmptyIntent,

    #[error("Image URL must not be empty.")]
    EmptyImageUrl,

    #[error("Image seems to be invalid.")]
    UnreachableImage,

    #[error("Credits must not be empty.")]
    EmptyCredits,

    /// An image form with no changed fields
    #[error("Nothing has been changed.")]
    ImageUnchanged,
}

/// The single human-readable reason an operation did not take effect
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Failure {
    #[error("Insufficient permissions.")]
    InsufficientPermissions,

    #[error("An unknown error occurred.")]
    Unknown,

    /// The update was accepted but the verify-read shows it did not land
    #[error("Couldn't edit, may not have permissions.")]
    EditNotApplied,

    #[error("Could not publish storefront, may not have permissions.")]
    PublishNotApplied,

    /// The delete was accepted but the row is still there
    #[error("Could not delete storefront, may not be allowed to.")]
    DeleteNotApplied,

    #[error("{0}")]
    Invalid(#[from] ValidationError),
}

impl From<&StoreError> for Failure {
    fn from(err: &StoreError) -> Self {
        match err.kind {
            ErrorKind::InsufficientPrivilege => Failure::InsufficientPermissions,
            _ => Failure::Unknown,
        }
    }
}

impl From<StoreError> for Failure {
    fn from(err: StoreError) -> Self { Failure::from(&err) }
}

/// Error type for optimistic edits.
///
/// A reverted edit is not an error; it is `Outcome::Reverted`. These are the cases where the
/// coordinator could not run the protocol at all, or could not restore the cache afterwards.
///
/// Returned from: `Coordinator::apply_edit`, `Coordinator::set_published`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("{0}")]
    Invalid(#[from] ValidationError),

    /// The edit failed and no snapshot existed to restore, so the cache keeps the optimistic value
    #[error("could not revert storefront {id}: {reason}")]
    RevertFailed { id: StorefrontId, reason: Failure },
}

impl EditError {
    /// What the user should be told
    pub fn failure(&self) -> Failure {
        match self {
            EditError::Invalid(err) => Failure::Invalid(err.clone()),
            EditError::RevertFailed { reason, .. } => reason.clone(),
        }
    }
}
