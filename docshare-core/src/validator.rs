//! Sharing validation: existence, uniqueness and type legitimacy.
//!
//! Sharing identifiers act as a foreign key from arbitrary documents back
//! into the registry. Any ambiguity aborts propagation.

use crate::error::{SharingError, SharingResult};
use crate::models::{Document, Sharing, SharingType};

/// A sharing that passed validation, with its parsed type.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSharing {
    pub sharing: Sharing,
    pub sharing_type: SharingType,
}

/// Reduces the registry lookup result to exactly one legitimate sharing.
///
/// Zero matches is `SharingDoesNotExist`, several is `SharingIdNotUnique`
/// (never resolved by picking one), and a type outside the enumeration is
/// `DocumentNotLegitimate`.
pub fn validate_sharing(sharing_id: &str, mut found: Vec<Sharing>) -> SharingResult<ValidatedSharing> {
    match found.len() {
        0 => Err(SharingError::SharingDoesNotExist {
            sharing_id: sharing_id.to_string(),
        }),
        1 => {
            let sharing = found.remove(0);
            let sharing_type =
                sharing
                    .parsed_type()
                    .map_err(|_| SharingError::DocumentNotLegitimate {
                        sharing_id: sharing_id.to_string(),
                        sharing_type: sharing.sharing_type.clone(),
                    })?;
            Ok(ValidatedSharing {
                sharing,
                sharing_type,
            })
        }
        count => Err(SharingError::SharingIdNotUnique {
            sharing_id: sharing_id.to_string(),
            count,
        }),
    }
}

/// Like [`validate_sharing`], but over the raw store documents.
///
/// Matches are counted before anything is decoded, so a duplicate that
/// cannot be read still makes the identifier `SharingIdNotUnique`.
pub fn validate_sharing_documents(sharing_id: &str, docs: Vec<Document>) -> SharingResult<ValidatedSharing> {
    if docs.len() > 1 {
        return Err(SharingError::SharingIdNotUnique {
            sharing_id: sharing_id.to_string(),
            count: docs.len(),
        });
    }
    let found = docs
        .iter()
        .map(Sharing::from_document)
        .collect::<SharingResult<Vec<_>>>()?;
    validate_sharing(sharing_id, found)
}
