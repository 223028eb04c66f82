//! Identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Dense cloud identifier, unique within a dataset.
/// Assigned from the position of the cloud file in the dataset listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CloudId(pub u32);

impl CloudId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CloudId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for CloudId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}
