use std::collections::BTreeSet;

/// Output shape requested from a resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolveMode {
    /// Bare identities.
    #[default]
    Flat,
    /// Full records loaded in one batch.
    Hydrated,
}

impl ResolveMode {
    /// Maps a transport `flat` flag to a mode.
    #[must_use]
    pub fn from_flat(flat: bool) -> Self {
        if flat { Self::Flat } else { Self::Hydrated }
    }
}

/// Resolver result in the shape selected by [`ResolveMode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expansion<I, R> {
    /// De-duplicated identities.
    Identities(BTreeSet<I>),
    /// Hydrated records in user-facing order.
    Records(Vec<R>),
}

impl<I, R> Expansion<I, R> {
    /// Returns the number of resolved entries.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Identities(identities) => identities.len(),
            Self::Records(records) => records.len(),
        }
    }

    /// Returns whether nothing was resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the identities of a flat expansion.
    #[must_use]
    pub fn into_identities(self) -> Option<BTreeSet<I>> {
        match self {
            Self::Identities(identities) => Some(identities),
            Self::Records(_) => None,
        }
    }

    /// Returns the records of a hydrated expansion.
    #[must_use]
    pub fn into_records(self) -> Option<Vec<R>> {
        match self {
            Self::Identities(_) => None,
            Self::Records(records) => Some(records),
        }
    }
}
