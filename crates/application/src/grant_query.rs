//! Composable bulk filters over permission grants.
//!
//! Every filter is a pure predicate on a single grant, so chained filters
//! commute: `active().filter_by_accounts(..)` selects exactly the same grants
//! as `filter_by_accounts(..).active()`.

use std::collections::BTreeSet;

use bastion_domain::{GrantId, PermissionGrant};
use chrono::{DateTime, Utc};

/// One predicate of a grant query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantFilter {
    /// `is_active` is set.
    Active,
    /// `is_active` is cleared.
    Inactive,
    /// Active and strictly inside the validity window at the instant.
    Valid(DateTime<Utc>),
    /// Exact complement of [`GrantFilter::Valid`] at the same instant.
    Invalid(DateTime<Utc>),
    /// Wildcard grants, or explicit lists containing every listed name.
    Accounts(BTreeSet<String>),
}

impl GrantFilter {
    /// Returns whether the grant satisfies the predicate.
    #[must_use]
    pub fn matches(&self, grant: &PermissionGrant) -> bool {
        match self {
            Self::Active => grant.is_active(),
            Self::Inactive => !grant.is_active(),
            Self::Valid(now) => grant.is_valid(*now),
            // Inactive, not started yet, or past expiry; the window bounds
            // themselves count as invalid so valid/invalid partition the set.
            Self::Invalid(now) => !grant.is_valid(*now),
            Self::Accounts(names) => grant
                .accounts()
                .admits_all(names.iter().map(String::as_str)),
        }
    }
}

/// Conjunction of grant filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrantQuery {
    filters: Vec<GrantFilter>,
}

impl GrantQuery {
    /// Creates a query matching every grant.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter.
    #[must_use]
    pub fn with(mut self, filter: GrantFilter) -> Self {
        if !self.filters.contains(&filter) {
            self.filters.push(filter);
        }
        self
    }

    /// Keeps active grants.
    #[must_use]
    pub fn active(self) -> Self {
        self.with(GrantFilter::Active)
    }

    /// Keeps inactive grants.
    #[must_use]
    pub fn inactive(self) -> Self {
        self.with(GrantFilter::Inactive)
    }

    /// Keeps grants valid at `now`.
    #[must_use]
    pub fn valid(self, now: DateTime<Utc>) -> Self {
        self.with(GrantFilter::Valid(now))
    }

    /// Keeps grants invalid at `now`.
    #[must_use]
    pub fn invalid(self, now: DateTime<Utc>) -> Self {
        self.with(GrantFilter::Invalid(now))
    }

    /// Keeps grants authorizing every name in `account_names`.
    #[must_use]
    pub fn filter_by_accounts<I, S>(self, account_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(GrantFilter::Accounts(
            account_names.into_iter().map(Into::into).collect(),
        ))
    }

    /// Returns the filters in insertion order.
    #[must_use]
    pub fn filters(&self) -> &[GrantFilter] {
        &self.filters
    }

    /// Returns whether the grant satisfies every filter.
    #[must_use]
    pub fn matches(&self, grant: &PermissionGrant) -> bool {
        self.filters.iter().all(|filter| filter.matches(grant))
    }
}

/// Borrowed selection of grants with chainable set operations.
#[derive(Debug, Clone)]
pub struct GrantSet<'a> {
    grants: Vec<&'a PermissionGrant>,
}

impl<'a> GrantSet<'a> {
    /// Starts from every grant in the slice.
    #[must_use]
    pub fn new(grants: &'a [PermissionGrant]) -> Self {
        Self {
            grants: grants.iter().collect(),
        }
    }

    /// Keeps grants matching the filter.
    #[must_use]
    pub fn filter(mut self, filter: &GrantFilter) -> Self {
        self.grants.retain(|grant| filter.matches(grant));
        self
    }

    /// Keeps grants matching every filter of the query.
    #[must_use]
    pub fn apply(mut self, query: &GrantQuery) -> Self {
        self.grants.retain(|grant| query.matches(grant));
        self
    }

    /// Keeps active grants.
    #[must_use]
    pub fn active(self) -> Self {
        self.filter(&GrantFilter::Active)
    }

    /// Keeps inactive grants.
    #[must_use]
    pub fn inactive(self) -> Self {
        self.filter(&GrantFilter::Inactive)
    }

    /// Keeps grants valid at `now`.
    #[must_use]
    pub fn valid(self, now: DateTime<Utc>) -> Self {
        self.filter(&GrantFilter::Valid(now))
    }

    /// Keeps grants invalid at `now`.
    #[must_use]
    pub fn invalid(self, now: DateTime<Utc>) -> Self {
        self.filter(&GrantFilter::Invalid(now))
    }

    /// Keeps grants authorizing every name in `account_names`.
    #[must_use]
    pub fn filter_by_accounts<I, S>(self, account_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter(&GrantFilter::Accounts(
            account_names.into_iter().map(Into::into).collect(),
        ))
    }

    /// Returns the ids of the selected grants.
    #[must_use]
    pub fn ids(&self) -> BTreeSet<GrantId> {
        self.grants.iter().map(|grant| grant.id()).collect()
    }

    /// Returns the number of selected grants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.grants.len()
    }

    /// Returns whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }

    /// Returns the selected grants in their original order.
    #[must_use]
    pub fn into_vec(self) -> Vec<&'a PermissionGrant> {
        self.grants
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use bastion_domain::PermissionGrant;
    use chrono::Duration;
    use proptest::prelude::*;
    use serde_json::json;

    use crate::test_fixtures::{fixed_now, grant_with};

    use super::{GrantFilter, GrantQuery, GrantSet};

    fn window_grant(start_offset: i64, length: i64, is_active: bool) -> PermissionGrant {
        grant_with(|input| {
            let start = fixed_now() + Duration::seconds(start_offset);
            input.date_start = Some(start);
            input.date_expired = Some(start + Duration::seconds(length));
            input.is_active = is_active;
        })
    }

    #[test]
    fn active_and_inactive_are_complements() {
        let grants = vec![
            window_grant(-10, 20, true),
            window_grant(-10, 20, false),
            window_grant(100, 20, true),
        ];

        let active = GrantSet::new(&grants).active().ids();
        let inactive = GrantSet::new(&grants).inactive().ids();

        assert_eq!(active.len(), 2);
        assert_eq!(inactive.len(), 1);
        assert!(active.is_disjoint(&inactive));
    }

    #[test]
    fn valid_requires_active_and_window() {
        let now = fixed_now();
        let current = window_grant(-10, 20, true);
        let disabled = window_grant(-10, 20, false);
        let future = window_grant(10, 20, true);
        let past = window_grant(-30, 20, true);
        let expected = BTreeSet::from([current.id()]);
        let grants = vec![current, disabled, future, past];

        assert_eq!(GrantSet::new(&grants).valid(now).ids(), expected);
        assert_eq!(GrantSet::new(&grants).invalid(now).len(), 3);
    }

    #[test]
    fn window_bounds_count_as_invalid() {
        let now = fixed_now();
        let starts_now = window_grant(0, 20, true);
        let expires_now = window_grant(-20, 20, true);
        let grants = vec![starts_now, expires_now];

        assert!(GrantSet::new(&grants).valid(now).is_empty());
        assert_eq!(GrantSet::new(&grants).invalid(now).len(), 2);
    }

    #[test]
    fn account_filter_uses_subset_containment_or_wildcard() {
        let both = grant_with(|input| input.accounts = json!(["root", "admin"]));
        let only_root = grant_with(|input| input.accounts = json!(["root"]));
        let wildcard = grant_with(|input| input.accounts = json!(["@ALL"]));
        let expected = BTreeSet::from([both.id(), wildcard.id()]);
        let grants = vec![both, only_root, wildcard];

        let selected = GrantSet::new(&grants)
            .filter_by_accounts(["root", "admin"])
            .ids();

        assert_eq!(selected, expected);
    }

    #[test]
    fn query_deduplicates_repeated_filters() {
        let query = GrantQuery::new().active().active().filter_by_accounts(["root"]);
        assert_eq!(query.filters().len(), 2);
        assert_eq!(query.filters()[0], GrantFilter::Active);
    }

    fn arbitrary_grant() -> impl Strategy<Value = PermissionGrant> {
        (
            -50_i64..50,
            1_i64..60,
            any::<bool>(),
            prop::sample::subsequence(vec!["root", "admin", "guest", "@ALL"], 0..=3),
        )
            .prop_map(|(start_offset, length, is_active, accounts)| {
                grant_with(|input| {
                    let start = fixed_now() + Duration::seconds(start_offset);
                    input.date_start = Some(start);
                    input.date_expired = Some(start + Duration::seconds(length));
                    input.is_active = is_active;
                    input.accounts = json!(accounts);
                })
            })
    }

    proptest! {
        #[test]
        fn valid_and_invalid_partition_every_grant_set(
            grants in prop::collection::vec(arbitrary_grant(), 0..12),
            probe in -60_i64..60,
        ) {
            let now = fixed_now() + Duration::seconds(probe);
            let all: BTreeSet<_> = GrantSet::new(&grants).ids();
            let valid = GrantSet::new(&grants).valid(now).ids();
            let invalid = GrantSet::new(&grants).invalid(now).ids();

            prop_assert!(valid.is_disjoint(&invalid));
            prop_assert_eq!(valid.union(&invalid).copied().collect::<BTreeSet<_>>(), all);
        }

        #[test]
        fn independent_filters_commute(
            grants in prop::collection::vec(arbitrary_grant(), 0..12),
            requested in prop::sample::subsequence(vec!["root", "admin", "guest"], 0..=2),
            probe in -60_i64..60,
        ) {
            let now = fixed_now() + Duration::seconds(probe);

            let left = GrantSet::new(&grants)
                .active()
                .filter_by_accounts(requested.clone())
                .valid(now)
                .ids();
            let right = GrantSet::new(&grants)
                .valid(now)
                .filter_by_accounts(requested.clone())
                .active()
                .ids();
            let query = GrantQuery::new()
                .filter_by_accounts(requested)
                .valid(now)
                .active();

            prop_assert_eq!(&left, &right);
            prop_assert_eq!(GrantSet::new(&grants).apply(&query).ids(), left);
        }
    }
}
