//! Application services and ports for permission resolution.

#![forbid(unsafe_code)]

mod account_resolver;
mod asset_set_resolver;
mod authorization_service;
mod expansion;
mod grant_query;
mod principal_expander;
mod resolution_ports;

#[cfg(test)]
mod test_fixtures;

pub use account_resolver::AccountResolver;
pub use asset_set_resolver::AssetSetResolver;
pub use authorization_service::{
    AccessDecision, AccessRequest, AuthorizationService, AuthorizedAccess, DirectoryPorts,
    GrantStatus, GrantValidity,
};
pub use expansion::{Expansion, ResolveMode};
pub use grant_query::{GrantFilter, GrantQuery, GrantSet};
pub use principal_expander::PrincipalExpander;
pub use resolution_ports::{
    AccountQuery, AccountStore, AssetStore, Clock, IdentityStore, NodeStore,
    PermissionGrantRepository,
};
