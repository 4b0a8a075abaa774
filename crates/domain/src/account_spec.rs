//! Account specification carried by a permission grant.

use std::collections::BTreeSet;
use std::str::FromStr;

use bastion_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Symbolic account names with a reserved meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AccountAlias {
    /// Every account on the resolved assets.
    #[serde(rename = "@ALL")]
    All,
    /// Credentials typed in manually at connect time.
    #[serde(rename = "@INPUT")]
    Input,
    /// Account named after the connecting user.
    #[serde(rename = "@USER")]
    User,
}

impl AccountAlias {
    /// Returns the stored alias string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "@ALL",
            Self::Input => "@INPUT",
            Self::User => "@USER",
        }
    }
}

impl FromStr for AccountAlias {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "@ALL" => Ok(Self::All),
            "@INPUT" => Ok(Self::Input),
            "@USER" => Ok(Self::User),
            _ => Err(AppError::Validation(format!(
                "unknown account alias '{value}'"
            ))),
        }
    }
}

/// Which accounts on the resolved assets a grant authorizes.
///
/// `@INPUT` and `@USER` stay explicit names until global settings give them
/// their own behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub enum AccountSpec {
    /// Every account on every resolved asset.
    Wildcard,
    /// Accounts whose username is in the set.
    ExplicitNames(BTreeSet<String>),
}

impl AccountSpec {
    /// Builds a specification from stored account names.
    ///
    /// Any occurrence of `@ALL` makes the specification a wildcard. Names
    /// match usernames exactly, so blank names and names with surrounding
    /// whitespace are rejected.
    pub fn from_names<I, S>(names: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut explicit = BTreeSet::new();
        for name in names {
            let name = name.into();
            if name.trim().is_empty() {
                return Err(AppError::Validation(
                    "account names must not be empty or whitespace".to_owned(),
                ));
            }
            if name.trim() != name {
                return Err(AppError::Validation(format!(
                    "account name '{name}' has surrounding whitespace"
                )));
            }

            if name == AccountAlias::All.as_str() {
                return Ok(Self::Wildcard);
            }

            explicit.insert(name);
        }

        Ok(Self::ExplicitNames(explicit))
    }

    /// Parses the stored JSON representation of a grant's accounts.
    ///
    /// Anything other than an array of strings is a configuration error.
    pub fn from_stored(value: &Value) -> AppResult<Self> {
        let Value::Array(items) = value else {
            return Err(AppError::Validation(format!(
                "account specification must be a list of account names, got {value}"
            )));
        };

        let names = items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_owned).ok_or_else(|| {
                    AppError::Validation(format!(
                        "account specification entries must be strings, got {item}"
                    ))
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Self::from_names(names)
    }

    /// Returns the stored JSON representation.
    #[must_use]
    pub fn to_stored(&self) -> Value {
        Value::Array(
            self.to_names()
                .into_iter()
                .map(Value::String)
                .collect(),
        )
    }

    /// Returns the stored account names.
    #[must_use]
    pub fn to_names(&self) -> Vec<String> {
        match self {
            Self::Wildcard => vec![AccountAlias::All.as_str().to_owned()],
            Self::ExplicitNames(names) => names.iter().cloned().collect(),
        }
    }

    /// Returns whether the specification is the `@ALL` wildcard.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard)
    }

    /// Returns whether the specification authorizes the username.
    #[must_use]
    pub fn admits(&self, username: &str) -> bool {
        match self {
            Self::Wildcard => true,
            Self::ExplicitNames(names) => names.contains(username),
        }
    }

    /// Returns whether every requested name is authorized.
    ///
    /// Wildcards admit any request. Explicit lists must contain the whole
    /// requested set, not merely intersect it.
    #[must_use]
    pub fn admits_all<'a, I>(&self, requested: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        match self {
            Self::Wildcard => true,
            Self::ExplicitNames(names) => requested.into_iter().all(|name| names.contains(name)),
        }
    }

    /// Returns the explicit usernames, or `None` for a wildcard.
    #[must_use]
    pub fn explicit_names(&self) -> Option<&BTreeSet<String>> {
        match self {
            Self::Wildcard => None,
            Self::ExplicitNames(names) => Some(names),
        }
    }
}

impl Default for AccountSpec {
    fn default() -> Self {
        Self::ExplicitNames(BTreeSet::new())
    }
}

impl TryFrom<Vec<String>> for AccountSpec {
    type Error = AppError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        Self::from_names(value)
    }
}

impl From<AccountSpec> for Vec<String> {
    fn from(value: AccountSpec) -> Self {
        value.to_names()
    }
}
