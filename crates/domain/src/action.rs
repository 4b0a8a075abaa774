//! Actions a grant authorizes and their bitmask encoding.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use bastion_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Single action a grant can allow on an asset account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Open a session.
    Connect,
    /// Upload files.
    Upload,
    /// Download files.
    Download,
    /// Copy from the remote clipboard.
    Copy,
    /// Paste into the remote clipboard.
    Paste,
    /// Delete remote files.
    Delete,
    /// Share a live session.
    Share,
}

impl Action {
    /// Returns the bit this action occupies in an [`ActionSet`].
    #[must_use]
    pub fn bit(&self) -> u32 {
        match self {
            Self::Connect => 0b1,
            Self::Upload => 0b10,
            Self::Download => 0b100,
            Self::Copy => 0b1000,
            Self::Paste => 0b1_0000,
            Self::Delete => 0b10_0000,
            Self::Share => 0b100_0000,
        }
    }

    /// Returns a stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Upload => "upload",
            Self::Download => "download",
            Self::Copy => "copy",
            Self::Paste => "paste",
            Self::Delete => "delete",
            Self::Share => "share",
        }
    }

    /// Returns all known actions in bit order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Action] = &[
            Action::Connect,
            Action::Upload,
            Action::Download,
            Action::Copy,
            Action::Paste,
            Action::Delete,
            Action::Share,
        ];

        ALL
    }
}

impl FromStr for Action {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "connect" => Ok(Self::Connect),
            "upload" => Ok(Self::Upload),
            "download" => Ok(Self::Download),
            "copy" => Ok(Self::Copy),
            "paste" => Ok(Self::Paste),
            "delete" => Ok(Self::Delete),
            "share" => Ok(Self::Share),
            _ => Err(AppError::Validation(format!("unknown action '{value}'"))),
        }
    }
}

/// Combinable action bitmask stored on a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct ActionSet(u32);

impl ActionSet {
    /// Set with no actions.
    pub const NONE: Self = Self(0);

    /// Creates a set from stored bits, rejecting unknown bits.
    pub fn from_bits(bits: u32) -> AppResult<Self> {
        let known = Self::all().0;
        if bits & !known != 0 {
            return Err(AppError::Validation(format!(
                "action bitmask {bits:#b} contains unknown bits"
            )));
        }

        Ok(Self(bits))
    }

    /// Returns the stored bits.
    #[must_use]
    pub fn bits(&self) -> u32 {
        self.0
    }

    /// Returns a set holding every known action.
    #[must_use]
    pub fn all() -> Self {
        Self::from_actions(Action::all().iter().copied())
    }

    /// Builds a set from individual actions.
    #[must_use]
    pub fn from_actions(actions: impl IntoIterator<Item = Action>) -> Self {
        Self(actions.into_iter().fold(0, |bits, action| bits | action.bit()))
    }

    /// Parses action names such as `["connect", "upload"]`.
    pub fn parse_names<I, S>(names: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|name| Action::from_str(name.as_ref()))
            .collect::<AppResult<Vec<_>>>()
            .map(Self::from_actions)
    }

    /// Returns whether the action is allowed.
    #[must_use]
    pub fn contains(&self, action: Action) -> bool {
        self.0 & action.bit() != 0
    }

    /// Returns the union of both sets.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Returns whether no action is allowed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Returns the allowed actions in bit order.
    #[must_use]
    pub fn actions(&self) -> Vec<Action> {
        Action::all()
            .iter()
            .copied()
            .filter(|action| self.contains(*action))
            .collect()
    }
}

impl Default for ActionSet {
    fn default() -> Self {
        Self::from_actions([Action::Connect])
    }
}

impl TryFrom<u32> for ActionSet {
    type Error = AppError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_bits(value)
    }
}

impl From<ActionSet> for u32 {
    fn from(value: ActionSet) -> Self {
        value.0
    }
}

impl Display for ActionSet {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.actions().iter().map(Action::as_str).collect();
        formatter.write_str(names.join(",").as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, ActionSet};

    #[test]
    fn default_allows_connect_only() {
        let actions = ActionSet::default();
        assert!(actions.contains(Action::Connect));
        assert!(!actions.contains(Action::Upload));
        assert_eq!(actions.bits(), 1);
    }

    #[test]
    fn union_combines_bits() {
        let read = ActionSet::from_actions([Action::Connect, Action::Download]);
        let write = ActionSet::from_actions([Action::Upload]);
        assert_eq!(read.union(write).bits(), 0b111);
        assert_eq!(read.union(write).to_string(), "connect,upload,download");
    }

    #[test]
    fn unknown_bits_are_rejected() {
        assert!(ActionSet::from_bits(0b1000_0000).is_err());
        assert!(ActionSet::from_bits(ActionSet::all().bits()).is_ok());
    }

    #[test]
    fn names_parse_into_a_set() {
        let parsed = ActionSet::parse_names(["connect", "paste"]);
        assert_eq!(
            parsed.ok(),
            Some(ActionSet::from_actions([Action::Connect, Action::Paste]))
        );
        assert!(ActionSet::parse_names(["teleport"]).is_err());
    }
}
