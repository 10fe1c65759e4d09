use std::fmt::Display;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    New,
    Active,
    Suspended,
}

impl UserStatus {
    /// Accounts still in `new` have not finished initial provisioning.
    pub fn is_provisioned(&self) -> bool {
        !matches!(self, UserStatus::New)
    }
}

impl Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            UserStatus::New => "new",
            UserStatus::Active => "active",
            UserStatus::Suspended => "suspended",
        };
        write!(f, "{}", status)
    }
}

impl TryFrom<&str> for UserStatus {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "new" => Ok(UserStatus::New),
            "active" => Ok(UserStatus::Active),
            "suspended" => Ok(UserStatus::Suspended),
            other => Err(anyhow!("unknown user status {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_new_accounts_are_unprovisioned() {
        assert!(!UserStatus::try_from("new").unwrap().is_provisioned());
        assert!(UserStatus::try_from("active").unwrap().is_provisioned());
        assert!(UserStatus::try_from("suspended").unwrap().is_provisioned());
    }

    #[test]
    fn unknown_status_is_an_error() {
        assert!(UserStatus::try_from("pending").is_err());
    }
}
