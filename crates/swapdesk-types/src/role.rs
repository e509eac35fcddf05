//! Platform roles.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A role an account may hold.
///
/// `Admin` is the superset authority. `Moderator` may only recover tokens
/// sent to the engine by mistake. `Upgrader` is carried for the deployment
/// tooling and grants nothing inside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Moderator,
    Upgrader,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "ADMIN"),
            Self::Moderator => write!(f, "MODERATOR"),
            Self::Upgrader => write!(f, "UPGRADER"),
        }
    }
}
