//! Error types for game operations.

use thiserror::Error;

use crate::board::{MapError, ProvinceId, TurnId, UnitId, UserId};
use crate::config::ConfigError;
use crate::store::StoreError;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for game operations.
///
/// Validation and not-found errors are raised before any state is mutated.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("turn not found for user '{0}'")]
    TurnNotFound(UserId),

    #[error("turn {0} not found")]
    TurnIdNotFound(TurnId),

    #[error("division {0} not found")]
    UnitNotFound(UnitId),

    #[error("unknown province '{0}'")]
    UnknownProvince(String),

    #[error("user '{0}' already has a campaign")]
    CampaignExists(UserId),

    #[error("cannot act while the turn is ending")]
    TurnEnding,

    #[error("can only move allied divisions")]
    NotAllied,

    #[error("division has no movement points left")]
    NoMovement,

    #[error("invalid move: {to} is not adjacent to {from}")]
    NotAdjacent { from: ProvinceId, to: ProvinceId },

    #[error("infantry units cannot attack armor units")]
    IllegalMatchup,

    #[error("divisions {attacker} and {defender} are not on opposing sides")]
    NotOpposed { attacker: UnitId, defender: UnitId },

    #[error("you do not control {0}")]
    NotControlled(ProvinceId),

    #[error("no available space to deploy a division")]
    NoDeploySpace,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Map(#[from] MapError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl GameError {
    /// True for errors meaning "no such record".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            GameError::TurnNotFound(_)
                | GameError::TurnIdNotFound(_)
                | GameError::UnitNotFound(_)
                | GameError::UnknownProvince(_)
        )
    }

    /// True for rule violations rejected without touching state.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            GameError::CampaignExists(_)
                | GameError::TurnEnding
                | GameError::NotAllied
                | GameError::NoMovement
                | GameError::NotAdjacent { .. }
                | GameError::IllegalMatchup
                | GameError::NotOpposed { .. }
                | GameError::NotControlled(_)
                | GameError::NoDeploySpace
        )
    }

    /// Short machine-readable category used by the line protocol.
    pub fn kind(&self) -> &'static str {
        if self.is_not_found() {
            "not_found"
        } else if self.is_rejection() {
            "rejected"
        } else {
            "internal"
        }
    }
}
