use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of a call to the remote program, classified by kind rather than
/// by transport.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum RemoteError {
    #[error("rejected by the game program: {reason}")]
    ValidationRejected { reason: RejectReason },
    #[error("game not found")]
    NotFound,
    #[error("network error: {message}")]
    TransientIo { message: String },
}

impl RemoteError {
    pub fn rejected(reason: RejectReason) -> Self {
        RemoteError::ValidationRejected { reason }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        RemoteError::TransientIo {
            message: message.into(),
        }
    }

    /// Classifies a raw program error message. Messages carrying a known
    /// program error code become `ValidationRejected`; anything else is
    /// treated as a transport failure.
    pub fn from_program_message(message: &str) -> Self {
        match RejectReason::from_program_code(message) {
            RejectReason::Other(_) => RemoteError::transient(message),
            reason => RemoteError::rejected(reason),
        }
    }
}

/// Why the remote program refused an action.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectReason {
    NotEnoughStamina,
    NotEnoughFunds,
    NotEnoughAttackPoints,
    NotYourTurn,
    TileNotOwned,
    UnitTypeMismatch,
    MaxLevelReached,
    BuildingTypeConflict,
    GameFull,
    GameAlreadyStarted,
    AlreadyJoined,
    Other(String),
}

impl RejectReason {
    const CODES: [(&'static str, RejectReason); 11] = [
        ("notenoughstamina", RejectReason::NotEnoughStamina),
        ("notenoughfunds", RejectReason::NotEnoughFunds),
        ("notenoughbalance", RejectReason::NotEnoughFunds),
        ("notenoughattackpoints", RejectReason::NotEnoughAttackPoints),
        ("notyourturn", RejectReason::NotYourTurn),
        ("tilenotowned", RejectReason::TileNotOwned),
        ("unittypemismatch", RejectReason::UnitTypeMismatch),
        ("maxlevelreached", RejectReason::MaxLevelReached),
        ("buildingtypeconflict", RejectReason::BuildingTypeConflict),
        ("gamefull", RejectReason::GameFull),
        ("gamealreadystarted", RejectReason::GameAlreadyStarted),
    ];

    /// Parses a program error code in any of the forms the ledger reports it:
    /// `NotEnoughStamina`, `not_enough_stamina`, or embedded in a log line
    /// such as `Error Code: NotEnoughStamina. Error Number: 6003.`
    pub fn from_program_code(code: &str) -> RejectReason {
        let normalized: String = code
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        if normalized.contains("alreadyjoined") {
            return RejectReason::AlreadyJoined;
        }
        Self::CODES
            .iter()
            .find(|(needle, _)| normalized.contains(needle))
            .map(|(_, reason)| reason.clone())
            .unwrap_or_else(|| RejectReason::Other(code.trim().to_string()))
    }

    /// Short user-facing description.
    pub fn describe(&self) -> &str {
        match self {
            RejectReason::NotEnoughStamina => "Not enough stamina",
            RejectReason::NotEnoughFunds => "Not enough balance",
            RejectReason::NotEnoughAttackPoints => "Not enough attack points",
            RejectReason::NotYourTurn => "It is not your turn",
            RejectReason::TileNotOwned => "You do not control this tile",
            RejectReason::UnitTypeMismatch => "Units of different types cannot share a tile",
            RejectReason::MaxLevelReached => "Already at maximum level",
            RejectReason::BuildingTypeConflict => "This tile already has a different building",
            RejectReason::GameFull => "The game is full",
            RejectReason::GameAlreadyStarted => "The game has already started",
            RejectReason::AlreadyJoined => "You already joined this game",
            RejectReason::Other(message) => message,
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_code_forms() {
        assert_eq!(
            RejectReason::from_program_code("NotEnoughStamina"),
            RejectReason::NotEnoughStamina
        );
        assert_eq!(
            RejectReason::from_program_code("not_enough_attack_points"),
            RejectReason::NotEnoughAttackPoints
        );
        assert_eq!(
            RejectReason::from_program_code(
                "AnchorError occurred. Error Code: NotYourTurn. Error Number: 6001."
            ),
            RejectReason::NotYourTurn
        );
        assert_eq!(
            RejectReason::from_program_code("PlayerAlreadyJoined"),
            RejectReason::AlreadyJoined
        );
    }

    #[test]
    fn unknown_message_is_transient() {
        assert_eq!(
            RemoteError::from_program_message("connection reset by peer"),
            RemoteError::transient("connection reset by peer")
        );
        assert_eq!(
            RemoteError::from_program_message("Error Code: MaxLevelReached"),
            RemoteError::rejected(RejectReason::MaxLevelReached)
        );
    }
}
