//! Domain types for the game-board API.
//!
//! # Design
//! Responses are handed back as raw `serde_json::Value`, so the only typed
//! domain values here are the ones a caller passes in. `Direction` is a
//! closed enum: an invalid move can be rejected before any request exists.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Numeric user identifier, as used in the auth token and in user routes.
pub type UserId = u64;

/// Direction accepted by the move endpoint.
///
/// Serializes as the same upper-case wire name used in the move path, so
/// callers can deserialize direction fields out of board payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
    Right,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Right, Direction::Left];

    /// Wire form used in the move path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
            Direction::Right => "RIGHT",
            Direction::Left => "LEFT",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Direction::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| ApiError::InvalidDirection(s.to_string()))
    }
}

impl TryFrom<&str> for Direction {
    type Error = ApiError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_names() {
        for direction in Direction::ALL {
            assert_eq!(direction.as_str().parse::<Direction>().unwrap(), direction);
        }
    }

    #[test]
    fn rejects_unknown_direction() {
        let err = "SIDEWAYS".parse::<Direction>().unwrap_err();
        assert!(matches!(err, ApiError::InvalidDirection(s) if s == "SIDEWAYS"));
    }

    #[test]
    fn parsing_is_case_sensitive() {
        assert!(Direction::try_from("up").is_err());
    }

    #[test]
    fn serializes_as_wire_name() {
        assert_eq!(serde_json::to_string(&Direction::Left).unwrap(), r#""LEFT""#);
        let back: Direction = serde_json::from_str(r#""DOWN""#).unwrap();
        assert_eq!(back, Direction::Down);
    }
}
