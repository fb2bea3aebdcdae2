//! Player position, heading, and the four logical input actions.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::maze::Position;

/// Compass heading in 90 degree steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Heading {
    #[default]
    North,
    East,
    South,
    West,
}

impl Heading {
    pub const ALL: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// Heading index: 0 north, 1 east, 2 south, 3 west.
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::North => 0,
            Self::East => 1,
            Self::South => 2,
            Self::West => 3,
        }
    }

    /// Heading for any integer index, taken modulo 4.
    #[must_use]
    pub const fn from_index(index: u8) -> Self {
        match index % 4 {
            0 => Self::North,
            1 => Self::East,
            2 => Self::South,
            _ => Self::West,
        }
    }

    #[must_use]
    pub const fn turn_left(self) -> Self {
        Self::from_index(self.index() + 3)
    }

    #[must_use]
    pub const fn turn_right(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    #[must_use]
    pub const fn reverse(self) -> Self {
        Self::from_index(self.index() + 2)
    }

    /// Unit grid step `(dx, dy)`; north decreases `y`.
    #[must_use]
    pub const fn delta(self) -> (isize, isize) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }

    /// Clockwise rotation from north, for map markers.
    #[must_use]
    pub fn degrees(self) -> u16 {
        u16::from(self.index()) * 90
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::North => "north",
            Self::East => "east",
            Self::South => "south",
            Self::West => "west",
        }
    }
}

impl fmt::Display for Heading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discrete input accepted by a session. One action per input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveAction {
    Forward,
    Backward,
    TurnLeft,
    TurnRight,
}

impl MoveAction {
    pub const ALL: [Self; 4] = [
        Self::Forward,
        Self::Backward,
        Self::TurnLeft,
        Self::TurnRight,
    ];

    #[must_use]
    pub const fn is_turn(self) -> bool {
        matches!(self, Self::TurnLeft | Self::TurnRight)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Backward => "backward",
            Self::TurnLeft => "turn_left",
            Self::TurnRight => "turn_right",
        }
    }
}

impl fmt::Display for MoveAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MoveAction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forward" | "w" => Ok(Self::Forward),
            "backward" | "s" => Ok(Self::Backward),
            "turn_left" | "left" | "a" => Ok(Self::TurnLeft),
            "turn_right" | "right" | "d" => Ok(Self::TurnRight),
            _ => Err(()),
        }
    }
}

/// Grid position plus facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PlayerPose {
    pub position: Position,
    pub heading: Heading,
}

impl PlayerPose {
    #[must_use]
    pub const fn new(position: Position, heading: Heading) -> Self {
        Self { position, heading }
    }

    /// Cell a translation action would target, or `None` for turns and
    /// underflowing coordinates.
    #[must_use]
    pub const fn step_target(self, action: MoveAction) -> Option<Position> {
        let heading = match action {
            MoveAction::Forward => self.heading,
            MoveAction::Backward => self.heading.reverse(),
            MoveAction::TurnLeft | MoveAction::TurnRight => return None,
        };
        let (dx, dy) = heading.delta();
        self.position.offset(dx, dy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turns_wrap_modulo_four() {
        assert_eq!(Heading::North.turn_left(), Heading::West);
        assert_eq!(Heading::West.turn_right(), Heading::North);
        assert_eq!(Heading::from_index(7), Heading::West);
        for heading in Heading::ALL {
            assert_eq!(heading.turn_left().turn_right(), heading);
            assert_eq!(
                heading.turn_right().turn_right().turn_right().turn_right(),
                heading
            );
        }
    }

    #[test]
    fn deltas_follow_screen_axes() {
        assert_eq!(Heading::North.delta(), (0, -1));
        assert_eq!(Heading::East.delta(), (1, 0));
        assert_eq!(Heading::South.degrees(), 180);
    }

    #[test]
    fn step_target_handles_backward_and_turns() {
        let pose = PlayerPose::new(Position::new(3, 3), Heading::East);
        assert_eq!(pose.step_target(MoveAction::Forward), Some(Position::new(4, 3)));
        assert_eq!(pose.step_target(MoveAction::Backward), Some(Position::new(2, 3)));
        assert_eq!(pose.step_target(MoveAction::TurnLeft), None);

        let corner = PlayerPose::new(Position::new(0, 0), Heading::North);
        assert_eq!(corner.step_target(MoveAction::Forward), None);
    }

    #[test]
    fn actions_parse_from_names_and_keys() {
        assert_eq!("Forward".parse(), Ok(MoveAction::Forward));
        assert_eq!("a".parse(), Ok(MoveAction::TurnLeft));
        assert_eq!("turn_right".parse(), Ok(MoveAction::TurnRight));
        assert!("jump".parse::<MoveAction>().is_err());
        for action in MoveAction::ALL {
            assert_eq!(action.as_str().parse(), Ok(action));
        }
    }
}
