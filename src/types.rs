use core::fmt;
use core::str::FromStr;

use crate::InvalidGCode;

/// G-code dialects. Only Marlin is understood.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum Flavor {
    #[default]
    Marlin,
}

impl FromStr for Flavor {
    type Err = InvalidGCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("marlin") {
            Ok(Flavor::Marlin)
        } else {
            Err(InvalidGCode::UnsupportedFlavor(s.to_owned()))
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flavor::Marlin => f.write_str("Marlin"),
        }
    }
}

/// Cartesian axes of the motion system.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn letter(self) -> char {
        match self {
            Axis::X => 'X',
            Axis::Y => 'Y',
            Axis::Z => 'Z',
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'X' => Some(Axis::X),
            'Y' => Some(Axis::Y),
            'Z' => Some(Axis::Z),
            _ => None,
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// Heating elements addressed by temperature instructions.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Heater {
    Hotend,
    Bed,
    Chamber,
}

impl Heater {
    pub const ALL: [Heater; 3] = [Heater::Hotend, Heater::Bed, Heater::Chamber];

    pub fn code(self) -> &'static str {
        match self {
            Heater::Hotend => "M104",
            Heater::Bed => "M140",
            Heater::Chamber => "M141",
        }
    }

    /// Number of the `M` code setting this heater's target.
    pub fn number(self) -> u32 {
        match self {
            Heater::Hotend => 104,
            Heater::Bed => 140,
            Heater::Chamber => 141,
        }
    }
}

/// A point in the logical (G92 adjusted) coordinate system.
#[derive(Debug, PartialEq, Clone, Copy, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub fn distance_to(&self, other: &Position) -> f64 {
        let (dx, dy, dz) = (other.x - self.x, other.y - self.y, other.z - self.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}
