//! # Building blocks to describe linear and mixed integer programs.
use std::convert::TryFrom;
use std::fmt;
use std::ops::Not;

use enum_map::Enum;

use crate::error::Error;

/// Absolute tolerance below which two objective values are considered equal.
pub const OBJECTIVE_TOLERANCE: f64 = 1e-9;

/// Direction of optimization.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Objective {
    #[default]
    Minimize,
    Maximize,
}

impl Objective {
    /// Factor that turns an objective value of this direction into one that should be minimized.
    #[must_use]
    pub fn sense(self) -> f64 {
        match self {
            Objective::Minimize => 1_f64,
            Objective::Maximize => -1_f64,
        }
    }

    /// Whether `candidate` is strictly better than `reference` in this direction.
    ///
    /// Values within `OBJECTIVE_TOLERANCE` of each other are not an improvement.
    #[must_use]
    pub fn is_better(self, candidate: f64, reference: f64) -> bool {
        self.sense() * (reference - candidate) > OBJECTIVE_TOLERANCE
    }

    /// The worst possible objective value, used before anything is known.
    #[must_use]
    pub fn worst_value(self) -> f64 {
        self.sense() * f64::INFINITY
    }
}

impl TryFrom<i32> for Objective {
    type Error = Error;

    /// Direction codes as used in bulk-loaded models: `1` minimizes, `-1` maximizes.
    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Objective::Minimize),
            -1 => Ok(Objective::Maximize),
            other => Err(Error::MalformedModel(format!("unknown objective direction {}", other))),
        }
    }
}

/// A `ConstraintType` is a type of (in)equality.
#[allow(missing_docs)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Enum)]
pub enum ConstraintType {
    LessEqual,
    GreaterEqual,
    Equal,
}

impl ConstraintType {
    /// Whether `activity` satisfies `activity (type) rhs` up to `tolerance`.
    #[must_use]
    pub fn is_satisfied(self, activity: f64, rhs: f64, tolerance: f64) -> bool {
        match self {
            ConstraintType::LessEqual => activity <= rhs + tolerance,
            ConstraintType::GreaterEqual => activity >= rhs - tolerance,
            ConstraintType::Equal => (activity - rhs).abs() <= tolerance,
        }
    }
}

impl TryFrom<char> for ConstraintType {
    type Error = Error;

    fn try_from(code: char) -> Result<Self, Self::Error> {
        match code.to_ascii_uppercase() {
            'L' => Ok(ConstraintType::LessEqual),
            'G' => Ok(ConstraintType::GreaterEqual),
            'E' => Ok(ConstraintType::Equal),
            other => Err(Error::MalformedModel(format!("unknown constraint type '{}'", other))),
        }
    }
}

/// Direction of a bound.
///
/// Branching decisions tighten one side of the domain of a variable.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BoundDirection {
    /// In the case of a variable, x >= b.
    Lower,
    /// In the case of a variable, x <= b.
    Upper,
}

impl Not for BoundDirection {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Self::Lower => Self::Upper,
            Self::Upper => Self::Lower,
        }
    }
}

/// A variable is continuous, binary or general integer.
#[allow(missing_docs)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Enum)]
pub enum VariableType {
    Continuous,
    Binary,
    Integer,
}

impl VariableType {
    /// Whether the variable should take an integral value in a solution.
    #[must_use]
    pub fn is_integer(self) -> bool {
        !matches!(self, VariableType::Continuous)
    }
}

impl TryFrom<char> for VariableType {
    type Error = Error;

    fn try_from(code: char) -> Result<Self, Self::Error> {
        match code.to_ascii_uppercase() {
            'C' => Ok(VariableType::Continuous),
            'B' => Ok(VariableType::Binary),
            'I' => Ok(VariableType::Integer),
            other => Err(Error::MalformedModel(format!("unknown variable type '{}'", other))),
        }
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            VariableType::Continuous => 'C',
            VariableType::Binary => 'B',
            VariableType::Integer => 'I',
        };
        write!(f, "{}", code)
    }
}
