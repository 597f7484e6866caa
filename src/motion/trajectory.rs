// src/motion/trajectory.rs - Stopping point expansion
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TrajectoryError {
    #[error("Invalid stopping point '{token}' at position {index}: expected an integer degree")]
    InvalidToken { index: usize, token: String },
}

/// Dense sequence of degree positions, one per frame.
///
/// Positions may exceed ±180, repeat, and run in either direction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trajectory {
    positions: Vec<i32>,
}

impl Trajectory {
    pub fn positions(&self) -> &[i32] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

impl From<Vec<i32>> for Trajectory {
    fn from(positions: Vec<i32>) -> Self {
        Self { positions }
    }
}

/// Split a whitespace separated list of stopping points, including the start point.
pub fn parse_stopping_points(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Expand consecutive stopping points into unit steps.
///
/// Each pair `(a, b)` contributes `a, a±1, ...` up to but excluding `b`.
/// Fewer than two points give an empty trajectory.
pub fn expand<S: AsRef<str>>(stopping_points: &[S]) -> Result<Trajectory, TrajectoryError> {
    let points = stopping_points
        .iter()
        .enumerate()
        .map(|(index, token)| {
            let token = token.as_ref();
            token
                .trim()
                .parse::<i32>()
                .map_err(|_| TrajectoryError::InvalidToken {
                    index,
                    token: token.to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut positions = Vec::new();
    for pair in points.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        if from <= to {
            positions.extend(from..to);
        } else {
            positions.extend(((to + 1)..=from).rev());
        }
    }

    tracing::debug!(
        stopping_points = points.len(),
        steps = positions.len(),
        "Expanded trajectory"
    );
    Ok(Trajectory { positions })
}
