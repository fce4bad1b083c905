//! Error types for the local planner.

use thiserror::Error;

/// Failure modes of a transform lookup.
///
/// These mirror the three ways a transform tree can fail to answer:
/// the frame pair is unknown, the tree is split, or the requested
/// time is outside the buffered history.
#[derive(Debug, Clone, Error)]
pub enum TransformError {
    #[error("transform lookup failed: {0}")]
    Lookup(String),

    #[error("transform tree not connected: {0}")]
    Connectivity(String),

    #[error("transform time outside buffer: {0}")]
    Extrapolation(String),
}

/// Planner error type.
///
/// A control cycle never panics; every failure path surfaces one of
/// these variants and leaves the retained plan and goal state untouched.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("planner has not been initialized, call initialize() first")]
    NotInitialized,

    #[error("no global plan, or plan has zero length")]
    EmptyPlan,

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("robot pose unavailable from the costmap source")]
    PoseUnavailable,

    #[error("no valid trajectory among the sampled candidates")]
    NoValidTrajectory,

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for PlannerError {
    fn from(e: toml::de::Error) -> Self {
        PlannerError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PlannerError>;
