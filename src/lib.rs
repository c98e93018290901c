//! # cartesian-resolve
//!
//! Cartesian trajectory resolution for articulated robot manipulators.
//!
//! Given a robot kinematic model, an IK solver, and a workspace-parameter
//! helper (all supplied by the caller — this crate never performs forward
//! kinematics or IK itself), resolves a continuous Cartesian path into a
//! dense, resolution-bounded sequence of joint configurations.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │        Path Orchestrator (multi-waypoint paths)      │
//! └─────────────────────────────────────────────────────┘
//! ┌───────────────────────┐   ┌───────────────────────────┐
//! │   Linear Adaptive      │   │   Bisection Resolver      │
//! │   Resolver (4.C)        │   │   (4.D)                   │
//! └───────────────────────┘   └───────────────────────────┘
//! ┌─────────────────────────────────────────────────────┐
//! │              Roadmap Resolver (self-motion PRM)       │
//! └─────────────────────────────────────────────────────┘
//! ┌─────────────────────────────────────────────────────┐
//! │          Cartesian Solver Adapter (4.B)               │
//! └─────────────────────────────────────────────────────┘
//! ┌─────────────────────────────────────────────────────┐
//! │          Constraint Normalizer (4.A)                  │
//! └─────────────────────────────────────────────────────┘
//! ┌─────────────────────────────────────────────────────┐
//! │   RobotModel / IkSolver / WorkspaceHelper traits      │
//! │   (implemented by the caller)                         │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage Example
//!
//! ```rust
//! use cartesian_resolve::prelude::*;
//! use cartesian_resolve::reference::{NewtonIkSolver, PlanarArm, TipWorkspace};
//! use nalgebra::Vector2;
//!
//! let mut robot = PlanarArm::two_link();
//! let workspace = TipWorkspace;
//! let solver = NewtonIkSolver::from(&robot);
//! let opts = ResolverOptions::default();
//!
//! let trajectory = linear::resolve(
//!     &mut robot,
//!     &workspace,
//!     vec![ConstraintItem::Link(0usize.into())],
//!     &Vector2::new(2.0, 0.0),
//!     &Vector2::new(0.0, 2.0),
//!     ConfigSource::Explicit(Config::zeros(2)),
//!     ConfigSource::Unspecified,
//!     0.05,
//!     Some(solver),
//!     None,
//!     false,
//!     &opts,
//! );
//! assert!(trajectory.is_some());
//! ```

pub mod adapter;
pub mod bisect;
pub mod config;
pub mod constraints;
pub mod error;
pub mod linear;
pub mod model;
pub mod path;
pub mod reference;
pub mod roadmap;
pub mod trajectory;

pub use config::ResolverOptions;
pub use error::{ResolveError, ResolveResult};
pub use model::{
    box_joint_limits, Config, ConfigSource, ConstraintItem, IkAttempt, IkSolver, LinkIdentifier,
    RobotModel, SolverGuard, WorkspaceHelper,
};
pub use path::{PathInput, PathMethod};
pub use trajectory::Trajectory;

/// Convenience re-exports for the common entry points and supporting types.
pub mod prelude {
    pub use crate::config::ResolverOptions;
    pub use crate::error::{ResolveError, ResolveResult};
    pub use crate::model::{
        box_joint_limits, Config, ConfigSource, ConstraintItem, IkAttempt, IkSolver,
        LinkIdentifier, RobotModel, SolverGuard, WorkspaceHelper,
    };
    pub use crate::path::{PathInput, PathMethod};
    pub use crate::trajectory::Trajectory;
    pub use crate::{bisect, linear, path, roadmap};
}

/// Crate version, exposed for diagnostics and bug reports.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_matches_cargo_manifest() {
        assert_eq!(VERSION, "0.1.0");
    }
}
