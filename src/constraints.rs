//! Component A — Constraint Normalizer.
//!
//! Converts whatever shape of input the caller hands in (a constraint
//! list possibly mixing link identifiers and pose objectives, and
//! `startConfig`/`endConfig` sentinels) to the uniform shape the
//! resolvers operate on (spec §4.A).

use crate::error::{ResolveError, ResolveResult};
use crate::model::{Config, ConfigSource, ConstraintItem, IkSolver, RobotModel};

/// The result of normalization: a plain objective list, the resolved
/// start/end configurations (`None` meaning "unconstrained"), and a solver
/// already loaded with the objective list.
pub struct Normalized<O, S> {
    pub constraints: Vec<O>,
    pub start_config: Option<Config>,
    pub end_config: Option<Config>,
    pub solver: S,
}

/// Normalizes `constraints`/`start`/`end`/`solver` per spec §4.A.
///
/// If any element of `constraints` is a [`ConstraintItem::Link`], it is
/// replaced with an identity-pose objective on that link (built via
/// [`RobotModel::identity_objective`]) and the solver is cleared and
/// reloaded with the resulting objective list. A `solver` of `None` is
/// built via `S::default()`.
pub fn normalize<R, S>(
    robot: &R,
    constraints: Vec<ConstraintItem<R::Objective>>,
    start: ConfigSource,
    end: ConfigSource,
    solver: Option<S>,
) -> ResolveResult<Normalized<R::Objective, S>>
where
    R: RobotModel,
    S: IkSolver<Objective = R::Objective> + Default,
{
    if constraints.is_empty() {
        return Err(ResolveError::InvalidConstraint(
            "constraint list must have at least one entry".into(),
        ));
    }

    let resolved = constraints
        .into_iter()
        .map(|item| match item {
            ConstraintItem::Link(link) => robot.identity_objective(&link),
            ConstraintItem::Objective(o) => Ok(o),
        })
        .collect::<ResolveResult<Vec<_>>>()?;

    let mut solver = solver.unwrap_or_default();
    solver.clear();
    for objective in resolved.iter().cloned() {
        solver.add(objective);
    }

    Ok(Normalized {
        constraints: resolved,
        start_config: resolve_config_source(robot, start),
        end_config: resolve_config_source(robot, end),
        solver,
    })
}

/// Resolves the `'robot'` / explicit-configuration / `None` sentinel into
/// an `Option<Config>`, where `None` means "unconstrained" (spec §4.A).
pub fn resolve_config_source<R: RobotModel>(robot: &R, src: ConfigSource) -> Option<Config> {
    match src {
        ConfigSource::Robot => Some(robot.get_config()),
        ConfigSource::Explicit(q) => Some(q),
        ConfigSource::Unspecified => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{NewtonIkSolver, PlanarArm};

    #[test]
    fn rejects_empty_constraint_list() {
        let robot = PlanarArm::two_link();
        let err = normalize::<PlanarArm, NewtonIkSolver>(
            &robot,
            vec![],
            ConfigSource::Robot,
            ConfigSource::Unspecified,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidConstraint(_)));
    }

    #[test]
    fn link_identifiers_become_identity_objectives() {
        let robot = PlanarArm::two_link();
        let n = normalize::<PlanarArm, NewtonIkSolver>(
            &robot,
            vec![ConstraintItem::Link(0usize.into())],
            ConfigSource::Robot,
            ConfigSource::Unspecified,
            None,
        )
        .unwrap();
        assert_eq!(n.constraints.len(), 1);
        assert!(n.end_config.is_none());
        assert!(n.start_config.is_some());
    }
}
