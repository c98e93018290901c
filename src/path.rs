//! Component E — Path Resolver Orchestrator (spec §4.E).
//!
//! Drives a multi-waypoint Cartesian path through the per-segment
//! resolvers (4.C/4.D), falling back to the roadmap resolver (4.F) when a
//! segment fails to resolve pointwise or when the caller asks for the
//! roadmap method directly.

use crate::adapter;
use crate::bisect;
use crate::config::ResolverOptions;
use crate::constraints;
use crate::error::{ResolveError, ResolveResult};
use crate::linear;
use crate::model::{Config, ConfigSource, ConstraintItem, IkSolver, RobotModel, WorkspaceHelper};
use crate::roadmap;
use crate::trajectory::Trajectory;

/// Which segment-resolution strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathMethod {
    /// Try pointwise first, fall back to the roadmap resolver on failure.
    Any,
    /// Only attempt the pointwise strategy.
    Pointwise,
    /// Only attempt the roadmap strategy.
    Roadmap,
}

/// A caller-supplied path: either a raw list of workspace points (treated
/// as 1-second-spaced milestones) or a pre-built [`Trajectory`].
pub enum PathInput<P> {
    Points(Vec<P>),
    Trajectory(Trajectory<P>),
}

impl<P: Clone> PathInput<P> {
    fn into_trajectory(self) -> Trajectory<P> {
        match self {
            PathInput::Trajectory(t) => t,
            PathInput::Points(pts) => {
                let times = (0..pts.len()).map(|i| i as f64).collect();
                Trajectory::new(times, pts)
            }
        }
    }
}

/// Discretizes a path into the waypoint sequence the roadmap resolver
/// samples against. For an already-discrete [`PathInput::Points`] input
/// this is the identity; for a continuous pre-built [`PathInput::Trajectory`]
/// this takes the trajectory's own milestones as waypoints, since the
/// specification does not otherwise define a sampling rate for continuous
/// input (spec.md §4.F only ever references the discrete "waypoints of a
/// multi-segment Cartesian path").
pub fn densify_for_roadmap<P: Clone>(path: &Trajectory<P>) -> Vec<P> {
    path.milestones.clone()
}

/// Public entry point, collapsing failure to `None`.
#[allow(clippy::too_many_arguments)]
pub fn resolve<R, W, S>(
    robot: &mut R,
    workspace: &W,
    constraint_items: Vec<ConstraintItem<R::Objective>>,
    path: PathInput<W::Point>,
    start: ConfigSource,
    end: ConfigSource,
    delta: f64,
    method: PathMethod,
    num_samples: usize,
    solver: Option<S>,
    feasibility_test: Option<&dyn Fn(&Config) -> bool>,
    maximize: bool,
    opts: &ResolverOptions,
) -> Option<Trajectory<Config>>
where
    R: RobotModel,
    W: WorkspaceHelper<Objective = R::Objective>,
    S: IkSolver<Objective = R::Objective> + Default,
{
    match resolve_checked(
        robot,
        workspace,
        constraint_items,
        path,
        start,
        end,
        delta,
        method,
        num_samples,
        solver,
        feasibility_test,
        maximize,
        opts,
    ) {
        Ok(traj) => Some(traj),
        Err(e) => {
            tracing::warn!(error = %e, "path orchestrator exhausted both strategies");
            None
        }
    }
}

/// Typed variant of [`resolve`].
#[allow(clippy::too_many_arguments)]
pub fn resolve_checked<R, W, S>(
    robot: &mut R,
    workspace: &W,
    constraint_items: Vec<ConstraintItem<R::Objective>>,
    path: PathInput<W::Point>,
    start: ConfigSource,
    end: ConfigSource,
    delta: f64,
    method: PathMethod,
    num_samples: usize,
    solver: Option<S>,
    feasibility_test: Option<&dyn Fn(&Config) -> bool>,
    maximize: bool,
    opts: &ResolverOptions,
) -> ResolveResult<Trajectory<Config>>
where
    R: RobotModel,
    W: WorkspaceHelper<Objective = R::Objective>,
    S: IkSolver<Objective = R::Objective> + Default,
{
    let path_traj = path.into_trajectory();
    if path_traj.len() < 2 {
        return Err(ResolveError::InvalidConstraint(
            "path must have at least two waypoints".into(),
        ));
    }

    let normalized = constraints::normalize(robot, constraint_items, start, end, solver)?;
    let mut solver = normalized.solver;
    let constraint_list = normalized.constraints;
    // Pointwise always needs a concrete starting configuration; the roadmap
    // strategy instead treats a genuinely unspecified start as "sample it",
    // so the two strategies see different views of `normalized.start_config`.
    let start_config_opt = normalized.start_config.clone();
    let start_config = normalized
        .start_config
        .unwrap_or_else(|| robot.get_config());
    let end_config = normalized.end_config;

    if method != PathMethod::Roadmap {
        match pointwise(
            robot,
            workspace,
            &constraint_list,
            &mut solver,
            &path_traj,
            start_config.clone(),
            end_config.clone(),
            delta,
            feasibility_test,
            maximize && method == PathMethod::Pointwise,
            opts,
        ) {
            Ok(traj) => return Ok(traj),
            Err(e) if method == PathMethod::Pointwise => return Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "pointwise path resolution failed, falling back to roadmap");
            }
        }
    }

    let waypoints = densify_for_roadmap(&path_traj);
    roadmap::resolve_checked(
        robot,
        workspace,
        &constraint_list,
        &mut solver,
        &waypoints,
        &path_traj.times,
        start_config_opt,
        end_config,
        delta,
        num_samples,
        feasibility_test,
        maximize,
        opts,
        &mut rand::thread_rng(),
    )
}

/// The pointwise strategy: resolve each consecutive waypoint pair with the
/// 4.C/4.D segment resolvers and concatenate.
#[allow(clippy::too_many_arguments)]
fn pointwise<R, W, S>(
    robot: &mut R,
    workspace: &W,
    constraints: &[R::Objective],
    solver: &mut S,
    path: &Trajectory<W::Point>,
    start_config: Config,
    end_config: Option<Config>,
    delta: f64,
    feasibility_test: Option<&dyn Fn(&Config) -> bool>,
    maximize: bool,
    opts: &ResolverOptions,
) -> ResolveResult<Trajectory<Config>>
where
    R: RobotModel,
    W: WorkspaceHelper<Objective = R::Objective>,
    S: IkSolver<Objective = R::Objective>,
{
    let mut overall = Trajectory::single(path.start_time(), start_config.clone());
    let mut tail = start_config.clone();
    let total_span = path.end_time() - path.start_time();

    for i in 0..path.len() - 1 {
        let seg_a = &path.milestones[i];
        let seg_b = &path.milestones[i + 1];

        let seg_result = if let Some(ref end_q) = end_config {
            let u = if total_span > 0.0 {
                (path.times[i + 1] - path.start_time()) / total_span
            } else {
                1.0
            };
            let seed = robot.interpolate(&tail, end_q, u);
            robot.set_config(&seed);
            let attempt = adapter::solve_at(
                workspace,
                &mut constraints.to_vec(),
                seg_b,
                solver,
                &seed,
            );
            if !attempt.solved {
                return Err(ResolveError::EndUnreachable {
                    residual: solver.residual(&attempt.config),
                });
            }
            bisect::resolve_segment_checked(
                robot,
                workspace,
                constraints,
                solver,
                seg_a,
                seg_b,
                tail.clone(),
                attempt.config,
                delta,
                10.0,
                feasibility_test,
            )
        } else {
            linear::resolve_segment_checked(
                robot,
                workspace,
                constraints,
                solver,
                seg_a,
                seg_b,
                tail.clone(),
                None,
                delta,
                feasibility_test,
                maximize,
                opts,
            )
        };

        match seg_result {
            Ok(mut seg_traj) => {
                seg_traj.rescale_unit_domain(path.times[i], path.times[i + 1]);
                tail = seg_traj.milestones.last().unwrap().clone();
                overall.append_aligned(seg_traj);
            }
            Err(e) => {
                if maximize {
                    return Ok(overall);
                }
                return Err(e);
            }
        }
    }

    Ok(overall)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{NewtonIkSolver, PlanarArm, TipWorkspace};
    use nalgebra::Vector2;

    #[test]
    fn resolves_a_multi_waypoint_path_pointwise() {
        let mut robot = PlanarArm::two_link();
        let workspace = TipWorkspace;
        let solver = NewtonIkSolver::from(&robot);
        let opts = ResolverOptions::default();

        let path = PathInput::Points(vec![
            Vector2::new(2.0, 0.0),
            Vector2::new(1.5, 1.0),
            Vector2::new(0.5, 1.7),
            Vector2::new(0.0, 2.0),
        ]);

        let traj = resolve_checked(
            &mut robot,
            &workspace,
            vec![ConstraintItem::Link(0usize.into())],
            path,
            ConfigSource::Explicit(Config::zeros(2)),
            ConfigSource::Unspecified,
            0.05,
            PathMethod::Pointwise,
            0,
            Some(solver),
            None,
            false,
            &opts,
        )
        .expect("multi-waypoint path should resolve");

        assert_eq!(traj.start_time(), 0.0);
        assert_eq!(traj.end_time(), 3.0);
    }
}
