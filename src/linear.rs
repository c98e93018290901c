//! Component C — Linear Adaptive Resolver (spec §4.C).
//!
//! Walks the workspace segment `a → b` with an adaptive step size, solving
//! IK at each proposed milestone and falling back to a binary line search
//! (with a "grudging accept" tolerance relaxation) when a step fails.

use crate::adapter;
use crate::config::ResolverOptions;
use crate::constraints;
use crate::error::{ResolveError, ResolveResult};
use crate::model::{box_joint_limits, Config, ConfigSource, ConstraintItem, IkSolver, RobotModel, SolverGuard, WorkspaceHelper};
use crate::trajectory::Trajectory;

/// Public entry point: normalizes inputs (component A) and resolves the
/// `a → b` segment. Collapses every failure to `None`, logging a warning —
/// this is the shape most callers want (spec §7's "null/absent result"
/// policy at the top-level entry point).
#[allow(clippy::too_many_arguments)]
pub fn resolve<R, W, S>(
    robot: &mut R,
    workspace: &W,
    constraints: Vec<ConstraintItem<R::Objective>>,
    a: &W::Point,
    b: &W::Point,
    start: ConfigSource,
    end: ConfigSource,
    delta: f64,
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
        constraints,
        a,
        b,
        start,
        end,
        delta,
        solver,
        feasibility_test,
        maximize,
        opts,
    ) {
        Ok(traj) => Some(traj),
        Err(e) => {
            tracing::warn!(error = %e, "linear resolver failed");
            None
        }
    }
}

/// Typed variant of [`resolve`] that returns the specific failure instead of
/// collapsing it to `None`.
#[allow(clippy::too_many_arguments)]
pub fn resolve_checked<R, W, S>(
    robot: &mut R,
    workspace: &W,
    constraint_items: Vec<ConstraintItem<R::Objective>>,
    a: &W::Point,
    b: &W::Point,
    start: ConfigSource,
    end: ConfigSource,
    delta: f64,
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
    let normalized = constraints::normalize(robot, constraint_items, start, end, solver)?;
    let mut solver = normalized.solver;
    let start_config = normalized
        .start_config
        .unwrap_or_else(|| robot.get_config());
    resolve_segment_checked(
        robot,
        workspace,
        &normalized.constraints,
        &mut solver,
        a,
        b,
        start_config,
        normalized.end_config,
        delta,
        feasibility_test,
        maximize,
        opts,
    )
}

/// The core step-walking algorithm, operating on already-normalized
/// objectives and resolved start/end configurations. Used directly by the
/// path orchestrator (component E), which normalizes constraints once for
/// the whole path rather than per segment.
#[allow(clippy::too_many_arguments)]
pub fn resolve_segment_checked<R, W, S>(
    robot: &mut R,
    workspace: &W,
    constraints: &[R::Objective],
    solver: &mut S,
    a: &W::Point,
    b: &W::Point,
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
    let mut constraints = constraints.to_vec();

    // Preamble, step 2.
    robot.set_config(&start_config);
    adapter::set_target(workspace, &mut constraints, a, solver);
    let start_config = if solver.is_solved(&start_config) {
        start_config
    } else {
        let attempt = solver.solve(&start_config);
        if !attempt.solved {
            return Err(ResolveError::StartUnreachable {
                residual: solver.residual(&attempt.config),
            });
        }
        tracing::warn!(
            residual = solver.residual(&attempt.config),
            "startConfig required a re-solve; using the solved configuration"
        );
        robot.set_config(&attempt.config);
        attempt.config
    };

    // Preamble, step 3.
    if let Some(ref end_q) = end_config {
        robot.set_config(end_q);
        adapter::set_target(workspace, &mut constraints, b, solver);
        if !solver.is_solved(end_q) {
            return Err(ResolveError::EndUnreachable {
                residual: solver.residual(end_q),
            });
        }
    }

    // Preamble, step 4.
    if let Some(test) = feasibility_test {
        if !test(&start_config) {
            return Err(ResolveError::InfeasibleEndpoint);
        }
        if let Some(ref end_q) = end_config {
            if !test(end_q) {
                return Err(ResolveError::InfeasibleEndpoint);
            }
        }
    }

    let seg_distance = workspace.distance(&constraints, a, b);
    if seg_distance == 0.0 {
        return Ok(Trajectory::single(0.0, start_config));
    }

    let mut guard = SolverGuard::new(solver);
    let tol0 = guard.original_tolerance();
    let (qmin0, qmax0) = guard.original_joint_limits().clone();
    guard.set_tolerance(tol0 * opts.tolerance_tighten);
    let param_stall_tolerance = 0.01 * tol0 / seg_distance;

    let mut trajectory = Trajectory::single(0.0, start_config.clone());
    let mut t = 0.0_f64;
    let mut q = start_config.clone();
    let mut stepsize = opts.initial_stepsize;

    while t < 1.0 {
        let tend = (t + stepsize).min(1.0);
        let x = workspace.interpolate(&constraints, a, b, tend);
        let mut seed = q.clone();
        if let Some(ref end_q) = end_config {
            let bias = robot.interpolate(&start_config, end_q, tend);
            guard.set_bias_config(Some(bias.clone()));
            seed = bias;
        }
        let (lo, hi) = box_joint_limits(&q, delta, &qmin0, &qmax0);
        guard.set_joint_limits(lo, hi);

        let attempt = adapter::solve_at(workspace, &mut constraints, &x, &mut *guard, &seed);
        let accepted = if attempt.solved {
            Some((tend, attempt.config, stepsize * opts.step_growth))
        } else {
            line_search(
                &mut *guard,
                robot,
                workspace,
                &mut constraints,
                a,
                b,
                &start_config,
                end_config.as_ref(),
                &q,
                t,
                stepsize,
                delta,
                &qmin0,
                &qmax0,
                tol0,
                param_stall_tolerance,
                opts,
            )
        };

        let (tend, next_q, next_stepsize) = match accepted {
            Some(v) => v,
            None => {
                guard.set_tolerance(tol0);
                guard.set_joint_limits(qmin0.clone(), qmax0.clone());
                return if maximize {
                    Ok(trajectory)
                } else {
                    Err(ResolveError::StepStall { t })
                };
            }
        };

        if let Some(test) = feasibility_test {
            if !test(&next_q) {
                guard.set_tolerance(tol0);
                guard.set_joint_limits(qmin0.clone(), qmax0.clone());
                return if maximize {
                    Ok(trajectory)
                } else {
                    Err(ResolveError::Infeasible { t: tend })
                };
            }
        }

        robot.set_config(&next_q);
        trajectory.push(tend, next_q.clone());
        q = next_q;
        t = tend;
        stepsize = next_stepsize;
    }

    guard.set_tolerance(tol0);
    guard.set_joint_limits(qmin0, qmax0);
    Ok(trajectory)
}

/// Binary line search on failure: halves the step until a solve succeeds,
/// a grudging relaxed-tolerance acceptance holds, or the step size drops to
/// the parameter-stall tolerance (spec §4.C step 4).
#[allow(clippy::too_many_arguments)]
fn line_search<R, W, S>(
    solver: &mut S,
    robot: &R,
    workspace: &W,
    constraints: &mut [R::Objective],
    a: &W::Point,
    b: &W::Point,
    start_config: &Config,
    end_config: Option<&Config>,
    q: &Config,
    t: f64,
    initial_stepsize: f64,
    delta: f64,
    qmin0: &Config,
    qmax0: &Config,
    tol0: f64,
    param_stall_tolerance: f64,
    opts: &ResolverOptions,
) -> Option<(f64, Config, f64)>
where
    R: RobotModel,
    W: WorkspaceHelper<Objective = R::Objective>,
    S: IkSolver<Objective = R::Objective>,
{
    let mut stepsize = initial_stepsize;
    loop {
        if stepsize <= param_stall_tolerance {
            return None;
        }
        stepsize *= opts.step_shrink;
        let tend = (t + stepsize).min(1.0);
        let x = workspace.interpolate(constraints, a, b, tend);
        let mut seed = q.clone();
        if let Some(end_q) = end_config {
            let bias = robot.interpolate(start_config, end_q, tend);
            solver.set_bias_config(Some(bias.clone()));
            seed = bias;
        }
        let (lo, hi) = box_joint_limits(q, delta, qmin0, qmax0);
        solver.set_joint_limits(lo, hi);

        let attempt = adapter::solve_at(workspace, constraints, &x, solver, &seed);
        if attempt.solved {
            return Some((tend, attempt.config, stepsize * opts.step_growth));
        }

        solver.set_tolerance(tol0);
        if solver.is_solved(&attempt.config) {
            return Some((tend, attempt.config, stepsize * opts.step_growth));
        }
        solver.set_tolerance(tol0 * opts.tolerance_tighten);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{NewtonIkSolver, PlanarArm, TipWorkspace};
    use nalgebra::Vector2;

    #[test]
    fn sweeps_a_two_link_arm_from_full_extension_to_a_right_angle() {
        let mut robot = PlanarArm::two_link();
        let workspace = TipWorkspace;
        let solver = NewtonIkSolver::from(&robot);
        let opts = ResolverOptions::default();
        let a = Vector2::new(2.0, 0.0);
        let b = Vector2::new(0.0, 2.0f64.sqrt() * 2.0f64.sqrt());

        let traj = resolve_checked(
            &mut robot,
            &workspace,
            vec![ConstraintItem::Link(0usize.into())],
            &a,
            &b,
            ConfigSource::Explicit(Config::zeros(2)),
            ConfigSource::Unspecified,
            0.05,
            Some(solver),
            None,
            false,
            &opts,
        )
        .expect("segment should resolve");

        assert_eq!(traj.start_time(), 0.0);
        assert_eq!(traj.end_time(), 1.0);
        assert!(traj.len() > 1);
    }

    #[test]
    fn feasibility_rejecting_the_start_fails_immediately() {
        let mut robot = PlanarArm::two_link();
        let workspace = TipWorkspace;
        let solver = NewtonIkSolver::from(&robot);
        let opts = ResolverOptions::default();
        let a = Vector2::new(2.0, 0.0);
        let b = Vector2::new(0.0, 2.0);
        let never = |_: &Config| false;

        let err = resolve_checked(
            &mut robot,
            &workspace,
            vec![ConstraintItem::Link(0usize.into())],
            &a,
            &b,
            ConfigSource::Explicit(Config::zeros(2)),
            ConfigSource::Unspecified,
            0.05,
            Some(solver),
            Some(&never),
            false,
            &opts,
        )
        .unwrap_err();

        assert_eq!(err, ResolveError::InfeasibleEndpoint);
    }
}
