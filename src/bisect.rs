//! Component D — Bisection Resolver (spec §4.D).
//!
//! Recursively bisects the workspace segment `a → b`, solving IK at each
//! midpoint, until every leaf spans at most `delta` in configuration space.
//! A growth-bound check on each subdivision detects divergence typical of a
//! self-motion manifold discontinuity.

use crate::adapter;
use crate::constraints;
use crate::error::{ResolveError, ResolveResult};
use crate::model::{Config, ConfigSource, ConstraintItem, IkSolver, RobotModel, WorkspaceHelper};
use crate::trajectory::Trajectory;

struct Node<P> {
    a: P,
    b: P,
    ua: f64,
    ub: f64,
    qa: Config,
    qb: Config,
    d: f64,
}

/// Public entry point: normalizes inputs and resolves `a → b` by bisection.
#[allow(clippy::too_many_arguments)]
pub fn resolve<R, W, S>(
    robot: &mut R,
    workspace: &W,
    constraint_items: Vec<ConstraintItem<R::Objective>>,
    a: &W::Point,
    b: &W::Point,
    start: ConfigSource,
    end: ConfigSource,
    delta: f64,
    growth_tol: f64,
    solver: Option<S>,
    feasibility_test: Option<&dyn Fn(&Config) -> bool>,
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
        a,
        b,
        start,
        end,
        delta,
        growth_tol,
        solver,
        feasibility_test,
    ) {
        Ok(traj) => Some(traj),
        Err(e) => {
            tracing::warn!(error = %e, "bisection resolver failed");
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
    a: &W::Point,
    b: &W::Point,
    start: ConfigSource,
    end: ConfigSource,
    delta: f64,
    growth_tol: f64,
    solver: Option<S>,
    feasibility_test: Option<&dyn Fn(&Config) -> bool>,
) -> ResolveResult<Trajectory<Config>>
where
    R: RobotModel,
    W: WorkspaceHelper<Objective = R::Objective>,
    S: IkSolver<Objective = R::Objective> + Default,
{
    let normalized = constraints::normalize(robot, constraint_items, start, end, solver)?;
    let mut solver = normalized.solver;
    let mut constraints = normalized.constraints.clone();
    let start_config = normalized
        .start_config
        .unwrap_or_else(|| robot.get_config());

    robot.set_config(&start_config);
    adapter::set_target(workspace, &mut constraints, a, &mut solver);
    let start_config = if solver.is_solved(&start_config) {
        start_config
    } else {
        let attempt = solver.solve(&start_config);
        if !attempt.solved {
            return Err(ResolveError::StartUnreachable {
                residual: solver.residual(&attempt.config),
            });
        }
        tracing::warn!("startConfig required a re-solve in the bisection resolver");
        attempt.config
    };

    let end_config = match normalized.end_config {
        Some(q) => {
            robot.set_config(&q);
            adapter::set_target(workspace, &mut constraints, b, &mut solver);
            if !solver.is_solved(&q) {
                return Err(ResolveError::EndUnreachable {
                    residual: solver.residual(&q),
                });
            }
            q
        }
        None => {
            robot.set_config(&start_config);
            let attempt = adapter::solve_at(workspace, &mut constraints, b, &mut solver, &start_config);
            if !attempt.solved {
                return Err(ResolveError::EndUnreachable {
                    residual: solver.residual(&attempt.config),
                });
            }
            attempt.config
        }
    };

    if let Some(test) = feasibility_test {
        if !test(&start_config) || !test(&end_config) {
            return Err(ResolveError::InfeasibleEndpoint);
        }
    }

    resolve_segment_checked(
        robot,
        workspace,
        &constraints,
        &mut solver,
        a,
        b,
        start_config,
        end_config,
        delta,
        growth_tol,
        feasibility_test,
    )
}

/// The core recursive-bisection algorithm, operating on already-normalized
/// objectives and resolved endpoint configurations. Used directly by the
/// path orchestrator for pointwise segments with a known end configuration.
#[allow(clippy::too_many_arguments)]
pub fn resolve_segment_checked<R, W, S>(
    robot: &R,
    workspace: &W,
    constraints: &[R::Objective],
    solver: &mut S,
    a: &W::Point,
    b: &W::Point,
    start_config: Config,
    end_config: Config,
    delta: f64,
    growth_tol: f64,
    feasibility_test: Option<&dyn Fn(&Config) -> bool>,
) -> ResolveResult<Trajectory<Config>>
where
    R: RobotModel,
    W: WorkspaceHelper<Objective = R::Objective>,
    S: IkSolver<Objective = R::Objective>,
{
    let mut constraints = constraints.to_vec();
    let d0 = robot.distance(&start_config, &end_config);
    let dorig = d0;
    let mut dtotal = d0;
    let scalecond = 0.5 * (2.0 - 2.0 / growth_tol);

    let root = Node {
        a: a.clone(),
        b: b.clone(),
        ua: 0.0,
        ub: 1.0,
        qa: start_config.clone(),
        qb: end_config,
        d: d0,
    };

    let mut leaves: Vec<Node<W::Point>> = Vec::new();
    let mut stack = vec![root];

    while let Some(n) = stack.pop() {
        if n.d <= delta {
            leaves.push(n);
            continue;
        }

        let m = workspace.interpolate(&constraints, &n.a, &n.b, 0.5);
        let qm_seed = robot.interpolate(&n.qa, &n.qb, 0.5);
        solver.set_bias_config(Some(qm_seed.clone()));
        let attempt = adapter::solve_at(workspace, &mut constraints, &m, solver, &qm_seed);
        solver.set_bias_config(None);
        if !attempt.solved {
            return Err(ResolveError::BisectIkFail { u: (n.ua + n.ub) / 2.0 });
        }
        let qm = attempt.config;

        let d1 = robot.distance(&n.qa, &qm);
        let d2 = robot.distance(&qm, &n.qb);
        dtotal = dtotal + d1 + d2 - n.d;

        if dtotal > dorig * growth_tol || d1 > scalecond * n.d || d2 > scalecond * n.d {
            return Err(ResolveError::ExcessiveGrowth {
                u: (n.ua + n.ub) / 2.0,
                d0,
                d1,
                d2,
            });
        }

        if let Some(test) = feasibility_test {
            if !test(&qm) {
                return Err(ResolveError::Infeasible {
                    t: (n.ua + n.ub) / 2.0,
                });
            }
        }

        let um = (n.ua + n.ub) / 2.0;
        let left = Node {
            a: n.a.clone(),
            b: m.clone(),
            ua: n.ua,
            ub: um,
            qa: n.qa.clone(),
            qb: qm.clone(),
            d: d1,
        };
        let right = Node {
            a: m,
            b: n.b.clone(),
            ua: um,
            ub: n.ub,
            qa: qm,
            qb: n.qb.clone(),
            d: d2,
        };

        // Enqueue shorter first so the longer interval is popped next from
        // this LIFO stack, biasing refinement toward remaining large spans.
        if d1 <= d2 {
            stack.push(left);
            stack.push(right);
        } else {
            stack.push(right);
            stack.push(left);
        }
    }

    leaves.sort_by(|x, y| x.ua.partial_cmp(&y.ua).unwrap());

    let mut trajectory = Trajectory::single(0.0, start_config);
    for leaf in leaves {
        trajectory.push(leaf.ub, leaf.qb);
    }
    Ok(trajectory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{NewtonIkSolver, PlanarArm, TipWorkspace};
    use nalgebra::Vector2;

    #[test]
    fn bisects_a_reachable_segment_into_bounded_milestones() {
        let robot = PlanarArm::two_link();
        let workspace = TipWorkspace;
        let mut solver = NewtonIkSolver::from(&robot);
        let constraints = vec![robot.objective()];

        let a = Vector2::new(2.0, 0.0);
        let b = Vector2::new(0.0, 2.0);
        let start = Config::zeros(2);
        let end_attempt = {
            let mut c = constraints.clone();
            adapter::solve_at(&workspace, &mut c, &b, &mut solver, &start)
        };
        assert!(end_attempt.solved);

        let traj = resolve_segment_checked(
            &robot,
            &workspace,
            &constraints,
            &mut solver,
            &a,
            &b,
            start,
            end_attempt.config,
            0.05,
            10.0,
            None,
        )
        .expect("segment should bisect");

        assert_eq!(traj.start_time(), 0.0);
        assert_eq!(traj.end_time(), 1.0);
        for w in traj.milestones.windows(2) {
            assert!(robot.distance(&w[0], &w[1]) <= 0.05 + 1e-9);
        }
    }
}
