//! Component F — Roadmap Resolver (spec §4.F).
//!
//! Builds a probabilistic roadmap over a constrained robot's self-motion
//! manifold: multiple IK solutions are sampled per waypoint and stitched
//! together via segment resolution, so a single-segment resolver trapped in
//! the wrong manifold component can be escaped.

use std::collections::{HashSet, VecDeque};

use rand::Rng;

use crate::adapter;
use crate::bisect;
use crate::config::ResolverOptions;
use crate::error::{ResolveError, ResolveResult};
use crate::model::{Config, IkSolver, RobotModel, WorkspaceHelper};
use crate::trajectory::Trajectory;

struct Node {
    waypoint: usize,
    config: Config,
    cc: usize,
}

struct Edge {
    a: usize,
    b: usize,
    trajectory: Trajectory<Config>,
}

/// Resolves a multi-waypoint path by sampling IK solutions per waypoint and
/// stitching them into a connected roadmap, collapsing failure to `None`.
#[allow(clippy::too_many_arguments)]
pub fn resolve<R, W, S, Rn>(
    robot: &mut R,
    workspace: &W,
    constraints: &[R::Objective],
    solver: &mut S,
    waypoints: &[W::Point],
    times: &[f64],
    start_config: Option<Config>,
    end_config: Option<Config>,
    delta: f64,
    num_samples: usize,
    feasibility_test: Option<&dyn Fn(&Config) -> bool>,
    maximize: bool,
    opts: &ResolverOptions,
    rng: &mut Rn,
) -> Option<Trajectory<Config>>
where
    R: RobotModel,
    W: WorkspaceHelper<Objective = R::Objective>,
    S: IkSolver<Objective = R::Objective>,
    Rn: Rng + ?Sized,
{
    match resolve_checked(
        robot,
        workspace,
        constraints,
        solver,
        waypoints,
        times,
        start_config,
        end_config,
        delta,
        num_samples,
        feasibility_test,
        maximize,
        opts,
        rng,
    ) {
        Ok(traj) => Some(traj),
        Err(e) => {
            tracing::warn!(error = %e, "roadmap resolver exhausted its sample budget");
            None
        }
    }
}

/// Typed variant of [`resolve`].
#[allow(clippy::too_many_arguments)]
pub fn resolve_checked<R, W, S, Rn>(
    robot: &mut R,
    workspace: &W,
    constraints: &[R::Objective],
    solver: &mut S,
    waypoints: &[W::Point],
    times: &[f64],
    start_config: Option<Config>,
    end_config: Option<Config>,
    delta: f64,
    num_samples: usize,
    feasibility_test: Option<&dyn Fn(&Config) -> bool>,
    maximize: bool,
    opts: &ResolverOptions,
    rng: &mut Rn,
) -> ResolveResult<Trajectory<Config>>
where
    R: RobotModel,
    W: WorkspaceHelper<Objective = R::Objective>,
    S: IkSolver<Objective = R::Objective>,
    Rn: Rng + ?Sized,
{
    let w_last = waypoints.len() - 1;
    let start_was_unspecified = start_config.is_none();
    let end_was_unspecified = end_config.is_none();

    let start_config = match start_config {
        Some(q) => q,
        None => sample_endpoint(workspace, constraints, solver, &waypoints[0], num_samples, feasibility_test, rng)
            .ok_or(ResolveError::StartUnreachable {
                residual: f64::INFINITY,
            })?,
    };
    let end_config = match end_config {
        Some(q) => q,
        None => sample_endpoint(
            workspace,
            constraints,
            solver,
            &waypoints[w_last],
            num_samples,
            feasibility_test,
            rng,
        )
        .ok_or(ResolveError::EndUnreachable {
            residual: f64::INFINITY,
        })?,
    };

    let mut nodes = vec![
        Node {
            waypoint: 0,
            config: start_config,
            cc: 0,
        },
        Node {
            waypoint: w_last,
            config: end_config,
            cc: 1,
        },
    ];
    let mut edges: Vec<Edge> = Vec::new();
    let mut adjacency: Vec<Vec<(usize, usize)>> = vec![Vec::new(); 2];
    // Waypoints whose endpoint configuration wasn't supplied by the caller
    // still need roadmap nodes sampled for them, same as any intermediate
    // waypoint, so they aren't excluded from intermediate-node connection.
    let mut path_indices: Vec<usize> = (1..w_last).collect();
    if start_was_unspecified {
        path_indices.push(0);
    }
    if end_was_unspecified && w_last != 0 {
        path_indices.push(w_last);
    }

    if w_last == 0 {
        return Ok(Trajectory::single(times[0], nodes[0].config.clone()));
    }

    // Try the direct start→end connection first; with no intermediate
    // waypoints to sample this is the only way the roadmap ever connects.
    if let Ok(traj) = connect(
        robot,
        workspace,
        constraints,
        solver,
        waypoints,
        times,
        0,
        w_last,
        &nodes[0].config.clone(),
        &nodes[1].config.clone(),
        delta,
        feasibility_test,
    ) {
        edges.push(Edge { a: 0, b: 1, trajectory: traj });
        adjacency[0].push((1, 0));
        adjacency[1].push((0, 0));
        union(&mut nodes, 0, 1);
        if let Some(traj) = findpath(&nodes, &edges, &adjacency, w_last) {
            return Ok(traj);
        }
    }

    let mut samples_so_far = 0usize;
    for _ in 0..num_samples {
        if path_indices.is_empty() {
            break;
        }
        let w = path_indices[rng.gen_range(0..path_indices.len())];
        let seed = solver.sample_initial(rng);
        let mut c = constraints.to_vec();
        let attempt = adapter::solve_at(workspace, &mut c, &waypoints[w], solver, &seed);
        samples_so_far += 1;
        if !attempt.solved {
            continue;
        }
        if let Some(test) = feasibility_test {
            if !test(&attempt.config) {
                continue;
            }
        }

        let new_idx = nodes.len();
        nodes.push(Node {
            waypoint: w,
            config: attempt.config.clone(),
            cc: new_idx,
        });
        adjacency.push(Vec::new());

        let k = ((samples_so_far as f64 + 2.0).ln().floor() as usize) + opts.neighbor_base;
        let mut candidates: Vec<(usize, f64)> = nodes[..new_idx]
            .iter()
            .enumerate()
            .filter(|(_, n)| n.waypoint != w)
            .map(|(i, n)| (i, robot.distance(&attempt.config, &n.config)))
            .collect();
        candidates.sort_by(|x, y| x.1.partial_cmp(&y.1).unwrap());
        candidates.truncate(k);

        for (other_idx, _) in candidates {
            if nodes[other_idx].cc == nodes[new_idx].cc {
                continue;
            }
            let (lo, hi) = if nodes[other_idx].waypoint < nodes[new_idx].waypoint {
                (other_idx, new_idx)
            } else {
                (new_idx, other_idx)
            };
            let (wi, wj) = (nodes[lo].waypoint, nodes[hi].waypoint);
            let qi = nodes[lo].config.clone();
            let qj = nodes[hi].config.clone();

            match connect(
                robot,
                workspace,
                constraints,
                solver,
                waypoints,
                times,
                wi,
                wj,
                &qi,
                &qj,
                delta,
                feasibility_test,
            ) {
                Ok(traj) => {
                    let edge_idx = edges.len();
                    edges.push(Edge { a: lo, b: hi, trajectory: traj });
                    adjacency[lo].push((hi, edge_idx));
                    adjacency[hi].push((lo, edge_idx));
                    let cc_lo = nodes[lo].cc;
                    let cc_hi = nodes[hi].cc;
                    union(&mut nodes, cc_lo, cc_hi);
                }
                Err(_) => continue,
            }
        }

        if nodes[0].cc == nodes[1].cc {
            if let Some(traj) = findpath(&nodes, &edges, &adjacency, w_last) {
                return Ok(traj);
            }
        }
    }

    if maximize {
        if let Some(depth) = deepest_reachable(&nodes) {
            if depth > 0 {
                if let Some(traj) = findpath(&nodes, &edges, &adjacency, depth) {
                    return Ok(traj);
                }
            }
        }
    }

    Err(ResolveError::SampleBudgetExhausted { budget: num_samples })
}

/// Rewrites every node sharing the larger of `a`/`b` to the smaller, in
/// place — union-find without path compression (spec §9).
fn union(nodes: &mut [Node], a: usize, b: usize) {
    if a == b {
        return;
    }
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    for n in nodes.iter_mut() {
        if n.cc == hi {
            n.cc = lo;
        }
    }
}

/// Connects configurations `qi` (at waypoint `i`) and `qj` (at waypoint
/// `j`, `i < j`) by IK-refining every intermediate waypoint along a
/// straight-line configuration-space interpolant, then bisecting each
/// resulting hop (spec §4.F step 6's "call 4.E in pointwise mode").
#[allow(clippy::too_many_arguments)]
fn connect<R, W, S>(
    robot: &R,
    workspace: &W,
    constraints: &[R::Objective],
    solver: &mut S,
    waypoints: &[W::Point],
    times: &[f64],
    i: usize,
    j: usize,
    qi: &Config,
    qj: &Config,
    delta: f64,
    feasibility_test: Option<&dyn Fn(&Config) -> bool>,
) -> ResolveResult<Trajectory<Config>>
where
    R: RobotModel,
    W: WorkspaceHelper<Objective = R::Objective>,
    S: IkSolver<Objective = R::Objective>,
{
    let mut configs = vec![qi.clone()];
    for k in (i + 1)..j {
        let u = (k - i) as f64 / (j - i) as f64;
        let seed = robot.interpolate(qi, qj, u);
        let mut c = constraints.to_vec();
        let attempt = adapter::solve_at(workspace, &mut c, &waypoints[k], solver, &seed);
        if !attempt.solved {
            return Err(ResolveError::BisectIkFail { u });
        }
        configs.push(attempt.config);
    }
    configs.push(qj.clone());

    let mut overall = Trajectory::single(times[i], qi.clone());
    for k in 0..configs.len() - 1 {
        let mut seg = bisect::resolve_segment_checked(
            robot,
            workspace,
            constraints,
            solver,
            &waypoints[i + k],
            &waypoints[i + k + 1],
            configs[k].clone(),
            configs[k + 1].clone(),
            delta,
            10.0,
            feasibility_test,
        )?;
        seg.rescale_unit_domain(times[i + k], times[i + k + 1]);
        overall.append_aligned(seg);
    }
    Ok(overall)
}

/// Breadth-first from every waypoint-0 node; the first node reached on
/// `target_waypoint` yields the composed trajectory (spec §4.F's
/// `findpath`).
fn findpath(
    nodes: &[Node],
    edges: &[Edge],
    adjacency: &[Vec<(usize, usize)>],
    target_waypoint: usize,
) -> Option<Trajectory<Config>> {
    let mut visited = vec![false; nodes.len()];
    let mut parent: Vec<Option<(usize, usize)>> = vec![None; nodes.len()];
    let mut queue = VecDeque::new();

    for (i, n) in nodes.iter().enumerate() {
        if n.waypoint == 0 {
            visited[i] = true;
            queue.push_back(i);
        }
    }

    let mut reached = None;
    while let Some(cur) = queue.pop_front() {
        if nodes[cur].waypoint == target_waypoint {
            reached = Some(cur);
            break;
        }
        for &(next, edge_idx) in &adjacency[cur] {
            if !visited[next] {
                visited[next] = true;
                parent[next] = Some((cur, edge_idx));
                queue.push_back(next);
            }
        }
    }

    let mut cur = reached?;
    let mut chain = Vec::new();
    while let Some((p, e)) = parent[cur] {
        chain.push(e);
        cur = p;
    }
    chain.reverse();

    if chain.is_empty() {
        return Some(Trajectory::single(0.0, nodes[reached?].config.clone()));
    }

    let mut overall = edges[chain[0]].trajectory.clone();
    for &e in &chain[1..] {
        overall.append_aligned(edges[e].trajectory.clone());
    }
    Some(overall)
}

/// The deepest waypoint index reachable from any waypoint-0 node, used by
/// maximize mode when the sample budget is exhausted without a full
/// connection (spec §4.F's "maximize mode").
fn deepest_reachable(nodes: &[Node]) -> Option<usize> {
    let start_ccs: HashSet<usize> = nodes
        .iter()
        .filter(|n| n.waypoint == 0)
        .map(|n| n.cc)
        .collect();
    nodes
        .iter()
        .filter(|n| start_ccs.contains(&n.cc))
        .map(|n| n.waypoint)
        .max()
}

fn sample_endpoint<W, S, Rn>(
    workspace: &W,
    constraints: &[W::Objective],
    solver: &mut S,
    point: &W::Point,
    budget: usize,
    feasibility_test: Option<&dyn Fn(&Config) -> bool>,
    rng: &mut Rn,
) -> Option<Config>
where
    W: WorkspaceHelper,
    S: IkSolver<Objective = W::Objective>,
    Rn: Rng + ?Sized,
{
    for _ in 0..budget.max(1) {
        let seed = solver.sample_initial(rng);
        let mut c = constraints.to_vec();
        let attempt = adapter::solve_at(workspace, &mut c, point, solver, &seed);
        if !attempt.solved {
            continue;
        }
        if let Some(test) = feasibility_test {
            if !test(&attempt.config) {
                continue;
            }
        }
        return Some(attempt.config);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{NewtonIkSolver, PlanarArm, TipWorkspace};
    use nalgebra::Vector2;
    use rand::SeedableRng;

    #[test]
    fn roadmap_connects_a_four_waypoint_path() {
        let mut robot = PlanarArm::two_link();
        let workspace = TipWorkspace;
        let mut solver = NewtonIkSolver::from(&robot);
        let constraints = vec![robot.objective()];
        let opts = ResolverOptions::default();

        let waypoints = vec![
            Vector2::new(2.0, 0.0),
            Vector2::new(1.5, 1.0),
            Vector2::new(0.5, 1.7),
            Vector2::new(0.0, 2.0),
        ];
        let times = vec![0.0, 1.0, 2.0, 3.0];
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);

        let traj = resolve_checked(
            &mut robot,
            &workspace,
            &constraints,
            &mut solver,
            &waypoints,
            &times,
            Some(Config::zeros(2)),
            None,
            0.1,
            200,
            None,
            false,
            &opts,
            &mut rng,
        )
        .expect("roadmap should connect a reachable path");

        assert_eq!(traj.start_time(), 0.0);
        assert!(traj.end_time() > 0.0);
    }
}
