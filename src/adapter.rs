//! Component B — Cartesian Solver Adapter.
//!
//! The thin layer every resolver drives the IK solver through: set a
//! workspace target, then ask the solver to solve from a seed (spec §4.B).

use crate::model::{Config, IkAttempt, IkSolver, WorkspaceHelper};

/// Applies `x` to `constraints` via the workspace helper, then clears and
/// reloads `solver` with the updated constraint list.
pub fn set_target<W, S>(workspace: &W, constraints: &mut [W::Objective], x: &W::Point, solver: &mut S)
where
    W: WorkspaceHelper,
    S: IkSolver<Objective = W::Objective>,
{
    workspace.set_config(constraints, x);
    solver.clear();
    for objective in constraints.iter().cloned() {
        solver.add(objective);
    }
}

/// `set_target` followed by a solve attempt from `seed`.
pub fn solve_at<W, S>(
    workspace: &W,
    constraints: &mut [W::Objective],
    x: &W::Point,
    solver: &mut S,
    seed: &Config,
) -> IkAttempt
where
    W: WorkspaceHelper,
    S: IkSolver<Objective = W::Objective>,
{
    set_target(workspace, constraints, x, solver);
    solver.solve(seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{NewtonIkSolver, PlanarArm, TipWorkspace};
    use nalgebra::Vector2;

    #[test]
    fn solve_at_reaches_a_feasible_target() {
        let robot = PlanarArm::two_link();
        let workspace = TipWorkspace;
        let mut solver = NewtonIkSolver::from(&robot);
        let mut constraints = vec![robot.objective()];
        let target = Vector2::new(1.0, 0.0);
        let attempt = solve_at(&workspace, &mut constraints, &target, &mut solver, &robot.get_config_default());
        assert!(attempt.solved);
    }
}
