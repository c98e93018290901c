//! A minimal `RobotModel` / `IkSolver` / `WorkspaceHelper` triple for tests
//! and doctests.
//!
//! The real collaborators are supplied by callers (spec §1); this module
//! ships a small planar-arm stand-in so the resolvers have something
//! concrete to run against in this crate's own test suite and in
//! integration tests under `tests/`, without pulling in a full kinematics
//! dependency.

use nalgebra::{Matrix2, Matrix2xX, Vector2};

use crate::error::{ResolveError, ResolveResult};
use crate::model::{Config, IkAttempt, IkSolver, LinkIdentifier, RobotModel, WorkspaceHelper};

/// A target position for the arm's tip, in the plane.
pub type PositionObjective = Vector2<f64>;

/// A planar arm with an arbitrary number of revolute joints and fixed link
/// lengths, configured entirely by its joint-angle vector.
#[derive(Debug, Clone)]
pub struct PlanarArm {
    link_lengths: Vec<f64>,
    config: Config,
}

impl PlanarArm {
    pub fn new(link_lengths: Vec<f64>) -> Self {
        let config = Config::zeros(link_lengths.len());
        Self {
            link_lengths,
            config,
        }
    }

    /// A two-link arm with unit-length links, both joints at zero.
    pub fn two_link() -> Self {
        Self::new(vec![1.0, 1.0])
    }

    /// A four-link arm; long enough to have a self-motion manifold, which
    /// the bisection resolver's growth-bound check is meant to catch.
    pub fn four_link() -> Self {
        Self::new(vec![1.0, 1.0, 1.0, 1.0])
    }

    pub fn num_joints(&self) -> usize {
        self.link_lengths.len()
    }

    /// Forward kinematics: the tip position for an arbitrary joint vector.
    pub fn tip_position(&self, q: &Config) -> Vector2<f64> {
        let mut angle = 0.0;
        let mut pos = Vector2::new(0.0, 0.0);
        for (i, len) in self.link_lengths.iter().enumerate() {
            angle += q[i];
            pos += Vector2::new(angle.cos(), angle.sin()) * *len;
        }
        pos
    }

    /// A single pose objective for this arm's only end-effector link.
    pub fn objective(&self) -> PositionObjective {
        self.tip_position(&self.config)
    }

    /// The arm's current configuration, independent of [`RobotModel::get_config`].
    pub fn get_config_default(&self) -> Config {
        self.config.clone()
    }
}

impl RobotModel for PlanarArm {
    type Objective = PositionObjective;

    fn get_config(&self) -> Config {
        self.config.clone()
    }

    fn set_config(&mut self, q: &Config) {
        self.config = q.clone();
    }

    fn distance(&self, a: &Config, b: &Config) -> f64 {
        (a - b).norm()
    }

    fn interpolate(&self, a: &Config, b: &Config, u: f64) -> Config {
        a + (b - a) * u
    }

    fn num_links(&self) -> usize {
        self.link_lengths.len()
    }

    fn identity_objective(&self, link: &LinkIdentifier) -> ResolveResult<Self::Objective> {
        match link {
            LinkIdentifier::Index(i) if *i < self.link_lengths.len() => {
                Ok(self.tip_position(&self.config))
            }
            LinkIdentifier::Index(i) => Err(ResolveError::InvalidConstraint(format!(
                "link index {i} out of range for a {}-joint arm",
                self.link_lengths.len()
            ))),
            LinkIdentifier::Name(n) => Err(ResolveError::InvalidConstraint(format!(
                "{n}: planar arm reference model only supports index links"
            ))),
        }
    }
}

/// Drives the tip objective directly with a workspace point, bypassing the
/// robot's own configuration.
pub struct TipWorkspace;

impl WorkspaceHelper for TipWorkspace {
    type Objective = PositionObjective;
    type Point = Vector2<f64>;

    fn get_config(&self, constraints: &[Self::Objective]) -> Self::Point {
        constraints[0]
    }

    fn set_config(&self, constraints: &mut [Self::Objective], x: &Self::Point) {
        constraints[0] = *x;
    }

    fn interpolate(
        &self,
        _constraints: &[Self::Objective],
        a: &Self::Point,
        b: &Self::Point,
        u: f64,
    ) -> Self::Point {
        a + (b - a) * u
    }

    fn distance(&self, _constraints: &[Self::Objective], a: &Self::Point, b: &Self::Point) -> f64 {
        (a - b).norm()
    }
}

/// Newton-Raphson IK over a [`PlanarArm`]'s joint-angle configuration space,
/// solving for a single tip-position target. Grounded on the teacher's
/// `ConstraintSolver`: numerical Jacobian, damped update, norm-based
/// convergence check.
#[derive(Debug, Clone)]
pub struct NewtonIkSolver {
    link_lengths: Vec<f64>,
    targets: Vec<PositionObjective>,
    tolerance: f64,
    epsilon: f64,
    damping: f64,
    max_iters: usize,
    joint_limits: (Config, Config),
    bias_config: Option<Config>,
}

impl NewtonIkSolver {
    pub fn new(link_lengths: Vec<f64>) -> Self {
        let n = link_lengths.len();
        Self {
            link_lengths,
            targets: Vec::new(),
            tolerance: 1e-6,
            epsilon: 1e-8,
            damping: 0.8,
            max_iters: 100,
            joint_limits: (
                Config::from_element(n, f64::NEG_INFINITY),
                Config::from_element(n, f64::INFINITY),
            ),
            bias_config: None,
        }
    }

    fn tip(&self, q: &Config) -> Vector2<f64> {
        let mut angle = 0.0;
        let mut pos = Vector2::new(0.0, 0.0);
        for (i, len) in self.link_lengths.iter().enumerate() {
            angle += q[i];
            pos += Vector2::new(angle.cos(), angle.sin()) * *len;
        }
        pos
    }

    fn residual_vec(&self, q: &Config) -> Vector2<f64> {
        let target = match self.targets.first() {
            Some(t) => *t,
            None => return Vector2::zeros(),
        };
        self.tip(q) - target
    }

    fn jacobian(&self, q: &Config) -> Matrix2xX<f64> {
        let n = q.len();
        let mut jac = Matrix2xX::zeros(n);
        let base = self.residual_vec(q);
        for i in 0..n {
            let mut qp = q.clone();
            qp[i] += self.epsilon;
            let perturbed = self.residual_vec(&qp);
            let d = (perturbed - base) / self.epsilon;
            jac.set_column(i, &d);
        }
        jac
    }

    fn clamp_to_limits(&self, q: &mut Config) {
        for i in 0..q.len() {
            q[i] = q[i].max(self.joint_limits.0[i]).min(self.joint_limits.1[i]);
        }
    }
}

impl Default for NewtonIkSolver {
    fn default() -> Self {
        Self::new(vec![1.0, 1.0])
    }
}

impl IkSolver for NewtonIkSolver {
    type Objective = PositionObjective;

    fn clear(&mut self) {
        self.targets.clear();
    }

    fn add(&mut self, objective: Self::Objective) {
        self.targets.push(objective);
    }

    fn solve(&mut self, seed: &Config) -> IkAttempt {
        let mut q = seed.clone();
        for _ in 0..self.max_iters {
            let residual = self.residual_vec(&q);
            if residual.norm() < self.tolerance {
                return IkAttempt {
                    config: q,
                    solved: true,
                };
            }
            let jac = self.jacobian(&q);
            let jt = jac.transpose();
            let jtj = &jt * &jac;
            let jte = &jt * residual;
            let reg = Matrix2::identity() * 1e-6;
            let jtj_reg = jtj + reg;
            let delta = match jtj_reg.try_inverse() {
                Some(inv) => -(inv * jte),
                None => break,
            };
            for i in 0..q.len() {
                q[i] += self.damping * delta[i];
            }
            self.clamp_to_limits(&mut q);
        }
        let solved = self.residual_vec(&q).norm() < self.tolerance;
        IkAttempt { config: q, solved }
    }

    fn is_solved(&self, q: &Config) -> bool {
        self.residual_vec(q).norm() < self.tolerance
    }

    fn residual(&self, q: &Config) -> f64 {
        self.residual_vec(q).norm()
    }

    fn tolerance(&self) -> f64 {
        self.tolerance
    }

    fn set_tolerance(&mut self, tol: f64) {
        self.tolerance = tol;
    }

    fn joint_limits(&self) -> (Config, Config) {
        self.joint_limits.clone()
    }

    fn set_joint_limits(&mut self, lo: Config, hi: Config) {
        self.joint_limits = (lo, hi);
    }

    fn bias_config(&self) -> Option<Config> {
        self.bias_config.clone()
    }

    fn set_bias_config(&mut self, q: Option<Config>) {
        self.bias_config = q;
    }

    fn sample_initial<Rng: rand::Rng + ?Sized>(&mut self, rng: &mut Rng) -> Config {
        let n = self.link_lengths.len();
        let lo = &self.joint_limits.0;
        let hi = &self.joint_limits.1;
        Config::from_iterator(
            n,
            (0..n).map(|i| {
                let (a, b) = (lo[i], hi[i]);
                if a.is_finite() && b.is_finite() {
                    rng.gen_range(a..=b)
                } else {
                    rng.gen_range(-std::f64::consts::PI..=std::f64::consts::PI)
                }
            }),
        )
    }

    fn max_iters(&self) -> usize {
        self.max_iters
    }

    fn active_dofs(&self) -> Vec<usize> {
        (0..self.link_lengths.len()).collect()
    }
}

/// Alias kept for arms whose joint count is fixed at construction via
/// [`PlanarArm::two_link`] / [`PlanarArm::four_link`]; builds a matching
/// solver with the same link lengths.
impl From<&PlanarArm> for NewtonIkSolver {
    fn from(arm: &PlanarArm) -> Self {
        NewtonIkSolver::new(arm.link_lengths.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_link_arm_reaches_a_reachable_target() {
        let arm = PlanarArm::two_link();
        let mut solver = NewtonIkSolver::from(&arm);
        solver.add(Vector2::new(1.0, 0.5));
        let attempt = solver.solve(&Config::zeros(2));
        assert!(attempt.solved);
        assert!(solver.residual(&attempt.config) < 1e-4);
    }

    #[test]
    fn tip_position_matches_straight_extension() {
        let arm = PlanarArm::two_link();
        let q = Config::zeros(2);
        let tip = arm.tip_position(&q);
        assert!((tip - Vector2::new(2.0, 0.0)).norm() < 1e-9);
    }
}
