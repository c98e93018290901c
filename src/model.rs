//! The external collaborators the resolvers are written against.
//!
//! The robot kinematic model, the IK solver, and the workspace-parameter
//! helper are explicitly out of scope (spec §1) — they are supplied by the
//! caller. This module only defines the traits the resolvers need from
//! them (spec §6), plus the small sum types spec §9 recommends in place of
//! the original's string/`None` sentinels.

use nalgebra::DVector;

use crate::error::ResolveResult;

/// A robot configuration: an ordered sequence of joint values.
pub type Config = DVector<f64>;

/// Identifies a constrained link, either by index or by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LinkIdentifier {
    Index(usize),
    Name(String),
}

impl From<usize> for LinkIdentifier {
    fn from(i: usize) -> Self {
        LinkIdentifier::Index(i)
    }
}

impl From<&str> for LinkIdentifier {
    fn from(s: &str) -> Self {
        LinkIdentifier::Name(s.to_string())
    }
}

/// Replaces the `'robot'` / `None` sentinel convention for `startConfig` and
/// `endConfig` (spec §9).
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// Take the robot's current configuration.
    Robot,
    /// Use this configuration explicitly.
    Explicit(Config),
    /// No configuration was supplied.
    Unspecified,
}

impl From<Config> for ConfigSource {
    fn from(q: Config) -> Self {
        ConfigSource::Explicit(q)
    }
}

/// A single entry in a caller-supplied constraint list: either an already
/// built pose objective, or a link identifier that normalization should
/// turn into an identity-pose objective (spec §4.A).
#[derive(Debug, Clone)]
pub enum ConstraintItem<O> {
    Link(LinkIdentifier),
    Objective(O),
}

/// The robot kinematic model: forward kinematics, joint limits, and
/// configuration-space interpolation live here, entirely outside this
/// crate (spec §1's "out of scope" list).
pub trait RobotModel {
    /// The IK objective type this robot can build identity-pose objectives
    /// for, matching the [`WorkspaceHelper::Objective`] used alongside it.
    type Objective: Clone;

    fn get_config(&self) -> Config;
    fn set_config(&mut self, q: &Config);
    fn distance(&self, a: &Config, b: &Config) -> f64;
    fn interpolate(&self, a: &Config, b: &Config, u: f64) -> Config;
    fn num_links(&self) -> usize;

    /// Builds a pose objective binding `link` to the identity rotation at
    /// the origin. The concrete pose is irrelevant (spec §4.A) because the
    /// solver is re-targeted before every solve; this only needs to succeed
    /// for link identifiers the robot actually has.
    fn identity_objective(&self, link: &LinkIdentifier) -> ResolveResult<Self::Objective>;
}

/// A single outcome of an IK solve attempt. The solver always reports some
/// configuration (its best effort), and `solved` tells the caller whether
/// that configuration actually met the solver's current tolerance — this
/// is what lets the "grudging accept" path in the linear resolver (spec
/// §4.C step 4) re-evaluate the same attempt against a relaxed tolerance
/// without re-solving.
#[derive(Debug, Clone)]
pub struct IkAttempt {
    pub config: Config,
    pub solved: bool,
}

/// The IK solver: given a constraint list (built via `add`/`clear`) and a
/// seed configuration, attempts to find a configuration that satisfies the
/// constraints within tolerance (spec §6).
pub trait IkSolver {
    type Objective: Clone;

    fn clear(&mut self);
    fn add(&mut self, objective: Self::Objective);

    /// Attempts to solve from `seed`, returning the best configuration
    /// found and whether it met the current tolerance.
    fn solve(&mut self, seed: &Config) -> IkAttempt;

    /// Whether `q` already satisfies the current constraint list within
    /// tolerance, without performing a fresh solve.
    fn is_solved(&self, q: &Config) -> bool;

    fn residual(&self, q: &Config) -> f64;

    fn tolerance(&self) -> f64;
    fn set_tolerance(&mut self, tol: f64);

    fn joint_limits(&self) -> (Config, Config);
    fn set_joint_limits(&mut self, lo: Config, hi: Config);

    fn bias_config(&self) -> Option<Config>;
    fn set_bias_config(&mut self, q: Option<Config>);

    /// Draws a configuration from the solver's own initial-sample
    /// distribution (spec §4.F, §5 — randomness for the roadmap must be
    /// sourced from here so seeding upstream gives test determinism).
    fn sample_initial<Rng: rand::Rng + ?Sized>(&mut self, rng: &mut Rng) -> Config;

    fn max_iters(&self) -> usize;
    fn active_dofs(&self) -> Vec<usize>;
}

/// Drives a setting of a constraint list (spec §3's "workspace point").
///
/// `Point` is an opaque parameter bundle: a full transform, a position, a
/// rotation, or some heterogeneous mix across the constraint list — the
/// resolvers never inspect it directly, only interpolate, measure, and
/// apply it via this trait.
pub trait WorkspaceHelper {
    type Objective: Clone;
    type Point: Clone;

    fn get_config(&self, constraints: &[Self::Objective]) -> Self::Point;
    fn set_config(&self, constraints: &mut [Self::Objective], x: &Self::Point);
    fn interpolate(
        &self,
        constraints: &[Self::Objective],
        a: &Self::Point,
        b: &Self::Point,
        u: f64,
    ) -> Self::Point;
    fn distance(&self, constraints: &[Self::Objective], a: &Self::Point, b: &Self::Point) -> f64;
}

/// RAII wrapper that saves a solver's tolerance, joint limits, and bias
/// configuration on construction and restores them on every exit path
/// (spec §5's save/restore discipline, recommended explicitly in §9).
pub struct SolverGuard<'a, S: IkSolver> {
    solver: &'a mut S,
    tolerance: f64,
    joint_limits: (Config, Config),
    bias_config: Option<Config>,
}

impl<'a, S: IkSolver> SolverGuard<'a, S> {
    pub fn new(solver: &'a mut S) -> Self {
        let tolerance = solver.tolerance();
        let joint_limits = solver.joint_limits();
        let bias_config = solver.bias_config();
        Self {
            solver,
            tolerance,
            joint_limits,
            bias_config,
        }
    }

    /// The tolerance captured at construction (`tol0` in spec §4.C/§4.D).
    pub fn original_tolerance(&self) -> f64 {
        self.tolerance
    }

    /// The joint limits captured at construction (`qmin0, qmax0`).
    pub fn original_joint_limits(&self) -> &(Config, Config) {
        &self.joint_limits
    }
}

impl<'a, S: IkSolver> std::ops::Deref for SolverGuard<'a, S> {
    type Target = S;
    fn deref(&self) -> &S {
        self.solver
    }
}

impl<'a, S: IkSolver> std::ops::DerefMut for SolverGuard<'a, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.solver
    }
}

impl<'a, S: IkSolver> Drop for SolverGuard<'a, S> {
    fn drop(&mut self) {
        self.solver.set_tolerance(self.tolerance);
        self.solver
            .set_joint_limits(self.joint_limits.0.clone(), self.joint_limits.1.clone());
        self.solver.set_bias_config(self.bias_config.clone());
    }
}

/// Shrinks `(qmin0, qmax0)` to a box of radius `delta` around `q`, per
/// spec §4.C step 3.
pub fn box_joint_limits(q: &Config, delta: f64, qmin0: &Config, qmax0: &Config) -> (Config, Config) {
    let lo = Config::from_iterator(
        q.len(),
        q.iter()
            .zip(qmin0.iter())
            .map(|(v, vmin)| (v - delta).max(*vmin)),
    );
    let hi = Config::from_iterator(
        q.len(),
        q.iter()
            .zip(qmax0.iter())
            .map(|(v, vmax)| (v + delta).min(*vmax)),
    );
    (lo, hi)
}
