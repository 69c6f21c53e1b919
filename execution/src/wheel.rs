//! Wheel and ball animation.
//!
//! A presentational simulation that always comes to rest with the ball in the
//! pocket it was told to reach. The animation runs through
//! `idle -> spinning -> dropping -> settling -> settled`:
//!
//! - **spinning**: wheel and ball rotate in opposite directions, each slowed by a
//!   per-tick friction factor. Once the ball is slow enough it starts to drop.
//! - **dropping**: the ball spirals in toward the pockets and may bounce off the
//!   frets a bounded number of times.
//! - **settling**: the ball rides the wheel and eases onto the target pocket while
//!   the wheel brakes. This is the only phase that reads the target.
//! - **settled**: the ball is pinned to the target pocket every tick.
//!
//! Randomness (launch speeds, bounces) only shapes the path and its duration. All
//! of it comes from the injected [`Rng`], so a seeded generator replays a spin
//! exactly. [`step`] is a pure function of `(state, target, dt, rng)`.

use std::f64::consts::TAU;

use croupier_types::casino::{
    pocket_index, WheelPhase, WheelSimState, MAX_BOUNCES, MAX_NUMBER, POCKET_COUNT, WHEEL_ORDER,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::debug;

/// Nominal animation tick. Friction factors are expressed per tick.
pub const TICK_SECS: f64 = 1.0 / 60.0;
/// Arc covered by one pocket.
pub const SLOT_ARC: f64 = TAU / POCKET_COUNT as f64;

const WHEEL_FRICTION: f64 = 0.9995;
const BALL_FRICTION: f64 = 0.997;
/// Wheel brake applied once the ball is in the pockets.
const SETTLE_WHEEL_BRAKE: f64 = 0.97;
/// Ball speed (rad/s) below which it leaves the outer track.
const DROP_SPEED: f64 = 3.5;

const OUTER_RADIUS: f64 = 1.0;
const POCKET_RADIUS: f64 = 0.72;
/// Inward drift while dropping, radius units per second.
const DROP_RATE: f64 = 0.12;
const BOUNCE_CHANCE: f64 = 0.04;
const BOUNCE_LIFT: (f64, f64) = (0.015, 0.05);
const BOUNCE_JITTER: f64 = 0.25;

/// Fraction of the remaining angular error closed per second while settling.
const SETTLE_EASE: f64 = 4.0;
const WHEEL_REST_SPEED: f64 = 0.05;
const ANGLE_TOLERANCE: f64 = 0.01;
const IDLE_WHEEL_SPEED: f64 = 0.25;

const LAUNCH_WHEEL_SPEED: (f64, f64) = (1.2, 2.0);
const LAUNCH_BALL_SPEED: (f64, f64) = (9.0, 12.0);

/// Longest step taken in one go; longer gaps are clamped.
pub const MAX_STEP_SECS: f64 = 0.1;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum WheelError {
    #[error("target {0} is not a pocket on the wheel")]
    InvalidTarget(u8),
    #[error("wheel is already {0}")]
    AlreadyRunning(WheelPhase),
}

/// Wrap an angle into `[0, 2π)`.
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Shortest signed rotation taking `from` onto `to`, in `(-π, π]`.
fn angle_delta(from: f64, to: f64) -> f64 {
    let delta = normalize_angle(to - from);
    if delta > TAU / 2.0 {
        delta - TAU
    } else {
        delta
    }
}

/// Absolute angle of a number's pocket for the given wheel rotation.
pub fn slot_angle(number: u8, wheel_angle: f64) -> f64 {
    let index = pocket_index(number).unwrap_or(0);
    normalize_angle(wheel_angle + index as f64 * SLOT_ARC)
}

/// Number of the pocket nearest to `ball_angle` for the given wheel rotation.
pub fn pocket_at(ball_angle: f64, wheel_angle: f64) -> u8 {
    let offset = normalize_angle(ball_angle - wheel_angle);
    let index = (offset / SLOT_ARC).round() as usize % POCKET_COUNT;
    WHEEL_ORDER[index]
}

fn friction(factor: f64, dt: f64) -> f64 {
    factor.powf(dt / TICK_SECS)
}

/// State for a wheel at rest, ball on the rim.
pub fn idle_state(wheel_angle: f64) -> WheelSimState {
    WheelSimState {
        wheel_angle: normalize_angle(wheel_angle),
        wheel_speed: IDLE_WHEEL_SPEED,
        ball_angle: normalize_angle(wheel_angle),
        ball_speed: 0.0,
        ball_radius: OUTER_RADIUS,
        phase: WheelPhase::Idle,
        bounce_count: 0,
    }
}

/// Launch the ball: randomized speeds, wheel keeps its current rotation.
pub fn launch<R: Rng + ?Sized>(state: &WheelSimState, rng: &mut R) -> WheelSimState {
    WheelSimState {
        wheel_angle: state.wheel_angle,
        wheel_speed: rng.gen_range(LAUNCH_WHEEL_SPEED.0..LAUNCH_WHEEL_SPEED.1),
        ball_angle: rng.gen_range(0.0..TAU),
        ball_speed: rng.gen_range(LAUNCH_BALL_SPEED.0..LAUNCH_BALL_SPEED.1),
        ball_radius: OUTER_RADIUS,
        phase: WheelPhase::Spinning,
        bounce_count: 0,
    }
}

/// Advance the simulation by `dt` seconds.
///
/// `target` is only consulted in the settling and settled phases; without one
/// the ball stays on the rim of the pockets.
pub fn step<R: Rng + ?Sized>(
    state: WheelSimState,
    target: Option<u8>,
    dt: f64,
    rng: &mut R,
) -> WheelSimState {
    let dt = dt.clamp(0.0, MAX_STEP_SECS);
    let mut next = state;
    match state.phase {
        WheelPhase::Idle => {
            next.wheel_angle = normalize_angle(state.wheel_angle + state.wheel_speed * dt);
            next.ball_angle = normalize_angle(state.ball_angle + state.wheel_speed * dt);
        }
        WheelPhase::Spinning => {
            next.wheel_angle = normalize_angle(state.wheel_angle + state.wheel_speed * dt);
            next.ball_angle = normalize_angle(state.ball_angle - state.ball_speed * dt);
            next.wheel_speed = state.wheel_speed * friction(WHEEL_FRICTION, dt);
            next.ball_speed = state.ball_speed * friction(BALL_FRICTION, dt);
            if next.ball_speed < DROP_SPEED {
                next.phase = WheelPhase::Dropping;
            }
        }
        WheelPhase::Dropping => {
            next.wheel_angle = normalize_angle(state.wheel_angle + state.wheel_speed * dt);
            next.ball_angle = normalize_angle(state.ball_angle - state.ball_speed * dt);
            next.wheel_speed = state.wheel_speed * friction(WHEEL_FRICTION, dt);
            next.ball_speed = state.ball_speed * friction(BALL_FRICTION, dt);
            next.ball_radius = state.ball_radius - DROP_RATE * dt;

            let chance = (BOUNCE_CHANCE * dt / TICK_SECS).min(1.0);
            if state.bounce_count < MAX_BOUNCES && rng.gen_bool(chance) {
                let lift = rng.gen_range(BOUNCE_LIFT.0..BOUNCE_LIFT.1);
                next.ball_radius = (next.ball_radius + lift).min(OUTER_RADIUS);
                next.ball_angle =
                    normalize_angle(next.ball_angle + rng.gen_range(-BOUNCE_JITTER..BOUNCE_JITTER));
                next.bounce_count = state.bounce_count + 1;
            }

            if next.ball_radius <= POCKET_RADIUS {
                next.ball_radius = POCKET_RADIUS;
                next.phase = WheelPhase::Settling;
            }
        }
        WheelPhase::Settling => {
            let Some(target) = target else {
                return next;
            };
            next.wheel_angle = normalize_angle(state.wheel_angle + state.wheel_speed * dt);
            next.wheel_speed = state.wheel_speed * friction(SETTLE_WHEEL_BRAKE, dt);
            next.ball_speed = 0.0;

            // Ride the wheel, then close part of the remaining gap to the pocket.
            let riding = normalize_angle(state.ball_angle + state.wheel_speed * dt);
            let goal = slot_angle(target, next.wheel_angle);
            let error = angle_delta(riding, goal);
            let ease = (SETTLE_EASE * dt).min(1.0);
            next.ball_angle = normalize_angle(riding + error * ease);

            let remaining = angle_delta(next.ball_angle, goal).abs();
            if next.wheel_speed < WHEEL_REST_SPEED && remaining < ANGLE_TOLERANCE {
                next.phase = WheelPhase::Settled;
                next.ball_angle = goal;
            }
        }
        WheelPhase::Settled => {
            next.wheel_angle = normalize_angle(state.wheel_angle + state.wheel_speed * dt);
            next.wheel_speed = state.wheel_speed * friction(SETTLE_WHEEL_BRAKE, dt);
            next.ball_speed = 0.0;
            if let Some(target) = target {
                next.ball_angle = slot_angle(target, next.wheel_angle);
            }
        }
    }
    next
}

/// Owns the simulation state for one table and reports when the ball comes to rest.
#[derive(Debug)]
pub struct WheelAnimator<R: Rng = StdRng> {
    state: WheelSimState,
    target: Option<u8>,
    reported: bool,
    rng: R,
}

impl WheelAnimator<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> WheelAnimator<R> {
    pub fn new(rng: R) -> Self {
        Self {
            state: idle_state(0.0),
            target: None,
            reported: false,
            rng,
        }
    }

    pub fn state(&self) -> &WheelSimState {
        &self.state
    }

    pub fn phase(&self) -> WheelPhase {
        self.state.phase
    }

    pub fn target(&self) -> Option<u8> {
        self.target
    }

    pub fn is_settled(&self) -> bool {
        self.state.phase == WheelPhase::Settled
    }

    /// Pocket currently under the ball.
    pub fn pocket_under_ball(&self) -> u8 {
        pocket_at(self.state.ball_angle, self.state.wheel_angle)
    }

    /// Launch a spin that will come to rest on `target`.
    pub fn start(&mut self, target: u8) -> Result<(), WheelError> {
        if target > MAX_NUMBER {
            return Err(WheelError::InvalidTarget(target));
        }
        if self.state.phase != WheelPhase::Idle {
            return Err(WheelError::AlreadyRunning(self.state.phase));
        }
        self.target = Some(target);
        self.reported = false;
        self.state = launch(&self.state, &mut self.rng);
        debug!(number = target, "wheel launched");
        Ok(())
    }

    /// Return to idle, keeping the wheel where it is.
    pub fn reset(&mut self) {
        self.state = idle_state(self.state.wheel_angle);
        self.target = None;
        self.reported = false;
    }

    /// Step the animation. Returns the target number the first time the ball is
    /// pinned in its pocket, and `None` on every other call.
    pub fn advance(&mut self, dt: f64) -> Option<u8> {
        let before = self.state.phase;
        self.state = step(self.state, self.target, dt, &mut self.rng);
        if self.state.phase != before {
            debug!(from = %before, to = %self.state.phase, bounces = self.state.bounce_count, "wheel phase");
        }
        if self.is_settled() && !self.reported {
            self.reported = true;
            return self.target;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand_chacha::ChaCha8Rng;

    const STEP_LIMIT: usize = 10_000;

    /// Run until settled; returns the number of steps taken.
    fn run_to_rest<R: Rng>(animator: &mut WheelAnimator<R>, dt: f64) -> usize {
        for steps in 1..=STEP_LIMIT {
            animator.advance(dt);
            if animator.is_settled() {
                return steps;
            }
        }
        panic!("wheel did not settle within {STEP_LIMIT} steps");
    }

    #[test]
    fn test_idle_until_started() {
        let mut animator = WheelAnimator::new(StdRng::seed_from_u64(1));
        for _ in 0..120 {
            assert_eq!(animator.advance(TICK_SECS), None);
        }
        assert_eq!(animator.phase(), WheelPhase::Idle);
        assert_eq!(animator.state().ball_radius, OUTER_RADIUS);
    }

    #[test]
    fn test_start_rejects_bad_target_and_double_start() {
        let mut animator = WheelAnimator::new(StdRng::seed_from_u64(2));
        assert_eq!(animator.start(37), Err(WheelError::InvalidTarget(37)));
        animator.start(12).unwrap();
        assert_eq!(
            animator.start(12),
            Err(WheelError::AlreadyRunning(WheelPhase::Spinning))
        );
    }

    #[test]
    fn test_runs_through_every_phase_in_order() {
        let mut animator = WheelAnimator::new(StdRng::seed_from_u64(3));
        animator.start(26).unwrap();
        let mut seen = vec![animator.phase()];
        for _ in 0..STEP_LIMIT {
            animator.advance(TICK_SECS);
            if seen.last() != Some(&animator.phase()) {
                seen.push(animator.phase());
            }
            if animator.is_settled() {
                break;
            }
        }
        assert_eq!(
            seen,
            vec![
                WheelPhase::Spinning,
                WheelPhase::Dropping,
                WheelPhase::Settling,
                WheelPhase::Settled
            ]
        );
    }

    #[test]
    fn test_completion_reported_once() {
        let mut animator = WheelAnimator::new(StdRng::seed_from_u64(4));
        animator.start(0).unwrap();
        let mut reports = Vec::new();
        for _ in 0..STEP_LIMIT + 600 {
            if let Some(number) = animator.advance(TICK_SECS) {
                reports.push(number);
            }
        }
        assert_eq!(reports, vec![0]);
    }

    #[test]
    fn test_settled_ball_tracks_drifting_wheel() {
        let mut animator = WheelAnimator::new(StdRng::seed_from_u64(5));
        animator.start(17).unwrap();
        run_to_rest(&mut animator, TICK_SECS);
        for _ in 0..300 {
            animator.advance(TICK_SECS);
            let state = animator.state();
            assert_eq!(state.ball_angle, slot_angle(17, state.wheel_angle));
            assert_eq!(animator.pocket_under_ball(), 17);
        }
    }

    #[test]
    fn test_spin_fits_roughly_in_the_spinning_window() {
        let mut animator = WheelAnimator::new(StdRng::seed_from_u64(6));
        animator.start(9).unwrap();
        let steps = run_to_rest(&mut animator, TICK_SECS);
        let secs = steps as f64 * TICK_SECS;
        assert!((5.0..25.0).contains(&secs), "spin took {secs}s");
    }

    #[test]
    fn test_reset_returns_to_idle_and_keeps_wheel_angle() {
        let mut animator = WheelAnimator::new(StdRng::seed_from_u64(7));
        animator.start(3).unwrap();
        for _ in 0..90 {
            animator.advance(TICK_SECS);
        }
        let angle = animator.state().wheel_angle;
        animator.reset();
        assert_eq!(animator.phase(), WheelPhase::Idle);
        assert_eq!(animator.target(), None);
        assert_eq!(animator.state().wheel_angle, angle);
        assert_eq!(animator.state().bounce_count, 0);
        animator.start(4).unwrap();
    }

    #[test]
    fn test_target_does_not_shape_the_early_path() {
        let mut a = WheelAnimator::new(ChaCha8Rng::seed_from_u64(8));
        let mut b = WheelAnimator::new(ChaCha8Rng::seed_from_u64(8));
        a.start(1).unwrap();
        b.start(36).unwrap();
        while a.phase() != WheelPhase::Settling {
            a.advance(TICK_SECS);
            b.advance(TICK_SECS);
            assert_eq!(a.state(), b.state());
        }
    }

    #[test]
    fn test_long_frames_are_clamped() {
        let state = launch(&idle_state(0.0), &mut StdRng::seed_from_u64(9));
        let mut rng = StdRng::seed_from_u64(10);
        let jumped = step(state, Some(5), 30.0, &mut rng);
        let expected = normalize_angle(state.ball_angle - state.ball_speed * MAX_STEP_SECS);
        assert!((jumped.ball_angle - expected).abs() < 1e-9);
    }

    #[test]
    fn test_pocket_geometry() {
        for number in 0..=MAX_NUMBER {
            for wheel in [0.0, 1.0, 3.3, TAU - 1e-12] {
                assert_eq!(pocket_at(slot_angle(number, wheel), wheel), number);
            }
        }
        assert!((angle_delta(0.1, TAU - 0.1) + 0.2).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn test_prop_always_settles_on_target(target in 0u8..=36, seed in any::<u64>()) {
            let mut animator = WheelAnimator::new(ChaCha8Rng::seed_from_u64(seed));
            animator.start(target).unwrap();
            let mut reported = None;
            for _ in 0..STEP_LIMIT {
                if let Some(number) = animator.advance(TICK_SECS) {
                    reported = Some(number);
                    break;
                }
            }
            prop_assert_eq!(reported, Some(target));
            let state = *animator.state();
            prop_assert_eq!(state.phase, WheelPhase::Settled);
            prop_assert!(state.bounce_count <= MAX_BOUNCES);
            prop_assert_eq!(state.ball_angle, slot_angle(target, state.wheel_angle));
            prop_assert_eq!(animator.pocket_under_ball(), target);
        }

        #[test]
        fn test_prop_settles_with_uneven_frames(
            target in 0u8..=36,
            seed in any::<u64>(),
            frames in proptest::collection::vec(0.001f64..0.2, 64),
        ) {
            let mut animator = WheelAnimator::new(StdRng::seed_from_u64(seed));
            animator.start(target).unwrap();
            let mut settled = false;
            for i in 0..STEP_LIMIT * 2 {
                animator.advance(frames[i % frames.len()]);
                if animator.is_settled() {
                    settled = true;
                    break;
                }
            }
            prop_assert!(settled);
            prop_assert_eq!(animator.pocket_under_ball(), target);
        }
    }
}
