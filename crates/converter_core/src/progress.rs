//! Synthesized progress for a conversion that reports no telemetry.
//!
//! Each tick advances by `max(1, 10 * e^(-p/25))` points: fast at first,
//! slowing as it approaches the ceiling. Only a finished attempt reaches 100.

/// Progress of a finished attempt, successful or not.
pub const PROGRESS_COMPLETE: f64 = 100.0;

/// Highest value the animation reaches while the request is still pending.
pub const IN_FLIGHT_CEILING: f64 = 99.0;

/// Advances the animation by one tick. Never decreases and never passes
/// [`IN_FLIGHT_CEILING`].
pub fn next_progress(current: f64) -> f64 {
    let step = (10.0 * (-current / 25.0).exp()).max(1.0);
    (current + step).min(IN_FLIGHT_CEILING).max(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_advances_by_ten() {
        assert!((next_progress(0.0) - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn step_never_drops_below_one_point() {
        // 10 * e^(-80/25) is about 0.41, so the floor of 1 applies.
        assert!((next_progress(80.0) - 81.0).abs() < 1e-9);
    }

    #[test]
    fn animation_is_monotone_and_capped() {
        let mut p = 0.0;
        for _ in 0..500 {
            let next = next_progress(p);
            assert!(next >= p);
            assert!(next <= IN_FLIGHT_CEILING);
            p = next;
        }
        assert_eq!(p, IN_FLIGHT_CEILING);
    }
}
