use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StateModifier {
    #[default]
    None,
    /// transitions also wait for a dwell time
    Delayed,
}

/// Decides whether a guarded transition may fire.
///
/// With [`StateModifier::None`] this is a pass-through. With
/// [`StateModifier::Delayed`] every elapsed duration must be strictly greater
/// than its paired threshold. Single values are passed as one element slices.
pub fn guard(pairs: &[(Duration, Duration)], modifier: StateModifier) -> bool {
    match modifier {
        StateModifier::None => true,
        StateModifier::Delayed => pairs
            .iter()
            .all(|(elapsed, threshold)| elapsed > threshold),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn none_always_passes() {
        assert!(guard(&[(ms(0), ms(1000))], StateModifier::None));
        assert!(guard(&[(ms(0), ms(1000)), (ms(5), ms(10))], StateModifier::None));
    }

    #[test]
    fn delayed_requires_strictly_greater() {
        assert!(!guard(&[(ms(500), ms(500))], StateModifier::Delayed));
        assert!(!guard(&[(ms(499), ms(500))], StateModifier::Delayed));
        assert!(guard(&[(ms(501), ms(500))], StateModifier::Delayed));
    }

    #[test]
    fn delayed_requires_every_pair() {
        let threshold = ms(800);
        assert!(!guard(
            &[(ms(900), threshold), (ms(100), threshold)],
            StateModifier::Delayed
        ));
        assert!(guard(
            &[(ms(900), threshold), (ms(801), threshold)],
            StateModifier::Delayed
        ));
    }

    #[test]
    fn delayed_below_threshold_never_passes() {
        let threshold = ms(250);
        for elapsed in 0..=250 {
            assert!(!guard(&[(ms(elapsed), threshold)], StateModifier::Delayed));
            assert!(!guard(
                &[(Duration::MAX, threshold), (ms(elapsed), threshold)],
                StateModifier::Delayed
            ));
        }
    }
}
