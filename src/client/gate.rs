use crate::geo::CoordinateSample;

use super::ClientConfig;

/// Whether `current` should be reported given the last sample that was sent.
///
/// The first sample always goes out. After that a sample has to clear a time
/// floor (`update_interval`) and then a distance floor (`min_distance`). A
/// stationary device therefore stays quiet even once the interval has passed.
pub fn should_update(
    config: &ClientConfig,
    current: &CoordinateSample,
    last_sent: Option<&CoordinateSample>,
) -> bool {
    let Some(last) = last_sent else {
        return true;
    };

    // A clock that went backwards yields a negative elapsed time: too soon.
    if current.seconds_since(last) < config.update_interval as f64 {
        return false;
    }

    current.distance_to(last) >= config.min_distance
}
