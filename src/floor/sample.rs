use crate::discrete_system::Time;
use rand::Rng;

/// Smallest gap or service duration a draw may produce, so virtual time
/// always moves forward.
pub const MIN_DELAY: Time = 0.1;

/// Draw from the closed interval `[low, high]`.
pub fn uniform<R: Rng>(rng: &mut R, (low, high): (f64, f64)) -> f64 {
    if high > low {
        rng.random_range(low..=high)
    } else {
        low
    }
}

/// Draw a whole number from the closed interval `[low, high]`.
pub fn uniform_count<R: Rng>(rng: &mut R, (low, high): (u32, u32)) -> u32 {
    if high > low {
        rng.random_range(low..=high)
    } else {
        low
    }
}

/// `true` with probability `p`.
pub fn chance<R: Rng>(rng: &mut R, p: f64) -> bool {
    rng.random::<f64>() < p
}
