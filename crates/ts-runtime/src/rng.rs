pub(crate) fn next_random_u32(state: &mut u32) -> u32 {
    let mut next = state.wrapping_add(0x6d2b79f5);
    *state = next;
    next = (next ^ (next >> 15)).wrapping_mul(next | 1);
    next ^= next.wrapping_add((next ^ (next >> 7)).wrapping_mul(next | 61));
    next ^ (next >> 14)
}

/// Uniform draw in `[0, 1)`.
pub(crate) fn next_random_unit(state: &mut u32) -> f64 {
    f64::from(next_random_u32(state)) / (f64::from(u32::MAX) + 1.0)
}

#[cfg(test)]
mod rng_tests {
    use super::*;

    #[test]
    fn same_seed_yields_same_sequence() {
        let mut a = 17u32;
        let mut b = 17u32;
        for _ in 0..16 {
            assert_eq!(next_random_u32(&mut a), next_random_u32(&mut b));
        }
    }

    #[test]
    fn unit_draws_stay_in_half_open_interval() {
        let mut state = 1u32;
        for _ in 0..1_000 {
            let value = next_random_unit(&mut state);
            assert!((0.0..1.0).contains(&value));
        }
    }
}
