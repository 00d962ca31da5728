/// Factors other than 2 and 3 allowed at most once in a grid length.
const SEEDS: [usize; 4] = [1, 5, 7, 11];

/// Returns the smallest length not below `lower_limit` of the form `seed * 2^a * 3^b`,
/// with `seed` one of 1, 5, 7 or 11.
///
/// Used to round a requested grid resolution up to a size rustfft handles quickly.
pub fn fastish_fft_len(lower_limit: usize) -> usize {
    let limit = lower_limit.max(1);
    let mut best = limit.next_power_of_two();
    for &seed in SEEDS.iter() {
        // walk the powers of two, topping each up with threes
        let mut base = seed;
        loop {
            let mut len = base;
            while len < limit {
                len *= 3;
            }
            best = best.min(len);
            if base >= limit {
                break;
            }
            base *= 2;
        }
    }
    best
}
