// Deterministic xorshift32 generator. Fast, seedable, and good enough for
// visual noise; fixed seeds make the animation paths reproducible in tests.

#[derive(Clone)]
pub struct Rng32 {
    state: u32,
}

impl Rng32 {
    pub fn from_seed(seed: u32) -> Self {
        // A zero state would stick at zero forever.
        Self { state: seed | 1 }
    }

    /// Seed from the wall clock. Used once at startup.
    pub fn from_clock() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0xC0FF_EE00);
        Self::from_seed(nanos ^ 0x9E37_79B9)
    }

    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform in [0, 1).
    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / ((1u32 << 24) as f32)
    }

    /// Uniform in [min, max).
    #[inline]
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        min + (max - min) * self.next_f32()
    }

    /// Uniform in [0, n). `n` must be nonzero.
    #[inline]
    pub fn range_usize(&mut self, n: usize) -> usize {
        (self.next_f32() * n as f32) as usize % n
    }

    /// Uniform Fisher-Yates shuffle.
    pub fn shuffle(&mut self, items: &mut [u32]) {
        for i in (1..items.len()).rev() {
            let j = self.range_usize(i + 1);
            items.swap(i, j);
        }
    }
}
