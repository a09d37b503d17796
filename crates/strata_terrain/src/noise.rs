//! # Simplex Noise
//!
//! Deterministic 2D and 3D simplex noise for secondary-material painting.
//!
//! ## Determinism Guarantee
//!
//! Given the same `NoiseSeed`, this implementation produces exactly the same
//! values on any platform, any time. It does not try to match any engine's
//! built-in noise bit for bit.

/// Seed for deterministic noise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NoiseSeed(u64);

impl NoiseSeed {
    /// Creates a new noise seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

/// Pre-computed permutation table, shuffled once from the seed.
#[derive(Clone)]
struct PermutationTable {
    /// 512-entry permutation table (256 entries, doubled for overflow handling).
    perm: [u8; 512],
}

impl PermutationTable {
    /// Gradients for 2D simplex: a regular 8-gon plus the axes again.
    const GRAD2: [[i8; 2]; 12] = [
        [1, 0], [1, 1], [0, 1], [-1, 1],
        [-1, 0], [-1, -1], [0, -1], [1, -1],
        [1, 0], [0, 1], [-1, 0], [0, -1],
    ];

    /// Gradients for 3D simplex: midpoints of the cube edges.
    const GRAD3: [[i8; 3]; 12] = [
        [1, 1, 0], [-1, 1, 0], [1, -1, 0], [-1, -1, 0],
        [1, 0, 1], [-1, 0, 1], [1, 0, -1], [-1, 0, -1],
        [0, 1, 1], [0, -1, 1], [0, 1, -1], [0, -1, -1],
    ];

    fn new(seed: NoiseSeed) -> Self {
        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().take(256).enumerate() {
            *slot = i as u8;
        }

        // Fisher-Yates shuffle driven by xorshift64
        let mut rng_state = seed.value() | 1;
        for i in (1..256).rev() {
            rng_state ^= rng_state << 13;
            rng_state ^= rng_state >> 7;
            rng_state ^= rng_state << 17;

            let j = (rng_state % (i as u64 + 1)) as usize;
            perm.swap(i, j);
        }

        // Double the table to avoid index wrapping
        for i in 0..256 {
            perm[256 + i] = perm[i];
        }

        Self { perm }
    }

    #[inline]
    fn get(&self, index: usize) -> usize {
        self.perm[index & 511] as usize
    }
}

/// Seeded simplex noise generator.
///
/// Produces smooth, continuous values in `[-1, 1]`.
#[derive(Clone)]
pub struct SimplexNoise {
    perm_table: PermutationTable,
}

impl SimplexNoise {
    /// Skewing factor for 2D simplex grid.
    const F2: f64 = 0.366_025_403_784_439; // (sqrt(3) - 1) / 2
    /// Unskewing factor for 2D simplex grid.
    const G2: f64 = 0.211_324_865_405_187; // (3 - sqrt(3)) / 6
    /// Skewing factor for 3D simplex grid.
    const F3: f64 = 1.0 / 3.0;
    /// Unskewing factor for 3D simplex grid.
    const G3: f64 = 1.0 / 6.0;

    /// Creates a new simplex noise generator from a seed.
    #[must_use]
    pub fn new(seed: NoiseSeed) -> Self {
        Self {
            perm_table: PermutationTable::new(seed),
        }
    }

    /// Samples 2D simplex noise. Returns a value in `[-1, 1]`.
    #[must_use]
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let skew = (x + y) * Self::F2;
        let i = fast_floor(x + skew);
        let j = fast_floor(y + skew);

        let unskew = f64::from(i + j) * Self::G2;
        let x0 = x - (f64::from(i) - unskew);
        let y0 = y - (f64::from(j) - unskew);

        // Upper or lower triangle
        let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };

        let x1 = x0 - f64::from(i1) + Self::G2;
        let y1 = y0 - f64::from(j1) + Self::G2;
        let x2 = x0 - 1.0 + 2.0 * Self::G2;
        let y2 = y0 - 1.0 + 2.0 * Self::G2;

        let ii = (i & 255) as usize;
        let jj = (j & 255) as usize;
        let p = &self.perm_table;

        let gi0 = p.get(ii + p.get(jj));
        let gi1 = p.get(ii + i1 as usize + p.get(jj + j1 as usize));
        let gi2 = p.get(ii + 1 + p.get(jj + 1));

        let n = Self::corner2(x0, y0, gi0)
            + Self::corner2(x1, y1, gi1)
            + Self::corner2(x2, y2, gi2);

        // 70 normalizes the sum to [-1, 1]
        (70.0 * n).clamp(-1.0, 1.0)
    }

    /// Samples 3D simplex noise. Returns a value in `[-1, 1]`.
    #[must_use]
    pub fn sample3(&self, x: f64, y: f64, z: f64) -> f64 {
        let skew = (x + y + z) * Self::F3;
        let i = fast_floor(x + skew);
        let j = fast_floor(y + skew);
        let k = fast_floor(z + skew);

        let unskew = f64::from(i + j + k) * Self::G3;
        let x0 = x - (f64::from(i) - unskew);
        let y0 = y - (f64::from(j) - unskew);
        let z0 = z - (f64::from(k) - unskew);

        // Which of the six tetrahedra we are in
        let (o1, o2) = if x0 >= y0 {
            if y0 >= z0 {
                ([1, 0, 0], [1, 1, 0])
            } else if x0 >= z0 {
                ([1, 0, 0], [1, 0, 1])
            } else {
                ([0, 0, 1], [1, 0, 1])
            }
        } else if y0 < z0 {
            ([0, 0, 1], [0, 1, 1])
        } else if x0 < z0 {
            ([0, 1, 0], [0, 1, 1])
        } else {
            ([0, 1, 0], [1, 1, 0])
        };

        let corner = |o: [usize; 3], g: f64| {
            (
                x0 - o[0] as f64 + g,
                y0 - o[1] as f64 + g,
                z0 - o[2] as f64 + g,
            )
        };
        let c1 = corner(o1, Self::G3);
        let c2 = corner(o2, 2.0 * Self::G3);
        let c3 = corner([1, 1, 1], 3.0 * Self::G3);

        let ii = (i & 255) as usize;
        let jj = (j & 255) as usize;
        let kk = (k & 255) as usize;
        let p = &self.perm_table;
        let hash = |o: [usize; 3]| p.get(ii + o[0] + p.get(jj + o[1] + p.get(kk + o[2])));

        let n = Self::corner3((x0, y0, z0), hash([0, 0, 0]))
            + Self::corner3(c1, hash(o1))
            + Self::corner3(c2, hash(o2))
            + Self::corner3(c3, hash([1, 1, 1]));

        // 32 normalizes the sum to [-1, 1]
        (32.0 * n).clamp(-1.0, 1.0)
    }

    /// 3D noise remapped to `[0, 1]`, the form thresholds are written in.
    #[inline]
    #[must_use]
    pub fn sample3_unit(&self, x: f64, y: f64, z: f64) -> f64 {
        (self.sample3(x, y, z) + 1.0) * 0.5
    }

    /// 2D noise remapped to `[0, 1]`.
    #[inline]
    #[must_use]
    pub fn sample_unit(&self, x: f64, y: f64) -> f64 {
        (self.sample(x, y) + 1.0) * 0.5
    }

    /// Fractal 3D noise: `octaves` layers, each at `lacunarity` times the
    /// frequency and `persistence` times the amplitude of the previous one.
    ///
    /// Returns a value in `[-1, 1]`.
    #[must_use]
    pub fn octaved3(
        &self,
        x: f64,
        y: f64,
        z: f64,
        octaves: u32,
        persistence: f64,
        lacunarity: f64,
    ) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_amplitude = 0.0;

        for _ in 0..octaves.max(1) {
            total += self.sample3(x * frequency, y * frequency, z * frequency) * amplitude;
            max_amplitude += amplitude;
            amplitude *= persistence;
            frequency *= lacunarity;
        }

        total / max_amplitude
    }

    #[inline]
    fn corner2(x: f64, y: f64, hash: usize) -> f64 {
        let t = 0.5 - x * x - y * y;
        if t < 0.0 {
            0.0
        } else {
            let g = PermutationTable::GRAD2[hash % 12];
            let t2 = t * t;
            t2 * t2 * (x * f64::from(g[0]) + y * f64::from(g[1]))
        }
    }

    #[inline]
    fn corner3((x, y, z): (f64, f64, f64), hash: usize) -> f64 {
        let t = 0.6 - x * x - y * y - z * z;
        if t < 0.0 {
            0.0
        } else {
            let g = PermutationTable::GRAD3[hash % 12];
            let t2 = t * t;
            t2 * t2 * (x * f64::from(g[0]) + y * f64::from(g[1]) + z * f64::from(g[2]))
        }
    }
}

/// Fast floor that stays in `i32`.
#[inline]
fn fast_floor(x: f64) -> i32 {
    let xi = x as i32;
    if x < f64::from(xi) { xi - 1 } else { xi }
}
