// src/odometer.rs
use smallvec::SmallVec;

/// Coordinate tuple. Most scientific variables have rank <= 4, so the
/// tuple lives inline in that case.
pub type Coord = SmallVec<[u64; 4]>;

/// Enumerates every coordinate tuple of an N-dimensional box in
/// row-major order, carrying between dimensions like a mechanical
/// odometer: the last dimension varies fastest, and overflowing it
/// carries into the next-slower one.
///
/// The box may be anchored at an `origin` other than zero (used for the
/// chunk-grid pass, where the first overlapping chunk is rarely chunk
/// zero) and may carry a per-dimension stride vector mapping the current
/// tuple onto a flat offset.
///
/// A single traversal visits each coordinate exactly once; after
/// exhaustion `next()` keeps returning `false` until `reset()`.
///
/// # Example
///
/// ```
/// use ndchunk::odometer::Odometer;
///
/// let mut od = Odometer::new(&[2, 3]);
/// let mut seen = Vec::new();
/// while !od.is_exhausted() {
///     seen.push(od.indices().to_vec());
///     od.next();
/// }
/// assert_eq!(seen.len(), 6);
/// assert_eq!(seen[0], vec![0, 0]);
/// assert_eq!(seen[1], vec![0, 1]);
/// assert_eq!(seen[3], vec![1, 0]);
/// ```
#[derive(Debug, Clone)]
pub struct Odometer {
    origin: Coord,
    extents: Coord,
    strides: Option<Coord>,
    current: Coord,
    exhausted: bool,
}

impl Odometer {
    /// Box of the given extents, anchored at zero.
    pub fn new(extents: &[u64]) -> Self {
        Self::with_origin(&vec![0; extents.len()], extents)
    }

    /// Box of the given extents, anchored at `origin`.
    ///
    /// A box with any zero extent is exhausted immediately. A rank-0 box
    /// yields exactly one empty coordinate.
    ///
    /// Panics when `origin` and `extents` disagree on rank.
    pub fn with_origin(origin: &[u64], extents: &[u64]) -> Self {
        assert_eq!(origin.len(), extents.len(), "origin rank must match extents");
        let exhausted = extents.iter().any(|&e| e == 0);
        Odometer {
            origin: origin.iter().copied().collect(),
            extents: extents.iter().copied().collect(),
            strides: None,
            current: origin.iter().copied().collect(),
            exhausted,
        }
    }

    /// Attach a flat-offset stride vector: `offset()` becomes the dot
    /// product of the current tuple with `strides`.
    ///
    /// Panics when `strides` does not match the box rank.
    pub fn with_strides(mut self, strides: &[u64]) -> Self {
        assert_eq!(strides.len(), self.extents.len(), "stride rank must match extents");
        self.strides = Some(strides.iter().copied().collect());
        self
    }

    /// Row-major stride vector for a box of the given extents, i.e. the
    /// flat-offset multiplier of each dimension.
    pub fn row_major_strides(extents: &[u64]) -> Coord {
        let mut strides: Coord = SmallVec::with_capacity(extents.len());
        let mut acc = 1u64;
        for &e in extents.iter().rev() {
            strides.push(acc);
            acc *= e;
        }
        strides.reverse();
        strides
    }

    pub fn rank(&self) -> usize {
        self.extents.len()
    }

    /// Total number of coordinates in the box.
    pub fn len(&self) -> u64 {
        self.extents.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// The current coordinate tuple. Only meaningful while not exhausted.
    pub fn indices(&self) -> &[u64] {
        &self.current
    }

    /// Flat offset of the current tuple under the attached stride vector.
    ///
    /// Panics if no stride vector was attached.
    pub fn offset(&self) -> u64 {
        let strides = self
            .strides
            .as_ref()
            .expect("offset() requires a stride vector");
        self.current
            .iter()
            .zip(strides.iter())
            .map(|(&c, &s)| c * s)
            .sum()
    }

    /// Advance the fastest-varying dimension by one, carrying into
    /// slower dimensions on overflow. Returns `false` once the slowest
    /// dimension has overflowed; the odometer stays exhausted until
    /// `reset()`.
    pub fn next(&mut self) -> bool {
        if self.exhausted {
            return false;
        }
        for d in (0..self.extents.len()).rev() {
            self.current[d] += 1;
            if self.current[d] < self.origin[d] + self.extents[d] {
                return true;
            }
            self.current[d] = self.origin[d];
        }
        // Slowest dimension carried out, or rank 0: one coordinate total.
        self.exhausted = true;
        false
    }

    /// Restart the traversal from the box origin.
    pub fn reset(&mut self) {
        self.current = self.origin.clone();
        self.exhausted = self.extents.iter().any(|&e| e == 0);
    }
}

/// Iterator adapter yielding owned coordinate tuples.
impl Iterator for Odometer {
    type Item = Coord;

    fn next(&mut self) -> Option<Coord> {
        if self.exhausted {
            return None;
        }
        let out: Coord = self.current.clone();
        Odometer::next(self);
        Some(out)
    }
}
