//! Deterministic board generation.
//!
//! The server stores no per-player boards. Instead, a board is a pure
//! function of `(room code, player name)`: clients regenerate it locally on
//! reconnect and re-mark cells from the server's `numbers_drawn` set. That
//! only works if every implementation produces bit-identical output, so the
//! whole pipeline is pinned down exactly:
//!
//! 1. seed = [`hash32`] of the UTF-8 bytes of `"{room}|{name}"`
//! 2. PRNG = [`Xorshift32`] over that seed, outputs normalized to `[0, 1)`
//! 3. Fisher–Yates shuffle of `[1..=25]` driven by successive outputs
//!
//! `rand` is deliberately not used here: swapping PRNGs would silently
//! change every board in the wild.

/// Number of cells on a board.
///
/// Mirrors `BOARD_CELLS` in `bingo-protocol` (this crate stays
/// dependency-free so clients can embed it standalone).
pub const CELLS: usize = 25;

/// Rolling polynomial hash with multiplier 31 over the input bytes,
/// wrapping at 32 bits.
pub fn hash32(input: &str) -> u32 {
    input
        .bytes()
        .fold(0u32, |h, b| h.wrapping_mul(31).wrapping_add(u32::from(b)))
}

/// The xorshift32 generator (Marsaglia), `13/17/5` shift triplet.
///
/// Note: a zero seed yields an all-zero sequence. That is the documented
/// behavior of the hash-seeded pipeline, not something to silently patch —
/// clients run the identical sequence.
#[derive(Debug, Clone)]
pub struct Xorshift32 {
    state: u32,
}

impl Xorshift32 {
    /// Creates a generator from a raw seed.
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Returns the next raw 32-bit output.
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Returns the next output normalized to `[0, 1)`.
    pub fn next_unit(&mut self) -> f64 {
        f64::from(self.next_u32()) / 4_294_967_296.0
    }
}

/// Generates the 25-cell board for `name` in `room`: a permutation of
/// `1..=25`, identical across calls and across implementations.
pub fn generate_board(room: &str, name: &str) -> [u8; CELLS] {
    let seed = hash32(&format!("{room}|{name}"));
    let mut rng = Xorshift32::new(seed);

    let mut cells: [u8; CELLS] = std::array::from_fn(|i| (i + 1) as u8);
    // Fisher–Yates, high index down; j = floor(r * (i + 1)).
    for i in (1..CELLS).rev() {
        let j = (rng.next_unit() * (i as f64 + 1.0)) as usize;
        cells.swap(i, j);
    }
    cells
}
