use crate::logic::board::Piece;
use std::sync::OnceLock;

// 13 piece rows (index 0 unused, 1-6 white P..K, 7-12 black P..K) so a
// piece's key row is exactly its piece_index.
const NUM_PIECE_ROWS: usize = 13;
const NUM_SQUARES: usize = 64;

const SEED: u64 = 0x1234_5678_ABCD_EF01;

pub struct ZobristKeys {
    pub piece_keys: [[u64; NUM_SQUARES]; NUM_PIECE_ROWS],
    pub side_key: u64,
    pub castle_keys: [u64; 16],
    pub ep_keys: [u64; 8],
}

// Simple XorShift RNG for deterministic keys without dependencies
struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

impl ZobristKeys {
    fn new() -> Self {
        let mut rng = XorShift64::new(SEED);
        let mut piece_keys = [[0; NUM_SQUARES]; NUM_PIECE_ROWS];
        for row in &mut piece_keys {
            for key in row.iter_mut() {
                *key = rng.next();
            }
        }
        let side_key = rng.next();
        let mut castle_keys = [0; 16];
        for key in &mut castle_keys {
            *key = rng.next();
        }
        let mut ep_keys = [0; 8];
        for key in &mut ep_keys {
            *key = rng.next();
        }

        Self {
            piece_keys,
            side_key,
            castle_keys,
            ep_keys,
        }
    }

    pub fn get() -> &'static Self {
        static INSTANCE: OnceLock<ZobristKeys> = OnceLock::new();
        INSTANCE.get_or_init(ZobristKeys::new)
    }

    pub fn piece_key(&self, piece: Piece, sq: usize) -> u64 {
        self.piece_keys[piece.index()][sq]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_deterministic() {
        // Two engine processes must hash positions identically.
        let a = ZobristKeys::new();
        let b = ZobristKeys::new();
        assert_eq!(a.side_key, b.side_key);
        assert_eq!(a.piece_keys[1][0], b.piece_keys[1][0]);
        assert_eq!(a.castle_keys, b.castle_keys);
        assert_eq!(a.ep_keys, b.ep_keys);
    }

    #[test]
    fn get_returns_same_instance() {
        let a = ZobristKeys::get() as *const ZobristKeys;
        let b = ZobristKeys::get() as *const ZobristKeys;
        assert_eq!(a, b);
    }

    #[test]
    fn keys_are_distinct() {
        let keys = ZobristKeys::get();
        assert_ne!(keys.piece_keys[1][0], keys.piece_keys[1][1]);
        assert_ne!(keys.piece_keys[1][0], keys.piece_keys[7][0]);
        assert_ne!(keys.side_key, 0);
    }
}
