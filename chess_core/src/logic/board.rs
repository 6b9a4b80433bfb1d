use crate::engine::zobrist::ZobristKeys;
use crate::engine::{Move, FLAG_CASTLE, FLAG_DOUBLE_PUSH, FLAG_EN_PASSANT};
use serde::{Deserialize, Serialize};
use serde_big_array::BigArray;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

// Castling-rights mask bits
pub const CASTLE_WK: u8 = 1;
pub const CASTLE_WQ: u8 = 2;
pub const CASTLE_BK: u8 = 4;
pub const CASTLE_BQ: u8 = 8;

// Step offsets on the 64-square mailbox. Every walker that applies them
// must re-check the file delta, otherwise steps wrap around the board edge.
pub const KNIGHT_DIRS: [i32; 8] = [17, 15, 10, 6, -6, -10, -15, -17];
pub const BISHOP_DIRS: [i32; 4] = [9, 7, -7, -9];
pub const ROOK_DIRS: [i32; 4] = [8, 1, -1, -8];
pub const KING_DIRS: [i32; 8] = [1, -1, 8, -8, 9, 7, -7, -9];

// Repetition stack bound; ample for any real game plus search depth.
const MAX_HISTORY: usize = 1024;

#[must_use]
pub const fn sq_file(sq: usize) -> usize {
    sq & 7
}

#[must_use]
pub const fn sq_rank(sq: usize) -> usize {
    sq >> 3
}

#[must_use]
pub const fn make_sq(file: usize, rank: usize) -> usize {
    (rank << 3) | file
}

/// Reflects a square across the horizontal center line (a1 <-> a8).
#[must_use]
pub const fn mirror_sq(sq: usize) -> usize {
    sq ^ 56
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Color {
    White,
    Black,
}

impl Color {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Self::White => 0,
            Self::Black => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PieceType {
    Pawn = 1,
    Knight = 2,
    Bishop = 3,
    Rook = 4,
    Queen = 5,
    King = 6,
}

impl PieceType {
    pub const fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    pub piece_type: PieceType,
    pub color: Color,
}

impl Piece {
    #[must_use]
    pub const fn new(piece_type: PieceType, color: Color) -> Self {
        Self { piece_type, color }
    }

    /// Hash-table row for this piece: 1-6 white P..K, 7-12 black P..K.
    pub const fn index(self) -> usize {
        match self.color {
            Color::White => self.piece_type.index(),
            Color::Black => 6 + self.piece_type.index(),
        }
    }
}

/// Saved side effects of a move; together with the move itself this is
/// everything `unmake_move` needs to restore the position exactly.
#[derive(Debug, Clone, Copy, Default)]
pub struct UndoInfo {
    pub castling: u8,
    pub ep_square: Option<usize>,
    pub halfmove: i32,
    pub hash: u64,
}

/// The 64-cell mailbox is the ground truth; hash, king squares and the
/// repetition stack are maintained incrementally by make/unmake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    #[serde(with = "BigArray")]
    pub grid: [Option<Piece>; 64],
    pub side: Color,
    pub castling: u8,
    pub ep_square: Option<usize>,
    pub halfmove: i32,
    pub fullmove: i32,
    pub hash: u64,
    pub king_sq: [Option<usize>; 2],
    pub history: Vec<u64>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    #[must_use]
    pub fn new() -> Self {
        Self {
            grid: [None; 64],
            side: Color::White,
            castling: 0,
            ep_square: None,
            halfmove: 0,
            fullmove: 1,
            hash: 0,
            king_sq: [None; 2],
            history: Vec::with_capacity(MAX_HISTORY),
        }
    }

    #[must_use]
    pub fn from_fen(fen: &str) -> Self {
        let mut board = Self::new();
        board.set_fen(fen);
        board
    }

    fn clear(&mut self) {
        self.grid = [None; 64];
        self.side = Color::White;
        self.castling = 0;
        self.ep_square = None;
        self.halfmove = 0;
        self.fullmove = 1;
        self.hash = 0;
        self.king_sq = [None; 2];
        self.history.clear();
    }

    /// Parses the six standard FEN fields. Lenient: unknown characters and
    /// missing fields are coerced to a consistent (possibly empty) board,
    /// callers that care about validity must pre-validate.
    pub fn set_fen(&mut self, fen: &str) {
        self.clear();
        let mut parts = fen.split_whitespace();

        // 1. Piece placement, from a8
        let mut sq: i32 = 56;
        for ch in parts.next().unwrap_or("").chars() {
            match ch {
                '/' => sq -= 16,
                '1'..='8' => sq += ch as i32 - '0' as i32,
                _ => {
                    if (0..64).contains(&sq) {
                        if let Some(piece) = piece_from_char(ch) {
                            self.grid[sq as usize] = Some(piece);
                            if piece.piece_type == PieceType::King {
                                self.king_sq[piece.color.index()] = Some(sq as usize);
                            }
                        }
                    }
                    sq += 1;
                }
            }
        }

        // 2. Side to move
        if parts.next() == Some("b") {
            self.side = Color::Black;
        }

        // 3. Castling rights
        if let Some(castle) = parts.next() {
            for ch in castle.chars() {
                match ch {
                    'K' => self.castling |= CASTLE_WK,
                    'Q' => self.castling |= CASTLE_WQ,
                    'k' => self.castling |= CASTLE_BK,
                    'q' => self.castling |= CASTLE_BQ,
                    _ => {}
                }
            }
        }

        // 4. En passant target
        if let Some(ep) = parts.next() {
            let b = ep.as_bytes();
            if b.len() == 2 && (b'a'..=b'h').contains(&b[0]) && (b'1'..=b'8').contains(&b[1]) {
                self.ep_square = Some(make_sq((b[0] - b'a') as usize, (b[1] - b'1') as usize));
            }
        }

        // 5-6. Clocks
        self.halfmove = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
        self.fullmove = parts.next().and_then(|s| s.parse().ok()).unwrap_or(1);

        self.hash = self.calculate_hash();
        self.history.push(self.hash);
    }

    #[must_use]
    pub fn to_fen(&self) -> String {
        let mut fen = String::new();
        for r in (0..8).rev() {
            let mut empty = 0;
            for f in 0..8 {
                match self.grid[make_sq(f, r)] {
                    None => empty += 1,
                    Some(piece) => {
                        if empty > 0 {
                            fen.push_str(&empty.to_string());
                            empty = 0;
                        }
                        fen.push(piece_to_char(piece));
                    }
                }
            }
            if empty > 0 {
                fen.push_str(&empty.to_string());
            }
            if r > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(if self.side == Color::White { 'w' } else { 'b' });

        fen.push(' ');
        if self.castling == 0 {
            fen.push('-');
        } else {
            if self.castling & CASTLE_WK != 0 {
                fen.push('K');
            }
            if self.castling & CASTLE_WQ != 0 {
                fen.push('Q');
            }
            if self.castling & CASTLE_BK != 0 {
                fen.push('k');
            }
            if self.castling & CASTLE_BQ != 0 {
                fen.push('q');
            }
        }

        fen.push(' ');
        match self.ep_square {
            Some(ep) => {
                fen.push((b'a' + sq_file(ep) as u8) as char);
                fen.push((b'1' + sq_rank(ep) as u8) as char);
            }
            None => fen.push('-'),
        }

        fen.push_str(&format!(" {} {}", self.halfmove, self.fullmove));
        fen
    }

    /// Folds the full position into a hash from scratch. Make/unmake keep
    /// `self.hash` equal to this incrementally.
    #[must_use]
    pub fn calculate_hash(&self) -> u64 {
        let keys = ZobristKeys::get();
        let mut hash = 0;
        for (sq, cell) in self.grid.iter().enumerate() {
            if let Some(piece) = cell {
                hash ^= keys.piece_key(*piece, sq);
            }
        }
        if self.side == Color::Black {
            hash ^= keys.side_key;
        }
        hash ^= keys.castle_keys[self.castling as usize];
        if let Some(ep) = self.ep_square {
            hash ^= keys.ep_keys[sq_file(ep)];
        }
        hash
    }

    pub fn make_move(&mut self, m: &Move) -> UndoInfo {
        let undo = UndoInfo {
            castling: self.castling,
            ep_square: self.ep_square,
            halfmove: self.halfmove,
            hash: self.hash,
        };
        let keys = ZobristKeys::get();
        let from = m.from as usize;
        let to = m.to as usize;

        let Some(piece) = self.grid[from] else {
            return undo;
        };

        // Lift the mover off its source square
        self.hash ^= keys.piece_key(piece, from);
        self.grid[from] = None;

        // Remove the captured piece; en passant captures away from `to`
        if let Some(captured) = m.captured {
            if m.flags & FLAG_EN_PASSANT != 0 {
                let cap_sq = make_sq(sq_file(to), sq_rank(from));
                self.hash ^= keys.piece_key(captured, cap_sq);
                self.grid[cap_sq] = None;
            } else {
                self.hash ^= keys.piece_key(captured, to);
            }
        }

        // Drop the mover (or its promotion) on the destination
        let placed = match m.promotion {
            Some(pt) => Piece::new(pt, piece.color),
            None => piece,
        };
        self.grid[to] = Some(placed);
        self.hash ^= keys.piece_key(placed, to);

        if piece.piece_type == PieceType::King {
            self.king_sq[piece.color.index()] = Some(to);
        }

        // Relocate the rook on castling
        if m.flags & FLAG_CASTLE != 0 {
            let rook = Piece::new(PieceType::Rook, piece.color);
            let rank = sq_rank(from);
            let (rook_from, rook_to) = if sq_file(to) == 6 {
                (make_sq(7, rank), make_sq(5, rank))
            } else {
                (make_sq(0, rank), make_sq(3, rank))
            };
            self.hash ^= keys.piece_key(rook, rook_from);
            self.hash ^= keys.piece_key(rook, rook_to);
            self.grid[rook_from] = None;
            self.grid[rook_to] = Some(rook);
        }

        // Castling rights: king moves clear both bits of that side, any
        // move touching a corner square clears the matching rook bit
        // (covers rook moves and rook captures alike).
        self.hash ^= keys.castle_keys[self.castling as usize];
        if piece.piece_type == PieceType::King {
            match piece.color {
                Color::White => self.castling &= !(CASTLE_WK | CASTLE_WQ),
                Color::Black => self.castling &= !(CASTLE_BK | CASTLE_BQ),
            }
        }
        if from == 0 || to == 0 {
            self.castling &= !CASTLE_WQ;
        }
        if from == 7 || to == 7 {
            self.castling &= !CASTLE_WK;
        }
        if from == 56 || to == 56 {
            self.castling &= !CASTLE_BQ;
        }
        if from == 63 || to == 63 {
            self.castling &= !CASTLE_BK;
        }
        self.hash ^= keys.castle_keys[self.castling as usize];

        // En passant target lives for exactly one reply
        if let Some(ep) = self.ep_square {
            self.hash ^= keys.ep_keys[sq_file(ep)];
        }
        self.ep_square = None;
        if m.flags & FLAG_DOUBLE_PUSH != 0 && piece.piece_type == PieceType::Pawn {
            let ep = (from + to) / 2;
            self.ep_square = Some(ep);
            self.hash ^= keys.ep_keys[sq_file(ep)];
        }

        if piece.piece_type == PieceType::Pawn || m.captured.is_some() {
            self.halfmove = 0;
        } else {
            self.halfmove += 1;
        }

        self.side = self.side.opposite();
        self.hash ^= keys.side_key;
        if self.side == Color::White {
            self.fullmove += 1;
        }

        if self.history.len() < MAX_HISTORY {
            self.history.push(self.hash);
        }

        undo
    }

    pub fn unmake_move(&mut self, m: &Move, undo: &UndoInfo) {
        let from = m.from as usize;
        let to = m.to as usize;

        // Flip side first so it names the mover again
        self.side = self.side.opposite();
        let mover = self.side;

        let Some(moved) = self.grid[to] else {
            return;
        };
        // A promoted piece goes back as the pawn it was
        let piece = match m.promotion {
            Some(_) => Piece::new(PieceType::Pawn, mover),
            None => moved,
        };

        self.grid[to] = None;
        self.grid[from] = Some(piece);

        if let Some(captured) = m.captured {
            if m.flags & FLAG_EN_PASSANT != 0 {
                self.grid[make_sq(sq_file(to), sq_rank(from))] = Some(captured);
            } else {
                self.grid[to] = Some(captured);
            }
        }

        if m.flags & FLAG_CASTLE != 0 {
            let rook = Piece::new(PieceType::Rook, mover);
            let rank = sq_rank(from);
            if sq_file(to) == 6 {
                self.grid[make_sq(7, rank)] = Some(rook);
                self.grid[make_sq(5, rank)] = None;
            } else {
                self.grid[make_sq(0, rank)] = Some(rook);
                self.grid[make_sq(3, rank)] = None;
            }
        }

        if piece.piece_type == PieceType::King {
            self.king_sq[mover.index()] = Some(from);
        }

        self.castling = undo.castling;
        self.ep_square = undo.ep_square;
        self.halfmove = undo.halfmove;
        self.hash = undo.hash;
        if self.side == Color::Black {
            self.fullmove -= 1;
        }

        self.history.pop();
    }

    /// Hands the move to the opponent: side and en passant flip, the
    /// repetition stack is left untouched.
    pub fn make_null_move(&mut self) -> UndoInfo {
        let undo = UndoInfo {
            castling: self.castling,
            ep_square: self.ep_square,
            halfmove: self.halfmove,
            hash: self.hash,
        };
        let keys = ZobristKeys::get();
        if let Some(ep) = self.ep_square {
            self.hash ^= keys.ep_keys[sq_file(ep)];
        }
        self.ep_square = None;
        self.side = self.side.opposite();
        self.hash ^= keys.side_key;
        undo
    }

    pub fn unmake_null_move(&mut self, undo: &UndoInfo) {
        self.side = self.side.opposite();
        self.ep_square = undo.ep_square;
        self.hash = undo.hash;
    }

    /// Counts earlier occurrences of the current position. Only entries
    /// with the same side to move can match, hence the stride of two.
    #[must_use]
    pub fn count_repetitions(&self) -> usize {
        let mut count = 0;
        let len = self.history.len();
        let mut i = len as i32 - 3;
        while i >= 0 {
            if self.history[i as usize] == self.hash {
                count += 1;
            }
            i -= 2;
        }
        count
    }

    /// Fifty-move rule or third occurrence of the current position.
    #[must_use]
    pub fn is_draw(&self) -> bool {
        self.halfmove >= 100 || self.count_repetitions() >= 2
    }
}

fn piece_from_char(ch: char) -> Option<Piece> {
    let color = if ch.is_ascii_uppercase() {
        Color::White
    } else {
        Color::Black
    };
    let piece_type = match ch.to_ascii_lowercase() {
        'p' => PieceType::Pawn,
        'n' => PieceType::Knight,
        'b' => PieceType::Bishop,
        'r' => PieceType::Rook,
        'q' => PieceType::Queen,
        'k' => PieceType::King,
        _ => return None,
    };
    Some(Piece::new(piece_type, color))
}

fn piece_to_char(piece: Piece) -> char {
    let ch = match piece.piece_type {
        PieceType::Pawn => 'p',
        PieceType::Knight => 'n',
        PieceType::Bishop => 'b',
        PieceType::Rook => 'r',
        PieceType::Queen => 'q',
        PieceType::King => 'k',
    };
    if piece.color == Color::White {
        ch.to_ascii_uppercase()
    } else {
        ch
    }
}
