//! # Marching-Cubes Case Tables
//!
//! Static lookup data of the cube triangulation.
//!
//! ## Cube conventions
//!
//! Corner `c` of a cube sits at offset `(c & 1, (c >> 1) & 1, (c >> 2) & 1)`.
//! A corner pattern is the 8-bit mask of corners lying on the solid side.
//! Patterns fall into the 15 classes (cases 0-14) of the marching-cubes
//! literature under cube rotations and complement; the tables here map each
//! pattern to its case, list the intersected edges and flag the faces whose
//! sign pattern is ambiguous (diagonal pairs of equal sign).

// =============================================================================
// GEOMETRY TABLES
// =============================================================================

/// Corner pair of each cube edge, lower corner first.
///
/// Edges 0-3 run along x, 4-7 along y and 8-11 along z.
pub const EDGE_CORNERS: [(usize, usize); 12] = [
    (0, 1), (2, 3), (4, 5), (6, 7),
    (0, 2), (1, 3), (4, 6), (5, 7),
    (0, 4), (1, 5), (2, 6), (3, 7),
];

/// Axis of each cube edge.
pub const EDGE_AXIS: [usize; 12] = [0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2];

/// Corners of each cube face, counter-clockwise seen from outside the cube.
///
/// Faces 0/1 are the -x/+x faces, 2/3 the -y/+y and 4/5 the -z/+z faces.
pub const FACE_CORNERS: [[usize; 4]; 6] = [
    [0, 4, 6, 2],
    [1, 3, 7, 5],
    [0, 1, 5, 4],
    [2, 6, 7, 3],
    [0, 2, 3, 1],
    [4, 5, 7, 6],
];

/// Corners of each face in a canonical order shared by both cubes adjacent
/// to the face: the two in-plane axes in increasing order, visiting local
/// coordinates (0,0), (1,0), (1,1), (0,1).
pub const FACE_CANONICAL_CORNERS: [[usize; 4]; 6] = [
    [0, 2, 6, 4],
    [1, 3, 7, 5],
    [0, 1, 5, 4],
    [2, 3, 7, 6],
    [0, 1, 3, 2],
    [4, 5, 7, 6],
];

/// Bit mask of the two faces adjacent to each edge.
pub const EDGE_FACES: [u8; 12] = build_edge_faces();

/// Edge index joining two corners, or [`NO_EDGE`] for non-adjacent corners.
pub const EDGE_BETWEEN: [[u8; 8]; 8] = build_edge_between();

/// Marker for "no edge" entries.
pub const NO_EDGE: u8 = u8::MAX;

/// Cases whose two contours may be joined through the cube interior.
pub const INTERIOR_AMBIGUOUS_CASES: u16 =
    (1 << 4) | (1 << 6) | (1 << 7) | (1 << 10) | (1 << 12) | (1 << 13);

const fn build_edge_between() -> [[u8; 8]; 8] {
    let mut table = [[NO_EDGE; 8]; 8];
    let mut e = 0;
    while e < 12 {
        let (a, b) = EDGE_CORNERS[e];
        table[a][b] = e as u8;
        table[b][a] = e as u8;
        e += 1;
    }
    table
}

const fn build_edge_faces() -> [u8; 12] {
    let between = build_edge_between();
    let mut table = [0u8; 12];
    let mut f = 0;
    while f < 6 {
        let mut q = 0;
        while q < 4 {
            let a = FACE_CORNERS[f][q];
            let b = FACE_CORNERS[f][(q + 1) % 4];
            table[between[a][b] as usize] |= 1 << f;
            q += 1;
        }
        f += 1;
    }
    table
}

/// Returns the case number (0-14) of a corner pattern.
#[inline]
pub fn case_of(pattern: u8) -> u8 {
    CASES[pattern as usize][0]
}

/// Returns true if the pattern belongs to a case with an interior
/// ambiguity.
#[inline]
pub fn has_interior_ambiguity(pattern: u8) -> bool {
    INTERIOR_AMBIGUOUS_CASES & (1 << case_of(pattern)) != 0
}

// =============================================================================
// CASE TABLES
// =============================================================================

/// Case number and configuration index (running number of the pattern
/// within its case) of every corner pattern.
pub static CASES: [[u8; 2]; 256] = [
    [ 0,  0], [ 1,  0], [ 1,  1], [ 2,  0], [ 1,  2], [ 2,  1], [ 3,  0], [ 5,  0],
    [ 1,  3], [ 3,  1], [ 2,  2], [ 5,  1], [ 2,  3], [ 5,  2], [ 5,  3], [ 8,  0],
    [ 1,  4], [ 2,  4], [ 3,  2], [ 5,  4], [ 3,  3], [ 5,  5], [ 7,  0], [ 9,  0],
    [ 4,  0], [ 6,  0], [ 6,  1], [14,  0], [ 6,  2], [11,  0], [12,  0], [ 5,  6],
    [ 1,  5], [ 3,  4], [ 2,  5], [ 5,  7], [ 4,  1], [ 6,  3], [ 6,  4], [11,  1],
    [ 3,  5], [ 7,  1], [ 5,  8], [ 9,  1], [ 6,  5], [12,  1], [14,  1], [ 5,  9],
    [ 2,  6], [ 5, 10], [ 5, 11], [ 8,  1], [ 6,  6], [14,  2], [12,  2], [ 5, 12],
    [ 6,  7], [12,  3], [11,  2], [ 5, 13], [10,  0], [ 6,  8], [ 6,  9], [ 2,  7],
    [ 1,  6], [ 3,  6], [ 4,  2], [ 6, 10], [ 2,  8], [ 5, 14], [ 6, 11], [14,  3],
    [ 3,  7], [ 7,  2], [ 6, 12], [12,  4], [ 5, 15], [ 9,  2], [11,  3], [ 5, 16],
    [ 2,  9], [ 5, 17], [ 6, 13], [11,  4], [ 5, 18], [ 8,  2], [12,  5], [ 5, 19],
    [ 6, 14], [12,  6], [10,  1], [ 6, 15], [14,  4], [ 5, 20], [ 6, 16], [ 2, 10],
    [ 3,  8], [ 7,  3], [ 6, 17], [12,  7], [ 6, 18], [12,  8], [10,  2], [ 6, 19],
    [ 7,  4], [13,  0], [12,  9], [ 7,  5], [12, 10], [ 7,  6], [ 6, 20], [ 3,  9],
    [ 5, 21], [ 9,  3], [14,  5], [ 5, 22], [11,  5], [ 5, 23], [ 6, 21], [ 2, 11],
    [12, 11], [ 7,  7], [ 6, 22], [ 3, 10], [ 6, 23], [ 3, 11], [ 4,  3], [ 1,  7],
    [ 1,  8], [ 4,  4], [ 3, 12], [ 6, 24], [ 3, 13], [ 6, 25], [ 7,  8], [12, 12],
    [ 2, 12], [ 6, 26], [ 5, 24], [11,  6], [ 5, 25], [14,  6], [ 9,  4], [ 5, 26],
    [ 3, 14], [ 6, 27], [ 7,  9], [12, 13], [ 7, 10], [12, 14], [13,  1], [ 7, 11],
    [ 6, 28], [10,  3], [12, 15], [ 6, 29], [12, 16], [ 6, 30], [ 7, 12], [ 3, 15],
    [ 2, 13], [ 6, 31], [ 5, 27], [14,  7], [ 6, 32], [10,  4], [12, 17], [ 6, 33],
    [ 5, 28], [12, 18], [ 8,  3], [ 5, 29], [11,  7], [ 6, 34], [ 5, 30], [ 2, 14],
    [ 5, 31], [11,  8], [ 9,  5], [ 5, 32], [12, 19], [ 6, 35], [ 7, 13], [ 3, 16],
    [14,  8], [ 6, 36], [ 5, 33], [ 2, 15], [ 6, 37], [ 4,  5], [ 3, 17], [ 1,  9],
    [ 2, 16], [ 6, 38], [ 6, 39], [10,  5], [ 5, 34], [11,  9], [12, 20], [ 6, 40],
    [ 5, 35], [12, 21], [14,  9], [ 6, 41], [ 8,  4], [ 5, 36], [ 5, 37], [ 2, 17],
    [ 5, 38], [14, 10], [12, 22], [ 6, 42], [ 9,  6], [ 5, 39], [ 7, 14], [ 3, 18],
    [11, 10], [ 6, 43], [ 6, 44], [ 4,  6], [ 5, 40], [ 2, 18], [ 3, 19], [ 1, 10],
    [ 5, 41], [12, 23], [11, 11], [ 6, 45], [14, 11], [ 6, 46], [ 6, 47], [ 4,  7],
    [ 9,  7], [ 7, 15], [ 5, 42], [ 3, 20], [ 5, 43], [ 3, 21], [ 2, 19], [ 1, 11],
    [ 8,  5], [ 5, 44], [ 5, 45], [ 2, 20], [ 5, 46], [ 2, 21], [ 3, 22], [ 1, 12],
    [ 5, 47], [ 3, 23], [ 2, 22], [ 1, 13], [ 2, 23], [ 1, 14], [ 1, 15], [ 0,  1],
];

/// Intersected edges of every corner pattern (bit `e` set if edge `e`
/// joins corners on different sides).
pub static EDGE_MASK: [u16; 256] = [
    0x000, 0x111, 0x221, 0x330, 0x412, 0x503, 0x633, 0x722,
    0x822, 0x933, 0xa03, 0xb12, 0xc30, 0xd21, 0xe11, 0xf00,
    0x144, 0x055, 0x365, 0x274, 0x556, 0x447, 0x777, 0x666,
    0x966, 0x877, 0xb47, 0xa56, 0xd74, 0xc65, 0xf55, 0xe44,
    0x284, 0x395, 0x0a5, 0x1b4, 0x696, 0x787, 0x4b7, 0x5a6,
    0xaa6, 0xbb7, 0x887, 0x996, 0xeb4, 0xfa5, 0xc95, 0xd84,
    0x3c0, 0x2d1, 0x1e1, 0x0f0, 0x7d2, 0x6c3, 0x5f3, 0x4e2,
    0xbe2, 0xaf3, 0x9c3, 0x8d2, 0xff0, 0xee1, 0xdd1, 0xcc0,
    0x448, 0x559, 0x669, 0x778, 0x05a, 0x14b, 0x27b, 0x36a,
    0xc6a, 0xd7b, 0xe4b, 0xf5a, 0x878, 0x969, 0xa59, 0xb48,
    0x50c, 0x41d, 0x72d, 0x63c, 0x11e, 0x00f, 0x33f, 0x22e,
    0xd2e, 0xc3f, 0xf0f, 0xe1e, 0x93c, 0x82d, 0xb1d, 0xa0c,
    0x6cc, 0x7dd, 0x4ed, 0x5fc, 0x2de, 0x3cf, 0x0ff, 0x1ee,
    0xeee, 0xfff, 0xccf, 0xdde, 0xafc, 0xbed, 0x8dd, 0x9cc,
    0x788, 0x699, 0x5a9, 0x4b8, 0x39a, 0x28b, 0x1bb, 0x0aa,
    0xfaa, 0xebb, 0xd8b, 0xc9a, 0xbb8, 0xaa9, 0x999, 0x888,
    0x888, 0x999, 0xaa9, 0xbb8, 0xc9a, 0xd8b, 0xebb, 0xfaa,
    0x0aa, 0x1bb, 0x28b, 0x39a, 0x4b8, 0x5a9, 0x699, 0x788,
    0x9cc, 0x8dd, 0xbed, 0xafc, 0xdde, 0xccf, 0xfff, 0xeee,
    0x1ee, 0x0ff, 0x3cf, 0x2de, 0x5fc, 0x4ed, 0x7dd, 0x6cc,
    0xa0c, 0xb1d, 0x82d, 0x93c, 0xe1e, 0xf0f, 0xc3f, 0xd2e,
    0x22e, 0x33f, 0x00f, 0x11e, 0x63c, 0x72d, 0x41d, 0x50c,
    0xb48, 0xa59, 0x969, 0x878, 0xf5a, 0xe4b, 0xd7b, 0xc6a,
    0x36a, 0x27b, 0x14b, 0x05a, 0x778, 0x669, 0x559, 0x448,
    0xcc0, 0xdd1, 0xee1, 0xff0, 0x8d2, 0x9c3, 0xaf3, 0xbe2,
    0x4e2, 0x5f3, 0x6c3, 0x7d2, 0x0f0, 0x1e1, 0x2d1, 0x3c0,
    0xd84, 0xc95, 0xfa5, 0xeb4, 0x996, 0x887, 0xbb7, 0xaa6,
    0x5a6, 0x4b7, 0x787, 0x696, 0x1b4, 0x0a5, 0x395, 0x284,
    0xe44, 0xf55, 0xc65, 0xd74, 0xa56, 0xb47, 0x877, 0x966,
    0x666, 0x777, 0x447, 0x556, 0x274, 0x365, 0x055, 0x144,
    0xf00, 0xe11, 0xd21, 0xc30, 0xb12, 0xa03, 0x933, 0x822,
    0x722, 0x633, 0x503, 0x412, 0x330, 0x221, 0x111, 0x000,
];

/// Ambiguous faces of every corner pattern (bit `f` set if face `f` has its
/// solid corners on one diagonal and its empty corners on the other).
pub static AMBIGUOUS_FACES: [u8; 256] = [
    0b000000, 0b000000, 0b000000, 0b000000, 0b000000, 0b000000, 0b010000, 0b000000,
    0b000000, 0b010000, 0b000000, 0b000000, 0b000000, 0b000000, 0b000000, 0b000000,
    0b000000, 0b000000, 0b000100, 0b000000, 0b000001, 0b000000, 0b010101, 0b000000,
    0b000000, 0b010000, 0b000100, 0b000000, 0b000001, 0b000000, 0b000101, 0b000000,
    0b000000, 0b000100, 0b000000, 0b000000, 0b000000, 0b000100, 0b010000, 0b000000,
    0b000010, 0b010110, 0b000000, 0b000000, 0b000010, 0b000110, 0b000000, 0b000000,
    0b000000, 0b000000, 0b000000, 0b000000, 0b000001, 0b000000, 0b010001, 0b000000,
    0b000010, 0b010010, 0b000000, 0b000000, 0b000011, 0b000010, 0b000001, 0b000000,
    0b000000, 0b000001, 0b000000, 0b000001, 0b000000, 0b000000, 0b010000, 0b000000,
    0b001000, 0b011001, 0b001000, 0b001001, 0b000000, 0b000000, 0b000000, 0b000000,
    0b000000, 0b000000, 0b000100, 0b000000, 0b000000, 0b000000, 0b010100, 0b000000,
    0b001000, 0b011000, 0b001100, 0b001000, 0b000000, 0b000000, 0b000100, 0b000000,
    0b100000, 0b100101, 0b100000, 0b100001, 0b100000, 0b100100, 0b110000, 0b100000,
    0b101010, 0b111111, 0b101000, 0b101001, 0b100010, 0b100110, 0b100000, 0b100000,
    0b000000, 0b000000, 0b000000, 0b000000, 0b000000, 0b000000, 0b010000, 0b000000,
    0b001010, 0b011010, 0b001000, 0b001000, 0b000010, 0b000010, 0b000000, 0b000000,
    0b000000, 0b000000, 0b000010, 0b000010, 0b001000, 0b001000, 0b011010, 0b001010,
    0b000000, 0b010000, 0b000000, 0b000000, 0b000000, 0b000000, 0b000000, 0b000000,
    0b100000, 0b100000, 0b100110, 0b100010, 0b101001, 0b101000, 0b111111, 0b101010,
    0b100000, 0b110000, 0b100100, 0b100000, 0b100001, 0b100000, 0b100101, 0b100000,
    0b000000, 0b000100, 0b000000, 0b000000, 0b001000, 0b001100, 0b011000, 0b001000,
    0b000000, 0b010100, 0b000000, 0b000000, 0b000000, 0b000100, 0b000000, 0b000000,
    0b000000, 0b000000, 0b000000, 0b000000, 0b001001, 0b001000, 0b011001, 0b001000,
    0b000000, 0b010000, 0b000000, 0b000000, 0b000001, 0b000000, 0b000001, 0b000000,
    0b000000, 0b000001, 0b000010, 0b000011, 0b000000, 0b000000, 0b010010, 0b000010,
    0b000000, 0b010001, 0b000000, 0b000001, 0b000000, 0b000000, 0b000000, 0b000000,
    0b000000, 0b000000, 0b000110, 0b000010, 0b000000, 0b000000, 0b010110, 0b000010,
    0b000000, 0b010000, 0b000100, 0b000000, 0b000000, 0b000000, 0b000100, 0b000000,
    0b000000, 0b000101, 0b000000, 0b000001, 0b000000, 0b000100, 0b010000, 0b000000,
    0b000000, 0b010101, 0b000000, 0b000001, 0b000000, 0b000100, 0b000000, 0b000000,
    0b000000, 0b000000, 0b000000, 0b000000, 0b000000, 0b000000, 0b010000, 0b000000,
    0b000000, 0b010000, 0b000000, 0b000000, 0b000000, 0b000000, 0b000000, 0b000000,
];
