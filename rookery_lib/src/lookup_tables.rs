use once_cell::sync::Lazy;
use rookery_bitboards::*;

/// Per-square attack tables, built once on first use and never mutated.
pub struct LookupTables {
    knight_table: [BitBoard; 64],
    king_table: [BitBoard; 64],
    straight_rays: [BitBoard; 64],
    diagonal_rays: [BitBoard; 64],
    directional_rays: [[BitBoard; 8]; 64],
    // squares strictly between two squares on a shared line, FULL_BOARD when
    // they share no line
    connection: Box<[[BitBoard; 64]; 64]>,
}

static LOOKUP_TABLES: Lazy<LookupTables> = Lazy::new(LookupTables::generate);

/// Builds the tables now rather than on the first lookup.
pub fn init() {
    Lazy::force(&LOOKUP_TABLES);
}

impl LookupTables {
    fn generate() -> Self {
        Self {
            knight_table: generate_knight_table(),
            king_table: generate_king_table(),
            straight_rays: generate_ray_table(&Direction::STRAIGHT),
            diagonal_rays: generate_ray_table(&Direction::DIAGONAL),
            directional_rays: generate_directional_rays(),
            connection: generate_connection_table(),
        }
    }
}

/// All squares reached by sliding from `square` towards `direction` on an
/// empty board.
fn ray(square: Square, direction: Direction) -> BitBoard {
    let mut result = BitBoard::empty();
    let mut cursor = square.bitboard().shift(direction);
    while cursor.is_not_empty() {
        result |= cursor;
        cursor = cursor.shift(direction);
    }
    result
}

fn generate_knight_table() -> [BitBoard; 64] {
    use Direction::*;
    const JUMPS: [[Direction; 3]; 8] = [
        [North, North, East],
        [North, North, West],
        [South, South, East],
        [South, South, West],
        [East, East, North],
        [East, East, South],
        [West, West, North],
        [West, West, South],
    ];

    let mut table = [BitBoard::empty(); 64];
    for square in Square::ALL {
        table[square] = JUMPS.iter().fold(BitBoard::empty(), |moves, jump| {
            moves
                | jump
                    .iter()
                    .fold(square.bitboard(), |board, &direction| board.shift(direction))
        });
    }
    table
}

fn generate_king_table() -> [BitBoard; 64] {
    let mut table = [BitBoard::empty(); 64];
    for square in Square::ALL {
        table[square] = Direction::ALL
            .iter()
            .fold(BitBoard::empty(), |moves, &direction| {
                moves | square.bitboard().shift(direction)
            });
    }
    table
}

fn generate_directional_rays() -> [[BitBoard; 8]; 64] {
    let mut table = [[BitBoard::empty(); 8]; 64];
    for square in Square::ALL {
        for direction in Direction::ALL {
            table[square][direction as usize] = ray(square, direction);
        }
    }
    table
}

fn generate_ray_table(directions: &[Direction]) -> [BitBoard; 64] {
    let mut table = [BitBoard::empty(); 64];
    for square in Square::ALL {
        table[square] = directions
            .iter()
            .fold(BitBoard::empty(), |rays, &direction| rays | ray(square, direction));
    }
    table
}

fn generate_connection_table() -> Box<[[BitBoard; 64]; 64]> {
    let mut table = Box::new([[FULL_BOARD; 64]; 64]);

    for from in Square::ALL {
        for direction in Direction::ALL {
            let mut between = BitBoard::empty();
            let mut cursor = from.bitboard().shift(direction);
            while let Some(target) = cursor.first_square() {
                table[from][target] = between;
                between |= cursor;
                cursor = cursor.shift(direction);
            }
        }
    }
    table
}

#[inline(always)]
pub fn lookup_knight(square: Square) -> BitBoard {
    LOOKUP_TABLES.knight_table[square]
}

#[inline(always)]
pub fn lookup_king(square: Square) -> BitBoard {
    LOOKUP_TABLES.king_table[square]
}

/// Union of the rank and file through `square`, excluding the square.
#[inline(always)]
pub fn lookup_straight_rays(square: Square) -> BitBoard {
    LOOKUP_TABLES.straight_rays[square]
}

/// Union of both diagonals through `square`, excluding the square.
#[inline(always)]
pub fn lookup_diagonal_rays(square: Square) -> BitBoard {
    LOOKUP_TABLES.diagonal_rays[square]
}

/// Squares reached from `square` towards `direction` on an empty board.
#[inline(always)]
pub fn lookup_ray(square: Square, direction: Direction) -> BitBoard {
    LOOKUP_TABLES.directional_rays[square][direction as usize]
}

/// Slider destinations: each ray is cut at its nearest occupied square, which
/// stays in the result so captures can be masked in by the caller.
fn lookup_slider(square: Square, occupied: BitBoard, directions: &[Direction]) -> BitBoard {
    directions.iter().fold(BitBoard::empty(), |attacks, &direction| {
        let ray = lookup_ray(square, direction);
        let blockers = ray & occupied;
        let nearest = if direction.is_ascending() {
            blockers.first_square()
        } else {
            blockers.last_square()
        };
        attacks
            | match nearest {
                Some(blocker) => lookup_connection(square, blocker) | blocker.bitboard(),
                None => ray,
            }
    })
}

#[inline(always)]
pub fn lookup_bishop(square: Square, occupied: BitBoard) -> BitBoard {
    lookup_slider(square, occupied, &Direction::DIAGONAL)
}

#[inline(always)]
pub fn lookup_rook(square: Square, occupied: BitBoard) -> BitBoard {
    lookup_slider(square, occupied, &Direction::STRAIGHT)
}

#[inline(always)]
pub fn lookup_queen(square: Square, occupied: BitBoard) -> BitBoard {
    lookup_rook(square, occupied) | lookup_bishop(square, occupied)
}

/// Squares strictly between `a` and `b`, or `FULL_BOARD` if they are not on
/// a common rank, file or diagonal.
#[inline(always)]
pub fn lookup_connection(a: Square, b: Square) -> BitBoard {
    LOOKUP_TABLES.connection[a][b]
}

#[inline(always)]
pub fn are_aligned(a: Square, b: Square) -> bool {
    lookup_connection(a, b) != FULL_BOARD
}
