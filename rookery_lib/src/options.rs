pub const PERFT_DEPTH: usize = 4;
pub const PERFT_PARALLEL: bool = false;
pub const PERFT_COUNT_CHECKS: bool = false;
pub const PERFT_COUNT_CHECKMATES: bool = false;
pub const PERFT_DIVIDE: bool = false;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PerftOptions {
    pub depth: usize,
    /// Fan the root moves out over the rayon thread pool.
    pub parallel: bool,
    pub count_checks: bool,
    pub count_checkmates: bool,
    /// Report node counts per root move.
    pub divide: bool,
}

impl Default for PerftOptions {
    fn default() -> Self {
        Self {
            depth: PERFT_DEPTH,
            parallel: PERFT_PARALLEL,
            count_checks: PERFT_COUNT_CHECKS,
            count_checkmates: PERFT_COUNT_CHECKMATES,
            divide: PERFT_DIVIDE,
        }
    }
}

impl PerftOptions {
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            ..Default::default()
        }
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn count_checks(mut self, count_checks: bool) -> Self {
        self.count_checks = count_checks;
        self
    }

    pub fn count_checkmates(mut self, count_checkmates: bool) -> Self {
        self.count_checkmates = count_checkmates;
        self
    }

    pub fn divide(mut self, divide: bool) -> Self {
        self.divide = divide;
        self
    }

    /// Leaves need their own move generation.
    pub(crate) fn inspects_leaves(&self) -> bool {
        self.count_checks || self.count_checkmates
    }
}
