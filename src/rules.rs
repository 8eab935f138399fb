//! Rule table for B3/S23.
//!
//! Both engines count the 8-cell Moore neighborhood and look the result up
//! here, so the partitioned and sequential runs agree bit-for-bit.

/// Next state for every `(alive, neighbors)` pair, indexed by
/// `alive as usize * 9 + neighbors`.
pub struct RuleTable {
    table: [bool; 18],
}

pub const LIFE: RuleTable = RuleTable::new();

impl RuleTable {
    pub const fn new() -> Self {
        let mut table = [false; 18];
        let mut neighbors = 0u8;
        while neighbors <= 8 {
            table[neighbors as usize] = output_for(false, neighbors);
            table[9 + neighbors as usize] = output_for(true, neighbors);
            neighbors += 1;
        }
        Self { table }
    }

    #[inline(always)]
    pub fn lookup(&self, alive: bool, neighbors: u8) -> bool {
        debug_assert!(neighbors <= 8);
        self.table[alive as usize * 9 + neighbors as usize]
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::new()
    }
}

const fn output_for(alive: bool, neighbors: u8) -> bool {
    if alive {
        neighbors == 2 || neighbors == 3
    } else {
        neighbors == 3
    }
}

/// Apply B3/S23 to one cell.
#[inline(always)]
pub fn next_state(alive: bool, neighbors: u8) -> bool {
    LIFE.lookup(alive, neighbors)
}
