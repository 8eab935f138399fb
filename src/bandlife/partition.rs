//! Row-band decomposition of the board across workers.

use crate::error::{LifeError, Result};

/// Half-open global row range `[start, end)` owned by one worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Band {
    pub start: usize,
    pub end: usize,
}

impl Band {
    #[inline]
    pub fn height(self) -> usize {
        self.end - self.start
    }
}

/// Rows `floor(rank*R/P) .. floor((rank+1)*R/P)` for worker `rank` of `workers`.
///
/// Every worker must call this with the same `rows` and `workers`.
pub fn plan(rows: usize, workers: usize, rank: usize) -> Result<Band> {
    if workers == 0 {
        return Err(LifeError::config("worker count must be positive"));
    }
    if rank >= workers {
        return Err(LifeError::config(format!(
            "rank {rank} outside 0..{workers}"
        )));
    }
    Ok(Band {
        start: rank * rows / workers,
        end: (rank + 1) * rows / workers,
    })
}

/// The bands of every rank, in rank order.
pub fn plan_all(rows: usize, workers: usize) -> Result<Vec<Band>> {
    (0..workers).map(|rank| plan(rows, workers, rank)).collect()
}

#[cfg(test)]
mod tests {
    use super::{Band, plan, plan_all};
    use proptest::prelude::*;

    #[test]
    fn even_split() {
        let bands = plan_all(8, 4).unwrap();
        assert_eq!(
            bands,
            vec![
                Band { start: 0, end: 2 },
                Band { start: 2, end: 4 },
                Band { start: 4, end: 6 },
                Band { start: 6, end: 8 },
            ]
        );
    }

    #[test]
    fn uneven_split_keeps_integer_boundaries() {
        let heights: Vec<usize> = plan_all(10, 4).unwrap().iter().map(|b| b.height()).collect();
        assert_eq!(heights, vec![2, 3, 2, 3]);
    }

    #[test]
    fn rejects_invalid_input() {
        assert!(plan(10, 0, 0).is_err());
        assert!(plan(10, 2, 2).is_err());
    }

    proptest! {
        #[test]
        fn divisible_rows_tile_exactly(per in 1usize..32, workers in 1usize..16) {
            let rows = per * workers;
            let bands = plan_all(rows, workers).unwrap();
            let mut next = 0;
            for band in &bands {
                prop_assert_eq!(band.start, next);
                prop_assert_eq!(band.height(), per);
                next = band.end;
            }
            prop_assert_eq!(next, rows);
        }

        #[test]
        fn bands_are_contiguous_for_any_rows(rows in 0usize..500, workers in 1usize..24) {
            let bands = plan_all(rows, workers).unwrap();
            prop_assert_eq!(bands[0].start, 0);
            for pair in bands.windows(2) {
                prop_assert_eq!(pair[0].end, pair[1].start);
            }
            prop_assert_eq!(bands[workers - 1].end, rows);
        }
    }
}
