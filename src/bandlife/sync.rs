//! Halo exchange between vertically adjacent workers.
//!
//! Each worker owns four rendezvous channels: its first row goes to the
//! previous rank's bottom halo, its last row to the next rank's top halo, and
//! the two matching rows come back into its own halo slots. Rank 0's previous
//! rank is P-1 and rank P-1's next rank is 0, closing the torus vertically.
//!
//! Sends block until the peer receives, so the order of the four transfers
//! matters. Even ranks run send-low, recv-low, send-high, recv-high; odd
//! ranks run the mirror, recv-high, send-high, recv-low, send-low. Every send
//! then meets a peer already waiting on the matching receive, for any even P.

use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::sync::{Condvar, Mutex, PoisonError};

use super::grid::{GridBuffer, Slot};
use crate::error::{Direction, LifeError, Result};

/// One boundary row in flight.
pub type Row = Vec<bool>;

/// Point-to-point endpoints of one worker in a ring of two or more.
pub struct PeerLink {
    rank: usize,
    /// First owned row, to the previous rank.
    to_prev: SyncSender<Row>,
    /// Last owned row, to the next rank.
    to_next: SyncSender<Row>,
    /// Previous rank's last row, into the top halo.
    from_prev: Receiver<Row>,
    /// Next rank's first row, into the bottom halo.
    from_next: Receiver<Row>,
}

/// How a worker reaches its vertical neighbors.
pub enum HaloLink {
    /// P = 1: both neighbors are the worker itself; halos are filled locally.
    Local,
    Peer(PeerLink),
}

/// Check that `workers` can run the parity protocol.
pub fn validate_workers(workers: usize) -> Result<()> {
    match workers {
        0 => Err(LifeError::config("worker count must be positive")),
        1 => Ok(()),
        n if n % 2 == 1 => Err(LifeError::OddWorkers(n)),
        _ => Ok(()),
    }
}

/// Build the ring of links for `workers` ranks, in rank order.
pub fn mesh(workers: usize) -> Result<Vec<HaloLink>> {
    validate_workers(workers)?;
    if workers == 1 {
        return Ok(vec![HaloLink::Local]);
    }

    // `down[r]` carries rank r's first row, `up[r]` its last row.
    let (down_tx, mut down_rx): (Vec<_>, Vec<_>) =
        (0..workers).map(|_| sync_channel::<Row>(0)).unzip();
    let (up_tx, mut up_rx): (Vec<_>, Vec<_>) =
        (0..workers).map(|_| sync_channel::<Row>(0)).unzip();

    // Rank r listens on up[r-1] and down[r+1].
    up_rx.rotate_right(1);
    down_rx.rotate_left(1);

    let links = down_tx
        .into_iter()
        .zip(up_tx)
        .zip(up_rx.into_iter().zip(down_rx))
        .enumerate()
        .map(|(rank, ((to_prev, to_next), (from_prev, from_next)))| {
            HaloLink::Peer(PeerLink {
                rank,
                to_prev,
                to_next,
                from_prev,
                from_next,
            })
        })
        .collect();
    Ok(links)
}

impl PeerLink {
    fn send_low(&self, grid: &GridBuffer) -> Result<()> {
        self.to_prev
            .send(grid.first_row().to_vec())
            .map_err(|_| self.transfer_error(Direction::Low))
    }

    fn send_high(&self, grid: &GridBuffer) -> Result<()> {
        self.to_next
            .send(grid.last_row().to_vec())
            .map_err(|_| self.transfer_error(Direction::High))
    }

    fn recv_low(&self, grid: &mut GridBuffer) -> Result<()> {
        let row = self
            .from_prev
            .recv()
            .map_err(|_| self.transfer_error(Direction::Low))?;
        self.store(grid, Slot::TopHalo, &row, Direction::Low)
    }

    fn recv_high(&self, grid: &mut GridBuffer) -> Result<()> {
        let row = self
            .from_next
            .recv()
            .map_err(|_| self.transfer_error(Direction::High))?;
        self.store(grid, Slot::BottomHalo, &row, Direction::High)
    }

    fn store(&self, grid: &mut GridBuffer, slot: Slot, row: &[bool], dir: Direction) -> Result<()> {
        if row.len() != grid.cols() {
            return Err(self.transfer_error(dir));
        }
        grid.copy_row(slot, row);
        Ok(())
    }

    #[inline]
    fn transfer_error(&self, direction: Direction) -> LifeError {
        LifeError::Transfer {
            rank: self.rank,
            direction,
        }
    }
}

/// Refresh both halo slots of `grid` from the neighbors' boundary rows.
///
/// Sends exactly the two boundary rows of `grid` and receives exactly the
/// two halo rows. Any failed transfer is returned as fatal.
pub fn exchange(grid: &mut GridBuffer, link: &HaloLink) -> Result<()> {
    match link {
        HaloLink::Local => {
            let last = grid.last_row().to_vec();
            let first = grid.first_row().to_vec();
            grid.copy_row(Slot::TopHalo, &last);
            grid.copy_row(Slot::BottomHalo, &first);
            Ok(())
        }
        HaloLink::Peer(peer) if peer.rank % 2 == 0 => {
            peer.send_low(grid)?;
            peer.recv_low(grid)?;
            peer.send_high(grid)?;
            peer.recv_high(grid)
        }
        HaloLink::Peer(peer) => {
            peer.recv_high(grid)?;
            peer.send_high(grid)?;
            peer.recv_low(grid)?;
            peer.send_low(grid)
        }
    }
}

#[derive(Debug, Default)]
struct BarrierState {
    arrived: usize,
    round: u64,
    aborted: bool,
}

/// Collective barrier that peers can tear down.
///
/// Unlike `std::sync::Barrier`, a failing worker can `abort` it so the
/// others stop waiting instead of hanging on a rank that will never arrive.
#[derive(Debug)]
pub struct LockstepBarrier {
    parties: usize,
    state: Mutex<BarrierState>,
    cvar: Condvar,
}

impl LockstepBarrier {
    pub fn new(parties: usize) -> Self {
        Self {
            parties: parties.max(1),
            state: Mutex::new(BarrierState::default()),
            cvar: Condvar::new(),
        }
    }

    /// Block until all parties arrive, or fail once the barrier is aborted.
    pub fn wait(&self, rank: usize) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.aborted {
            return Err(LifeError::Aborted { rank });
        }
        state.arrived += 1;
        if state.arrived == self.parties {
            state.arrived = 0;
            state.round = state.round.wrapping_add(1);
            self.cvar.notify_all();
            return Ok(());
        }
        let round = state.round;
        while state.round == round && !state.aborted {
            state = self.cvar.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
        if state.round == round {
            return Err(LifeError::Aborted { rank });
        }
        Ok(())
    }

    pub fn abort(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.aborted = true;
        self.cvar.notify_all();
    }

    #[cfg(test)]
    pub(crate) fn is_aborted(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .aborted
    }
}
