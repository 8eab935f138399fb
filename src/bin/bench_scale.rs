use band_life::bandlife::{BandLife, BandLifeConfig, NoSnapshots, SnapshotSchedule};
use band_life::board::Board;
use rand::RngCore;
use rand::SeedableRng;

fn random_board(size: usize, density: f64, seed: u64) -> Board {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let threshold = (u64::MAX as f64 * density) as u64;
    let mut board = Board::new(size, size);
    for r in 0..size {
        for c in 0..size {
            if rng.next_u64() <= threshold {
                board.set(r, c, true);
            }
        }
    }
    board
}

fn main() {
    let scales: &[(usize, u64)] = &[(256, 200), (512, 100), (1024, 50), (2048, 20)];
    let worker_counts = [1usize, 2, 4, 8];

    println!(
        "{:<10} {:>8} {:>8} {:>12} {:>10} {:>12}",
        "Grid", "Workers", "Gens", "Total(ms)", "Avg(ms)", "MaxDelay(ms)"
    );
    println!("{}", "-".repeat(66));

    for &(size, gens) in scales {
        let board = random_board(size, 0.42, 0x5EED_1234_ABCD_EF01);
        for &workers in &worker_counts {
            let config = BandLifeConfig::default().workers(workers);
            let mut engine = match BandLife::with_config(board.clone(), config) {
                Ok(engine) => engine,
                Err(err) => {
                    println!("{size}x{size} with {workers} workers: {err}");
                    continue;
                }
            };
            let report = match engine.run(gens, &SnapshotSchedule::none(), &NoSnapshots) {
                Ok(report) => report,
                Err(err) => {
                    println!("{size}x{size} with {workers} workers failed: {err}");
                    continue;
                }
            };
            let total_ms = report.elapsed.as_secs_f64() * 1000.0;
            let avg_ms = total_ms / (gens + 1) as f64;
            let max_delay_ms = report
                .timings
                .iter()
                .map(|t| t.max_delay.as_secs_f64() * 1000.0)
                .fold(0.0, f64::max);
            println!(
                "{:<10} {:>8} {:>8} {:>12.1} {:>10.4} {:>12.4}",
                format!("{}x{}", size, size),
                workers,
                gens,
                total_ms,
                avg_ms,
                max_delay_ms
            );
        }
    }
}
