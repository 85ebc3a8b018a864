//! Performance benchmarks for the per-tick hot path

use rand::rngs::StdRng;
use rand::SeedableRng;
use server::config::GameConfig;
use server::game::{Game, GameState};
use server::render::RenderError;
use server::utils::Clock;
use shared::{Direction, Packet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

fn manual_game(rows: u16, cols: u16) -> (Game, Arc<AtomicU64>) {
    let now = Arc::new(AtomicU64::new(1_700_000_000_000));
    let clock_now = Arc::clone(&now);
    let clock: Clock = Arc::new(move || clock_now.load(Ordering::SeqCst));
    let game = Game::with_parts(
        GameConfig::new(rows, cols),
        StdRng::seed_from_u64(42),
        clock,
    )
    .unwrap();
    (game, now)
}

/// Benchmarks idle ticks, the common case between moves
#[test]
fn benchmark_idle_ticks() {
    let (game, now) = manual_game(20, 20);
    let mut render = |_: &GameState| -> Result<(), RenderError> { Ok(()) };

    let iterations = 100_000;
    let start = Instant::now();

    for _ in 0..iterations {
        now.fetch_add(1, Ordering::SeqCst);
        game.update(&mut render, false);
    }

    let duration = start.elapsed();
    println!(
        "Idle ticks: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    // Should complete in under 2 seconds
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks moving ticks with snapshot rendering
#[test]
fn benchmark_moving_ticks_with_snapshots() {
    let (game, now) = manual_game(200, 200);
    let mut frames = 0u32;
    let mut render = |state: &GameState| -> Result<(), RenderError> {
        let _ = state.snapshot();
        frames += 1;
        Ok(())
    };

    let iterations = 10_000;
    let start = Instant::now();

    for i in 0..iterations {
        // Sweep down and back up the first column
        let direction = if (i / 199) % 2 == 0 {
            Direction::Down
        } else {
            Direction::Up
        };
        game.set_direction(direction);
        now.fetch_add(201, Ordering::SeqCst);
        game.update(&mut render, false);
    }

    let duration = start.elapsed();
    println!(
        "Moving ticks: {} iterations, {} frames in {:?} ({:.2} μs/iter)",
        iterations,
        frames,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Should complete in under 5 seconds
    assert!(duration.as_millis() < 5000);
}

/// Benchmarks frame packet serialization
#[test]
fn benchmark_frame_serialization() {
    let (game, now) = manual_game(20, 20);
    now.fetch_add(1, Ordering::SeqCst);
    game.update(&mut |_: &GameState| -> Result<(), RenderError> { Ok(()) }, false);
    let packet = Packet::Frame(game.snapshot());

    let iterations = 100_000;
    let start = Instant::now();

    let mut total = 0;
    for _ in 0..iterations {
        total += bincode::serialize(&packet).unwrap().len();
    }

    let duration = start.elapsed();
    println!(
        "Frame serialization: {} iterations in {:?} ({:.2} ns/iter, {} bytes/frame)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64,
        total / iterations
    );

    // Should complete in under 1 second
    assert!(duration.as_millis() < 1000);
}
