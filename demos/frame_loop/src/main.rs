//! A tiny frame-based host driving two background jobs: one runs to completion while the frame
//! loop stays responsive, the other gets aborted mid-flight.

use std::time::{Duration, Instant};

use bg_job::prelude::*;

/// Pretends to load an asset in chunks, checking for cancellation between chunks.
struct AssetLoadJob {
    name: &'static str,
    chunks: u32,
    chunks_loaded: u32,
}

impl AssetLoadJob {
    fn new(name: &'static str, chunks: u32) -> Self {
        Self {
            name,
            chunks,
            chunks_loaded: 0,
        }
    }
}

impl Job for AssetLoadJob {
    fn run(&mut self, cancel: &CancelToken) {
        for _ in 0..self.chunks {
            if cancel.is_cancelled() {
                return;
            }

            // One chunk of pretend I/O
            std::thread::sleep(Duration::from_millis(30));
            self.chunks_loaded += 1;
        }
    }

    fn on_finished(&mut self) {
        bg_log!(
            "'{}' finished with all {} chunks loaded",
            self.name,
            self.chunks_loaded
        );
    }

    fn on_abort(&mut self) {
        bg_log!(
            "'{}' aborted after {}/{} chunks",
            self.name,
            self.chunks_loaded,
            self.chunks
        );
    }
}

fn main() {
    let log_level = if cfg!(debug_assertions) {
        simplelog::LevelFilter::Trace
    } else {
        simplelog::LevelFilter::Info
    };
    simplelog::TermLogger::init(
        log_level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )
    .expect("Could not initialize the logger");

    let mut level = BackgroundJob::new(AssetLoadJob::new("level geometry", 8));
    let mut textures = BackgroundJob::new(AssetLoadJob::new("texture pack", 1000));
    level.start();
    textures.start();

    // A fixed-timestep frame loop standing in for a real host scheduler. The level load is
    // awaited through its wait sequence, one step per frame; the texture job gets cancelled once
    // the level is in.
    let frame_time = Duration::from_millis(16);
    let mut waiter = level.wait_for();
    let mut frame = 0u32;
    loop {
        let frame_start = Instant::now();
        frame += 1;

        if waiter.next().is_none() {
            break;
        }
        bg_trace!("frame {frame}: level still loading");

        std::thread::sleep(frame_time.saturating_sub(frame_start.elapsed()));
    }
    drop(waiter);
    bg_log!("level ready after {frame} frames");

    textures.abort();
    while !textures.update() {
        std::thread::sleep(frame_time);
    }
}
