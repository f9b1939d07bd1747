use clicktrack::{AudioOutput, Metronome, MetronomeCallbacks};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

// Bars played before and after the pause/resume demonstration
const BARS_BEFORE_PAUSE: u32 = 4;
const BARS_TOTAL: u32 = 8;

fn main() {
    println!("=== clicktrack ===");

    let bpm = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse::<f64>().ok())
        .unwrap_or(120.0);

    let (output, clock, sink) = match AudioOutput::open() {
        Ok(parts) => parts,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            return;
        }
    };
    println!("Sample rate: {} Hz", output.sample_rate());

    let (bar_tx, bar_rx) = mpsc::channel();
    let callbacks = MetronomeCallbacks {
        on_beat: Box::new(|position, accent| {
            println!("  beat {}  [{:?}]", position, accent);
        }),
        on_bar_complete: Box::new(move |bar| {
            let _ = bar_tx.send(bar);
        }),
    };

    let mut metronome = Metronome::new(Box::new(clock), Box::new(sink), callbacks);
    metronome.set_bpm(bpm);

    println!("Playing at {} BPM, 4/4\n", metronome.settings().bpm());
    metronome.start();

    while let Ok(bar) = bar_rx.recv() {
        if bar >= BARS_BEFORE_PAUSE {
            break;
        }
    }

    println!("\n-- pause --");
    metronome.pause();
    thread::sleep(Duration::from_millis(750));
    println!("-- resume --\n");
    metronome.resume();

    while let Ok(bar) = bar_rx.recv() {
        if bar >= BARS_TOTAL {
            break;
        }
    }

    metronome.stop();
    println!("\nDone.");
}
