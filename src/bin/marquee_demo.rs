//! Desktop demo of the marquee driver against a simulated panel chain.
//!
//! Each argument is one shell command (`led`, `ledttl`, `ledsf`, ...). With
//! no arguments a short default script runs. The simulated panels are
//! printed after the script, then a few ticks of the cylon animation.
//!
//! Driver log records go to stdout. Set `MARQUEE_LOG=debug` to also see
//! setter calls and periodic reconfiguration.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin marquee_demo
//! cargo run --bin marquee_demo -- "led 0 HELLO WORLD" "ledsf 0 2" "ledstatus"
//! ```

use log::{LevelFilter, Log, Metadata, Record};

use led_marquee::hal::SimulatedChain;
use led_marquee::{
    CommandOutcome, DisplayCommand, DisplayConfig, DisplayDriver, MouthMode, PanelGrid,
};

/// Ticks rendered after the script.
const TICKS: usize = 12;

/// Ticks shown per animation frame dump.
const ANIMATION_STEPS: usize = 3;

/// Prints log records as `[level target] message`.
struct StdoutLogger;

impl Log for StdoutLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            println!("[{} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StdoutLogger = StdoutLogger;

fn init_logging() -> anyhow::Result<()> {
    let level = match std::env::var("MARQUEE_LOG").as_deref() {
        Ok("debug") => LevelFilter::Debug,
        Ok("warn") => LevelFilter::Warn,
        Ok("off") => LevelFilter::Off,
        _ => LevelFilter::Info,
    };
    log::set_logger(&LOGGER).map_err(|e| anyhow::anyhow!("{}", e))?;
    log::set_max_level(level);
    Ok(())
}

const DEFAULT_SCRIPT: &[&str] = &[
    "led 0 HELLO WORLD",
    "ledttl 1 6 BYE",
    "led 1 OK",
    "ledbright 4",
    "ledstatus",
];

fn main() -> anyhow::Result<()> {
    init_logging()?;

    println!();
    println!("================================");
    println!("  led-marquee simulator demo");
    println!("================================");
    println!();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let script: Vec<&str> = if args.is_empty() {
        DEFAULT_SCRIPT.to_vec()
    } else {
        args.iter().map(String::as_str).collect()
    };

    // =========================================================================
    // Text rows
    // =========================================================================
    let grid = PanelGrid::new(2, 4);
    let chain = SimulatedChain::new(grid);
    let config = DisplayConfig::default().with_grid(grid);
    let driver = DisplayDriver::new(chain.clone(), config)?;

    for line in script {
        let command = match DisplayCommand::parse(line) {
            Ok(command) => command,
            Err(e) => {
                println!("[cmd] {:<20} -> {}", line, e);
                continue;
            }
        };
        match command.apply(&driver) {
            Ok(CommandOutcome::Applied) => println!("[cmd] {:<20} -> ok", line),
            Ok(CommandOutcome::Status(status)) => println!("[cmd] {}\n{}", line, status),
            Err(e) => println!("[cmd] {:<20} -> {}", line, e),
        }
    }

    for _ in 0..TICKS {
        driver.repaint()?;
    }
    println!();
    println!("After {} ticks:", TICKS);
    print!("{}", chain.render());

    // =========================================================================
    // Animation
    // =========================================================================
    let strip = PanelGrid::strip(4);
    let chain = SimulatedChain::new(strip);
    let animated = DisplayDriver::animated(chain.clone(), DisplayConfig::default())?;
    animated.set_mode(MouthMode::Cylon);

    for step in 0..ANIMATION_STEPS {
        animated.repaint()?;
        animated.repaint()?;
        println!();
        println!("{} tick {}:", MouthMode::Cylon.as_str(), step * 2 + 1);
        print!("{}", chain.render());
    }

    Ok(())
}
