//! Driver facade tests: diffing, refresh, scheduler lifecycle and threading.

use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use led_marquee::glyphs::glyph_for;
use led_marquee::hal::{MockBus, SimulatedChain};
use led_marquee::protocol::scanline_register;
use led_marquee::{
    DisplayConfig, DisplayDriver, DisplayError, PanelGrid, Register, SchedulerState, Ttl,
};

fn mock_driver(config: DisplayConfig) -> (DisplayDriver<MockBus>, MockBus) {
    let bus = MockBus::new();
    let tap = bus.clone();
    (DisplayDriver::new(bus, config).unwrap(), tap)
}

/// Polls `cond` until it holds or two seconds pass.
fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    cond()
}

// ============================================================================
// Diffing and refresh
// ============================================================================

#[test]
fn unchanged_tick_sends_nothing() {
    let (driver, bus) = mock_driver(DisplayConfig::default());
    driver.set_text(0, "HI").unwrap();
    driver.repaint().unwrap();
    bus.reset();

    for _ in 0..10 {
        let report = driver.repaint().unwrap();
        assert_eq!(report.frames, 0);
    }
    assert_eq!(bus.attempts(), 0);
}

#[test]
fn scrolling_tick_sends_only_dirty_lines() {
    let (driver, bus) = mock_driver(DisplayConfig::default());
    driver.set_text(0, "HELLO").unwrap();
    driver.repaint().unwrap();
    bus.reset();

    let report = driver.repaint().unwrap();
    assert!(report.frames > 0 && report.frames <= 8);
    assert_eq!(bus.transmissions().len(), report.frames);
    assert_eq!(bus.scanline_frames().len(), report.frames);
}

#[test]
fn refresh_tick_reconfigures_and_repaints_everything() {
    let config = DisplayConfig::default().with_refresh_interval(3);
    let (driver, bus) = mock_driver(config);
    driver.set_text(0, "HI").unwrap();
    driver.repaint().unwrap(); // tick 0
    bus.reset();

    driver.repaint().unwrap();
    driver.repaint().unwrap();
    assert_eq!(bus.attempts(), 0);

    let report = driver.repaint().unwrap(); // tick 3
    assert_eq!(report.frames, 8);
    assert_eq!(bus.transmissions().len(), 5 + 8);
    assert_eq!(bus.broadcasts(Register::DecodeMode), vec![0]);
    assert_eq!(bus.broadcasts(Register::ScanLimit), vec![7]);
    assert_eq!(bus.broadcasts(Register::Shutdown), vec![1]);
    assert_eq!(bus.broadcasts(Register::DisplayTest), vec![0]);
}

#[test]
fn panels_are_sent_mirrored_along_the_chain() {
    let config = DisplayConfig::default().with_grid(PanelGrid::strip(2));
    let (driver, bus) = mock_driver(config);
    driver.draw(0, 0, &[0xFF; 8]).unwrap();
    bus.reset();
    driver.repaint().unwrap();

    let frames = bus.scanline_frames();
    assert_eq!(frames.len(), 8);
    for (line, frame) in frames.iter().enumerate() {
        // Pair 0 reaches the far chip (column 1), pair 1 the near one (column 0)
        assert_eq!(frame, &vec![scanline_register(line), 0, scanline_register(line), 0xFF]);
    }
}

// ============================================================================
// Simulated chain
// ============================================================================

#[test]
fn simulator_shows_the_rasterized_text() {
    let chain = SimulatedChain::new(PanelGrid::strip(4));
    let driver = DisplayDriver::new(chain.clone(), DisplayConfig::default()).unwrap();
    assert!(chain.is_powered());

    driver.set_text(0, "ABCD").unwrap();
    driver.repaint().unwrap();

    for (col, c) in "ABCD".chars().enumerate() {
        let chip = chain.chip(0, col).unwrap();
        let glyph = glyph_for(c);
        for line in 0..8 {
            for x in 0..8 {
                let expected = glyph[line] & (1 << x) != 0;
                assert_eq!(chip.lit(line, x), expected, "{} line {} x {}", c, line, x);
            }
        }
    }
}

#[test]
fn draw_row_puts_bit_31_on_the_left() {
    let chain = SimulatedChain::new(PanelGrid::strip(4));
    let driver = DisplayDriver::new(chain.clone(), DisplayConfig::default()).unwrap();
    driver.draw_row(0, &[0x8000_0001; 8]).unwrap();
    driver.repaint().unwrap();

    let art = chain.render();
    let first = art.lines().next().unwrap();
    assert_eq!(first.len(), 32);
    assert!(first.starts_with('#'));
    assert!(first.ends_with('#'));
    assert_eq!(first.matches('#').count(), 2);
}

#[test]
fn intensity_is_written_through_when_stopped() {
    let chain = SimulatedChain::new(PanelGrid::strip(4));
    let driver = DisplayDriver::new(chain.clone(), DisplayConfig::default()).unwrap();
    assert_eq!(chain.chip(0, 0).unwrap().intensity, 1);

    driver.set_intensity(12).unwrap();
    assert_eq!(driver.intensity(), 12);
    for col in 0..4 {
        assert_eq!(chain.chip(0, col).unwrap().intensity, 12);
    }
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn rejected_settings_leave_state_unchanged() {
    let (driver, bus) = mock_driver(DisplayConfig::default());
    driver.set_text(0, "KEEP").unwrap();
    driver.set_slowdown_factor(0, 2).unwrap();
    bus.reset();

    assert_eq!(
        driver.set_intensity(16),
        Err(DisplayError::InvalidIntensity(16))
    );
    assert_eq!(driver.intensity(), 1);
    assert_eq!(bus.attempts(), 0);

    assert_eq!(driver.set_delay(Duration::ZERO), Err(DisplayError::InvalidDelay));
    assert_eq!(driver.delay(), Duration::from_millis(20));

    assert_eq!(
        driver.set_slowdown_factor(0, 0),
        Err(DisplayError::InvalidSlowdownFactor(0))
    );
    assert_eq!(driver.slowdown_factor(0).unwrap(), 2);

    assert_eq!(
        driver.set_text(1, "NOPE"),
        Err(DisplayError::InvalidRow { row: 1, rows: 1 })
    );
    assert_eq!(
        driver.set_text_with_ttl(0, "NOPE", Ttl::Ticks(0)),
        Err(DisplayError::InvalidTtl)
    );
    assert_eq!(driver.text(0).unwrap(), "KEEP");
    assert_eq!(driver.ttl(0).unwrap(), Ttl::Forever);
}

#[test]
fn invalid_grids_are_rejected_at_construction() {
    for grid in [PanelGrid::new(0, 4), PanelGrid::new(1, 0), PanelGrid::new(2, 17)] {
        let config = DisplayConfig::default().with_grid(grid);
        assert!(matches!(
            DisplayDriver::new(MockBus::new(), config),
            Err(DisplayError::InvalidGrid { .. })
        ));
    }
}

// ============================================================================
// Scheduler lifecycle
// ============================================================================

#[test]
fn join_before_start_returns_immediately() {
    let (driver, _bus) = mock_driver(DisplayConfig::default());
    driver.join();
    driver.stop();
    driver.join();
    assert_eq!(driver.scheduler_state(), SchedulerState::Stopped);
}

#[test]
fn start_stop_join_are_idempotent() {
    let config = DisplayConfig::default().with_delay_ms(1);
    let (driver, bus) = mock_driver(config);

    driver.start().unwrap();
    driver.start().unwrap();
    assert!(driver.is_running());
    assert_eq!(driver.repaint(), Err(DisplayError::SchedulerRunning));

    driver.stop();
    driver.stop();
    driver.join();
    driver.join();
    assert_eq!(driver.scheduler_state(), SchedulerState::Stopped);
    assert_eq!(bus.broadcasts(Register::Shutdown).last(), Some(&0));
    assert!(driver.repaint().is_ok());
}

#[test]
fn restart_after_stop_powers_the_chain_again() {
    let chain = SimulatedChain::new(PanelGrid::strip(4));
    let config = DisplayConfig::default().with_delay_ms(1);
    let driver = DisplayDriver::new(chain.clone(), config).unwrap();
    driver.set_text(0, "ON").unwrap();

    driver.start().unwrap();
    assert!(wait_until(|| chain.render().contains('#')));
    driver.stop();
    driver.join();
    assert!(!chain.is_powered());

    driver.start().unwrap();
    assert!(wait_until(|| chain.is_powered()));
    assert!(wait_until(|| chain.render().contains('#')));
    driver.stop();
    driver.join();
}

#[test]
fn stop_wakes_a_long_sleep_promptly() {
    let config = DisplayConfig::default().with_delay_ms(60_000);
    let (driver, _bus) = mock_driver(config);
    driver.start().unwrap();

    let started = Instant::now();
    driver.stop();
    driver.join();
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn intensity_reaches_the_bus_on_a_running_tick() {
    let config = DisplayConfig::default().with_delay_ms(2);
    let (driver, bus) = mock_driver(config);
    driver.start().unwrap();

    driver.set_intensity(9).unwrap();
    assert!(wait_until(|| bus.broadcasts(Register::Intensity).contains(&9)));

    driver.stop();
    driver.join();
}

#[test]
fn dropping_a_running_driver_stops_the_thread() {
    let config = DisplayConfig::default().with_delay_ms(1);
    let (driver, bus) = mock_driver(config);
    driver.start().unwrap();
    drop(driver);

    assert_eq!(bus.broadcasts(Register::Shutdown).last(), Some(&0));
}

#[test]
fn bus_failures_do_not_stop_the_render_loop() {
    let config = DisplayConfig::default().with_delay_ms(1);
    let (driver, bus) = mock_driver(config);
    driver.set_text(0, "SCROLLING TEXT").unwrap();
    driver.start().unwrap();

    bus.set_failing(true);
    let attempts = bus.attempts();
    assert!(wait_until(|| bus.attempts() > attempts + 5));
    assert!(driver.is_running());

    bus.set_failing(false);
    let sent = bus.transmissions().len();
    assert!(wait_until(|| bus.transmissions().len() > sent));

    driver.stop();
    driver.join();
}

#[test]
fn repaint_reports_failed_frames() {
    let (driver, bus) = mock_driver(DisplayConfig::default());
    driver.set_text(0, "HI").unwrap();
    driver.repaint().unwrap();

    driver.set_text(0, "HO").unwrap();
    bus.fail_next(1);
    let report = driver.repaint().unwrap();
    assert!(report.frames > 0);
    assert_eq!(report.failures, 1);
}

// ============================================================================
// Threading
// ============================================================================

#[test]
fn setters_from_many_threads_while_running() {
    let config = DisplayConfig::default()
        .with_grid(PanelGrid::new(4, 4))
        .with_delay_ms(1);
    let (driver, _bus) = mock_driver(config);
    let driver = Arc::new(driver);
    driver.start().unwrap();

    let workers: Vec<_> = (0..4)
        .map(|row| {
            let driver = Arc::clone(&driver);
            thread::spawn(move || {
                for i in 0..50 {
                    driver.set_text(row, &format!("ROW {} MSG {}", row, i)).unwrap();
                    driver.set_slowdown_factor(row, i % 3 + 1).unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    for row in 0..4 {
        assert_eq!(driver.text(row).unwrap(), format!("ROW {} MSG 49", row));
        assert_eq!(driver.welcome_text(row).unwrap(), format!("ROW {} MSG 0", row));
    }

    driver.stop();
    driver.join();
}

#[test]
fn facade_stays_responsive_while_another_thread_joins() {
    let config = DisplayConfig::default().with_delay_ms(5);
    let (driver, bus) = mock_driver(config);
    let driver = Arc::new(driver);
    driver.start().unwrap();

    let joiner = {
        let driver = Arc::clone(&driver);
        thread::spawn(move || driver.join())
    };
    thread::sleep(Duration::from_millis(20));

    let (tx, rx) = mpsc::channel();
    {
        let driver = Arc::clone(&driver);
        thread::spawn(move || {
            let result = driver.set_intensity(5);
            let status = driver.status();
            driver.stop();
            let _ = tx.send((result, status.scheduler));
        });
    }

    let (result, scheduler) = rx
        .recv_timeout(Duration::from_secs(2))
        .expect("setters blocked while the render thread was being joined");
    assert_eq!(result, Ok(()));
    assert_eq!(scheduler, SchedulerState::Running);

    joiner.join().unwrap();
    assert_eq!(driver.scheduler_state(), SchedulerState::Stopped);
    assert!(bus.broadcasts(Register::Intensity).contains(&5));
}
