//! Edge case and boundary condition tests for the display driver

use led_marquee::hal::{MockBus, SimulatedChain};
use led_marquee::layer::MAX_TEXT_LEN;
use led_marquee::{
    Canvas, CommandOutcome, ContentProvider, DisplayCommand, DisplayConfig, DisplayDriver,
    DisplayError, MouthMode, PanelGrid, ParseError, Shift, TextLayer, TextLayers, Ttl,
};

fn driver() -> DisplayDriver<MockBus> {
    DisplayDriver::new(MockBus::new(), DisplayConfig::default()).unwrap()
}

// ============================================================================
// Text Boundary Tests
// ============================================================================

#[test]
fn empty_text_renders_blank_and_is_not_a_welcome_text() {
    let mut layers = TextLayers::new(PanelGrid::strip(4));
    layers.set_text(0, "", Ttl::Forever).unwrap();
    assert_eq!(layers.welcome_text(0).unwrap(), "");

    let mut canvas = Canvas::new(layers.grid());
    layers.tick(&mut canvas);
    assert!(canvas.is_blank());

    layers.set_text(0, "NEXT", Ttl::Forever).unwrap();
    assert_eq!(layers.welcome_text(0).unwrap(), "NEXT");
}

#[test]
fn max_length_text_is_accepted_and_scrolls() {
    let text = "X".repeat(MAX_TEXT_LEN);
    let mut layer = TextLayer::new(4);
    layer.set_text(&text, Ttl::Forever).unwrap();
    assert_eq!(layer.text().len(), MAX_TEXT_LEN);

    for _ in 0..MAX_TEXT_LEN + 4 + 1 {
        layer.advance();
    }
    assert_eq!(layer.cursor(), -4);
}

#[test]
fn text_over_capacity_is_rejected() {
    let driver = driver();
    driver.set_text(0, "OLD").unwrap();

    let text = "X".repeat(MAX_TEXT_LEN + 1);
    assert_eq!(
        driver.set_text(0, &text),
        Err(DisplayError::TextTooLong {
            len: MAX_TEXT_LEN + 1,
            max: MAX_TEXT_LEN
        })
    );
    assert_eq!(driver.text(0).unwrap(), "OLD");
}

#[test]
fn capacity_counts_characters_not_bytes() {
    let text = "\u{e9}".repeat(MAX_TEXT_LEN);
    let mut layer = TextLayer::new(4);
    assert!(layer.set_text(&text, Ttl::Forever).is_ok());
}

#[test]
fn non_ascii_is_masked_to_seven_bits() {
    let mut layer = TextLayer::new(4);
    // U+00E9 masks to 0x69
    layer.set_text("\u{e9}", Ttl::Forever).unwrap();
    assert_eq!(layer.text(), "i");
    assert_eq!(layer.codes(), &[0x69]);
}

#[test]
fn text_exactly_as_wide_as_the_row_does_not_scroll() {
    let mut layer = TextLayer::new(4);
    layer.set_text("ABCD", Ttl::Forever).unwrap();
    assert!(!layer.scrolls());

    layer.set_text("ABCDE", Ttl::Forever).unwrap();
    assert!(layer.scrolls());
}

#[test]
fn ttl_without_welcome_text_falls_back_to_blank() {
    let mut layer = TextLayer::new(4);
    layer.set_welcome_text("", false).unwrap();
    layer.set_text("GONE", Ttl::Ticks(1)).unwrap();
    layer.advance();
    assert_eq!(layer.text(), "");
}

#[test]
fn ttl_from_optional_ticks() {
    assert_eq!(Ttl::from(None), Ttl::Forever);
    assert_eq!(Ttl::from(Some(5)), Ttl::Ticks(5));
    assert_eq!(Ttl::Forever.remaining(), None);
    assert_eq!(Ttl::Ticks(5).remaining(), Some(5));
}

// ============================================================================
// Addressing Boundary Tests
// ============================================================================

#[test]
fn out_of_range_rows_and_columns() {
    let config = DisplayConfig::default().with_grid(PanelGrid::new(2, 4));
    let driver = DisplayDriver::new(MockBus::new(), config).unwrap();

    let bad_row = Err(DisplayError::InvalidRow { row: 2, rows: 2 });
    assert_eq!(driver.set_text(2, "X"), bad_row);
    assert_eq!(driver.set_slowdown_factor(2, 1), bad_row);
    assert_eq!(driver.set_welcome_text_for(2, "X", true), bad_row);
    assert_eq!(driver.draw(2, 0, &[0; 8]), bad_row);
    assert_eq!(driver.draw_row(2, &[0; 8]), bad_row);
    assert_eq!(driver.text(2), Err(DisplayError::InvalidRow { row: 2, rows: 2 }));

    assert_eq!(
        driver.draw(1, 4, &[0; 8]),
        Err(DisplayError::InvalidColumn { col: 4, cols: 4 })
    );
    assert_eq!(
        driver.draw_shifted(0, 9, Shift::Left(1), false, &[0; 8]),
        Err(DisplayError::InvalidColumn { col: 9, cols: 4 })
    );
}

#[test]
fn draw_row_on_a_narrow_grid_keeps_the_leftmost_panels() {
    let chain = SimulatedChain::new(PanelGrid::strip(2));
    let config = DisplayConfig::default().with_grid(PanelGrid::strip(2));
    let driver = DisplayDriver::new(chain.clone(), config).unwrap();

    driver.draw_row(0, &[0xFF00_00FF; 8]).unwrap();
    driver.repaint().unwrap();

    let art = chain.render();
    let first = art.lines().next().unwrap();
    assert_eq!(first, "########........");
}

#[test]
fn single_panel_grid() {
    let chain = SimulatedChain::new(PanelGrid::strip(1));
    let config = DisplayConfig::default().with_grid(PanelGrid::strip(1));
    let driver = DisplayDriver::new(chain.clone(), config).unwrap();

    driver.set_text(0, "AB").unwrap();
    for _ in 0..10 {
        driver.repaint().unwrap();
    }
    assert_eq!(chain.render().lines().count(), 8);
}

#[test]
fn largest_supported_chain() {
    let grid = PanelGrid::new(8, 4);
    let chain = SimulatedChain::new(grid);
    let config = DisplayConfig::default().with_grid(grid);
    let driver = DisplayDriver::new(chain.clone(), config).unwrap();
    for row in 0..8 {
        driver.set_text(row, "ROW").unwrap();
    }
    driver.repaint().unwrap();
    assert!(chain.is_powered());
    assert_eq!(chain.render().lines().count(), 64);
}

// ============================================================================
// Intensity Boundary Tests
// ============================================================================

#[test]
fn intensity_limits() {
    let driver = driver();
    assert!(driver.set_intensity(0).is_ok());
    assert!(driver.set_intensity(15).is_ok());
    assert_eq!(driver.set_intensity(16), Err(DisplayError::InvalidIntensity(16)));
    assert_eq!(driver.intensity(), 15);
}

// ============================================================================
// Command Surface Tests
// ============================================================================

#[test]
fn blank_and_unknown_command_lines() {
    assert_eq!(DisplayCommand::parse("   "), Err(ParseError::Empty));
    assert_eq!(
        DisplayCommand::parse("ledblink 3"),
        Err(ParseError::UnknownCommand("ledblink".into()))
    );
}

#[test]
fn lone_number_is_text_not_a_row() {
    assert_eq!(
        DisplayCommand::parse("led 7"),
        Ok(DisplayCommand::SetText {
            row: 0,
            text: "7".into(),
            ttl: Ttl::Forever
        })
    );
}

#[test]
fn command_with_invalid_row_leaves_display_untouched() {
    let driver = driver();
    driver.set_text(0, "SAFE").unwrap();

    let cmd = DisplayCommand::parse("led 3 OOPS").unwrap();
    assert!(matches!(cmd.apply(&driver), Err(DisplayError::InvalidRow { .. })));
    assert_eq!(driver.text(0).unwrap(), "SAFE");

    let status = DisplayCommand::Status.apply(&driver).unwrap();
    match status {
        CommandOutcome::Status(status) => assert_eq!(status.rows[0].text.as_str(), "SAFE"),
        CommandOutcome::Applied => panic!("expected status"),
    }
}

#[test]
fn welcome_command_restores_every_row() {
    let config = DisplayConfig::default().with_grid(PanelGrid::new(2, 4));
    let driver = DisplayDriver::new(MockBus::new(), config).unwrap();
    driver.set_text(0, "ONE").unwrap();
    driver.set_text(1, "TWO").unwrap();
    DisplayCommand::Clear.apply(&driver).unwrap();
    assert_eq!(driver.text(0).unwrap(), "");

    DisplayCommand::Welcome.apply(&driver).unwrap();
    assert_eq!(driver.text(0).unwrap(), "ONE");
    assert_eq!(driver.text(1).unwrap(), "TWO");
}

// ============================================================================
// Animation Boundary Tests
// ============================================================================

#[test]
fn rejected_display_text_keeps_the_mode() {
    let driver = DisplayDriver::animated(MockBus::new(), DisplayConfig::default()).unwrap();
    driver.set_mode(MouthMode::Smile);

    assert_eq!(
        driver.display_text("HI", 0),
        Err(DisplayError::InvalidSlowdownFactor(0))
    );
    assert!(driver
        .display_text(&"X".repeat(MAX_TEXT_LEN + 1), 1)
        .is_err());
    assert_eq!(driver.mode(), MouthMode::Smile);
}

#[test]
fn every_mode_renders_without_error() {
    for mode in MouthMode::ALL {
        let driver = DisplayDriver::animated(MockBus::new(), DisplayConfig::default()).unwrap();
        driver.set_mode(mode);
        for _ in 0..100 {
            assert!(driver.repaint().is_ok());
        }
    }
}
