//! ASCII rendering of the harbor, drawn once per cycle.
//!
//! Every cell is three characters wide: ` . ` for open water, ` v ` for a
//! free entry point, the dock id for a free dock and the kind glyph for a
//! vessel. The queue strip above the grid shows waiting vessels, or just
//! their count when they would not fit.

use std::fmt::Write as _;
use std::io::Write;

use harbormaster_logic::geometry::Point;
use harbormaster_logic::observer::{CycleView, HarborObserver};

pub struct AsciiDisplay<W: Write> {
    out: W,
}

impl<W: Write> AsciiDisplay<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> HarborObserver for AsciiDisplay<W> {
    fn on_cycle(&mut self, view: &CycleView<'_>) {
        let frame = render(view);
        if let Err(e) = self.out.write_all(frame.as_bytes()).and_then(|_| self.out.flush()) {
            log::warn!("Could not draw cycle {}: {}", view.cycle, e);
        }
    }
}

pub fn render(view: &CycleView<'_>) -> String {
    let harbor = view.harbor;
    let width = harbor.width() as usize;
    let mut frame = String::new();

    let _ = writeln!(
        frame,
        "\n── cycle {} ({:?}) · {} on surface · {} free docks ──",
        view.cycle,
        view.phase,
        harbor.vessel_count(),
        harbor.free_docks().len()
    );

    if view.queue.len() <= width {
        frame.push('[');
        for vessel in view.queue {
            let _ = write!(frame, " {} ", vessel.glyph());
        }
        frame.push_str(&"   ".repeat(width - view.queue.len()));
        frame.push_str("]\n");
    } else {
        let _ = writeln!(frame, "[ Queue size: {} ]", view.queue.len());
    }

    for y in 0..harbor.height() as i32 {
        frame.push(' ');
        for x in 0..harbor.width() as i32 {
            frame.push_str(&cell(view, Point::new(x, y)));
        }
        frame.push('\n');
    }
    frame
}

fn cell(view: &CycleView<'_>, point: Point) -> String {
    let harbor = view.harbor;
    if let Some(vessel) = harbor.vessel_at(point) {
        return format!(" {} ", vessel.glyph());
    }
    if let Some(dock) = harbor.dock_at(point) {
        return format!("{:>3}", dock);
    }
    if harbor.is_entry_point(point) {
        return " v ".to_string();
    }
    " . ".to_string()
}
