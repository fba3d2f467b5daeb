use crate::game::map::Cell;
use crate::game::sparkle::Sparkle;
use crate::game::voyage::Voyage;
use serde::Serialize;
use std::collections::HashMap;

pub const TITLE: &str = "TL Ocean Solo Race";
pub const HELP: &str = "Arrow keys steer | A = Anchor | R = Reset";
pub const START_LABEL: &str = "[ START SAILING ]";
const START_HINT: &str = "Press Enter / Space / S";
const INTRO_TEXT: &[&str] = &[
    "TL OCEAN SOLO RACE",
    "",
    "> Inspired by historic solo ocean races.",
    "> A single sailor.",
    "> A changing world.",
    "",
    "No crowds.",
    "No timers.",
    "No pressure.",
    "",
    "Each reset generates a new archipelago.",
    "Each voyage stands alone.",
    "",
    "Navigate with patience.",
    "Anchor when needed.",
    "Sail at your own rhythm.",
    "",
    "Collect reflections scattered across the sea.",
    "",
    "Press START SAILING to begin.",
];

/// Rows above the map: top border and title.
const MAP_TOP: usize = 2;

/// A run of characters the host should style, in character columns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Span {
    pub row: usize,
    pub col: usize,
    pub len: usize,
}

/// Everything the host needs to draw one frame.
#[derive(Clone, Debug, Serialize)]
pub struct Screen {
    pub lines: Vec<String>,
    pub boat: Option<Span>,
    pub start_button: Option<Span>,
}

fn centered(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.chars().take(width).collect();
    }
    let left = (width - len) / 2;
    format!("{}{}{}", " ".repeat(left), text, " ".repeat(width - len - left))
}

fn fit_line(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.chars().take(width).collect();
    }
    format!("{}{}", text, " ".repeat(width - len))
}

fn framed(inner: &str) -> String {
    format!("│{}│", inner)
}

fn border(top: bool, width: usize) -> String {
    let (l, r) = if top { ('┌', '┐') } else { ('└', '┘') };
    format!("{}{}{}", l, "─".repeat(width), r)
}

pub fn status_line(voyage: &Voyage, notice: Option<&str>) -> String {
    let boat = voyage.boat();
    let mode = if boat.anchored { "ANCHORED" } else { "SAILING" };
    let weather = if voyage.boat_in_front() { " ROUGH" } else { "" };
    let extra = notice
        .filter(|n| !n.is_empty())
        .map(|n| format!(" | {}", n))
        .unwrap_or_default();
    format!(
        "DIR:{} POS:{},{} {}{} SEED:{} REFLECTIONS:{}/{}{}",
        boat.heading.label(),
        boat.x,
        boat.y,
        mode,
        weather,
        voyage.seed(),
        voyage.found(),
        voyage.total(),
        extra
    )
}

pub fn render_voyage(voyage: &Voyage, sparkles: &[Sparkle], notice: Option<&str>) -> Screen {
    let grid = voyage.grid();
    let width = grid.width();
    let boat = voyage.boat();

    let marks: HashMap<(usize, usize), char> = voyage
        .reflections()
        .iter()
        .map(|r| ((r.x, r.y), '?'))
        .collect();
    let glints: HashMap<(usize, usize), char> =
        sparkles.iter().map(|s| ((s.x, s.y), s.glyph)).collect();

    let mut lines = Vec::with_capacity(grid.height() + 6);
    lines.push(border(true, width));
    lines.push(framed(&centered(TITLE, width)));

    for y in 0..grid.height() {
        let row: String = (0..width)
            .map(|x| {
                if (x, y) == (boat.x, boat.y) {
                    return boat.heading.glyph();
                }
                if let Some(&m) = marks.get(&(x, y)) {
                    return m;
                }
                match grid.get(x, y) {
                    Some(Cell::Water) => {}
                    Some(cell) => return cell.glyph(),
                    None => return ' ',
                }
                if let Some(&g) = glints.get(&(x, y)) {
                    return g;
                }
                if voyage.in_front(x, y) {
                    '~'
                } else {
                    Cell::Water.glyph()
                }
            })
            .collect();
        lines.push(framed(&row));
    }

    lines.push(framed(&fit_line(&status_line(voyage, notice), width)));
    let saying = voyage
        .visible_aphorism()
        .map(|a| format!("~ {} ~", a))
        .unwrap_or_default();
    lines.push(framed(&centered(&saying, width)));
    lines.push(framed(&fit_line(HELP, width)));
    lines.push(border(false, width));

    Screen {
        lines,
        boat: Some(Span {
            row: MAP_TOP + boat.y,
            col: 1 + boat.x,
            len: 1,
        }),
        start_button: None,
    }
}

pub fn render_intro(width: usize, height: usize) -> Screen {
    let content_width = INTRO_TEXT
        .iter()
        .map(|l| l.chars().count())
        .chain([START_LABEL.len(), START_HINT.len()])
        .max()
        .unwrap_or(0);
    let window_width = (content_width + 4).min(width);
    let inner_width = window_width.saturating_sub(2);
    let window_height = INTRO_TEXT.len() + 6;
    let left_pad = width.saturating_sub(window_width) / 2;
    let right_pad = width.saturating_sub(left_pad + window_width);
    let top_pad = height.saturating_sub(window_height) / 2;

    let mut lines = Vec::with_capacity(height + 5);
    let mut start_button = None;
    lines.push(border(true, width));
    lines.push(framed(&centered(TITLE, width)));

    for y in 0..height {
        if y < top_pad || y >= top_pad + window_height {
            lines.push(framed(&" ".repeat(width)));
            continue;
        }
        let local_y = y - top_pad;
        let row = if local_y == 0 || local_y == window_height - 1 {
            format!("+{}+", "-".repeat(inner_width))
        } else {
            let content_row = local_y - 1;
            let inner = if content_row == INTRO_TEXT.len() + 2 {
                let pad = inner_width.saturating_sub(START_LABEL.len()) / 2;
                start_button = Some(Span {
                    row: lines.len(),
                    col: 1 + left_pad + 1 + pad,
                    len: START_LABEL.len(),
                });
                centered(START_LABEL, inner_width)
            } else if content_row == INTRO_TEXT.len() + 3 {
                centered(START_HINT, inner_width)
            } else {
                match content_row.checked_sub(1).and_then(|i| INTRO_TEXT.get(i)) {
                    Some(text) => centered(text, inner_width),
                    None => " ".repeat(inner_width),
                }
            };
            format!("|{}|", inner)
        };
        lines.push(framed(&format!(
            "{}{}{}",
            " ".repeat(left_pad),
            row,
            " ".repeat(right_pad)
        )));
    }

    lines.push(framed(&" ".repeat(width)));
    lines.push(framed(&" ".repeat(width)));
    lines.push(framed(&" ".repeat(width)));
    lines.push(border(false, width));

    Screen {
        lines,
        boat: None,
        start_button,
    }
}
