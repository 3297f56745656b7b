//! Timetable grid.
//!
//! The day column is `rowspan`-merged: the first row of a day has seven cells,
//! the day's remaining rows have six and belong to the last day seen.

use crate::document::{Document, Node};
use crate::models::{StateTokenSet, TimeTableEvent};
use crate::parsers::table::{body_rows, is_sentinel_text};
use crate::state;
use tracing::debug;

const TABLE_ID: &str = "MCPH1_SCPH_gvTimeTable";
const DAY_ROW_CELLS: usize = 7;
const SLOT_ROW_CELLS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TimetableRow {
    /// Opens a new day; carries the day cell's text.
    DayHeader(String),
    Continuation,
    Sentinel,
    Skip,
}

impl TimetableRow {
    pub(crate) fn classify(cell_count: usize, first_text: Option<&str>) -> Self {
        if cell_count == 1 && first_text.is_some_and(is_sentinel_text) {
            return TimetableRow::Sentinel;
        }
        match cell_count {
            DAY_ROW_CELLS => TimetableRow::DayHeader(first_text.unwrap_or_default().to_string()),
            n if n >= SLOT_ROW_CELLS => TimetableRow::Continuation,
            _ => TimetableRow::Skip,
        }
    }

    /// Cells before the slot columns.
    fn offset(&self) -> usize {
        match self {
            TimetableRow::DayHeader(_) => 1,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) enum DayState {
    #[default]
    NoDayYet,
    InDay(String),
}

impl DayState {
    /// Only a day row with a non-empty day cell moves to a new day.
    pub(crate) fn advance(&mut self, row: &TimetableRow) {
        if let TimetableRow::DayHeader(day) = row {
            if !day.is_empty() {
                *self = DayState::InDay(day.clone());
            }
        }
    }

    pub(crate) fn day(&self) -> &str {
        match self {
            DayState::NoDayYet => "",
            DayState::InDay(day) => day,
        }
    }
}

fn slot_value(cells: &[Node<'_>], index: usize) -> String {
    cells
        .get(index)
        .map(|cell| cell.nested_text("span").unwrap_or_else(|| cell.text()))
        .unwrap_or_default()
}

pub fn parse_timetable(html: &str) -> Vec<TimeTableEvent> {
    let document = Document::parse(html);
    let Some(rows) = body_rows(&document, TABLE_ID, 1) else {
        debug!(table = TABLE_ID, "timetable not rendered, no events");
        return Vec::new();
    };

    let mut day = DayState::default();
    let mut events = Vec::new();
    for row in &rows {
        let cells = row.cells();
        let first = cells.first().map(|cell| cell.text());
        let shape = TimetableRow::classify(cells.len(), first.as_deref());
        match shape {
            TimetableRow::Sentinel => break,
            TimetableRow::Skip => continue,
            TimetableRow::DayHeader(_) | TimetableRow::Continuation => {
                day.advance(&shape);
                let at = shape.offset();
                events.push(TimeTableEvent {
                    day: day.day().to_string(),
                    subject_code: slot_value(&cells, at),
                    subject: slot_value(&cells, at + 1),
                    faculty: slot_value(&cells, at + 2),
                    group: slot_value(&cells, at + 3),
                    time_slot: slot_value(&cells, at + 4),
                    hall: slot_value(&cells, at + 5),
                });
            }
        }
    }
    debug!(events = events.len(), "parsed timetable");
    events
}

/// Tokens and student id of the timetable page itself.
pub fn parse_timetable_form(html: &str) -> (StateTokenSet, String) {
    let document = Document::parse(html);
    (state::extract(&document), state::subject_id(&document))
}
