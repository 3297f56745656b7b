//! One parser per ERP page. Each takes the raw HTML and owns its parsed
//! document, so nothing borrowed from the DOM crosses an `.await`.

pub mod alerts;
pub mod attendance;
pub mod grades;
pub mod login;
pub mod profile;
pub(crate) mod table;
pub mod timetable;
