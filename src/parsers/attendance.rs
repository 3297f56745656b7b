use crate::document::Document;
use crate::models::{Attendance, DateAttendance, MonthlyAttendance, SemesterAttendance, SubjectAttendance};
use crate::parsers::table::{TableSpec, parse_table, span_at, text_at};

const TODAY: TableSpec = TableSpec::new("MCPH1_SCPH_gvDailyAttendence1", 8);
const MONTHLY: TableSpec = TableSpec::new("MCPH1_SCPH_gvMonthly", 6);
const SUBJECT_WISE: TableSpec = TableSpec::new("MCPH1_SCPH_GVSubject", 6);
const DATE_WISE: TableSpec = TableSpec::new("MCPH1_SCPH_gvDateWise", 9);
const SEMESTER: TableSpec = TableSpec::new("MCPH1_SCPH_gvAttendanceDetail", 5);

pub fn parse_today(html: &str) -> Vec<Attendance> {
    let document = Document::parse(html);
    parse_table(&document, TODAY, |cells| {
        Some(Attendance {
            sr_no: text_at(cells, 0),
            year: text_at(cells, 1),
            course: text_at(cells, 2),
            semester: text_at(cells, 3),
            subject: text_at(cells, 4),
            time: text_at(cells, 5),
            kind: text_at(cells, 6),
            status: text_at(cells, 7),
        })
    })
}

pub fn parse_monthly(html: &str) -> Vec<MonthlyAttendance> {
    let document = Document::parse(html);
    parse_table(&document, MONTHLY, |cells| {
        Some(MonthlyAttendance {
            sr_no: text_at(cells, 0),
            year: text_at(cells, 1),
            course: text_at(cells, 2),
            semester: text_at(cells, 3),
            month: text_at(cells, 4),
            percentage: span_at(cells, 5),
        })
    })
}

pub fn parse_subject_wise(html: &str) -> Vec<SubjectAttendance> {
    let document = Document::parse(html);
    parse_table(&document, SUBJECT_WISE, |cells| {
        Some(SubjectAttendance {
            sr_no: text_at(cells, 0),
            year: text_at(cells, 1),
            course: text_at(cells, 2),
            semester: text_at(cells, 3),
            subject: text_at(cells, 4),
            percentage: span_at(cells, 5),
        })
    })
}

pub fn parse_date_wise(html: &str) -> Vec<DateAttendance> {
    let document = Document::parse(html);
    parse_table(&document, DATE_WISE, |cells| {
        Some(DateAttendance {
            sr_no: text_at(cells, 0),
            year: text_at(cells, 1),
            course: text_at(cells, 2),
            semester: text_at(cells, 3),
            date: text_at(cells, 4),
            subject: text_at(cells, 5),
            time_slot: text_at(cells, 6),
            kind: text_at(cells, 7),
            status: text_at(cells, 8),
        })
    })
}

pub fn parse_semester(html: &str) -> Vec<SemesterAttendance> {
    let document = Document::parse(html);
    parse_table(&document, SEMESTER, |cells| {
        Some(SemesterAttendance {
            sr_no: text_at(cells, 0),
            year: text_at(cells, 1),
            course: text_at(cells, 2),
            semester: text_at(cells, 3),
            percentage: span_at(cells, 4),
        })
    })
}
