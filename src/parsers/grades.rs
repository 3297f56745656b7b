use crate::document::Document;
use crate::models::{Grade, SelectOption, StateTokenSet};
use crate::parsers::table::{TableSpec, parse_table, text_at};
use crate::state;

// Header uses `th` cells, so no row is skipped up front.
const MARKS: TableSpec = TableSpec::new("MCPH1_SCPH_gvmarksdetails", 10).without_header();

const PLACEHOLDER_OPTION: &str = "--Select--";

/// Everything the exam result page offers before a semester is picked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExamPage {
    pub semesters: Vec<SelectOption>,
    pub exams: Vec<SelectOption>,
    pub tokens: StateTokenSet,
    pub subject_id: String,
}

pub fn parse_exam_page(html: &str) -> ExamPage {
    let document = Document::parse(html);

    // Some renders only carry the ids, others only the names.
    let by_id = state::extract_by_id(&document);
    let tokens = by_id.refreshed_with(&state::extract(&document));
    let subject_id = {
        let by_id = document.attr_of("hdnStudentId", "value");
        if by_id.is_empty() { state::subject_id(&document) } else { by_id }
    };

    ExamPage {
        semesters: select_options(&document, "MCPH1_SCPH_ddldrp"),
        exams: select_options(&document, "MCPH1_SCPH_ddlExamName"),
        tokens,
        subject_id,
    }
}

fn select_options(document: &Document, id: &str) -> Vec<SelectOption> {
    let Some(select) = document.by_id(id) else {
        return Vec::new();
    };
    select
        .select("option")
        .into_iter()
        .map(|option| SelectOption {
            value: option.attr("value").unwrap_or_default().to_string(),
            label: option.text(),
        })
        .filter(|option| option.value != PLACEHOLDER_OPTION)
        .collect()
}

pub fn parse_marks(html: &str) -> Vec<Grade> {
    let document = Document::parse(html);
    parse_table(&document, MARKS, |cells| {
        Some(Grade {
            sr_no: text_at(cells, 0),
            semester: text_at(cells, 1),
            subject_code: text_at(cells, 2),
            subject: text_at(cells, 3),
            s1: text_at(cells, 4),
            st2: text_at(cells, 5),
            put: text_at(cells, 6),
            ta: text_at(cells, 7),
            mt1: text_at(cells, 8),
            st1: text_at(cells, 9),
        })
    })
}
