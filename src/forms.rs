//! Postback bodies.
//!
//! The ERP serves several reports from one URL and picks the branch by which
//! submit field is present, so each builder below differs mostly in its
//! discriminator field.

use crate::models::{DateRange, SessionState, StateTokenSet};
use crate::state::{EVENT_VALIDATION, STUDENT_ID_FIELD, VIEW_STATE, VIEW_STATE_ENCRYPTED, VIEW_STATE_GENERATOR};

const PREFIX: &str = "ctl00$ctl00$MCPH1$SCPH$";

/// Hidden master-page fields the logout postback must echo back.
pub const LOGOUT_HIDDEN_FIELDS: [&str; 7] = [
    "ctl00$hdncollegenewsalerts",
    "ctl00$hdnsystemalerts",
    "ctl00$hdnattendancealerts",
    "ctl00$hdnlibraryalerts",
    "ctl00$hdnCollege",
    "ctl00$hdnForSchoolMaster",
    "ctl00$txtCaseCSS",
];

/// An ordered `application/x-www-form-urlencoded` body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostbackForm {
    fields: Vec<(String, String)>,
}

impl PostbackForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Field under the content placeholder prefix shared by all `/Student/*` pages.
    fn page_field(self, name: &str, value: impl Into<String>) -> Self {
        self.field(format!("{}{}", PREFIX, name), value)
    }

    pub fn tokens(self, tokens: &StateTokenSet) -> Self {
        self.field(VIEW_STATE, tokens.view_state.as_str())
            .field(VIEW_STATE_GENERATOR, tokens.view_state_generator.as_str())
            .field(EVENT_VALIDATION, tokens.event_validation.as_str())
    }

    /// Master-page fields every `/Student/*` postback carries, plus the student id.
    fn student_page(self, subject_id: &str) -> Self {
        self.field("ctl00$ctl00$hdnForSchoolMaster", "0")
            .field("ctl00$ctl00$txtCaseCSS", "textDefault")
            .field(STUDENT_ID_FIELD, subject_id)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.fields
    }
}

/// Credentials postback for `/Login`.
pub fn login(
    tokens: &StateTokenSet,
    captcha_field: &str,
    identifier: &str,
    secret: &str,
    captcha: &str,
) -> PostbackForm {
    PostbackForm::new()
        .field("__LASTFOCUS", "")
        .field("__EVENTTARGET", "")
        .field("__EVENTARGUMENT", "")
        .tokens(tokens)
        .field("selector", "rdoStdudent")
        .field("__txtUserId100", identifier)
        .field("txtPass", secret)
        .field(captcha_field, captcha)
        .field("btnLogin_", "LOGIN")
        .field("zx1234", identifier)
        .field("hidsetname", "ok")
        .field("hdnShowInstruction", "0")
        .field("txtUserName", "")
        .field("txtdateofBirth", "")
}

/// Logout postback for `/Home`. `hidden` pairs come from [`LOGOUT_HIDDEN_FIELDS`].
pub fn logout(tokens: &StateTokenSet, hidden: &[(String, String)]) -> PostbackForm {
    let mut form = PostbackForm::new()
        .field("__EVENTTARGET", "ctl00$btnLogOut")
        .field("__EVENTARGUMENT", "")
        .tokens(tokens);
    for (name, value) in hidden {
        form = form.field(name.as_str(), value.as_str());
    }
    form
}

/// The five reports behind `/Student/TodayAttendence`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceView {
    Today,
    Monthly,
    Semester,
    SubjectWise(DateRange),
    DateWise(DateRange),
}

pub fn attendance(state: &SessionState, view: AttendanceView) -> PostbackForm {
    let form = PostbackForm::new()
        .tokens(&state.tokens)
        .student_page(&state.subject_id);

    let blank_ranges = |form: PostbackForm| {
        form.page_field("txtDFrom", "")
            .page_field("txtDTo", "")
            .page_field("txtFrom", "")
            .page_field("txtTo", "")
    };

    match view {
        AttendanceView::Today => blank_ranges(form.page_field("btntodayAtt", "Today Attendance")),
        AttendanceView::Monthly => {
            blank_ranges(form.page_field("btnMonthlyAtt", "Monthly Attendance"))
        }
        AttendanceView::Semester => {
            blank_ranges(form.page_field("btnSemAtt", "Semester Attendance"))
        }
        AttendanceView::SubjectWise(range) => form
            .page_field("txtDFrom", range.from_text())
            .page_field("txtDTo", range.to_text())
            .page_field("btnShowSubject", "Show")
            .page_field("txtFrom", "")
            .page_field("txtTo", ""),
        AttendanceView::DateWise(range) => form
            .page_field("txtDFrom", "")
            .page_field("txtDTo", "")
            .page_field("txtFrom", range.from_text())
            .page_field("txtTo", range.to_text())
            .page_field("btnShowAtt", "Show"),
    }
}

pub fn grades(state: &SessionState, semester: &str, exam: &str) -> PostbackForm {
    PostbackForm::new()
        .field(VIEW_STATE, state.tokens.view_state.as_str())
        .field(VIEW_STATE_GENERATOR, state.tokens.view_state_generator.as_str())
        .field(VIEW_STATE_ENCRYPTED, "")
        .field(EVENT_VALIDATION, state.tokens.event_validation.as_str())
        .student_page(&state.subject_id)
        .page_field("hdnResult", "0")
        .page_field("ddldrp", semester)
        .page_field("ddlExamName", exam)
        .page_field("btnRun", "Show")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimetableView {
    Today,
    Weekly,
}

pub fn timetable(tokens: &StateTokenSet, subject_id: &str, view: TimetableView) -> PostbackForm {
    let form = PostbackForm::new().tokens(tokens).student_page(subject_id);
    match view {
        TimetableView::Today => form.page_field("Button2", "Today"),
        TimetableView::Weekly => form.page_field("Button1", "Weekly"),
    }
}

/// Hidden values the qualification page hands out on GET.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QualificationPage {
    pub tokens: StateTokenSet,
    pub view_state_encrypted: String,
    pub student_id: String,
    pub admission_no: String,
}

pub fn qualification(page: &QualificationPage) -> PostbackForm {
    PostbackForm::new()
        .field(VIEW_STATE, page.tokens.view_state.as_str())
        .field(VIEW_STATE_GENERATOR, page.tokens.view_state_generator.as_str())
        .field(VIEW_STATE_ENCRYPTED, page.view_state_encrypted.as_str())
        .field(EVENT_VALIDATION, page.tokens.event_validation.as_str())
        .field("ctl00$ctl00$hdnForSchoolMaster", "0")
        .field("ctl00$ctl00$txtCaseCSS", "textDefault")
        .page_field("HiddenField1", "0")
        .page_field("hdnstdid", page.student_id.as_str())
        .page_field("txtadmno", page.admission_no.as_str())
        .page_field("btnsearchs", "Show")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn state() -> SessionState {
        SessionState::new(
            StateTokenSet {
                view_state: "VS".into(),
                view_state_generator: "GEN".into(),
                event_validation: "EV".into(),
            },
            "4711",
        )
    }

    #[test]
    fn login_form_keys_captcha_under_dynamic_name() {
        let form = login(&state().tokens, "txtcaptcha81", "2300001", "hunter2", "x7Kq");
        assert_eq!(form.get("txtcaptcha81"), Some("x7Kq"));
        assert_eq!(form.get("selector"), Some("rdoStdudent"));
        assert_eq!(form.get("__txtUserId100"), Some("2300001"));
        assert_eq!(form.get("zx1234"), Some("2300001"));
        assert_eq!(form.get("btnLogin_"), Some("LOGIN"));
        assert_eq!(form.get("__VIEWSTATE"), Some("VS"));
        assert_eq!(form.get("txtdateofBirth"), Some(""));
    }

    #[test]
    fn each_attendance_view_sends_only_its_discriminator() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 8, 31).unwrap(),
        )
        .unwrap();
        let buttons = [
            "btntodayAtt",
            "btnMonthlyAtt",
            "btnSemAtt",
            "btnShowSubject",
            "btnShowAtt",
        ];
        let views = [
            AttendanceView::Today,
            AttendanceView::Monthly,
            AttendanceView::Semester,
            AttendanceView::SubjectWise(range),
            AttendanceView::DateWise(range),
        ];
        for (index, view) in views.into_iter().enumerate() {
            let form = attendance(&state(), view);
            for (other, button) in buttons.iter().enumerate() {
                let name = format!("{}{}", PREFIX, button);
                assert_eq!(form.contains(&name), index == other, "{:?} / {}", view, button);
            }
            assert_eq!(form.get(STUDENT_ID_FIELD), Some("4711"));
        }
    }

    #[test]
    fn date_ranges_land_in_the_right_pickers() {
        let range = DateRange::parse("01/08/2025", "15/08/2025").unwrap();
        let subject = attendance(&state(), AttendanceView::SubjectWise(range));
        assert_eq!(subject.get("ctl00$ctl00$MCPH1$SCPH$txtDFrom"), Some("01/08/2025"));
        assert_eq!(subject.get("ctl00$ctl00$MCPH1$SCPH$txtTo"), Some(""));

        let dated = attendance(&state(), AttendanceView::DateWise(range));
        assert_eq!(dated.get("ctl00$ctl00$MCPH1$SCPH$txtFrom"), Some("01/08/2025"));
        assert_eq!(dated.get("ctl00$ctl00$MCPH1$SCPH$txtTo"), Some("15/08/2025"));
        assert_eq!(dated.get("ctl00$ctl00$MCPH1$SCPH$txtDFrom"), Some(""));
    }

    #[test]
    fn logout_form_targets_logout_button() {
        let hidden = vec![("ctl00$hdnCollege".to_string(), "GLB".to_string())];
        let form = logout(&state().tokens, &hidden);
        assert_eq!(form.get("__EVENTTARGET"), Some("ctl00$btnLogOut"));
        assert_eq!(form.get("ctl00$hdnCollege"), Some("GLB"));
        assert_eq!(form.get("__EVENTVALIDATION"), Some("EV"));
    }

    #[test]
    fn timetable_views_use_distinct_buttons() {
        let today = timetable(&state().tokens, "4711", TimetableView::Today);
        let weekly = timetable(&state().tokens, "4711", TimetableView::Weekly);
        assert_eq!(today.get("ctl00$ctl00$MCPH1$SCPH$Button2"), Some("Today"));
        assert!(!today.contains("ctl00$ctl00$MCPH1$SCPH$Button1"));
        assert_eq!(weekly.get("ctl00$ctl00$MCPH1$SCPH$Button1"), Some("Weekly"));
    }
}
