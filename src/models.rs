use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// The three hidden postback fields the ERP expects echoed back verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTokenSet {
    /// `__VIEWSTATE`
    pub view_state: String,
    /// `__VIEWSTATEGENERATOR`
    pub view_state_generator: String,
    /// `__EVENTVALIDATION`
    pub event_validation: String,
}

impl StateTokenSet {
    pub fn is_complete(&self) -> bool {
        !self.view_state.is_empty()
            && !self.view_state_generator.is_empty()
            && !self.event_validation.is_empty()
    }

    /// Keeps `self`'s slots, replacing each one that `fresh` has a non-empty value for.
    pub fn refreshed_with(&self, fresh: &StateTokenSet) -> StateTokenSet {
        fn pick(fresh: &str, old: &str) -> String {
            let chosen = if fresh.is_empty() { old } else { fresh };
            chosen.to_string()
        }
        StateTokenSet {
            view_state: pick(&fresh.view_state, &self.view_state),
            view_state_generator: pick(&fresh.view_state_generator, &self.view_state_generator),
            event_validation: pick(&fresh.event_validation, &self.event_validation),
        }
    }
}

/// What every resource fetch needs: the token set and the student's hidden id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub authenticated: bool,
    pub tokens: StateTokenSet,
    /// Value of the `hdnStudentId` hidden field on the landing page.
    pub subject_id: String,
}

impl SessionState {
    pub fn new(tokens: StateTokenSet, subject_id: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            tokens,
            subject_id: subject_id.into(),
        }
    }
}

/// Result of the first step of the login handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginChallenge {
    /// Absolute, cache-busted URL of the captcha image.
    pub captcha_url: String,
    /// Server-generated name of the input the captcha answer goes into.
    pub captcha_field: String,
}

/// Inclusive date range, rendered the way the ERP date pickers do (`dd/MM/yyyy`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> crate::error::Result<Self> {
        if from > to {
            return Err(crate::error::PortalError::InvalidInput(format!(
                "date range starts after it ends: {} > {}",
                from, to
            )));
        }
        Ok(Self { from, to })
    }

    /// Parses two `dd/MM/yyyy` strings.
    pub fn parse(from: &str, to: &str) -> crate::error::Result<Self> {
        let parse = |s: &str| {
            NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|_| {
                crate::error::PortalError::InvalidInput(format!("not a dd/MM/yyyy date: {}", s))
            })
        };
        Self::new(parse(from)?, parse(to)?)
    }

    pub fn from_text(&self) -> String {
        self.from.format(DATE_FORMAT).to_string()
    }

    pub fn to_text(&self) -> String {
        self.to.format(DATE_FORMAT).to_string()
    }
}

const DATE_FORMAT: &str = "%d/%m/%Y";

/// A row of today's attendance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendance {
    pub sr_no: String,
    pub year: String,
    pub course: String,
    pub semester: String,
    pub subject: String,
    pub time: String,
    pub kind: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyAttendance {
    pub sr_no: String,
    pub year: String,
    pub course: String,
    pub semester: String,
    pub month: String,
    pub percentage: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectAttendance {
    pub sr_no: String,
    pub year: String,
    pub course: String,
    pub semester: String,
    pub subject: String,
    pub percentage: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateAttendance {
    pub sr_no: String,
    pub year: String,
    pub course: String,
    pub semester: String,
    pub date: String,
    pub subject: String,
    pub time_slot: String,
    pub kind: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemesterAttendance {
    pub sr_no: String,
    pub year: String,
    pub course: String,
    pub semester: String,
    pub percentage: String,
}

/// Marks for one subject. The assessment columns keep the ERP's short names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grade {
    pub sr_no: String,
    pub semester: String,
    pub subject_code: String,
    pub subject: String,
    pub s1: String,
    pub st2: String,
    pub put: String,
    pub ta: String,
    pub mt1: String,
    pub st1: String,
}

/// An entry of a `<select>` on the exam result page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

/// Selectable semesters and exams, plus the state observed on that page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeOptions {
    pub semesters: Vec<SelectOption>,
    pub exams: Vec<SelectOption>,
    /// The caller's session with any token seen on the exam page swapped in.
    /// Pass this to the next grades fetch.
    pub state: SessionState,
}

/// Personal details from the student's course page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub photo: String,
    pub admission_no: String,
    pub reg_form_no: String,
    pub name: String,
    pub gender: String,
    pub blood_group: String,
    pub dob: String,
    pub present_address: String,
    pub city: String,
    pub state: String,
    pub pin_code: String,
    pub phone: String,
    pub email: String,
    pub remark: String,
    pub local_guardian_name: String,
    pub local_guardian_address: String,
    pub local_guardian_phone: String,
    pub father_name: String,
    pub father_mobile: String,
    pub father_email: String,
    pub mother_name: String,
    pub mother_mobile: String,
    pub mother_email: String,
    pub occupation: String,
    pub designation: String,
    pub annual_income: String,
    pub permanent_address: String,
    pub permanent_city: String,
    pub permanent_state: String,
    pub permanent_pin_code: String,
    pub permanent_phone: String,
    pub guardian_mobile: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficialDetails {
    // Official
    pub admission_no: String,
    pub account_id: String,
    pub admission_date: String,
    pub status: String,
    pub session: String,
    pub program: String,
    pub adm_sem: String,
    pub current_sem: String,
    pub group_name: String,
    pub quota: String,
    pub hostel: String,
    pub transport: String,
    pub official_mail: String,

    // Registration
    pub name: String,
    pub category: String,
    pub roll_no: String,
    pub enrollment_no: String,
    pub reg_form_no: String,
    pub serial_no: String,
    pub adm_through: String,
    pub reference_by: String,
    pub lateral_entry: String,
    pub xii_pcm: String,
    pub xii_agg: String,
    pub mess: String,

    // Mentor
    pub mentor_name: String,
    pub mentor_code: String,
    pub mentor_mobile: String,
    pub mentor_email: String,
    pub department: String,
    pub mentor_designation: String,
    pub cabin_no: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Qualification {
    pub sr_no: String,
    pub qualification: String,
    pub subject: String,
    pub college: String,
    pub board: String,
    pub medium: String,
    pub year_passing: String,
    pub percentage: String,
    pub grade: String,
    pub cgpa: String,
}

/// The qualification page: a short student header plus the qualification grid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualificationData {
    pub name: String,
    pub admission_no: String,
    pub admission_date: String,
    pub status: String,
    pub session: String,
    pub program: String,
    pub qualifications: Vec<Qualification>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeTableEvent {
    pub day: String,
    pub subject_code: String,
    pub subject: String,
    pub faculty: String,
    pub group: String,
    /// Label such as `09:00-09:50 (P1)`.
    pub time_slot: String,
    pub hall: String,
}

static PERIOD_MARKER: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\(P(\d+)\)").ok());

impl TimeTableEvent {
    /// Period number from the `(P<n>)` marker in the time slot, or 0.
    pub fn period(&self) -> u32 {
        PERIOD_MARKER
            .as_ref()
            .and_then(|re| re.captures(&self.time_slot))
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    }
}

/// Stable sort by period number.
pub fn sort_by_period(events: &mut [TimeTableEvent]) {
    events.sort_by_key(TimeTableEvent::period);
}

/// Groups events by day in order of first appearance, each day sorted by period.
pub fn group_by_day(events: &[TimeTableEvent]) -> Vec<(String, Vec<TimeTableEvent>)> {
    let mut groups: Vec<(String, Vec<TimeTableEvent>)> = Vec::new();
    for event in events {
        match groups.iter_mut().find(|(day, _)| *day == event.day) {
            Some((_, bucket)) => bucket.push(event.clone()),
            None => groups.push((event.day.clone(), vec![event.clone()])),
        }
    }
    for (_, bucket) in groups.iter_mut() {
        sort_by_period(bucket);
    }
    groups
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub title: String,
    pub heading: String,
    pub description: String,
    pub read_status: String,
    pub date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertsData {
    pub unread: Vec<Alert>,
    pub read: Vec<Alert>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(day: &str, code: &str, slot: &str) -> TimeTableEvent {
        TimeTableEvent {
            day: day.to_string(),
            subject_code: code.to_string(),
            time_slot: slot.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn date_range_rejects_reversed_bounds() {
        assert!(DateRange::parse("31/08/2025", "01/08/2025").is_err());
        assert!(DateRange::parse("2025-08-01", "31/08/2025").is_err());
        let range = DateRange::parse(" 01/08/2025", "01/08/2025").unwrap();
        assert_eq!(range.from_text(), "01/08/2025");
        assert_eq!(range.to_text(), "01/08/2025");
    }

    #[test]
    fn period_comes_from_the_marker() {
        assert_eq!(event("Monday", "A", "09:00-09:50 (P1)").period(), 1);
        assert_eq!(event("Monday", "A", "14:10-15:00 (P12)").period(), 12);
        assert_eq!(event("Monday", "A", "Lunch").period(), 0);
    }

    #[test]
    fn grouping_keeps_day_order_and_sorts_periods() {
        let events = vec![
            event("Wednesday", "C", "(P3)"),
            event("Monday", "B", "(P2)"),
            event("Wednesday", "A", "(P1)"),
            event("Monday", "D", "(P2)"),
        ];
        let days = group_by_day(&events);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].0, "Wednesday");
        let codes: Vec<_> = days[0].1.iter().map(|e| e.subject_code.as_str()).collect();
        assert_eq!(codes, ["A", "C"]);
        // Equal periods keep their order.
        let codes: Vec<_> = days[1].1.iter().map(|e| e.subject_code.as_str()).collect();
        assert_eq!(codes, ["B", "D"]);
    }

    #[test]
    fn fresh_tokens_win_unless_empty() {
        let old = StateTokenSet {
            view_state: "old-vs".into(),
            view_state_generator: "old-gen".into(),
            event_validation: "old-ev".into(),
        };
        let fresh = StateTokenSet {
            view_state: "new-vs".into(),
            ..Default::default()
        };
        let merged = old.refreshed_with(&fresh);
        assert_eq!(merged.view_state, "new-vs");
        assert_eq!(merged.view_state_generator, "old-gen");
        assert_eq!(merged.event_validation, "old-ev");
    }
}
