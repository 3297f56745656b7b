use crate::document::Document;
use crate::forms::QualificationPage;
use crate::models::{OfficialDetails, Profile, Qualification, QualificationData};
use crate::parsers::table::{TableSpec, parse_table, text_at};
use crate::state::{self, VIEW_STATE_ENCRYPTED};

const QUALIFICATIONS: TableSpec = TableSpec::new("MCPH1_SCPH_GVQualification", 10);

pub fn parse_profile(html: &str) -> Profile {
    let doc = Document::parse(html);
    let text = |label: &str| doc.text_of(&format!("MCPH1_SCPH_{}", label));

    Profile {
        photo: doc.attr_of("MCPH1_SCPH_ViewStudentPhoto_ifrmaeImg", "src"),
        admission_no: text("lblAdmNo"),
        reg_form_no: text("lblRegNo"),
        name: text("lblName"),
        gender: text("lblGender"),
        blood_group: text("lblBG"),
        dob: text("lblDOB"),
        present_address: text("lblPresentAdd"),
        city: text("lblCity1"),
        state: text("lblstate1"),
        pin_code: text("lblPin1"),
        phone: text("lblPhone1"),
        email: text("lblEmail1"),
        remark: text("lblRemark"),
        local_guardian_name: text("lblLGuard"),
        local_guardian_address: text("lblAddress1"),
        local_guardian_phone: text("lblPhone"),
        father_name: text("lblfather"),
        father_mobile: text("lblfmob"),
        father_email: text("lblFEmail"),
        mother_name: text("lblmother"),
        mother_mobile: text("lblMobile"),
        mother_email: text("lblMEmail"),
        occupation: text("lblOccupation"),
        designation: text("lblDesi"),
        annual_income: text("lblMon"),
        permanent_address: text("lblParmanantAdd"),
        permanent_city: text("lblCity2"),
        permanent_state: text("lblState2"),
        permanent_pin_code: text("lblpin2"),
        permanent_phone: text("lblPhone2"),
        guardian_mobile: text("lblmob"),
    }
}

pub fn parse_official(html: &str) -> OfficialDetails {
    let doc = Document::parse(html);
    let text = |label: &str| doc.text_of(&format!("MCPH1_SCPH_{}", label));

    OfficialDetails {
        admission_no: text("lbladmissionNo"),
        account_id: text("lblaccountID"),
        admission_date: text("lbladmissiondate"),
        status: text("lblstatus"),
        session: text("lblsession"),
        program: text("lblprogram"),
        adm_sem: text("lbladmSem"),
        current_sem: text("lblcurrentSem"),
        group_name: text("lblgroupName"),
        quota: text("lblquota"),
        hostel: text("lblhostel"),
        transport: text("lblTransport"),
        official_mail: text("lblOffMail"),

        name: text("lblNa"),
        category: text("lblcategory"),
        roll_no: text("lblrollNo"),
        // sic: the ERP spells this id with a "k"
        enrollment_no: text("lbkenrollmentNo"),
        reg_form_no: text("lblregformNo"),
        serial_no: text("lblserialNo"),
        adm_through: text("lblAdmthrough"),
        reference_by: text("lblReferenceBy"),
        lateral_entry: text("lbllateralEntry"),
        xii_pcm: text("lblXIIPCM"),
        xii_agg: text("lblXIIAGG"),
        mess: text("lblmess"),

        mentor_name: text("lblMentorName"),
        mentor_code: text("lblMentorCode"),
        mentor_mobile: text("lblMobile"),
        mentor_email: text("lblEmail"),
        department: text("lblDept"),
        mentor_designation: text("lblDesg"),
        cabin_no: text("lblCabinNo"),
    }
}

/// Hidden values of the qualification page's search form.
///
/// `fallback_admission_no` fills the admission box when the page leaves it out.
pub fn parse_qualification_form(html: &str, fallback_admission_no: &str) -> QualificationPage {
    let doc = Document::parse(html);
    let admission_no = doc
        .input_value("ctl00$ctl00$MCPH1$SCPH$txtadmno")
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| fallback_admission_no.to_string());

    QualificationPage {
        tokens: state::extract(&doc),
        view_state_encrypted: state::hidden(&doc, VIEW_STATE_ENCRYPTED),
        student_id: state::hidden(&doc, "ctl00$ctl00$MCPH1$SCPH$hdnstdid"),
        admission_no,
    }
}

pub fn parse_qualifications(html: &str) -> QualificationData {
    let doc = Document::parse(html);
    let text = |label: &str| doc.text_of(&format!("MCPH1_SCPH_{}", label));

    let qualifications = parse_table(&doc, QUALIFICATIONS, |cells| {
        let qualification = text_at(cells, 1);
        if qualification.is_empty() {
            return None;
        }
        Some(Qualification {
            sr_no: text_at(cells, 0),
            qualification,
            subject: text_at(cells, 2),
            college: text_at(cells, 3),
            board: text_at(cells, 4),
            medium: text_at(cells, 5),
            year_passing: text_at(cells, 6),
            percentage: text_at(cells, 7),
            grade: text_at(cells, 8),
            cgpa: text_at(cells, 9),
        })
    });

    QualificationData {
        name: text("lblNa"),
        admission_no: text("lbladmissionNo"),
        admission_date: text("lbladmissiondate"),
        status: text("lblstatus"),
        session: text("lblsession"),
        program: text("lblprogram"),
        qualifications,
    }
}
