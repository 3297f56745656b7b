//! Reads the ERP's hidden postback state out of a served page.

use crate::document::Document;
use crate::models::StateTokenSet;

pub const VIEW_STATE: &str = "__VIEWSTATE";
pub const VIEW_STATE_GENERATOR: &str = "__VIEWSTATEGENERATOR";
pub const EVENT_VALIDATION: &str = "__EVENTVALIDATION";
pub const VIEW_STATE_ENCRYPTED: &str = "__VIEWSTATEENCRYPTED";

/// Hidden field holding the student id on every `/Student/*` page.
pub const STUDENT_ID_FIELD: &str = "ctl00$ctl00$MCPH1$SCPH$hdnStudentId";

/// Extracts the three state tokens by input name.
///
/// A missing input yields an empty slot; the ERP omits fields it does not need
/// for the next postback, and an empty token only costs that one exchange.
pub fn extract(document: &Document) -> StateTokenSet {
    StateTokenSet {
        view_state: hidden(document, VIEW_STATE),
        view_state_generator: hidden(document, VIEW_STATE_GENERATOR),
        event_validation: hidden(document, EVENT_VALIDATION),
    }
}

/// Same tokens, looked up by element id instead of input name.
///
/// The exam result page is the one place where the name lookup has proven
/// unreliable.
pub fn extract_by_id(document: &Document) -> StateTokenSet {
    let by_id = |id: &str| document.attr_of(id, "value");
    StateTokenSet {
        view_state: by_id(VIEW_STATE),
        view_state_generator: by_id(VIEW_STATE_GENERATOR),
        event_validation: by_id(EVENT_VALIDATION),
    }
}

/// Value of a named hidden input, or `""`.
pub fn hidden(document: &Document, name: &str) -> String {
    document.input_value(name).unwrap_or_default()
}

/// Student id from a `/Student/*` page, or `""`.
pub fn subject_id(document: &Document) -> String {
    hidden(document, STUDENT_ID_FIELD)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_login_page(tokens: &StateTokenSet) -> String {
        format!(
            r#"<html><body><form method="post" action="./Login">
                <input type="hidden" name="__VIEWSTATE" id="__VIEWSTATE" value="{}" />
                <input type="hidden" name="__VIEWSTATEGENERATOR" id="__VIEWSTATEGENERATOR" value="{}" />
                <input type="hidden" name="__EVENTVALIDATION" id="__EVENTVALIDATION" value="{}" />
                <div id="pnlInfo1"><input name="txtcaptcha81" type="text" /></div>
            </form></body></html>"#,
            tokens.view_state, tokens.view_state_generator, tokens.event_validation
        )
    }

    #[test]
    fn extract_returns_what_was_rendered() {
        let triples = [
            ("/wEPDwUKMTY3NzE5MjIyMA9kFgJmD2QWAgIDD2QWAg==", "C2EE9ABB", "/wEdAAo+Fv3q"),
            ("a", "b", "c"),
            ("x+y/z==", "00000000", "e&v"),
        ];
        for (vs, generator, ev) in triples {
            let tokens = StateTokenSet {
                view_state: vs.to_string(),
                view_state_generator: generator.to_string(),
                event_validation: ev.replace('&', "&amp;"),
            };
            let html = render_login_page(&tokens);
            let extracted = extract(&Document::parse(&html));
            assert_eq!(extracted.view_state, vs);
            assert_eq!(extracted.view_state_generator, generator);
            assert_eq!(extracted.event_validation, ev);
            assert_eq!(extract_by_id(&Document::parse(&html)), extracted);
        }
    }

    #[test]
    fn missing_tokens_default_to_empty() {
        let doc = Document::parse(
            r#"<form><input type="hidden" name="__VIEWSTATE" value="only-this" /></form>"#,
        );
        let tokens = extract(&doc);
        assert_eq!(tokens.view_state, "only-this");
        assert_eq!(tokens.view_state_generator, "");
        assert_eq!(tokens.event_validation, "");
        assert!(!tokens.is_complete());
    }

    #[test]
    fn subject_id_is_read_from_hidden_field() {
        let doc = Document::parse(
            r#"<input type="hidden" name="ctl00$ctl00$MCPH1$SCPH$hdnStudentId" value="20231045" />"#,
        );
        assert_eq!(subject_id(&doc), "20231045");
        assert_eq!(subject_id(&Document::parse("<p></p>")), "");
    }
}
