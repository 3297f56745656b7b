use crate::document::Document;
use crate::forms::LOGOUT_HIDDEN_FIELDS;
use crate::models::{SessionState, StateTokenSet};
use crate::state;

/// What the `/Login` page hands out for one login attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginPage {
    pub tokens: StateTokenSet,
    /// Name of the captcha input; regenerated by the server on every render.
    pub captcha_field: String,
    /// Raw `src` of the captcha image.
    pub captcha_src: String,
}

pub fn parse_login_page(html: &str) -> LoginPage {
    let doc = Document::parse(html);
    let captcha_field = doc
        .by_id("pnlInfo1")
        .and_then(|panel| panel.first("input"))
        .and_then(|input| input.attr("name"))
        .unwrap_or_default()
        .to_string();

    LoginPage {
        tokens: state::extract(&doc),
        captcha_field,
        captcha_src: doc.attr_of("Image1", "src"),
    }
}

/// Session payload from the post-login landing page.
pub fn parse_landing_page(html: &str) -> SessionState {
    let doc = Document::parse(html);
    SessionState::new(state::extract(&doc), state::subject_id(&doc))
}

/// Tokens plus the master-page hidden fields the logout postback needs.
pub fn parse_home_page(html: &str) -> (StateTokenSet, Vec<(String, String)>) {
    let doc = Document::parse(html);
    let hidden = LOGOUT_HIDDEN_FIELDS
        .iter()
        .map(|name| (name.to_string(), state::hidden(&doc, name)))
        .collect();
    (state::extract(&doc), hidden)
}
