// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use gportal_core::{ClientConfig, GportalClient, Page, PortalError, PostbackForm, Result, Transport};
use reqwest::StatusCode;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub const BASE_URL: &str = "https://erp.test/ISIMGLB";

/// One request as the fake transport saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: &'static str,
    pub path: String,
    pub form: Option<PostbackForm>,
}

#[derive(Clone)]
enum Reply {
    Page {
        status: u16,
        body: String,
        location: Option<String>,
    },
    Unreachable,
}

/// Scripted stand-in for the ERP.
///
/// Replies are queued per method and path (query string ignored). The last
/// reply of a queue is repeated; unscripted routes answer 404.
#[derive(Default)]
pub struct FakeTransport {
    routes: Mutex<HashMap<(String, String), VecDeque<Reply>>>,
    requests: Mutex<Vec<Recorded>>,
    cookies: Mutex<Vec<String>>,
    cookies_cleared: AtomicBool,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, method: &str, path: &str, reply: Reply) {
        self.routes
            .lock()
            .unwrap()
            .entry((method.to_string(), path.to_string()))
            .or_default()
            .push_back(reply);
    }

    pub fn on_get(&self, path: &str, body: impl Into<String>) {
        self.push("GET", path, Reply::Page { status: 200, body: body.into(), location: None });
    }

    pub fn on_post(&self, path: &str, body: impl Into<String>) {
        self.push("POST", path, Reply::Page { status: 200, body: body.into(), location: None });
    }

    pub fn on_status(&self, method: &str, path: &str, status: u16) {
        self.push(method, path, Reply::Page { status, body: String::new(), location: None });
    }

    pub fn on_redirect(&self, method: &str, path: &str, location: &str) {
        self.push(
            method,
            path,
            Reply::Page { status: 302, body: String::new(), location: Some(location.to_string()) },
        );
    }

    pub fn unreachable(&self, method: &str, path: &str) {
        self.push(method, path, Reply::Unreachable);
    }

    /// Drops every reply scripted for the route.
    pub fn clear_route(&self, method: &str, path: &str) {
        self.routes
            .lock()
            .unwrap()
            .remove(&(method.to_string(), path.to_string()));
    }

    pub fn set_cookies(&self, cookies: &[&str]) {
        *self.cookies.lock().unwrap() = cookies.iter().map(|c| c.to_string()).collect();
    }

    pub fn cookies_cleared(&self) -> bool {
        self.cookies_cleared.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && route_path(&r.path) == path)
            .count()
    }

    /// Form of the most recent POST to `path`.
    pub fn last_form(&self, path: &str) -> Option<PostbackForm> {
        self.requests()
            .into_iter()
            .rev()
            .find(|r| r.method == "POST" && r.path == path)
            .and_then(|r| r.form)
    }

    async fn answer(&self, method: &'static str, path: &str, form: Option<&PostbackForm>) -> Result<Page> {
        self.requests.lock().unwrap().push(Recorded {
            method,
            path: path.to_string(),
            form: form.cloned(),
        });

        let reply = {
            let mut routes = self.routes.lock().unwrap();
            match routes.get_mut(&(method.to_string(), route_path(path))) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match reply {
            Some(Reply::Page { status, body, location }) => Ok(Page {
                status: StatusCode::from_u16(status).unwrap(),
                location,
                body,
            }),
            Some(Reply::Unreachable) => Err(network_error().await),
            None => Ok(Page {
                status: StatusCode::NOT_FOUND,
                location: None,
                body: String::new(),
            }),
        }
    }
}

fn route_path(path: &str) -> String {
    let path = path.strip_prefix(BASE_URL).unwrap_or(path);
    path.split('?').next().unwrap_or_default().to_string()
}

/// A genuine `reqwest` failure, produced without touching the network.
async fn network_error() -> PortalError {
    match reqwest::Client::new().get("not a url").send().await {
        Err(e) => PortalError::Request(e),
        Ok(_) => unreachable!("malformed url was sent"),
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, path: &str) -> Result<Page> {
        self.answer("GET", path, None).await
    }

    async fn post_form(&self, path: &str, form: &PostbackForm) -> Result<Page> {
        self.answer("POST", path, Some(form)).await
    }

    async fn post_form_manual(&self, path: &str, form: &PostbackForm) -> Result<Page> {
        self.answer("POST", path, Some(form)).await
    }

    async fn get_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let page = self.answer("GET", path, None).await?.ensure_success(path)?;
        Ok(page.body.into_bytes())
    }

    fn clear_session_cookies(&self) {
        self.cookies.lock().unwrap().clear();
        self.cookies_cleared.store(true, Ordering::SeqCst);
    }

    fn export_cookies(&self) -> Vec<String> {
        self.cookies.lock().unwrap().clone()
    }

    fn import_cookies(&self, cookies: &[String]) {
        self.cookies.lock().unwrap().extend(cookies.iter().cloned());
    }
}

pub fn client(transport: &Arc<FakeTransport>) -> GportalClient {
    let config = ClientConfig::default().with_base_url(BASE_URL);
    GportalClient::with_transport(config, transport.clone())
}


pub fn tokens(view_state: &str) -> String {
    format!(
        r#"<input type="hidden" name="__VIEWSTATE" id="__VIEWSTATE" value="{vs}" />
           <input type="hidden" name="__VIEWSTATEGENERATOR" id="__VIEWSTATEGENERATOR" value="GEN-{vs}" />
           <input type="hidden" name="__EVENTVALIDATION" id="__EVENTVALIDATION" value="EV-{vs}" />"#,
        vs = view_state
    )
}

pub fn login_page(captcha_field: &str) -> String {
    format!(
        r#"<html><body><form method="post" action="./Login">{}
            <input name="__txtUserId100" type="text" />
            <input name="txtPass" type="password" />
            <img id="Image1" src="CaptchaImage.axd?guid=7a1e" />
            <div id="pnlInfo1"><input name="{}" type="text" /></div>
        </form></body></html>"#,
        tokens("LOGIN"),
        captcha_field
    )
}

pub fn landing_page(subject_id: &str) -> String {
    format!(
        r#"<html><body><form method="post" action="./TodayAttendence">{}
            <input type="hidden" name="ctl00$ctl00$MCPH1$SCPH$hdnStudentId" id="MCPH1_SCPH_hdnStudentId" value="{}" />
        </form></body></html>"#,
        tokens("LANDING"),
        subject_id
    )
}

pub fn home_page() -> String {
    format!(
        r#"<html><body><form method="post" action="./Home">{}
            <input type="hidden" name="ctl00$hdnCollege" value="GLB" />
            <input type="hidden" name="ctl00$hdnForSchoolMaster" value="0" />
            <input type="hidden" name="ctl00$txtCaseCSS" value="textDefault" />
        </form></body></html>"#,
        tokens("HOME")
    )
}

/// A page with a `MCPH1_SCPH_<id>` grid: one header row, then `rows`.
pub fn grid_page(id: &str, rows: &[&[&str]]) -> String {
    let body: String = rows
        .iter()
        .map(|cells| {
            let tds: String = cells.iter().map(|c| format!("<td>{}</td>", c)).collect();
            format!("<tr>{}</tr>", tds)
        })
        .collect();
    format!(
        r#"<html><body><table id="MCPH1_SCPH_{}"><tr><th>header</th></tr>{}</table></body></html>"#,
        id, body
    )
}

/// Logs `client` in against scripted login and landing pages.
pub async fn logged_in(transport: &Arc<FakeTransport>) -> (GportalClient, gportal_core::SessionState) {
    transport.on_get("/Login", login_page("txtcap01"));
    transport.on_post("/Login", "<html>welcome</html>");
    transport.on_get("/Student/TodayAttendence", landing_page("4711"));
    let client = client(transport);
    let state = client.login("2201920100", "secret", "x7k2").await.unwrap();
    (client, state)
}
