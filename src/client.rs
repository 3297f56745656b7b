use crate::cache::CacheBackend;
use crate::config::ClientConfig;
use crate::error::{PortalError, Result};
use crate::forms::{self, AttendanceView, TimetableView};
use crate::models::{
    AlertsData, Attendance, DateAttendance, DateRange, GradeOptions, Grade, LoginChallenge,
    MonthlyAttendance, OfficialDetails, Profile, QualificationData, SemesterAttendance,
    SessionState, SubjectAttendance, TimeTableEvent,
};
use crate::parsers;
use crate::session::{MemorySessionStore, SessionHolder, SessionStore};
use crate::transport::{HttpTransport, Transport};
use chrono::Utc;
use reqwest::Url;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

const LOGIN_PATH: &str = "/Login";
const HOME_PATH: &str = "/Home";
/// First page after login; also the attendance postback target.
const ATTENDANCE_PATH: &str = "/Student/TodayAttendence";
const EXAM_RESULT_PATH: &str = "/Student/ExamResult";
const PROFILE_PATH: &str = "/Student/Course";
const OFFICIAL_PATH: &str = "/Student/StudentOfficial";
const QUALIFICATION_PATH: &str = "/Student/StudentQualification";
const TIMETABLE_PATH: &str = "/Student/TimeTable";
const ALERTS_PATH: &str = "/Student/Alerts";

const DEFAULT_CACHE_TTL_SECS: u64 = 60 * 60;

/// Client for the college ERP.
///
/// Fetchers take the [`SessionState`] explicitly and never modify the one held
/// by the client; only [`GportalClient::login`] and [`GportalClient::logout`] do.
pub struct GportalClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    session: SessionHolder,
    cache: Option<Arc<dyn CacheBackend>>,
    cache_ttl_secs: u64,
}

impl GportalClient {
    /// A client talking HTTP to `config.base_url`, keeping the session in memory.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(config.clone())?);
        Ok(Self::with_transport(config, transport))
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            session: SessionHolder::new(Arc::new(MemorySessionStore::new())),
            cache: None,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }

    /// Persists the session through `store`. Call [`GportalClient::init`] afterwards.
    pub fn with_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.session = SessionHolder::new(store);
        self
    }

    /// Serves read-only pages (profile, official details, alerts) from `cache`.
    pub fn with_cache(mut self, cache: Arc<dyn CacheBackend>, ttl_secs: u64) -> Self {
        self.cache = Some(cache);
        self.cache_ttl_secs = ttl_secs;
        self
    }

    /// Restores a persisted session, if the store has one.
    pub async fn init(&self) {
        self.session.init().await;
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The session held by the client, or `NotAuthenticated`.
    pub async fn session(&self) -> Result<SessionState> {
        self.session.current().await
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.is_authenticated().await
    }

    /// Loads the login page and returns the captcha to show the user.
    pub async fn fetch_login_challenge(&self) -> Result<LoginChallenge> {
        let path = format!("{}?_={}", LOGIN_PATH, Utc::now().timestamp_millis());
        let page = self.transport.get(&path).await?.ensure_success(LOGIN_PATH)?;
        let login_page = parsers::login::parse_login_page(&page.body);

        if login_page.captcha_src.is_empty() {
            return Err(PortalError::auth("challenge-missing"));
        }

        Ok(LoginChallenge {
            captcha_url: self.captcha_url(&login_page.captcha_src),
            captcha_field: login_page.captcha_field,
        })
    }

    /// Downloads the captcha image through the session's cookie jar.
    pub async fn captcha_image(&self, challenge: &LoginChallenge) -> Result<Vec<u8>> {
        self.transport.get_bytes(&challenge.captcha_url).await
    }

    fn captcha_url(&self, src: &str) -> String {
        let absolute = if src.starts_with("http") {
            src.to_string()
        } else {
            self.config.url(src)
        };
        let separator = if absolute.contains('?') { '&' } else { '?' };
        format!("{}{}_={}", absolute, separator, Utc::now().timestamp_millis())
    }

    /// Logs in with a solved captcha and stores the resulting session.
    ///
    /// A rejected attempt cannot be retried as is: the challenge and the tokens
    /// are single-use, so start again from [`GportalClient::fetch_login_challenge`].
    pub async fn login(&self, identifier: &str, secret: &str, captcha: &str) -> Result<SessionState> {
        info!(identifier, "logging in");

        if let Err(e) = self.session.clear().await {
            warn!(error = %e, "could not clear previous session before login");
        }
        self.clear_cache().await;

        let page = self.transport.get(LOGIN_PATH).await?.ensure_success(LOGIN_PATH)?;
        let login_page = parsers::login::parse_login_page(&page.body);
        if login_page.captcha_field.is_empty() || login_page.tokens.view_state.is_empty() {
            warn!("login page carried no captcha field or view state");
            return Err(PortalError::auth("challenge-missing"));
        }
        debug!(
            captcha_field = %login_page.captcha_field,
            view_state_len = login_page.tokens.view_state.len(),
            "login challenge extracted"
        );

        let form = forms::login(
            &login_page.tokens,
            &login_page.captcha_field,
            identifier,
            secret,
            captcha,
        );
        let response = self.transport.post_form(LOGIN_PATH, &form).await?;
        if !response.is_success() {
            warn!(status = %response.status, "login rejected");
            return Err(PortalError::auth("login-rejected"));
        }

        let landing = self
            .transport
            .get(ATTENDANCE_PATH)
            .await?
            .ensure_success(ATTENDANCE_PATH)?;
        let state = parsers::login::parse_landing_page(&landing.body);
        if state.subject_id.is_empty() || state.tokens.view_state.is_empty() {
            // The ERP answers a wrong captcha with 200 and the login page again.
            warn!("landing page lacks student id or view state");
            return Err(PortalError::auth("landing-markers-missing"));
        }

        self.session.replace(state.clone()).await?;
        info!(subject_id = %state.subject_id, "logged in");
        Ok(state)
    }

    /// Ends the session on the server when possible, and always locally.
    pub async fn logout(&self) {
        info!("logging out");
        if let Err(e) = self.server_logout().await {
            warn!(error = %e, "server-side logout failed, clearing local state anyway");
        }

        self.transport.clear_session_cookies();
        if let Err(e) = self.session.clear().await {
            warn!(error = %e, "could not clear persisted session");
        }
        self.clear_cache().await;
        info!("logged out");
    }

    async fn server_logout(&self) -> Result<()> {
        let home = self.transport.get(HOME_PATH).await?.ensure_success(HOME_PATH)?;
        let (tokens, hidden) = parsers::login::parse_home_page(&home.body);

        let form = forms::logout(&tokens, &hidden);
        let response = self.transport.post_form_manual(HOME_PATH, &form).await?;
        debug!(status = %response.status, "logout postback answered");

        if matches!(response.status.as_u16(), 302 | 303) {
            if let Some(location) = response.location.as_deref() {
                let target = self.resolve_location(location);
                self.transport.get(&target).await?;
            }
        }
        Ok(())
    }

    /// Resolves a `Location` header against the page that sent it.
    fn resolve_location(&self, location: &str) -> String {
        Url::parse(&self.config.url(HOME_PATH))
            .and_then(|home| home.join(location))
            .map(|url| url.to_string())
            .unwrap_or_else(|_| self.config.url(location))
    }

    async fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.clear().await {
                warn!(error = %e, "could not clear response cache");
            }
        }
    }

    /// Writes the cookies the jar holds for the ERP to `path` as JSON.
    pub async fn save_cookies<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let cookies = self.transport.export_cookies();
        let json = serde_json::to_string(&cookies).map_err(|e| PortalError::Store(e.to_string()))?;
        tokio::fs::write(path, json)
            .await
            .map_err(|e| PortalError::Store(e.to_string()))
    }

    pub async fn load_cookies<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| PortalError::Store(e.to_string()))?;
        let cookies: Vec<String> =
            serde_json::from_str(&content).map_err(|e| PortalError::Store(e.to_string()))?;
        self.transport.import_cookies(&cookies);
        Ok(())
    }

    async fn get_html(&self, path: &str) -> Result<String> {
        let page = self.transport.get(path).await?.ensure_success(path)?;
        Ok(page.body)
    }

    async fn get_html_cached(&self, path: &str) -> Result<String> {
        let Some(cache) = &self.cache else {
            return self.get_html(path).await;
        };
        if let Some(html) = cache.get(path).await {
            debug!(path, "served from cache");
            return Ok(html);
        }
        let html = self.get_html(path).await?;
        if let Err(e) = cache.set(path, &html, self.cache_ttl_secs).await {
            warn!(path, error = %e, "could not cache page");
        }
        Ok(html)
    }

    async fn post_html(&self, path: &str, form: &forms::PostbackForm) -> Result<String> {
        let page = self.transport.post_form(path, form).await?.ensure_success(path)?;
        Ok(page.body)
    }

    async fn post_attendance(&self, state: &SessionState, view: AttendanceView) -> Result<String> {
        require(state)?;
        debug!(?view, "fetching attendance");
        self.post_html(ATTENDANCE_PATH, &forms::attendance(state, view)).await
    }

    pub async fn fetch_today_attendance(&self, state: &SessionState) -> Result<Vec<Attendance>> {
        let html = self.post_attendance(state, AttendanceView::Today).await?;
        Ok(parsers::attendance::parse_today(&html))
    }

    pub async fn fetch_monthly_attendance(&self, state: &SessionState) -> Result<Vec<MonthlyAttendance>> {
        let html = self.post_attendance(state, AttendanceView::Monthly).await?;
        Ok(parsers::attendance::parse_monthly(&html))
    }

    pub async fn fetch_subject_attendance(
        &self,
        state: &SessionState,
        range: DateRange,
    ) -> Result<Vec<SubjectAttendance>> {
        let html = self.post_attendance(state, AttendanceView::SubjectWise(range)).await?;
        Ok(parsers::attendance::parse_subject_wise(&html))
    }

    pub async fn fetch_date_attendance(
        &self,
        state: &SessionState,
        range: DateRange,
    ) -> Result<Vec<DateAttendance>> {
        let html = self.post_attendance(state, AttendanceView::DateWise(range)).await?;
        Ok(parsers::attendance::parse_date_wise(&html))
    }

    pub async fn fetch_semester_attendance(&self, state: &SessionState) -> Result<Vec<SemesterAttendance>> {
        let html = self.post_attendance(state, AttendanceView::Semester).await?;
        Ok(parsers::attendance::parse_semester(&html))
    }

    /// Semesters and exams on offer, plus the session refreshed from that page.
    ///
    /// The returned `state` is what the next [`GportalClient::fetch_grades`]
    /// call should get; the client's own session is left alone.
    pub async fn fetch_grade_options(&self, state: &SessionState) -> Result<GradeOptions> {
        require(state)?;
        let html = self.get_html(EXAM_RESULT_PATH).await?;
        let page = parsers::grades::parse_exam_page(&html);

        let mut refreshed = state.clone();
        refreshed.tokens = state.tokens.refreshed_with(&page.tokens);
        if !page.subject_id.is_empty() {
            refreshed.subject_id = page.subject_id;
        }

        Ok(GradeOptions {
            semesters: page.semesters,
            exams: page.exams,
            state: refreshed,
        })
    }

    pub async fn fetch_grades(&self, state: &SessionState, semester: &str) -> Result<Vec<Grade>> {
        self.fetch_grades_for_exam(state, semester, "All").await
    }

    pub async fn fetch_grades_for_exam(
        &self,
        state: &SessionState,
        semester: &str,
        exam: &str,
    ) -> Result<Vec<Grade>> {
        require(state)?;
        debug!(semester, exam, "fetching grades");
        let html = self
            .post_html(EXAM_RESULT_PATH, &forms::grades(state, semester, exam))
            .await?;
        Ok(parsers::grades::parse_marks(&html))
    }

    pub async fn fetch_profile(&self, state: &SessionState) -> Result<Profile> {
        require(state)?;
        let html = self.get_html_cached(PROFILE_PATH).await?;
        Ok(parsers::profile::parse_profile(&html))
    }

    pub async fn fetch_official_details(&self, state: &SessionState) -> Result<OfficialDetails> {
        require(state)?;
        let html = self.get_html_cached(OFFICIAL_PATH).await?;
        Ok(parsers::profile::parse_official(&html))
    }

    /// GET then POST: the search postback only accepts the page's own tokens.
    pub async fn fetch_qualification(&self, state: &SessionState) -> Result<QualificationData> {
        require(state)?;
        let html = self.get_html(QUALIFICATION_PATH).await?;
        let page = parsers::profile::parse_qualification_form(&html, &state.subject_id);

        let html = self
            .post_html(QUALIFICATION_PATH, &forms::qualification(&page))
            .await?;
        Ok(parsers::profile::parse_qualifications(&html))
    }

    pub async fn fetch_today_timetable(&self, state: &SessionState) -> Result<Vec<TimeTableEvent>> {
        self.fetch_timetable(state, TimetableView::Today).await
    }

    pub async fn fetch_weekly_timetable(&self, state: &SessionState) -> Result<Vec<TimeTableEvent>> {
        self.fetch_timetable(state, TimetableView::Weekly).await
    }

    // Tokens from any other page are rejected here, so every call re-reads the page first.
    async fn fetch_timetable(&self, state: &SessionState, view: TimetableView) -> Result<Vec<TimeTableEvent>> {
        require(state)?;
        let html = self.get_html(TIMETABLE_PATH).await?;
        let (tokens, page_subject_id) = parsers::timetable::parse_timetable_form(&html);
        let subject_id = if page_subject_id.is_empty() {
            state.subject_id.as_str()
        } else {
            page_subject_id.as_str()
        };

        debug!(?view, "fetching timetable");
        let html = self
            .post_html(TIMETABLE_PATH, &forms::timetable(&tokens, subject_id, view))
            .await?;
        Ok(parsers::timetable::parse_timetable(&html))
    }

    pub async fn fetch_alerts(&self, state: &SessionState) -> Result<AlertsData> {
        require(state)?;
        let html = self.get_html_cached(ALERTS_PATH).await?;
        Ok(parsers::alerts::parse_alerts(&html))
    }
}

fn require(state: &SessionState) -> Result<()> {
    if state.authenticated {
        Ok(())
    } else {
        Err(PortalError::NotAuthenticated)
    }
}
