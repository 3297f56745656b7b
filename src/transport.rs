use crate::config::ClientConfig;
use crate::error::{PortalError, Result};
use crate::forms::PostbackForm;
use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, LOCATION, USER_AGENT};
use reqwest::{StatusCode, Url, redirect};
use std::sync::Arc;
use tracing::debug;

/// A fully read HTTP response.
#[derive(Debug, Clone)]
pub struct Page {
    pub status: StatusCode,
    /// `Location` header, present on unfollowed redirects.
    pub location: Option<String>,
    pub body: String,
}

impl Page {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Fails with a status error unless the response is 2xx.
    pub fn ensure_success(self, resource: &str) -> Result<Page> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(PortalError::Status {
                resource: resource.to_string(),
                status: self.status,
            })
        }
    }
}

/// The HTTP conversation with the ERP. Every request carries the session cookies.
///
/// Paths are resolved against the configured base URL; absolute URLs are used as is.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, path: &str) -> Result<Page>;

    async fn post_form(&self, path: &str, form: &PostbackForm) -> Result<Page>;

    /// Like [`Transport::post_form`], but a redirect is returned instead of followed.
    async fn post_form_manual(&self, path: &str, form: &PostbackForm) -> Result<Page>;

    async fn get_bytes(&self, path: &str) -> Result<Vec<u8>>;

    /// Expires every cookie held for the ERP host and its parent domain.
    fn clear_session_cookies(&self);

    /// `name=value` pairs currently sent to the ERP.
    fn export_cookies(&self) -> Vec<String>;

    fn import_cookies(&self, cookies: &[String]);
}

/// [`Transport`] over `reqwest` with a shared cookie jar.
pub struct HttpTransport {
    config: ClientConfig,
    origin: Url,
    jar: Arc<Jar>,
    client: reqwest::Client,
    // Same jar, redirects off. Needed to see the logout redirect.
    manual: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let origin = Url::parse(&config.base_url)
            .map_err(|e| PortalError::InvalidInput(format!("bad base url {}: {}", config.base_url, e)))?;
        let jar = Arc::new(Jar::default());

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| PortalError::InvalidInput(format!("bad user agent: {}", e)))?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,*/*;q=0.8"),
        );

        let builder = || {
            reqwest::Client::builder()
                .cookie_provider(jar.clone())
                .default_headers(headers.clone())
                .timeout(config.timeout())
                .danger_accept_invalid_certs(config.accept_invalid_certs)
        };
        let client = builder().build()?;
        let manual = builder().redirect(redirect::Policy::none()).build()?;

        Ok(Self {
            config,
            origin,
            jar,
            client,
            manual,
        })
    }

    async fn read(response: reqwest::Response) -> Result<Page> {
        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;
        Ok(Page {
            status,
            location,
            body,
        })
    }

    fn cookie_names(&self) -> Vec<String> {
        self.export_cookies()
            .iter()
            .filter_map(|pair| pair.split('=').next())
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> Result<Page> {
        let url = self.config.url(path);
        let response = self.client.get(&url).send().await?;
        debug!(method = "GET", %url, status = %response.status(), "ERP response");
        Self::read(response).await
    }

    async fn post_form(&self, path: &str, form: &PostbackForm) -> Result<Page> {
        let url = self.config.url(path);
        let response = self.client.post(&url).form(form.pairs()).send().await?;
        debug!(method = "POST", %url, fields = form.pairs().len(), status = %response.status(), "ERP response");
        Self::read(response).await
    }

    async fn post_form_manual(&self, path: &str, form: &PostbackForm) -> Result<Page> {
        let url = self.config.url(path);
        let response = self.manual.post(&url).form(form.pairs()).send().await?;
        debug!(method = "POST", %url, status = %response.status(), "ERP response (redirects not followed)");
        Self::read(response).await
    }

    async fn get_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let url = self.config.url(path);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PortalError::Status {
                resource: url,
                status,
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    fn clear_session_cookies(&self) {
        let host = self.origin.host_str().unwrap_or_default().to_string();
        let app_path = self.origin.path().trim_end_matches('/').to_string();
        let domains = [String::new(), format!("; domain={}", host), format!("; domain=.{}", host)];
        let mut paths = vec!["/".to_string()];
        if !app_path.is_empty() {
            paths.push(app_path);
        }

        let names = self.cookie_names();
        for name in &names {
            for path in &paths {
                for domain in &domains {
                    let expired = format!(
                        "{}=; expires=Thu, 01 Jan 1970 00:00:00 GMT; path={}{}",
                        name, path, domain
                    );
                    self.jar.add_cookie_str(&expired, &self.origin);
                }
            }
        }
        debug!(count = names.len(), %host, "expired session cookies");
    }

    fn export_cookies(&self) -> Vec<String> {
        self.jar
            .cookies(&self.origin)
            .and_then(|header| header.to_str().ok().map(str::to_string))
            .map(|header| {
                header
                    .split(';')
                    .map(|pair| pair.trim().to_string())
                    .filter(|pair| !pair.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn import_cookies(&self, cookies: &[String]) {
        for pair in cookies {
            self.jar
                .add_cookie_str(&format!("{}; path=/", pair), &self.origin);
        }
    }
}
