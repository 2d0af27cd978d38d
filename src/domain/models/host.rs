use anyhow::Result;
use reqwest::header;

/// What the hosting portal hands the chat client: where the site lives and
/// how to call it as the signed-in user.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HostContext {
    pub site_url: String,
    pub access_token: Option<String>,
}

impl HostContext {
    /// An HTTP client that calls the site as the current user.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json;odata=nometadata"),
        );
        if let Some(token) = &self.access_token {
            let mut value = header::HeaderValue::from_str(&format!("Bearer {token}"))?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        return Ok(client);
    }

    pub fn site_url(&self) -> &str {
        return self.site_url.trim_end_matches('/');
    }
}
