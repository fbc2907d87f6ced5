/// HTTP delivery of form-encoded updates to the metrics endpoint
use log::info;
use reqwest::header::ACCEPT;
use std::time::Duration;
use url::Url;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// One POST of a form body, yielding the HTTP status code
///
/// Transport failures (DNS, refused connection, timeout) are errors; any
/// status the server answers with, including 5xx, is `Ok`.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn post_form(
        &self,
        form: &[(&'static str, String)],
    ) -> Result<u16, Box<dyn std::error::Error>>;
}

/// [`Transport`] over a real HTTP connection
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(endpoint: Url) -> Result<Self, Box<dyn std::error::Error>> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(HttpTransport { client, endpoint })
    }
}

impl Transport for HttpTransport {
    async fn post_form(
        &self,
        form: &[(&'static str, String)],
    ) -> Result<u16, Box<dyn std::error::Error>> {
        // `form` sets Content-Type: application/x-www-form-urlencoded
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(ACCEPT, "text/plain")
            .form(form)
            .send()
            .await?;

        let status = response.status();
        info!(
            "    Response {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        );

        // Drain the body so the connection can be reused
        response.text().await?;

        Ok(status.as_u16())
    }
}
