use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;

use super::models::{BrewingMethod, BrewingMethodsResponse};

pub const DEFAULT_CATALOG_URL: &str =
    "https://mockfast.io/backend/apitemplate/get/896668678538395/brewingMethods";

/// Where the brewing method catalog comes from.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_methods(&self) -> Result<Vec<BrewingMethod>>;
}

/// Fetches the catalog with a single HTTP GET.
pub struct HttpCatalogSource {
    client: Client,
    url: String,
}

impl HttpCatalogSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("brewflow/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch_methods(&self) -> Result<Vec<BrewingMethod>> {
        debug!("Fetching brewing methods from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .context("Failed to send catalog request")?
            .error_for_status()
            .context("Catalog endpoint returned an error status")?;

        let body: BrewingMethodsResponse = response
            .json()
            .await
            .context("Failed to decode catalog payload")?;

        Ok(body.brewing_methods)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    /// Answers a single request with `status` and `body`, returning the URL.
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        format!("http://{addr}/brewingMethods")
    }

    // Bypasses any proxy configured in the environment; the server is local.
    fn source(url: String) -> HttpCatalogSource {
        let client = Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        HttpCatalogSource { client, url }
    }

    #[tokio::test]
    async fn fetches_and_decodes_the_envelope() {
        let url = serve_once(
            "200 OK",
            r#"{ "brewingMethods": [
                { "id": "chemex", "name": "Chemex", "maxCups": 6,
                  "coffeeGramsPerCup": 14, "waterMlPerCup": 230,
                  "steps": [{ "order": 1, "title": "Bloom", "timeSeconds": 45 }] }
            ] }"#,
        )
        .await;

        let methods = source(url).fetch_methods().await.unwrap();

        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].id, "chemex");
        assert_eq!(methods[0].steps[0].time_seconds, 45);
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let url = serve_once("503 Service Unavailable", "{}").await;

        let err = source(url).fetch_methods().await.unwrap_err();

        assert!(format!("{err:#}").contains("error status"));
    }

    #[tokio::test]
    async fn payload_missing_required_fields_is_an_error() {
        let url = serve_once(
            "200 OK",
            r#"{ "brewingMethods": [{ "id": "chemex", "name": "Chemex" }] }"#,
        )
        .await;

        let err = source(url).fetch_methods().await.unwrap_err();

        assert!(format!("{err:#}").contains("Failed to decode catalog payload"));
    }
}
