//! Paginated video listings from Twelve Labs indexes.

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::TwelveLabsConfig;
use crate::error::ListingError;
use crate::models::RawVideo;

/// A source of video records for an index.
///
/// The returned stream is lazy, finite and not restartable: pages are
/// requested only as the consumer pulls items, and an error ends the stream.
pub trait VideoListing: Send + Sync {
    fn list_videos<'a>(&'a self, index_id: &'a str) -> BoxStream<'a, Result<RawVideo, ListingError>>;
}

#[derive(Debug, Deserialize)]
struct PageInfo {
    page: u32,
    total_page: u32,
}

#[derive(Debug, Deserialize)]
struct VideoPage {
    #[serde(default)]
    data: Vec<RawVideo>,
    #[serde(default)]
    page_info: Option<PageInfo>,
}

pub struct TwelveLabsClient {
    client: Client,
    base_url: String,
    api_key: String,
    page_limit: u32,
}

impl TwelveLabsClient {
    pub fn new(client: Client, config: &TwelveLabsConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().unwrap_or_default(),
            page_limit: config.page_limit,
        }
    }

    async fn fetch_page(&self, index_id: &str, page: u32) -> Result<VideoPage, ListingError> {
        let url = format!("{}/indexes/{}/videos", self.base_url, index_id);
        debug!("[twelvelabs] GET {} page={}", url, page);

        let response = self
            .client
            .get(&url)
            .header("x-api-key", &self.api_key)
            .query(&[("page", page), ("page_limit", self.page_limit)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ListingError::Status { status, body });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ListingError::Decode(e.to_string()))
    }
}

impl VideoListing for TwelveLabsClient {
    fn list_videos<'a>(&'a self, index_id: &'a str) -> BoxStream<'a, Result<RawVideo, ListingError>> {
        stream::try_unfold(Some(1u32), move |page| async move {
            let Some(page) = page else {
                return Ok::<_, ListingError>(None);
            };

            let body = self.fetch_page(index_id, page).await?;
            // Advance from the requested page, never from the echoed one, and
            // stop when the server answers for a different page.
            let next = match &body.page_info {
                Some(info)
                    if !body.data.is_empty() && info.page == page && page < info.total_page =>
                {
                    Some(page + 1)
                }
                _ => None,
            };

            let items = stream::iter(body.data.into_iter().map(Ok::<_, ListingError>));
            Ok::<_, ListingError>(Some((items, next)))
        })
        .try_flatten()
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_TWELVELABS_BASE_URL;
    use futures::StreamExt;
    use mockito::Matcher;

    fn client_for(server: &mockito::ServerGuard) -> TwelveLabsClient {
        let config = TwelveLabsConfig {
            api_key: Some("secret".to_string()),
            base_url: format!("{}/", server.url()),
            marengo_index_id: None,
            pegasus_index_id: None,
            page_limit: 2,
        };
        TwelveLabsClient::new(Client::new(), &config)
    }

    fn page_query(page: &str) -> Matcher {
        Matcher::AllOf(vec![
            Matcher::UrlEncoded("page".into(), page.into()),
            Matcher::UrlEncoded("page_limit".into(), "2".into()),
        ])
    }

    #[tokio::test]
    async fn walks_every_page() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/indexes/idx/videos")
            .match_header("x-api-key", "secret")
            .match_query(page_query("1"))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"data":[{"_id":"a","system_metadata":{"filename":"a.mp4"}},{"_id":"b"}],
                    "page_info":{"page":1,"total_page":2}}"#,
            )
            .create_async()
            .await;
        let second = server
            .mock("GET", "/indexes/idx/videos")
            .match_query(page_query("2"))
            .with_status(200)
            .with_body(r#"{"data":[{"_id":"c"}],"page_info":{"page":2,"total_page":2}}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let ids: Vec<String> = client
            .list_videos("idx")
            .map(|item| item.unwrap().id)
            .collect()
            .await;

        assert_eq!(ids, vec!["a", "b", "c"]);
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn error_status_ends_the_stream_after_earlier_pages() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/indexes/idx/videos")
            .match_query(page_query("1"))
            .with_status(200)
            .with_body(r#"{"data":[{"_id":"a"}],"page_info":{"page":1,"total_page":3}}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/indexes/idx/videos")
            .match_query(page_query("2"))
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let client = client_for(&server);
        let items: Vec<_> = client.list_videos("idx").collect().await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap().id, "a");
        match &items[1] {
            Err(ListingError::Status { status, body }) => {
                assert_eq!(status.as_u16(), 502);
                assert_eq!(body, "bad gateway");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn server_ignoring_page_parameter_still_terminates() {
        let mut server = mockito::Server::new_async().await;
        let pages = server
            .mock("GET", "/indexes/idx/videos")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"data":[{"_id":"a"}],"page_info":{"page":1,"total_page":2}}"#)
            .expect(2)
            .create_async()
            .await;

        let client = client_for(&server);
        let items: Vec<_> = client.list_videos("idx").take(500).collect().await;

        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|item| item.is_ok()));
        pages.assert_async().await;
    }

    #[tokio::test]
    async fn missing_page_info_stops_after_one_page() {
        let mut server = mockito::Server::new_async().await;
        let only = server
            .mock("GET", "/indexes/idx/videos")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"data":[{"id":"solo"}]}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server);
        let items: Vec<_> = client.list_videos("idx").collect().await;

        assert_eq!(items.len(), 1);
        only.assert_async().await;
    }

    #[tokio::test]
    async fn undecodable_body_is_a_decode_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/indexes/idx/videos")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>")
            .create_async()
            .await;

        let client = client_for(&server);
        let items: Vec<_> = client.list_videos("idx").collect().await;

        assert!(matches!(items.as_slice(), [Err(ListingError::Decode(_))]));
    }

    #[test]
    fn default_base_url_has_no_trailing_slash() {
        let config = TwelveLabsConfig {
            api_key: None,
            base_url: DEFAULT_TWELVELABS_BASE_URL.to_string(),
            marengo_index_id: None,
            pegasus_index_id: None,
            page_limit: 10,
        };
        let client = TwelveLabsClient::new(Client::new(), &config);
        assert_eq!(client.base_url, "https://api.twelvelabs.io/v1.3");
        assert!(client.api_key.is_empty());
    }
}
