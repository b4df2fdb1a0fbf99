//! iTunes Search API Client
//!
//! Provides candidate lookup against the iTunes Search API.
//!
//! ## API Endpoint
//!
//! - **Search**: `https://itunes.apple.com/search?term={query}&entity=song&limit=50`
//!
//! No API key is required. The API serves JSON regardless of the Accept
//! header and reports artwork as a 100x100 thumbnail URL; the full-size
//! 600x600 variant lives at the same path with the dimensions swapped.
//!
//! ## Failure Contract
//!
//! The [`CatalogSearch`] implementation never fails outward: network errors,
//! non-2xx statuses, and parse failures are logged and absorbed into an
//! empty candidate list, so one flaky search can never take down a batch.
//!
//! ## Usage
//!
//! ```ignore
//! use core_reconcile::providers::ItunesCatalog;
//! use std::sync::Arc;
//!
//! # async fn example(http_client: std::sync::Arc<dyn bridge_traits::http::HttpClient>) {
//! let catalog = ItunesCatalog::new(http_client, "my-tagger/1.0".to_string());
//! let candidates = catalog.search("Come Together", "The Beatles", None, None).await;
//! # }
//! ```

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::collaborators::CatalogSearch;
use crate::error::{ReconcileError, Result};
use crate::models::{CandidateTrack, LocalTrack};
use crate::normalize::year_from_release_date;
use crate::scoring::ConfidenceScorer;

/// iTunes Search API base URL
const ITUNES_API_BASE: &str = "https://itunes.apple.com/search";

/// Maximum number of results requested per search
const SEARCH_LIMIT: u32 = 50;

/// Default timeout for search requests
const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

/// iTunes Search API client
///
/// Queries the catalog for songs and maps the results into candidate
/// records, each annotated with a confidence score against the local track
/// (or a minimal stand-in when no local record is supplied).
pub struct ItunesCatalog {
    http_client: Arc<dyn HttpClient>,
    user_agent: String,
    search_timeout: Duration,
    scorer: ConfidenceScorer,
}

/// One result entry in an iTunes search response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItunesResult {
    #[serde(default)]
    wrapper_type: Option<String>,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    track_id: Option<u64>,
    #[serde(default)]
    track_name: Option<String>,
    #[serde(default)]
    artist_name: Option<String>,
    #[serde(default)]
    collection_name: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    primary_genre_name: Option<String>,
    #[serde(default)]
    track_number: Option<u32>,
    #[serde(default)]
    track_time_millis: Option<u64>,
    #[serde(default)]
    artwork_url_100: Option<String>,
}

impl ItunesResult {
    /// Songs are wrapped as `wrapperType: "track", kind: "song"`; everything
    /// else (albums, audiobooks, music videos) is filtered out.
    fn is_song(&self) -> bool {
        self.wrapper_type.as_deref() == Some("track") && self.kind.as_deref() == Some("song")
    }
}

/// iTunes search response wrapper
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<ItunesResult>,
}

impl ItunesCatalog {
    /// Creates a new iTunes catalog client with the default search timeout.
    pub fn new(http_client: Arc<dyn HttpClient>, user_agent: String) -> Self {
        Self::with_timeout(http_client, user_agent, DEFAULT_SEARCH_TIMEOUT)
    }

    /// Creates a new iTunes catalog client with a custom search timeout.
    pub fn with_timeout(
        http_client: Arc<dyn HttpClient>,
        user_agent: String,
        search_timeout: Duration,
    ) -> Self {
        Self {
            http_client,
            user_agent,
            search_timeout,
            scorer: ConfidenceScorer::new(),
        }
    }

    /// Assembles a client from the runtime configuration.
    pub fn from_config(config: &core_runtime::CoreConfig) -> Self {
        Self::with_timeout(
            config.http_client.clone(),
            config.user_agent.clone(),
            config.search_timeout,
        )
    }

    /// Executes the search request and parses the response.
    async fn search_songs(&self, title: &str, artist: &str) -> Result<Vec<ItunesResult>> {
        let query = format!("{} {}", title, artist);
        let url = format!(
            "{}?term={}&entity=song&limit={}",
            ITUNES_API_BASE,
            urlencoding::encode(query.trim()),
            SEARCH_LIMIT
        );

        debug!(url = %url, "Querying iTunes Search API");

        let request = HttpRequest::get(url)
            .header("User-Agent", self.user_agent.clone())
            .header("Accept", "application/json")
            .timeout(self.search_timeout);

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| ReconcileError::Search(format!("iTunes request failed: {}", e)))?;

        if !response.is_success() {
            return Err(ReconcileError::Search(format!(
                "iTunes returned HTTP {}",
                response.status
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .map_err(|e| ReconcileError::Search(format!("iTunes response parse failed: {}", e)))?;

        Ok(parsed.results)
    }

    /// Maps one song result into a candidate record.
    fn to_candidate(result: ItunesResult) -> CandidateTrack {
        CandidateTrack {
            catalog_id: result.track_id.map(|id| id.to_string()).unwrap_or_default(),
            title: result.track_name.unwrap_or_default(),
            artist: result.artist_name.unwrap_or_default(),
            album: result.collection_name.unwrap_or_default(),
            year: result
                .release_date
                .as_deref()
                .and_then(year_from_release_date),
            genre: result.primary_genre_name,
            track_number: result.track_number,
            duration_ms: result.track_time_millis,
            artwork_url: result
                .artwork_url_100
                .map(|url| url.replacen("100x100", "600x600", 1)),
            confidence: None,
        }
    }
}

#[async_trait]
impl CatalogSearch for ItunesCatalog {
    async fn search(
        &self,
        title: &str,
        artist: &str,
        duration_ms: Option<u64>,
        local: Option<&LocalTrack>,
    ) -> Vec<CandidateTrack> {
        let results = match self.search_songs(title, artist).await {
            Ok(results) => results,
            Err(e) => {
                warn!(
                    title = %title,
                    artist = %artist,
                    error = %e,
                    "Catalog search failed; returning no candidates"
                );
                return Vec::new();
            }
        };

        // Comparison basis for per-candidate confidence: the full local
        // record when available, a minimal stand-in otherwise.
        let stand_in;
        let basis = match local {
            Some(local) => local,
            None => {
                stand_in = LocalTrack {
                    title: Some(title.to_string()),
                    artist: Some(artist.to_string()),
                    duration_ms: duration_ms.unwrap_or(0),
                    ..LocalTrack::default()
                };
                &stand_in
            }
        };

        let candidates: Vec<CandidateTrack> = results
            .into_iter()
            .filter(ItunesResult::is_song)
            .map(|result| {
                let mut candidate = Self::to_candidate(result);
                candidate.confidence = Some(self.scorer.score(basis, &candidate).total);
                candidate
            })
            .collect();

        debug!(
            title = %title,
            artist = %artist,
            candidates = candidates.len(),
            "iTunes search completed"
        );

        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::BridgeError;
    use bridge_traits::http::HttpResponse;
    use bytes::Bytes;
    use std::collections::HashMap;

    const SAMPLE_RESPONSE: &str = r#"{
        "resultCount": 3,
        "results": [
            {
                "wrapperType": "track",
                "kind": "song",
                "trackId": 1441164589,
                "trackName": "Come Together",
                "artistName": "The Beatles",
                "collectionName": "Abbey Road (2019 Mix)",
                "releaseDate": "1969-09-26T07:00:00Z",
                "primaryGenreName": "Rock",
                "trackNumber": 1,
                "trackTimeMillis": 259947,
                "artworkUrl100": "https://example.com/art/100x100bb.jpg"
            },
            {
                "wrapperType": "collection",
                "collectionName": "Abbey Road"
            },
            {
                "wrapperType": "track",
                "kind": "music-video",
                "trackName": "Come Together (Video)"
            }
        ]
    }"#;

    struct StubHttpClient {
        status: u16,
        body: &'static str,
    }

    #[async_trait]
    impl HttpClient for StubHttpClient {
        async fn execute(
            &self,
            _request: HttpRequest,
        ) -> bridge_traits::error::Result<HttpResponse> {
            Ok(HttpResponse {
                status: self.status,
                headers: HashMap::new(),
                body: Bytes::from_static(self.body.as_bytes()),
            })
        }
    }

    struct FailingHttpClient;

    #[async_trait]
    impl HttpClient for FailingHttpClient {
        async fn execute(
            &self,
            _request: HttpRequest,
        ) -> bridge_traits::error::Result<HttpResponse> {
            Err(BridgeError::Timeout("itunes.apple.com".to_string()))
        }
    }

    fn catalog(client: Arc<dyn HttpClient>) -> ItunesCatalog {
        ItunesCatalog::new(client, "retag-test/0.1".to_string())
    }

    #[tokio::test]
    async fn test_search_maps_songs_and_filters_other_kinds() {
        let catalog = catalog(Arc::new(StubHttpClient {
            status: 200,
            body: SAMPLE_RESPONSE,
        }));

        let candidates = catalog
            .search("Come Together", "The Beatles", Some(259_000), None)
            .await;

        assert_eq!(candidates.len(), 1);
        let candidate = &candidates[0];
        assert_eq!(candidate.catalog_id, "1441164589");
        assert_eq!(candidate.title, "Come Together");
        assert_eq!(candidate.album, "Abbey Road (2019 Mix)");
        assert_eq!(candidate.year, Some(1969));
        assert_eq!(candidate.genre.as_deref(), Some("Rock"));
        assert_eq!(candidate.duration_ms, Some(259_947));
    }

    #[tokio::test]
    async fn test_search_upgrades_artwork_url() {
        let catalog = catalog(Arc::new(StubHttpClient {
            status: 200,
            body: SAMPLE_RESPONSE,
        }));

        let candidates = catalog.search("Come Together", "The Beatles", None, None).await;
        assert_eq!(
            candidates[0].artwork_url.as_deref(),
            Some("https://example.com/art/600x600bb.jpg")
        );
    }

    #[tokio::test]
    async fn test_search_annotates_confidence_from_stand_in() {
        let catalog = catalog(Arc::new(StubHttpClient {
            status: 200,
            body: SAMPLE_RESPONSE,
        }));

        // Stand-in basis: matching title/artist/duration, empty album.
        // duration 100, title 100, artist 100, album 0 -> total 90.
        let candidates = catalog
            .search("Come Together", "The Beatles", Some(259_947), None)
            .await;
        assert_eq!(candidates[0].confidence, Some(90));
    }

    #[tokio::test]
    async fn test_search_uses_full_local_metadata_when_given() {
        let catalog = catalog(Arc::new(StubHttpClient {
            status: 200,
            body: SAMPLE_RESPONSE,
        }));

        let local = LocalTrack {
            title: Some("Come Together".to_string()),
            artist: Some("The Beatles".to_string()),
            album: Some("Abbey Road (2019 Mix)".to_string()),
            duration_ms: 259_947,
            ..LocalTrack::default()
        };

        let candidates = catalog
            .search("Come Together", "The Beatles", local.duration(), Some(&local))
            .await;
        assert_eq!(candidates[0].confidence, Some(100));
    }

    #[tokio::test]
    async fn test_search_absorbs_transport_failure() {
        let catalog = catalog(Arc::new(FailingHttpClient));
        let candidates = catalog.search("a", "b", None, None).await;
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn test_search_absorbs_http_error_status() {
        let catalog = catalog(Arc::new(StubHttpClient {
            status: 503,
            body: "",
        }));
        let candidates = catalog.search("a", "b", None, None).await;
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn test_search_absorbs_parse_failure() {
        let catalog = catalog(Arc::new(StubHttpClient {
            status: 200,
            body: "<html>not json</html>",
        }));
        let candidates = catalog.search("a", "b", None, None).await;
        assert!(candidates.is_empty());
    }
}
