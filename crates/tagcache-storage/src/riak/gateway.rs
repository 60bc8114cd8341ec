use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, trace};

use tagcache_core::{CacheError, IndexSet, IndexValue, Result, StoreGateway, StoreRecord};

use super::config::RiakConfig;
use super::headers::{VCLOCK_HEADER, check_indexes, decode_indexes, encode_indexes};

/// Body of a secondary index query response
#[derive(Debug, Deserialize)]
struct IndexResponse {
    #[serde(default)]
    keys: Vec<String>,
    continuation: Option<String>,
}

/// Riak gateway over the HTTP interface
///
/// Secondary index queries need a 2i capable storage backend (eLevelDB or
/// memory); other backends answer with `indexes_not_supported`, surfaced as
/// [`CacheError::IndexesUnsupported`].
#[derive(Clone)]
pub struct RiakGateway {
    client: Client,
    base: Url,
    config: RiakConfig,
}

impl RiakGateway {
    /// Create a new Riak gateway
    ///
    /// No connection is made until the first request; use
    /// [`StoreGateway::ping`] to check reachability.
    pub fn new(config: RiakConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url())
            .map_err(|e| CacheError::Config(format!("invalid riak address: {}", e)))?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| CacheError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base,
            config,
        })
    }

    /// The gateway configuration
    pub fn config(&self) -> &RiakConfig {
        &self.config
    }

    /// Build a URL from path segments, percent-encoding each one
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| CacheError::Config(format!("'{}' cannot be a base url", self.base)))?
            .clear()
            .extend(segments);
        Ok(url)
    }

    fn key_url(&self, bucket: &str, key: &str) -> Result<Url> {
        self.url(&["buckets", bucket, "keys", key])
    }

    /// Read a key holding siblings
    ///
    /// Returns the first readable sibling under the vclock of the whole object,
    /// so the next write supersedes every sibling and a delete removes them.
    async fn read_siblings(&self, url: Url, response: Response) -> Result<StoreRecord> {
        let vclock = response
            .headers()
            .get(VCLOCK_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(transport_error)?;

        let mut record = None;
        for vtag in sibling_vtags(&body) {
            let response = self
                .client
                .get(url.clone())
                .query(&[("vtag", vtag)])
                .send()
                .await
                .map_err(transport_error)?;
            // Tombstone siblings answer 404
            if response.status() == StatusCode::OK {
                debug!(url = %url, vtag = %vtag, "riak object has siblings, reading one");
                record = Some(read_record(response).await?);
                break;
            }
        }

        // With no readable sibling the vclock alone still lets a write replace the object
        let mut record = record.unwrap_or_else(|| StoreRecord::new(Vec::new(), IndexSet::new()));
        record.causal_context = vclock.or(record.causal_context);
        Ok(record)
    }

    /// Run all pages of an index query
    async fn query(&self, url: Url) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut request = self.client.get(url.clone());
            if let Some(size) = self.config.page_size {
                request = request.query(&[("max_results", size.to_string())]);
            }
            if let Some(token) = &continuation {
                request = request.query(&[("continuation", token.as_str())]);
            }

            let response = request.send().await.map_err(transport_error)?;
            let response = check_status(response, &[StatusCode::OK]).await?;
            let page: IndexResponse = response
                .json()
                .await
                .map_err(|e| CacheError::Store(format!("malformed index response: {}", e)))?;

            trace!(url = %url, keys = page.keys.len(), "riak index page");
            keys.extend(page.keys);

            match page.continuation {
                Some(token) if self.config.page_size.is_some() => continuation = Some(token),
                _ => break,
            }
        }

        Ok(keys)
    }
}

impl std::fmt::Debug for RiakGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiakGateway")
            .field("base", &self.base.as_str())
            .field("page_size", &self.config.page_size)
            .finish()
    }
}

/// Build a record from a `200 OK` object response
async fn read_record(response: Response) -> Result<StoreRecord> {
    let headers = response.headers();
    let indexes = decode_indexes(headers)?;
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let causal_context = headers
        .get(VCLOCK_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let payload = response
        .bytes()
        .await
        .map_err(transport_error)?
        .to_vec();

    Ok(StoreRecord {
        payload,
        indexes,
        content_type,
        causal_context,
    })
}

/// Vtags listed in a `300 Multiple Choices` body (`Siblings:` then one per line)
fn sibling_vtags(body: &str) -> impl Iterator<Item = &str> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.eq_ignore_ascii_case("siblings:"))
}

/// Map a transport failure to the cache taxonomy
fn transport_error(e: reqwest::Error) -> CacheError {
    if e.is_connect() || e.is_timeout() {
        CacheError::StoreUnavailable(e.to_string())
    } else {
        CacheError::Store(e.to_string())
    }
}

/// Pass `response` through if its status is expected, otherwise turn the
/// body into an error
async fn check_status(response: Response, expected: &[StatusCode]) -> Result<Response> {
    let status = response.status();
    if expected.contains(&status) {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, &body))
}

fn status_error(status: StatusCode, body: &str) -> CacheError {
    if body.contains("indexes_not_supported") {
        return CacheError::IndexesUnsupported(body.trim().to_string());
    }
    match status {
        StatusCode::SERVICE_UNAVAILABLE => {
            CacheError::StoreUnavailable(format!("{}: {}", status, body.trim()))
        }
        StatusCode::MULTIPLE_CHOICES => CacheError::Store(
            "object has siblings; disable allow_mult on the cache bucket".to_string(),
        ),
        _ => CacheError::Store(format!("{}: {}", status, body.trim())),
    }
}

#[async_trait]
impl StoreGateway for RiakGateway {
    async fn get_record(&self, bucket: &str, key: &str) -> Result<Option<StoreRecord>> {
        let url = self.key_url(bucket, key)?;
        let response = self.client.get(url.clone()).send().await.map_err(transport_error)?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            StatusCode::MULTIPLE_CHOICES => self.read_siblings(url, response).await.map(Some),
            _ => {
                let response = check_status(response, &[StatusCode::OK]).await?;
                read_record(response).await.map(Some)
            }
        }
    }

    async fn put_record(&self, bucket: &str, key: &str, record: &StoreRecord) -> Result<()> {
        let url = self.key_url(bucket, key)?;

        let mut headers = HeaderMap::new();
        encode_indexes(&record.indexes, &mut headers)?;
        let content_type = HeaderValue::from_str(&record.content_type)
            .map_err(|e| CacheError::InvalidArgument(format!("content type: {}", e)))?;
        headers.insert(CONTENT_TYPE, content_type);
        if let Some(vclock) = &record.causal_context {
            let vclock = HeaderValue::from_str(vclock)
                .map_err(|e| CacheError::Store(format!("vclock: {}", e)))?;
            headers.insert(VCLOCK_HEADER, vclock);
        }

        let response = self
            .client
            .put(url)
            .query(&[("returnbody", "false")])
            .headers(headers)
            .body(record.payload.clone())
            .send()
            .await
            .map_err(transport_error)?;

        check_status(
            response,
            &[StatusCode::OK, StatusCode::CREATED, StatusCode::NO_CONTENT],
        )
        .await?;
        debug!(bucket = %bucket, key = %key, indexes = record.indexes.len(), "riak put");
        Ok(())
    }

    async fn delete_record(&self, bucket: &str, key: &str) -> Result<()> {
        let url = self.key_url(bucket, key)?;
        let response = self.client.delete(url).send().await.map_err(transport_error)?;
        check_status(response, &[StatusCode::NO_CONTENT, StatusCode::NOT_FOUND]).await?;
        Ok(())
    }

    async fn query_exact(&self, bucket: &str, field: &str, value: &IndexValue) -> Result<Vec<String>> {
        let value = value.to_string();
        let url = self.url(&["buckets", bucket, "index", field, &value])?;
        self.query(url).await
    }

    async fn query_range(&self, bucket: &str, field: &str, low: i64, high: i64) -> Result<Vec<String>> {
        if low > high {
            return Ok(Vec::new());
        }
        let (low, high) = (low.to_string(), high.to_string());
        let url = self.url(&["buckets", bucket, "index", field, &low, &high])?;
        self.query(url).await
    }

    fn check_indexes(&self, indexes: &IndexSet) -> Result<()> {
        check_indexes(indexes)
    }

    async fn ping(&self) -> Result<()> {
        let url = self.url(&["ping"])?;
        let response = self.client.get(url).send().await.map_err(transport_error)?;
        check_status(response, &[StatusCode::OK]).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagcache_core::IndexEntry;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const KEY_PATH: &str = "/buckets/cache/keys/k";
    const VCLOCK: &str = "a85hYGBgzGDKBVIcypz/fgaUHjmdwZTImMfKsP/x6RN8WQA=";

    fn gateway() -> RiakGateway {
        RiakGateway::new(RiakConfig::new("127.0.0.1", 8098)).unwrap()
    }

    #[test]
    fn test_key_url_encodes_segments() {
        let url = gateway().key_url("cache", "a b/c").unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8098/buckets/cache/keys/a%20b%2Fc"
        );
    }

    #[test]
    fn test_index_urls() {
        let gw = gateway();
        let url = gw
            .url(&["buckets", "cache", "index", "tag_bin", "Session_1"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8098/buckets/cache/index/tag_bin/Session_1"
        );
    }

    #[test]
    fn test_status_errors() {
        assert!(matches!(
            status_error(StatusCode::INTERNAL_SERVER_ERROR, "{error,{indexes_not_supported,riak_kv_bitcask_backend}}"),
            CacheError::IndexesUnsupported(_)
        ));
        assert!(status_error(StatusCode::SERVICE_UNAVAILABLE, "").is_unavailable());
        assert!(matches!(
            status_error(StatusCode::BAD_REQUEST, "bad"),
            CacheError::Store(_)
        ));
    }

    #[test]
    fn test_index_response_parsing() {
        let page: IndexResponse =
            serde_json::from_str(r#"{"keys":["X1","X2"],"continuation":"g2o"}"#).unwrap();
        assert_eq!(page.keys, vec!["X1", "X2"]);
        assert_eq!(page.continuation.as_deref(), Some("g2o"));

        let page: IndexResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(page.keys.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_node_is_unavailable() {
        let config = RiakConfig::new("127.0.0.1", 1)
            .request_timeout(std::time::Duration::from_millis(500));
        let gw = RiakGateway::new(config).unwrap();
        let err = gw.get_record("cache", "Foo").await.unwrap_err();
        assert!(err.is_unavailable());
    }

    #[test]
    fn test_sibling_vtags() {
        let vtags: Vec<&str> = sibling_vtags("Siblings:\n4v5xOg4bVR96pPB4TLdf\n2cWzH3EW0dAWfyXzUFYrUn\n")
            .collect();
        assert_eq!(vtags, vec!["4v5xOg4bVR96pPB4TLdf", "2cWzH3EW0dAWfyXzUFYrUn"]);
        assert_eq!(sibling_vtags("Siblings:\n").count(), 0);
    }

    fn gateway_for(server: &MockServer) -> RiakGateway {
        let addr = server.address();
        RiakGateway::new(RiakConfig::new(addr.ip().to_string(), addr.port())).unwrap()
    }

    /// Node where `k` has a tombstone sibling and a live one
    async fn node_with_siblings() -> MockServer {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(KEY_PATH))
            .and(query_param("vtag", "gone"))
            .respond_with(ResponseTemplate::new(404).insert_header("x-riak-deleted", "true"))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(KEY_PATH))
            .and(query_param("vtag", "live"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/x-tagcache")
                    .insert_header("x-riak-index-cache_int", "1")
                    .insert_header("x-riak-index-tag_bin", "A")
                    .insert_header("x-riak-vclock", "sibling-clock")
                    .set_body_bytes(b"sibling".to_vec()),
            )
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(KEY_PATH))
            .respond_with(
                ResponseTemplate::new(300)
                    .insert_header("x-riak-vclock", VCLOCK)
                    .set_body_string("Siblings:\ngone\nlive\n"),
            )
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(KEY_PATH))
            .and(header("x-riak-vclock", VCLOCK))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(KEY_PATH))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        server
    }

    #[tokio::test]
    async fn test_siblings_read_under_object_vclock() {
        let server = node_with_siblings().await;
        let gw = gateway_for(&server);

        let record = gw.get_record("cache", "k").await.unwrap().unwrap();
        assert_eq!(record.payload, b"sibling".to_vec());
        assert!(record.indexes.contains(&IndexEntry::tag("A")));
        assert_eq!(record.causal_context.as_deref(), Some(VCLOCK));

        // Writing back under that vclock resolves the siblings
        let replacement = StoreRecord::new(
            b"v".to_vec(),
            [IndexEntry::cache_marker()].into_iter().collect::<IndexSet>(),
        )
        .with_causal_context(record.causal_context);
        gw.put_record("cache", "k", &replacement).await.unwrap();
        gw.delete_record("cache", "k").await.unwrap();
    }

    #[tokio::test]
    async fn test_siblings_without_readable_value_keep_vclock() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(KEY_PATH))
            .respond_with(
                ResponseTemplate::new(300)
                    .insert_header("x-riak-vclock", VCLOCK)
                    .set_body_string("Siblings:\n"),
            )
            .mount(&server)
            .await;

        let record = gateway_for(&server)
            .get_record("cache", "k")
            .await
            .unwrap()
            .unwrap();
        assert!(record.payload.is_empty());
        assert!(record.indexes.is_empty());
        assert_eq!(record.causal_context.as_deref(), Some(VCLOCK));
    }

    #[test]
    fn test_gateway_checks_indexes_before_writing() {
        let gw = gateway();
        let indexes: IndexSet = [IndexEntry::tag("a,b")].into_iter().collect();
        assert!(gw.check_indexes(&indexes).unwrap_err().is_validation());

        let indexes: IndexSet = [IndexEntry::cache_marker(), IndexEntry::tag("ok")]
            .into_iter()
            .collect();
        assert!(gw.check_indexes(&indexes).is_ok());
    }
}
