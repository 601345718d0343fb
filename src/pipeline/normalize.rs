//! Header and query normalization.

use std::collections::BTreeMap;

use reqwest::header::HeaderMap;
use serde_json::{Map, Value};
use url::Url;

/// Base used to read the query of relative URLs; never dispatched to.
const RELATIVE_BASE: &str = "http://relative.invalid/";

/// Lowercase every header name. Later entries win on collision.
pub fn normalize_headers<I, K, V>(headers: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    headers
        .into_iter()
        .map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.as_ref().to_string()))
        .collect()
}

/// Same as [`normalize_headers`] for a transport header map.
///
/// Non-UTF-8 values are recorded lossily.
pub fn normalize_header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    normalize_headers(
        headers
            .iter()
            .map(|(name, value)| (name.as_str(), String::from_utf8_lossy(value.as_bytes()).into_owned())),
    )
}

/// Parse `url` leniently; relative URLs are read against a placeholder base.
pub fn parse_lenient(url: &str) -> Option<Url> {
    match Url::parse(url) {
        Ok(parsed) => Some(parsed),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(RELATIVE_BASE).ok()?.join(url).ok()
        }
        Err(_) => None,
    }
}

/// Query string of `url` merged with explicit `params`; `params` win.
///
/// A key repeated in the query string becomes an array. A URL that does
/// not parse contributes nothing.
pub fn normalize_query(url: &str, params: &Map<String, Value>) -> Map<String, Value> {
    let mut query = Map::new();

    if let Some(parsed) = parse_lenient(url) {
        for (key, value) in parsed.query_pairs() {
            let value = Value::String(value.into_owned());
            match query.get_mut(&*key) {
                Some(Value::Array(existing)) => existing.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
                None => {
                    query.insert(key.into_owned(), value);
                }
            }
        }
    }

    for (key, value) in params {
        query.insert(key.clone(), value.clone());
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use serde_json::json;

    #[test]
    fn test_headers_lowercased_last_wins() {
        let headers = normalize_headers(vec![
            ("Content-Type", "text/plain"),
            ("X-Trace", "1"),
            ("content-type", "application/json"),
        ]);
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["content-type"], "application/json");
        assert_eq!(headers["x-trace"], "1");
    }

    #[test]
    fn test_header_map() {
        let mut map = HeaderMap::new();
        map.insert("Content-Type", HeaderValue::from_static("application/json"));
        let headers = normalize_header_map(&map);
        assert_eq!(headers["content-type"], "application/json");
    }

    #[test]
    fn test_query_merges_params_with_precedence() {
        let mut params = Map::new();
        params.insert("page".into(), json!(3));
        params.insert("extra".into(), json!("yes"));

        let query = normalize_query("https://example.com/list?page=1&tag=a&tag=b", &params);
        assert_eq!(query["page"], json!(3));
        assert_eq!(query["tag"], json!(["a", "b"]));
        assert_eq!(query["extra"], json!("yes"));
    }

    #[test]
    fn test_query_relative_url() {
        let query = normalize_query("/path?x=1", &Map::new());
        assert_eq!(query["x"], json!("1"));
    }

    #[test]
    fn test_query_malformed_url_is_empty() {
        let query = normalize_query("http://[::1", &Map::new());
        assert!(query.is_empty());

        let mut params = Map::new();
        params.insert("k".into(), json!("v"));
        let query = normalize_query("http://[::1", &params);
        assert_eq!(query.len(), 1);
    }
}
