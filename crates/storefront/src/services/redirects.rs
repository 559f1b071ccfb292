//! Legacy URL redirects stored in KV.
//!
//! Keys are `{store code}.{path}`. When the query carries `tag` or `code`
//! the key path keeps exactly those two parameters; every other parameter is
//! carried over to the destination instead.

use url::form_urlencoded;

use super::kv::KvClient;

/// Parameters that take part in the lookup key.
const KEY_PARAMS: [&str; 2] = ["tag", "code"];

fn parse(query: Option<&str>) -> Vec<(String, String)> {
    query
        .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

fn with_query(path: &str, pairs: &[(String, String)]) -> String {
    if pairs.is_empty() {
        return path.to_string();
    }
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    format!("{path}?{query}")
}

/// KV key for a request path and query.
#[must_use]
pub fn lookup_key(code: &str, path: &str, query: Option<&str>) -> String {
    let pairs = parse(query);
    let key_pairs: Vec<(String, String)> = KEY_PARAMS
        .iter()
        .filter_map(|name| {
            pairs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(k, v)| (k.clone(), v.clone()))
        })
        .collect();

    format!("{code}.{}", with_query(path, &key_pairs))
}

/// Redirect target: the destination plus every query parameter except
/// `tag` and `code`.
#[must_use]
pub fn target(destination: &str, query: Option<&str>) -> String {
    let remaining: Vec<(String, String)> = parse(query)
        .into_iter()
        .filter(|(k, _)| !KEY_PARAMS.contains(&k.as_str()))
        .collect();
    with_query(destination, &remaining)
}

/// Look up a redirect; KV errors are logged and treated as a miss.
pub async fn find(kv: &KvClient, code: &str, path: &str, query: Option<&str>) -> Option<String> {
    let key = lookup_key(code, path, query);
    match kv.get_string(&key).await {
        Ok(Some(destination)) if !destination.is_empty() => Some(target(&destination, query)),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(error = %e, key = %key, "Redirect lookup failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_key_without_tag_or_code() {
        assert_eq!(lookup_key("rt", "/old/page", None), "rt./old/page");
        assert_eq!(
            lookup_key("rt", "/old/page", Some("utm_source=x")),
            "rt./old/page"
        );
    }

    #[test]
    fn test_lookup_key_keeps_only_tag_and_code() {
        assert_eq!(
            lookup_key("re", "/engines", Some("utm_source=x&code=ls1&tag=gm")),
            "re./engines?tag=gm&code=ls1"
        );
    }

    #[test]
    fn test_target_drops_tag_and_code() {
        assert_eq!(
            target("/collections/gm", Some("tag=gm&utm_source=mail&page=2")),
            "/collections/gm?utm_source=mail&page=2"
        );
        assert_eq!(target("/collections/gm", Some("code=ls1")), "/collections/gm");
        assert_eq!(target("/collections/gm", None), "/collections/gm");
    }
}
