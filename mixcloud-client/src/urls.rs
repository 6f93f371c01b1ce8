//! URL building helpers

use crate::error::Result;
use url::Url;

/// Parse `base` and append `segment` to its path.
pub fn url_join(base: &str, segment: &str) -> Result<Url> {
    let base = Url::parse(base)?;
    Ok(append_segment(&base, segment))
}

/// Append `segment` to the path of `base`.
///
/// A trailing slash on the base path and a leading slash on the segment
/// are collapsed into one. A trailing slash on the segment is kept, since
/// the API requires it on non-GET endpoints. Query and fragment are
/// dropped.
pub fn append_segment(base: &Url, segment: &str) -> Url {
    let mut url = base.clone();
    let path = format!(
        "{}/{}",
        base.path().trim_end_matches('/'),
        segment.trim_start_matches('/')
    );
    url.set_path(&path);
    url.set_query(None);
    url.set_fragment(None);
    url
}

/// Merge `params` into the query of `url`.
///
/// Existing keys take the new value in place, duplicates of them are
/// removed and new keys are appended.
pub fn update_query<K, V>(url: &mut Url, params: &[(K, V)])
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let existing: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    let mut pending: Vec<Option<(&str, &str)>> = params
        .iter()
        .map(|(key, value)| Some((key.as_ref(), value.as_ref())))
        .collect();
    let overridden = |key: &str| params.iter().any(|(k, _)| k.as_ref() == key);

    let mut merged: Vec<(String, String)> = Vec::with_capacity(existing.len() + params.len());
    for (key, value) in existing {
        if !overridden(&key) {
            merged.push((key, value));
            continue;
        }
        // Replace the first occurrence, drop the rest.
        if let Some(slot) = pending
            .iter_mut()
            .find(|slot| matches!(slot, Some((k, _)) if *k == key))
        {
            if let Some((k, v)) = slot.take() {
                merged.push((k.to_string(), v.to_string()));
            }
        }
    }
    merged.extend(
        pending
            .into_iter()
            .flatten()
            .map(|(k, v)| (k.to_string(), v.to_string())),
    );

    set_pairs(url, &merged);
}

/// Replace the whole query of `url` with `params`.
pub fn with_query<K, V>(mut url: Url, params: &[(K, V)]) -> Url
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    set_pairs(&mut url, params);
    url
}

fn set_pairs<K, V>(url: &mut Url, params: &[(K, V)])
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    if params.is_empty() {
        url.set_query(None);
        return;
    }
    url.query_pairs_mut()
        .clear()
        .extend_pairs(params.iter().map(|(k, v)| (k.as_ref(), v.as_ref())));
}

/// Render `url` for logging with the access token masked.
pub fn redacted(url: &Url) -> String {
    if !url.query_pairs().any(|(key, _)| key == "access_token") {
        return url.to_string();
    }
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .into_owned()
        .map(|(key, value)| {
            if key == "access_token" {
                (key, "***".to_string())
            } else {
                (key, value)
            }
        })
        .collect();
    with_query(url.clone(), &pairs).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(url: &Url) -> Vec<(String, String)> {
        url.query_pairs().into_owned().collect()
    }

    #[test]
    fn joins_with_a_single_slash() {
        let root = "https://api.mixcloud.com";
        assert_eq!(url_join(root, "me").unwrap().as_str(), "https://api.mixcloud.com/me");
        assert_eq!(
            url_join(root, "/bob/").unwrap().as_str(),
            "https://api.mixcloud.com/bob/"
        );
        assert_eq!(
            url_join("https://api.mixcloud.com/v1/", "/bob/mix/").unwrap().as_str(),
            "https://api.mixcloud.com/v1/bob/mix/"
        );
    }

    #[test]
    fn appending_keeps_segment_slash_and_drops_query() {
        let base = Url::parse("https://api.mixcloud.com/bob/?x=1#frag").unwrap();
        assert_eq!(
            append_segment(&base, "follow/").as_str(),
            "https://api.mixcloud.com/bob/follow/"
        );
    }

    #[test]
    fn update_query_replaces_and_appends() {
        let mut url = Url::parse("https://api.mixcloud.com/x/?metadata=0&a=1&metadata=2").unwrap();
        update_query(&mut url, &[("metadata", "1"), ("access_token", "t")]);
        assert_eq!(
            pairs(&url),
            vec![
                ("metadata".to_string(), "1".to_string()),
                ("a".to_string(), "1".to_string()),
                ("access_token".to_string(), "t".to_string()),
            ]
        );
    }

    #[test]
    fn with_query_replaces_everything() {
        let url = Url::parse("https://api.mixcloud.com/x/?a=1").unwrap();
        let url = with_query(url, &[("access_token", "t")]);
        assert_eq!(url.query(), Some("access_token=t"));

        let empty: &[(&str, &str)] = &[];
        let url = with_query(url, empty);
        assert_eq!(url.query(), None);
    }

    #[test]
    fn redaction_masks_only_the_token() {
        let url = Url::parse("https://api.mixcloud.com/me/?metadata=1&access_token=secret").unwrap();
        let shown = redacted(&url);
        assert!(!shown.contains("secret"));
        assert!(shown.contains("metadata=1"));

        let plain = Url::parse("https://api.mixcloud.com/me/").unwrap();
        assert_eq!(redacted(&plain), "https://api.mixcloud.com/me/");
    }
}
