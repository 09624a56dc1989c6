use std::collections::HashMap;
use std::sync::Mutex;

use super::*;

/// Fails the first `failures[url]` requests for each URL, then returns the URL bytes.
#[derive(Default)]
struct ScriptedFetcher {
    failures: Mutex<HashMap<String, usize>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    fn failing(url: &str, times: usize) -> Self {
        let f = Self::default();
        f.failures.lock().unwrap().insert(url.to_owned(), times);
        f
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ResourceFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> anyhow::Result<Vec<u8>> {
        self.calls.lock().unwrap().push(url.to_owned());
        let mut failures = self.failures.lock().unwrap();
        if let Some(left) = failures.get_mut(url)
            && *left > 0
        {
            *left -= 1;
            anyhow::bail!("503 from {url}");
        }
        Ok(url.as_bytes().to_vec())
    }
}

fn spec(sources: &[&str]) -> ResourceSpec {
    ResourceSpec {
        kind: ResourceKind::WasmBinary,
        file_name: "core.wasm".to_owned(),
        media_type: "application/wasm".to_owned(),
        sources: sources.iter().map(|s| (*s).to_owned()).collect(),
        sha256: None,
    }
}

#[test]
fn default_manifest_lists_every_kind_with_fallback() {
    let m = ResourceManifest::default();
    m.validate().unwrap();
    for r in &m.resources {
        assert_eq!(r.sources.len(), 2);
        assert!(r.sources[0].starts_with("https://unpkg.com/"));
        assert!(r.sources[1].starts_with("https://cdn.jsdelivr.net/"));
        assert!(r.sources[0].ends_with(&r.file_name));
    }
    let wasm = m
        .resources
        .iter()
        .find(|r| r.kind == ResourceKind::WasmBinary)
        .unwrap();
    assert_eq!(wasm.media_type, "application/wasm");
}

#[test]
fn manifest_rejects_missing_kind_and_unsafe_names() {
    let mut m = ResourceManifest::default();
    m.resources.pop();
    assert!(m.validate().is_err());

    let mut m = ResourceManifest::default();
    m.resources[0].file_name = "../escape.js".to_owned();
    assert!(m.validate().is_err());

    let mut m = ResourceManifest::default();
    m.resources[1].sources.clear();
    assert!(m.validate().is_err());
}

#[test]
fn backoff_doubles_from_one_second() {
    let p = RetryPolicy::default();
    assert_eq!(p.backoff(0), Duration::from_secs(1));
    assert_eq!(p.backoff(1), Duration::from_secs(2));
    assert_eq!(p.backoff(2), Duration::from_secs(4));
}

#[test]
fn sha256_hex_matches_known_digest() {
    assert_eq!(
        sha256_hex(b"abc"),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[tokio::test(start_paused = true)]
async fn retries_primary_then_falls_back() {
    let fetcher = ScriptedFetcher::failing("a", 3);
    let start = tokio::time::Instant::now();

    let bytes = fetch_with_fallback(&fetcher, &spec(&["a", "b"]), RetryPolicy::default())
        .await
        .unwrap();

    assert_eq!(bytes, b"b");
    assert_eq!(fetcher.calls(), vec!["a", "a", "a", "b"]);
    assert_eq!(start.elapsed(), Duration::from_secs(1 + 2 + 4));
}

#[tokio::test(start_paused = true)]
async fn recovers_within_same_source() {
    let fetcher = ScriptedFetcher::failing("a", 1);
    let start = tokio::time::Instant::now();

    let bytes = fetch_with_fallback(&fetcher, &spec(&["a", "b"]), RetryPolicy::default())
        .await
        .unwrap();

    assert_eq!(bytes, b"a");
    assert_eq!(fetcher.calls().len(), 2);
    assert_eq!(start.elapsed(), Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn exhaustion_reports_resource_fetch_error() {
    let fetcher = ScriptedFetcher::default();
    fetcher.failures.lock().unwrap().insert("a".into(), 99);
    fetcher.failures.lock().unwrap().insert("b".into(), 99);
    let start = tokio::time::Instant::now();

    let err = fetch_with_fallback(&fetcher, &spec(&["a", "b"]), RetryPolicy::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ReelError::ResourceFetch { ref resource, .. } if resource == "core.wasm"));
    assert!(err.to_string().contains("503 from b"));
    assert_eq!(fetcher.calls().len(), 6);
    // No sleep after the final attempt.
    assert_eq!(start.elapsed(), Duration::from_secs(1 + 2 + 4 + 1 + 2));
}

#[tokio::test(start_paused = true)]
async fn digest_mismatch_counts_as_failed_attempt() {
    let fetcher = ScriptedFetcher::default();
    let mut s = spec(&["a", "b"]);
    s.sha256 = Some(sha256_hex(b"b"));

    let bytes = fetch_with_fallback(&fetcher, &s, RetryPolicy::default())
        .await
        .unwrap();

    assert_eq!(bytes, b"b");
    assert_eq!(fetcher.calls(), vec!["a", "a", "a", "b"]);
}

#[tokio::test]
async fn bundle_stages_all_resources() {
    let fetcher = ScriptedFetcher::default();
    let root = tempfile::tempdir().unwrap();

    let bundle = fetch_bundle(
        &fetcher,
        &ResourceManifest::default(),
        RetryPolicy::default(),
        Some(root.path()),
    )
    .await
    .unwrap();

    assert_eq!(bundle.handles().len(), 3);
    assert!(bundle.dir().starts_with(root.path()));
    for kind in ResourceKind::ALL {
        let h = bundle.get(kind).unwrap();
        let on_disk = std::fs::read(&h.path).unwrap();
        assert_eq!(on_disk.len() as u64, h.len);
        assert_eq!(sha256_hex(&on_disk), h.sha256);
    }
    assert_eq!(
        bundle.get(ResourceKind::CoreRuntime).unwrap().media_type,
        "text/javascript"
    );

    let dir = bundle.dir().to_path_buf();
    drop(bundle);
    assert!(!dir.exists());
}

#[tokio::test(start_paused = true)]
async fn failed_bundle_exhausts_every_source_without_cancelling_siblings() {
    let manifest = ResourceManifest::default();
    let wasm = &manifest.resources[1];
    let fetcher = ScriptedFetcher::default();
    for url in &wasm.sources {
        fetcher.failures.lock().unwrap().insert(url.clone(), usize::MAX);
    }
    let root = tempfile::tempdir().unwrap();

    let Err(err) = fetch_bundle(&fetcher, &manifest, RetryPolicy::default(), Some(root.path())).await
    else {
        panic!("bundle fetched with an unreachable resource");
    };

    assert!(matches!(err, ReelError::ResourceFetch { ref resource, .. } if resource == &wasm.file_name));
    let calls = fetcher.calls();
    for url in &wasm.sources {
        assert_eq!(calls.iter().filter(|c| *c == url).count(), 3, "{url}");
    }
    // The two healthy resources succeed on their first primary attempt.
    assert_eq!(calls.len(), 2 * 3 + 2);
    assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
}
