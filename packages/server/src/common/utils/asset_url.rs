/// Content-addressed asset URLs.
///
/// Assets live under a two-level prefix of their content hash, e.g. hash
/// `abcdef…` with extension `png` is served from `{base}/ab/cd/abcdef….png`.
pub fn asset_url(base_url: &str, content_hash: &str, extension: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let extension = extension.trim_start_matches('.');
    let shard = |range: std::ops::Range<usize>| content_hash.get(range).unwrap_or("_");

    format!(
        "{}/{}/{}/{}.{}",
        base,
        shard(0..2),
        shard(2..4),
        content_hash,
        extension
    )
}
