/// Build number used when no segment of the version path is numeric.
pub const FALLBACK_BUILD_VERSION: &str = "0";

/// Extract the build number from a slash-separated path, such as the
/// `version` variable handed to the build step (`builds/42` → `42`).
///
/// Segments are scanned from the end towards the start and the first one that
/// parses as a 32-bit integer wins. Anything else, including empty segments and
/// numbers out of that range, is skipped.
pub fn build_version(path: &str) -> String {
    path.split('/')
        .rev()
        .find_map(|segment| segment.parse::<i32>().ok())
        .map(|number| number.to_string())
        .unwrap_or_else(|| FALLBACK_BUILD_VERSION.to_string())
}
