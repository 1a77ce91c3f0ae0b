//! Path and locator helpers for remote urls.
//!
//! Remote urls always use `/` separators regardless of platform, so these
//! operate on plain strings rather than `std::path`. Semantics for the
//! root and for bare names match the usual base/dir conventions:
//! `base_name("/") == "/"`, `parent_dir("name") == "."`.

/// Last path component: `"/docs/report.csv"` → `"report.csv"`.
pub fn base_name(path: &str) -> &str {
    if path.is_empty() {
        return ".";
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/";
    }
    match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// Everything but the last path component: `"/docs/report.csv"` → `"/docs"`.
///
/// The parent of a top-level entry is `"/"`; a bare name has parent `"."`.
pub fn parent_dir(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/";
    }
    match trimmed.rfind('/') {
        Some(0) => "/",
        Some(idx) => &trimmed[..idx],
        None => ".",
    }
}

/// Split a url into (stem, extension), where the extension starts at the
/// final dot of the final path element and includes the dot. A name with
/// no dot has an empty extension.
pub fn split_extension(path: &str) -> (&str, &str) {
    let base = base_name(path);
    match base.rfind('.') {
        Some(idx) => {
            let ext_len = base.len() - idx;
            path.split_at(path.len() - ext_len)
        }
        None => (path, ""),
    }
}

/// Join a server root locator with a relative url:
/// `("https://server.example", "/docs")` → `"https://server.example/docs"`.
pub fn join_locator(root: &str, path: &str) -> String {
    format!(
        "{}/{}",
        root.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
