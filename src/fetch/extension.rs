//! File extension resolution for record locators.

/// Returns the extension of `locator`, including the leading dot.
///
/// Everything from the first `?` or `#` onward is ignored. The extension is
/// taken from the last path segment only, so dots in the host or in parent
/// directories never leak into it. Returns an empty string when that segment
/// has no dot.
///
/// # Example
///
/// ```
/// use batchfetch_core::resolve_extension;
///
/// assert_eq!(resolve_extension("https://host/img.jpg?V"), ".jpg");
/// assert_eq!(resolve_extension("https://host/path/noext"), "");
/// assert_eq!(resolve_extension("https://example.com/noext"), "");
/// ```
#[must_use]
pub fn resolve_extension(locator: &str) -> &str {
    let end = locator.find(['?', '#']).unwrap_or(locator.len());
    let prefix = &locator[..end];

    // Skip `scheme://authority`; a locator without a path has no extension.
    let path = match prefix.find("://") {
        Some(scheme_end) => {
            let rest = &prefix[scheme_end + 3..];
            rest.find('/').map_or("", |slash| &rest[slash..])
        }
        None => prefix,
    };
    let segment = path.rfind('/').map_or(path, |slash| &path[slash + 1..]);

    segment.rfind('.').map_or("", |dot| &segment[dot..])
}
