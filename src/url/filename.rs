use regex::Regex;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("static regex is valid"));

#[allow(clippy::expect_used)]
static UNDERSCORE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_+").expect("static regex is valid"));

/// Extension residue left behind once the dot has been replaced
const EXTENSION_ARTIFACTS: &[&str] = &["_pdf", "_zip"];

/// Maps an address to a filesystem-safe local file name
///
/// # Sanitization Steps
///
/// 1. Lowercase the address; drop query string and fragment
/// 2. Take the final path segment (trailing slashes ignored)
/// 3. Replace each run of characters outside `[a-z0-9]` with `_`
/// 4. Collapse repeated underscores
/// 5. Strip a single leading underscore
/// 6. Remove every `_pdf` and `_zip`
/// 7. Append the original extension, dot included
///
/// The mapping is pure, so the same address always lands on the same file.
/// This is what makes an existing file usable as proof of a prior download.
///
/// # Examples
///
/// ```
/// use doc_harvest::url::sanitize_filename;
///
/// let name = sanitize_filename("HTTPS://Example.com/Path/File Name (1).PDF");
/// assert_eq!(name, "file_name_1.pdf");
/// ```
pub fn sanitize_filename(address: &str) -> String {
    // Step 1
    let lowercase = address.to_lowercase();
    let path = strip_query_and_fragment(&lowercase);

    let ext = file_extension(path);

    // Step 2
    let base = base_name(path);

    // Step 3 & 4
    let replaced = NON_ALPHANUMERIC.replace_all(base, "_");
    let collapsed = UNDERSCORE_RUNS.replace_all(&replaced, "_");

    // Step 5
    let mut safe = collapsed
        .strip_prefix('_')
        .unwrap_or(collapsed.as_ref())
        .to_string();

    // Step 6
    for artifact in EXTENSION_ARTIFACTS {
        safe = safe.replace(artifact, "");
    }

    // Step 7
    safe.push_str(&ext);
    safe
}

fn strip_query_and_fragment(address: &str) -> &str {
    let end = address.find(['?', '#']).unwrap_or(address.len());
    &address[..end]
}

/// Last path element, ignoring trailing slashes
fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "";
    }
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Extension of the last path element, dot included, restricted to `[a-z0-9]`
fn file_extension(path: &str) -> String {
    let last = path.rsplit('/').next().unwrap_or(path);
    match last.rfind('.') {
        Some(dot) => {
            let ext: String = last[dot + 1..]
                .chars()
                .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
                .collect();
            if ext.is_empty() {
                String::new()
            } else {
                format!(".{}", ext)
            }
        }
        None => String::new(),
    }
}
