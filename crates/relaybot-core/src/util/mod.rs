pub mod http;

/// Convert a string to a safe filename.
pub fn safe_filename(name: &str) -> String {
    const UNSAFE: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
    let mut result = name.to_string();
    for &c in UNSAFE {
        result = result.replace(c, "_");
    }
    result.trim().to_string()
}
