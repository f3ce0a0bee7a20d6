//! Phone and URL canonicalization.

use quarry_core::{BusinessRecord, NormalizedRecord};

use crate::completeness::check_completeness;

/// Normalize a phone number to E.164 (`+1XXXXXXXXXX` for North America).
///
/// Returns the input unchanged when it cannot be confidently normalized.
///
/// ```
/// use quality::normalize_phone;
///
/// assert_eq!(normalize_phone("(613) 555-1234"), "+16135551234");
/// assert_eq!(normalize_phone("555"), "555");
/// ```
pub fn normalize_phone(phone: &str) -> String {
    if phone.is_empty() {
        return String::new();
    }

    let has_plus = phone
        .chars()
        .find(|c| c.is_ascii_digit() || *c == '+')
        .is_some_and(|c| c == '+');
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();

    if digits.is_empty() {
        return phone.to_string();
    }

    match digits.len() {
        10 => format!("+1{}", digits),
        11 if digits.starts_with('1') => format!("+{}", digits),
        n if has_plus && n >= 10 => format!("+{}", digits),
        _ => phone.to_string(),
    }
}

/// Force an `https://` scheme onto a URL.
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();

    if url.is_empty() {
        return String::new();
    }
    if url.starts_with("https://") {
        return url.to_string();
    }
    if let Some(rest) = url.strip_prefix("http://") {
        return format!("https://{}", rest);
    }
    if url.starts_with("//") {
        return format!("https:{}", url);
    }
    format!("https://{}", url)
}

/// Check that a URL is absolute with both a scheme and a host.
pub fn validate_url(url: &str) -> bool {
    if url.trim().is_empty() {
        return false;
    }
    match url::Url::parse(url) {
        Ok(parsed) => parsed.host_str().is_some_and(|host| !host.is_empty()),
        Err(_) => false,
    }
}

/// Clean up a record's phone numbers and website and attach its completeness.
///
/// Blank fields are left as they are.
pub fn normalize_record(record: &BusinessRecord) -> NormalizedRecord {
    let mut normalized = record.clone();

    if let Some(phone) = non_empty(&normalized.phone) {
        normalized.phone = Some(normalize_phone(phone));
    }
    if let Some(phone) = non_empty(&normalized.international_phone) {
        normalized.international_phone = Some(normalize_phone(phone));
    }
    if let Some(website) = non_empty(&normalized.website) {
        normalized.website = Some(normalize_url(website));
    }

    let completeness = check_completeness(&normalized);
    NormalizedRecord {
        record: normalized,
        data_quality_score: completeness.score,
        missing_fields: completeness.missing_fields,
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
