//! Zone arithmetic
//!
//! Pure string helpers used by the reconciler. Matching is done on raw
//! dot-separated suffixes with exact, case-sensitive comparison; there is no
//! label validation or IDNA handling here.

/// Candidate zone names for `domain`, most specific first
///
/// `a.b.example.com` yields `a.b.example.com`, `b.example.com`,
/// `example.com`, `com`.
pub fn base_domain_name_guesses(domain: &str) -> Vec<String> {
    let labels: Vec<&str> = domain.split('.').collect();
    (0..labels.len()).map(|i| labels[i..].join(".")).collect()
}

/// First guess for `domain` that is an exact member of `zones`
pub fn find_zone<'a>(domain: &str, zones: &'a [String]) -> Option<&'a str> {
    base_domain_name_guesses(domain)
        .iter()
        .find_map(|guess| zones.iter().find(|zone| *zone == guess))
        .map(String::as_str)
}

/// The part of `record_name` inside `zone`
///
/// Returns `None` unless `record_name` ends with `"." + zone`.
pub fn subdomain_within<'a>(record_name: &'a str, zone: &str) -> Option<&'a str> {
    record_name
        .strip_suffix(zone)
        .and_then(|head| head.strip_suffix('.'))
}
