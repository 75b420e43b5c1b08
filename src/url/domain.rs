use url::Url;

/// Extracts the domain from a URL
///
/// The host is lowercased. Returns None if the URL has no host.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use jobbank_leads::url::extract_domain;
///
/// let url = Url::parse("https://WWW.IT-JOBBANK.DK/jobsoegning").unwrap();
/// assert_eq!(extract_domain(&url), Some("www.it-jobbank.dk".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Domain of a URL string, or the string itself when it does not parse
///
/// Used as the rate limiter key, so unparsable URLs still get a bucket of
/// their own.
pub fn domain_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| extract_domain(&u))
        .unwrap_or_else(|| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_with_port() {
        let url = Url::parse("http://127.0.0.1:8080/jobannonce/1").unwrap();
        assert_eq!(extract_domain(&url), Some("127.0.0.1".to_string()));
    }

    #[test]
    fn test_extract_mixed_case() {
        let url = Url::parse("https://Example.COM/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_domain_of() {
        assert_eq!(
            domain_of("https://www.it-jobbank.dk/jobannonce/h1?x=1"),
            "www.it-jobbank.dk"
        );
        assert_eq!(domain_of("not a url"), "not a url");
    }
}
