use crate::UrlError;
use url::Url;

/// Parses an absolute URL and checks that it is http(s) with a host
///
/// # Examples
///
/// ```
/// use jobbank_leads::url::parse_http_url;
///
/// assert!(parse_http_url("https://www.it-jobbank.dk/jobsoegning").is_ok());
/// assert!(parse_http_url("ftp://example.com/").is_err());
/// ```
pub fn parse_http_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    Ok(url)
}

/// Resolves an href found on `base` into an absolute http(s) URL
///
/// Surrounding whitespace is trimmed and the fragment removed. Absolute
/// hrefs are kept as they are; relative ones are joined onto the page URL.
///
/// # Arguments
///
/// * `href` - The raw attribute value
/// * `base` - URL of the page the href was found on
///
/// # Returns
///
/// * `Ok(String)` - Absolute URL
/// * `Err(UrlError)` - Empty href, unparsable URL or non-http scheme
pub fn resolve_href(href: &str, base: &Url) -> Result<String, UrlError> {
    let href = href.trim();
    if href.is_empty() {
        return Err(UrlError::Parse("empty href".to_string()));
    }

    let mut resolved = base.join(href).map_err(|e| UrlError::Parse(e.to_string()))?;
    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return Err(UrlError::InvalidScheme(resolved.scheme().to_string()));
    }
    resolved.set_fragment(None);

    Ok(resolved.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://www.it-jobbank.dk/jobsoegning?page=2").unwrap()
    }

    #[test]
    fn test_relative_href() {
        assert_eq!(
            resolve_href("/jobannonce/h123/udvikler", &base()).unwrap(),
            "https://www.it-jobbank.dk/jobannonce/h123/udvikler"
        );
    }

    #[test]
    fn test_query_only_href() {
        assert_eq!(
            resolve_href("?page=3", &base()).unwrap(),
            "https://www.it-jobbank.dk/jobsoegning?page=3"
        );
    }

    #[test]
    fn test_absolute_href_kept() {
        assert_eq!(
            resolve_href(" https://other.dk/job/1 ", &base()).unwrap(),
            "https://other.dk/job/1"
        );
    }

    #[test]
    fn test_fragment_removed() {
        assert_eq!(
            resolve_href("/jobannonce/h1#apply", &base()).unwrap(),
            "https://www.it-jobbank.dk/jobannonce/h1"
        );
    }

    #[test]
    fn test_rejected_hrefs() {
        assert!(resolve_href("", &base()).is_err());
        assert!(matches!(
            resolve_href("mailto:job@acme.dk", &base()),
            Err(UrlError::InvalidScheme(_))
        ));
    }

    #[test]
    fn test_parse_http_url() {
        assert!(parse_http_url("http://127.0.0.1:3000/").is_ok());
        assert!(matches!(
            parse_http_url("ftp://example.com/"),
            Err(UrlError::InvalidScheme(_))
        ));
        assert!(matches!(parse_http_url("nonsense"), Err(UrlError::Parse(_))));
    }
}
