//! URL resolution, normalization and domain scoping.

use url::Url;

/// Resolve an href against the page it appeared on. Non-navigable schemes
/// and bare fragments resolve to nothing.
pub fn resolve_href(base: &Url, href: &str) -> Option<Url> {
    if href.is_empty()
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with('#')
    {
        return None;
    }

    let mut resolved = base.join(href).ok()?;
    resolved.set_fragment(None);

    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        _ => None,
    }
}

/// Canonical string form used as the dedup key: lowercase scheme and host,
/// no fragment, no default port, duplicate slashes collapsed, trailing
/// slash stripped except for the root path. Queries are kept verbatim.
pub fn normalize(url: &Url) -> String {
    let scheme = url.scheme().to_ascii_lowercase();
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    // `Url::port` is already None when the port is the scheme default.
    let port = url.port().map(|p| format!(":{p}")).unwrap_or_default();

    let mut path = collapse_slashes(url.path());
    if path.len() > 1 && path.ends_with('/') {
        path.pop();
    }
    if path.is_empty() {
        path.push('/');
    }

    match url.query() {
        Some(q) => format!("{scheme}://{host}{port}{path}?{q}"),
        None => format!("{scheme}://{host}{port}{path}"),
    }
}

/// Lowercase host plus the port when it is not the scheme default. This is
/// the crawl domain: comparisons and the robots.txt URL both use it.
pub fn authority(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host,
    }
}

/// `www.`-insensitive comparison of a URL's authority against the crawl
/// domain.
pub fn same_domain(url: &Url, domain: &str) -> bool {
    if url.host_str().is_none() {
        return false;
    }
    strip_www(&authority(url)) == strip_www(&domain.to_ascii_lowercase())
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut prev_slash = false;
    for c in path.chars() {
        if c == '/' {
            if prev_slash {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_resolve_href_relative() {
        let base = parse("https://example.com/about/");
        let resolved = resolve_href(&base, "../carte").unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/carte");
    }

    #[test]
    fn test_resolve_href_strips_fragment() {
        let base = parse("https://example.com/");
        let resolved = resolve_href(&base, "/menu#lunch").unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/menu");
    }

    #[test]
    fn test_resolve_href_skips_non_navigable() {
        let base = parse("https://example.com/");
        assert!(resolve_href(&base, "").is_none());
        assert!(resolve_href(&base, "#top").is_none());
        assert!(resolve_href(&base, "mailto:chef@example.com").is_none());
        assert!(resolve_href(&base, "tel:+33123456789").is_none());
        assert!(resolve_href(&base, "javascript:void(0)").is_none());
        assert!(resolve_href(&base, "ftp://example.com/menu.pdf").is_none());
    }

    #[test]
    fn test_normalize_strips_trailing_slash() {
        assert_eq!(
            normalize(&parse("https://example.com/menu/")),
            "https://example.com/menu"
        );
    }

    #[test]
    fn test_normalize_keeps_root_slash() {
        assert_eq!(normalize(&parse("https://example.com")), "https://example.com/");
        assert_eq!(normalize(&parse("https://example.com/")), "https://example.com/");
    }

    #[test]
    fn test_normalize_collapses_duplicate_slashes() {
        assert_eq!(
            normalize(&parse("https://example.com//menu///dinner")),
            "https://example.com/menu/dinner"
        );
    }

    #[test]
    fn test_normalize_drops_default_port() {
        assert_eq!(normalize(&parse("https://example.com:443/menu")), "https://example.com/menu");
        assert_eq!(normalize(&parse("http://example.com:80/menu")), "http://example.com/menu");
        assert_eq!(
            normalize(&parse("http://example.com:8080/menu")),
            "http://example.com:8080/menu"
        );
    }

    #[test]
    fn test_normalize_lowercases_host() {
        assert_eq!(
            normalize(&parse("HTTPS://Example.COM/Menu")),
            "https://example.com/Menu"
        );
    }

    #[test]
    fn test_normalize_keeps_query() {
        assert_eq!(
            normalize(&parse("https://example.com/menu/?lang=fr")),
            "https://example.com/menu?lang=fr"
        );
    }

    #[test]
    fn test_same_domain_ignores_www() {
        let url = parse("https://www.example.com/menu");
        assert!(same_domain(&url, "example.com"));
        assert!(same_domain(&url, "www.example.com"));
        assert!(!same_domain(&url, "other.com"));
    }

    #[test]
    fn test_same_domain_subdomain_is_not_same() {
        let url = parse("https://blog.example.com/menu");
        assert!(!same_domain(&url, "example.com"));
    }

    #[test]
    fn test_same_domain_distinguishes_ports() {
        let url = parse("http://127.0.0.1:4001/menu");
        assert!(same_domain(&url, "127.0.0.1:4001"));
        assert!(!same_domain(&url, "127.0.0.1:4002"));
    }

    #[test]
    fn test_authority_drops_default_port() {
        assert_eq!(authority(&parse("https://example.com:443/")), "example.com");
        assert_eq!(authority(&parse("http://example.com:8080/")), "example.com:8080");
    }
}
