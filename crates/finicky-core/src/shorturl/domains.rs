//! Known URL shortener domains.

/// Built-in redirector domains.
pub const SHORTENER_DOMAINS: &[&str] = &[
    "bit.ly",
    "buff.ly",
    "goo.gl",
    "is.gd",
    "ow.ly",
    "spoti.fi",
    "t.co",
    "wu8.in",
    "dub.sh",
    "d.to",
    "tiny.cc",
    "tinyurl.com",
    "urlshortener.teams.microsoft.com",
    "msteams.link",
];

/// The built-in list plus any extra domains a policy asked for.
#[derive(Debug, Clone, Default)]
pub struct ShortenerDomains {
    extra: Vec<String>,
}

impl ShortenerDomains {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extra = extra
            .into_iter()
            .map(|d| d.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        Self { extra }
    }

    /// True if `host` is a listed domain or a subdomain of one.
    /// `notbit.ly` does not match `bit.ly`.
    pub fn matches(&self, host: &str) -> bool {
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        SHORTENER_DOMAINS
            .iter()
            .copied()
            .chain(self.extra.iter().map(String::as_str))
            .any(|domain| host_in_domain(&host, domain))
    }
}

fn host_in_domain(host: &str, domain: &str) -> bool {
    match host.strip_suffix(domain) {
        Some("") => true,
        Some(prefix) => prefix.ends_with('.'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_and_subdomain_match() {
        let d = ShortenerDomains::new();
        assert!(d.matches("bit.ly"));
        assert!(d.matches("BIT.LY"));
        assert!(d.matches("eu.bit.ly"));
        assert!(d.matches("t.co."));
        assert!(d.matches("urlshortener.teams.microsoft.com"));
    }

    #[test]
    fn lookalike_hosts_do_not_match() {
        let d = ShortenerDomains::new();
        assert!(!d.matches("notbit.ly"));
        assert!(!d.matches("example.com"));
        assert!(!d.matches("teams.microsoft.com"));
        assert!(!d.matches("t.com"));
    }

    #[test]
    fn extra_domains_extend_the_list() {
        let d = ShortenerDomains::with_extra([" .Go.Example ", ""]);
        assert!(d.matches("go.example"));
        assert!(d.matches("links.go.example"));
        assert!(d.matches("bit.ly"));
        assert!(!d.matches("example"));
    }
}
