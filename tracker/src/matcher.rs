use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static STATUS_PATH: Lazy<Regex> = Lazy::new(|| compile_regex(r"/([^/]+)/status/(\d+)"));

pub(crate) fn compile_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|err| panic!("invalid regex literal {pattern}: {err}"))
}

/// A URL recognised as a single content page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRef {
    pub content_id: String,
    pub url: String,
}

/// Decides whether a URL points at a trackable content page.
#[derive(Debug, Clone)]
pub struct NavigationMatcher {
    hosts: Vec<String>,
}

impl NavigationMatcher {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let hosts = hosts
            .into_iter()
            .map(|host| host.as_ref().trim().to_ascii_lowercase())
            .filter(|host| !host.is_empty())
            .collect();
        Self { hosts }
    }

    /// `Ok(None)` for well-formed URLs that are not content pages.
    pub fn classify(&self, raw: &str) -> Result<Option<ContentRef>, url::ParseError> {
        let parsed = Url::parse(raw)?;
        let Some(host) = parsed.host_str() else {
            return Ok(None);
        };
        if !self.hosts.iter().any(|known| known.eq_ignore_ascii_case(host)) {
            return Ok(None);
        }
        Ok(STATUS_PATH
            .captures(parsed.path())
            .and_then(|caps| caps.get(2))
            .map(|id| ContentRef {
                content_id: id.as_str().to_string(),
                url: raw.to_string(),
            }))
    }
}
