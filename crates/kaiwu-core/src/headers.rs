use std::sync::OnceLock;

use http::header::{self, HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue};
use secrecy::{ExposeSecret, SecretString};

/// Headers that callers may never inject into an upstream request
static DENY_LIST: OnceLock<[HeaderName; 10]> = OnceLock::new();

/// Get the header deny list
pub fn get_deny_list() -> &'static [HeaderName] {
    DENY_LIST.get_or_init(|| {
        [
            header::CONTENT_LENGTH,
            header::CONNECTION,
            HeaderName::from_static("keep-alive"),
            header::PROXY_AUTHENTICATE,
            header::PROXY_AUTHORIZATION,
            header::TE,
            header::TRAILER,
            header::TRANSFER_ENCODING,
            header::UPGRADE,
            header::HOST,
        ]
    })
}

/// Check if a header name is in the deny list
pub fn is_header_denied(name: &HeaderName) -> bool {
    get_deny_list().contains(name)
}

/// Merge header maps in order, later maps replacing earlier values
///
/// Denied headers are dropped regardless of which map supplied them.
pub fn combine_headers<'a>(maps: impl IntoIterator<Item = &'a HeaderMap>) -> HeaderMap {
    let mut result = HeaderMap::new();

    for map in maps {
        for name in map.keys() {
            if is_header_denied(name) {
                continue;
            }

            result.remove(name);
            for value in map.get_all(name) {
                result.append(name.clone(), value.clone());
            }
        }
    }

    result
}

/// Build an `Authorization: Bearer` header value, marked sensitive
pub fn bearer_authorization(token: &SecretString) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut value = HeaderValue::try_from(format!("Bearer {}", token.expose_secret()))?;
    value.set_sensitive(true);
    Ok(value)
}

/// Per-call header overrides
///
/// An entry with a value replaces the header; an entry without one removes
/// it from the outgoing request.
#[derive(Debug, Clone, Default)]
pub struct HeaderOverrides {
    entries: Vec<(HeaderName, Option<HeaderValue>)>,
}

impl HeaderOverrides {
    /// Create an empty override set
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Replace (or add) a header
    #[must_use]
    pub fn set(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.entries.push((name, Some(value)));
        self
    }

    /// Remove a header that an earlier layer would otherwise send
    #[must_use]
    pub fn remove(mut self, name: HeaderName) -> Self {
        self.entries.push((name, None));
        self
    }

    /// Whether no overrides are present
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply the overrides, in insertion order, to a header map
    pub fn apply(&self, headers: &mut HeaderMap) {
        for (name, value) in &self.entries {
            if is_header_denied(name) {
                continue;
            }

            match value {
                Some(value) => {
                    headers.insert(name.clone(), value.clone());
                }
                None => {
                    headers.remove(name);
                }
            }
        }
    }
}

impl From<HeaderMap> for HeaderOverrides {
    fn from(map: HeaderMap) -> Self {
        let entries = map
            .into_iter()
            .filter_map(|(name, value)| name.map(|name| (name, Some(value))))
            .collect();
        Self { entries }
    }
}
