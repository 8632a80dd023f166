//! Cookie jar carrying the ambient refresh credential.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use reqwest::Url;
use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use tracing::{debug, trace};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

type Cookies = BTreeMap<String, BTreeMap<String, String>>;

/// A minimal per-host cookie store.
///
/// Keeps `name=value` pairs keyed by host and sends all of a host's cookies
/// back to it. A `Set-Cookie` with an empty value, `Max-Age<=0` or an
/// `Expires` date in the past removes the cookie, which is how backends
/// clear the refresh cookie on logout.
///
/// Limits: `Path`, `Domain`, `Secure` and `SameSite` are ignored, so every
/// cookie goes to every path on the exact host that set it. An `Expires`
/// in the future is not tracked; the cookie lives until replaced or
/// removed. Only the IMF-fixdate form of `Expires` is understood.
///
/// The jar can be saved to and loaded from a JSON file; contents are never
/// logged.
#[derive(Default)]
pub struct CookieJar {
    cookies: Mutex<Cookies>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a jar saved with [`save`](Self::save). A missing file is an empty jar.
    pub fn load(path: &Path) -> io::Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let json = fs::read_to_string(path)?;
        let cookies: Cookies = serde_json::from_str(&json)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        debug!(path = %path.display(), hosts = cookies.len(), "Loaded cookie jar");
        Ok(Self {
            cookies: Mutex::new(cookies),
        })
    }

    /// Write the jar to `path`, readable by the owner only.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let json = {
            let cookies = self.lock();
            serde_json::to_string_pretty(&*cookies)?
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, json)?;

        // Set restrictive permissions (Unix only)
        #[cfg(unix)]
        {
            let mut perms = fs::metadata(path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(path, perms)?;
        }

        Ok(())
    }

    /// Returns true if the jar holds any cookie for `host`.
    pub fn has_cookies_for(&self, host: &str) -> bool {
        self.lock().get(host).is_some_and(|c| !c.is_empty())
    }

    /// Returns true if the jar holds no cookies at all.
    pub fn is_empty(&self) -> bool {
        self.lock().values().all(|c| c.is_empty())
    }

    /// Drop every cookie.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Cookies> {
        self.cookies.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn store(&self, host: &str, header: &str) {
        let Some((name, value, expired)) = parse_set_cookie(header) else {
            return;
        };

        let mut cookies = self.lock();
        let host_cookies = cookies.entry(host.to_string()).or_default();
        if expired {
            trace!(host, name = %name, "Cookie removed");
            host_cookies.remove(&name);
        } else {
            trace!(host, name = %name, "Cookie stored");
            host_cookies.insert(name, value);
        }
    }
}

/// Split a `Set-Cookie` header into name, value and whether it deletes.
fn parse_set_cookie(header: &str) -> Option<(String, String, bool)> {
    let mut parts = header.split(';');
    let (name, value) = parts.next()?.trim().split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let value = value.trim().trim_matches('"');

    let mut max_age = None;
    let mut expires = None;
    for attr in parts {
        let Some((key, v)) = attr.trim().split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.eq_ignore_ascii_case("max-age") {
            max_age = v.trim().parse::<i64>().ok();
        } else if key.eq_ignore_ascii_case("expires") {
            expires = DateTime::parse_from_rfc2822(v.trim())
                .ok()
                .map(|t| t.with_timezone(&Utc));
        }
    }

    // Max-Age wins over Expires when both are present.
    let expired = match max_age {
        Some(age) => age <= 0,
        None => expires.is_some_and(|at| at <= Utc::now()),
    };

    Some((
        name.to_string(),
        value.to_string(),
        value.is_empty() || expired,
    ))
}

impl CookieStore for CookieJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let Some(host) = url.host_str() else {
            return;
        };
        for header in cookie_headers {
            if let Ok(header) = header.to_str() {
                self.store(host, header);
            }
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let host = url.host_str()?;
        let cookies = self.lock();
        let host_cookies = cookies.get(host).filter(|c| !c.is_empty())?;
        let value = host_cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ");
        HeaderValue::from_str(&value).ok()
    }
}

impl std::fmt::Debug for CookieJar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let hosts: Vec<String> = self.lock().keys().cloned().collect();
        f.debug_struct("CookieJar")
            .field("hosts", &hosts)
            .field("cookies", &"[REDACTED]")
            .finish()
    }
}
