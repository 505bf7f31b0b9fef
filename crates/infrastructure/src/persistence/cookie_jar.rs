//! Cookie jar that survives the process.
//!
//! The backend keeps its refresh credential in an HTTP-only cookie. A
//! browser holds that cookie across page loads; this jar holds it across
//! `taskdeck` invocations by replaying every saved `Set-Cookie` line into a
//! fresh [`reqwest::cookie::Jar`] at startup.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use reqwest::Url;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::serialization::{SerializationError, from_json_bytes, to_json_stable_bytes};

/// File name of the cookie jar, next to the credentials file.
pub const COOKIES_FILE: &str = "cookies.json";

/// One `Set-Cookie` line and the URL it was received from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SavedCookie {
    url: String,
    set_cookie: String,
}

type Saved = BTreeMap<String, SavedCookie>;

#[derive(Debug, Default)]
struct JarState {
    jar: Jar,
    saved: Saved,
}

impl JarState {
    fn replay(saved: Saved) -> Self {
        let jar = Jar::default();
        for cookie in saved.values() {
            match Url::parse(&cookie.url) {
                Ok(url) => jar.add_cookie_str(&cookie.set_cookie, &url),
                Err(error) => warn!(url = %cookie.url, %error, "skipping saved cookie"),
            }
        }
        Self { jar, saved }
    }
}

/// Cookie store that can be cleared, optionally persisted as a JSON file.
///
/// Entries are keyed by origin and cookie name, so a newer `Set-Cookie`
/// for the same cookie replaces the older line. Expiry is left to the
/// in-memory jar.
#[derive(Debug, Default)]
pub struct CookieJar {
    path: Option<PathBuf>,
    state: RwLock<JarState>,
}

impl CookieJar {
    /// Opens the jar at `path`, loading any cookies saved there.
    ///
    /// A missing or unreadable file yields an empty jar.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let saved = match read_saved(&path) {
            Ok(saved) => saved,
            Err(error) => {
                warn!(path = %path.display(), %error, "ignoring unreadable cookie file");
                Saved::new()
            }
        };
        debug!(path = %path.display(), cookies = saved.len(), "cookie jar opened");
        Self {
            path: Some(path),
            state: RwLock::new(JarState::replay(saved)),
        }
    }

    /// A jar that lives only as long as the process.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// The file this jar reads and writes, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Forgets every cookie and removes the file.
    pub fn clear(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = JarState::default();
        let Some(path) = &self.path else {
            return;
        };
        match fs::remove_file(path) {
            Ok(()) => debug!(path = %path.display(), "cookie file removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(error) => warn!(path = %path.display(), %error, "could not remove cookie file"),
        }
    }

    fn persist(&self, saved: &Saved) {
        let Some(path) = &self.path else {
            return;
        };
        if let Err(error) = write_saved(path, saved) {
            warn!(path = %path.display(), %error, "could not save cookies");
        }
    }
}

impl CookieStore for CookieJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let mut changed = false;
        for header in cookie_headers {
            let Ok(line) = header.to_str() else {
                continue;
            };
            let Some(name) = cookie_name(line) else {
                continue;
            };
            state.jar.add_cookie_str(line, url);
            state.saved.insert(
                format!("{} {name}", url.origin().ascii_serialization()),
                SavedCookie {
                    url: url.to_string(),
                    set_cookie: line.to_string(),
                },
            );
            changed = true;
        }
        if changed {
            self.persist(&state.saved);
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .jar
            .cookies(url)
    }
}

fn cookie_name(set_cookie: &str) -> Option<&str> {
    let (name, _) = set_cookie.split_once('=')?;
    let name = name.trim();
    (!name.is_empty()).then_some(name)
}

#[derive(Debug, thiserror::Error)]
enum CookieFileError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] SerializationError),
}

fn read_saved(path: &Path) -> Result<Saved, CookieFileError> {
    match fs::read(path) {
        Ok(content) => Ok(from_json_bytes(&content)?),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Saved::new()),
        Err(e) => Err(e.into()),
    }
}

fn write_saved(path: &Path, saved: &Saved) -> Result<(), CookieFileError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, to_json_stable_bytes(saved)?)?;
    debug!(path = %path.display(), cookies = saved.len(), "cookies saved");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn api() -> Url {
        Url::parse("http://localhost:3000/api/auth/login").unwrap()
    }

    fn receive(jar: &CookieJar, lines: &[&'static str]) {
        let headers: Vec<HeaderValue> = lines.iter().copied().map(HeaderValue::from_static).collect();
        jar.set_cookies(&mut headers.iter(), &api());
    }

    fn cookie_header(jar: &CookieJar) -> Option<String> {
        let url = Url::parse("http://localhost:3000/api/auth/refresh").unwrap();
        jar.cookies(&url).map(|v| v.to_str().unwrap().to_string())
    }

    #[test]
    fn test_cookies_survive_reopening() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(COOKIES_FILE);

        let jar = CookieJar::open(&path);
        receive(&jar, &["refreshToken=r1; Path=/; HttpOnly"]);
        drop(jar);

        let reopened = CookieJar::open(&path);
        assert_eq!(cookie_header(&reopened).as_deref(), Some("refreshToken=r1"));
    }

    #[test]
    fn test_newer_cookie_replaces_older() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(COOKIES_FILE);

        let jar = CookieJar::open(&path);
        receive(&jar, &["refreshToken=r1; Path=/"]);
        receive(&jar, &["refreshToken=r2; Path=/"]);

        let saved = read_saved(&path).unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(
            cookie_header(&CookieJar::open(&path)).as_deref(),
            Some("refreshToken=r2")
        );
    }

    #[test]
    fn test_clear_forgets_cookies_and_removes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(COOKIES_FILE);

        let jar = CookieJar::open(&path);
        receive(&jar, &["refreshToken=r1; Path=/"]);
        assert!(path.exists());

        jar.clear();

        assert_eq!(cookie_header(&jar), None);
        assert!(!path.exists());
        assert_eq!(cookie_header(&CookieJar::open(&path)), None);
        jar.clear();
    }

    #[test]
    fn test_in_memory_jar_carries_and_clears() {
        let jar = CookieJar::in_memory();
        receive(&jar, &["refreshToken=r1; Path=/"]);
        assert_eq!(cookie_header(&jar).as_deref(), Some("refreshToken=r1"));
        assert_eq!(jar.path(), None);

        jar.clear();

        assert_eq!(cookie_header(&jar), None);
    }

    #[test]
    fn test_corrupt_file_opens_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(COOKIES_FILE);
        fs::write(&path, "not json").unwrap();

        let jar = CookieJar::open(&path);

        assert_eq!(cookie_header(&jar), None);
    }

    #[test]
    fn test_cookie_name() {
        assert_eq!(cookie_name("refreshToken=r1; Path=/"), Some("refreshToken"));
        assert_eq!(cookie_name("=nameless"), None);
        assert_eq!(cookie_name("garbage"), None);
    }
}
