//! File persistence adapters.

mod cookie_jar;
mod credentials_file;

pub use cookie_jar::{COOKIES_FILE, CookieJar};
pub use credentials_file::{CREDENTIALS_FILE, FileCredentialStore};
