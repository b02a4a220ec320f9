//! Built-in host lists.
//!
//! Entries are matched as substrings of the URL hostname, so
//! `"google.com"`-style entries also cover their subdomains.

pub const PRODUCTIVE_HOSTS: &[&str] = &[
    "docs.google.com",
    "github.com",
    "stackoverflow.com",
    "linkedin.com",
    "notion.so",
    "trello.com",
    "asana.com",
    "jira.com",
    "slack.com",
    "kaggle.com",
    "coursera.org",
    "udemy.com",
    "edx.org",
    "overleaf.com",
];

pub const UNPRODUCTIVE_HOSTS: &[&str] = &[
    "youtube.com",
    "facebook.com",
    "instagram.com",
    "twitter.com",
    "x.com",
    "reddit.com",
    "netflix.com",
    "tiktok.com",
    "twitch.tv",
    "pinterest.com",
    "buzzfeed.com",
    "9gag.com",
    "theonion.com",
    "fb.com",
    "m.facebook.com",
    "www.facebook.com",
];

/// URLs opened by `openUrls` when the caller supplies none.
pub const TEST_URLS: &[&str] = &[
    "google.com",
    "github.com",
    "stackoverflow.com",
    "mozilla.org",
    "developer.chrome.com",
];

/// Prefix `https://` unless the URL already carries an http(s) scheme.
pub fn with_scheme(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}
