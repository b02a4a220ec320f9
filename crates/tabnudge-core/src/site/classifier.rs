//! Hostname-substring site classification.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::hosts::{PRODUCTIVE_HOSTS, UNPRODUCTIVE_HOSTS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Productive,
    Unproductive,
    #[default]
    Neutral,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Productive => "productive",
            Classification::Unproductive => "unproductive",
            Classification::Neutral => "neutral",
        }
    }

    /// Whether suggestions are scheduled for sites of this class.
    pub fn is_listed(&self) -> bool {
        !matches!(self, Classification::Neutral)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Classification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "productive" => Ok(Classification::Productive),
            "unproductive" => Ok(Classification::Unproductive),
            "neutral" => Ok(Classification::Neutral),
            other => Err(format!("unknown site type '{other}'")),
        }
    }
}

/// Classifies URLs against a productive and an unproductive host list.
///
/// The productive list is checked first, so a hostname matching both
/// lists is productive.
#[derive(Debug, Clone)]
pub struct SiteClassifier {
    productive: Vec<String>,
    unproductive: Vec<String>,
}

impl Default for SiteClassifier {
    fn default() -> Self {
        Self::new(
            PRODUCTIVE_HOSTS.iter().map(|s| s.to_string()).collect(),
            UNPRODUCTIVE_HOSTS.iter().map(|s| s.to_string()).collect(),
        )
    }
}

impl SiteClassifier {
    pub fn new(productive: Vec<String>, unproductive: Vec<String>) -> Self {
        Self {
            productive: normalize(productive),
            unproductive: normalize(unproductive),
        }
    }

    /// Built-in lists extended with user-configured entries.
    pub fn with_extra(extra_productive: &[String], extra_unproductive: &[String]) -> Self {
        let mut classifier = Self::default();
        classifier
            .productive
            .extend(normalize(extra_productive.to_vec()));
        classifier
            .unproductive
            .extend(normalize(extra_unproductive.to_vec()));
        classifier
    }

    pub fn productive_hosts(&self) -> &[String] {
        &self.productive
    }

    pub fn unproductive_hosts(&self) -> &[String] {
        &self.unproductive
    }

    /// Classify a URL. Unparseable URLs and URLs without a host are neutral.
    pub fn classify(&self, url: &str) -> Classification {
        let Some(hostname) = hostname(url) else {
            debug!(url, "no hostname, treating as neutral");
            return Classification::Neutral;
        };
        self.classify_host(&hostname)
    }

    pub fn classify_host(&self, hostname: &str) -> Classification {
        if let Some(site) = self.productive.iter().find(|s| hostname.contains(s.as_str())) {
            debug!(hostname, site = site.as_str(), "matched productive site");
            return Classification::Productive;
        }
        if let Some(site) = self.unproductive.iter().find(|s| hostname.contains(s.as_str())) {
            debug!(hostname, site = site.as_str(), "matched unproductive site");
            return Classification::Unproductive;
        }
        Classification::Neutral
    }
}

/// Classify with the built-in lists.
pub fn classify(url: &str) -> Classification {
    SiteClassifier::default().classify(url)
}

pub(crate) fn hostname(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .map(str::to_string)
}

fn normalize(hosts: Vec<String>) -> Vec<String> {
    hosts
        .into_iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .filter(|h| !h.is_empty())
        .collect()
}
