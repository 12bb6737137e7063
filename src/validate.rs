//! Route status profiles
//!
//! A [`Profile`] records the expected value of the four mutable flags for
//! named routes. [`validate`] compares a live [`Snapshot`] against it;
//! [`crate::Client::enforce`] posts the corrections.
//!
//! Profiles are plain serde data, stored as JSON or TOML:
//!
//! ```toml
//! [clusters.web.node1]
//! disabled = false
//! hot_standby = true
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};
use crate::models::{Snapshot, StatusFlag};
use crate::mutation::StatusUpdate;

/// Expected flags per cluster and route
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub clusters: BTreeMap<String, BTreeMap<String, StatusUpdate>>,
}

impl Profile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expect `route` in `cluster` to match `update`
    pub fn expect(mut self, cluster: &str, route: &str, update: StatusUpdate) -> Self {
        self.clusters
            .entry(cluster.to_string())
            .or_default()
            .insert(route.to_string(), update);
        self
    }

    /// Record the current mutable flags of every route in `snapshot`
    pub fn capture(snapshot: &Snapshot) -> Self {
        snapshot.routes.iter().fold(Self::new(), |profile, route| {
            let update = StatusFlag::ALL
                .into_iter()
                .map(|flag| (flag, route.status.get(flag)))
                .collect();
            profile.expect(&route.cluster.name, &route.name, update)
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Other {
            context: "invalid profile TOML".to_string(),
            source: Some(Box::new(e)),
        })
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::Other {
            context: "cannot serialize profile as TOML".to_string(),
            source: Some(Box::new(e)),
        })
    }

    /// Load a profile, choosing JSON or TOML by file extension
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::Other {
            context: format!("cannot read profile {}", path.display()),
            source: Some(Box::new(e)),
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&text),
            _ => Self::from_toml(&text),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.values().all(BTreeMap::is_empty)
    }
}

/// One flag that differs from its expected value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub cluster: String,
    pub route: String,
    pub flag: StatusFlag,
    pub expected: bool,
    pub actual: bool,
}

/// Outcome of comparing a snapshot with a profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub mismatches: Vec<Mismatch>,

    /// `(cluster, route)` pairs named by the profile but absent from the page
    pub missing: Vec<(String, String)>,
}

impl ValidationReport {
    pub fn is_compliant(&self) -> bool {
        self.mismatches.is_empty() && self.missing.is_empty()
    }

    /// Updates that would bring each mismatched route in line
    ///
    /// One entry per route, carrying only the flags that differ.
    pub fn corrections(&self) -> Vec<(String, String, StatusUpdate)> {
        let mut out: Vec<(String, String, StatusUpdate)> = Vec::new();

        for m in &self.mismatches {
            match out
                .iter_mut()
                .find(|(cluster, route, _)| *cluster == m.cluster && *route == m.route)
            {
                Some((_, _, update)) => *update = update.set(m.flag, m.expected),
                None => out.push((
                    m.cluster.clone(),
                    m.route.clone(),
                    StatusUpdate::new().set(m.flag, m.expected),
                )),
            }
        }

        out
    }
}

/// Compare live route flags against `profile`
pub fn validate(snapshot: &Snapshot, profile: &Profile) -> ValidationReport {
    let mut report = ValidationReport::default();

    for (cluster, routes) in &profile.clusters {
        for (name, expected) in routes {
            let Some(route) = snapshot.route(cluster, name) else {
                report.missing.push((cluster.clone(), name.clone()));
                continue;
            };

            for (flag, want) in expected.touched() {
                let actual = route.status.get(flag);
                if actual != want {
                    report.mismatches.push(Mismatch {
                        cluster: cluster.clone(),
                        route: name.clone(),
                        flag,
                        expected: want,
                        actual,
                    });
                }
            }
        }
    }

    if !report.is_compliant() {
        tracing::debug!(
            url = %snapshot.endpoint.url,
            mismatches = report.mismatches.len(),
            missing = report.missing.len(),
            "Routes differ from profile"
        );
    }

    report
}
