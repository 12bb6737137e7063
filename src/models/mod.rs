//! Core data structures for balancer-manager state
//!
//! Every fetch produces a fresh [`Snapshot`]. Routes point back at their
//! [`Cluster`] and at the [`EndpointInfo`] they were read from through
//! shared `Arc`s, so a route can be handed around on its own and still be
//! attributed and mutated.

pub mod builder;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::parser::ApacheVersion;

/// Identity of the balancer-manager page a snapshot was read from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointInfo {
    pub url: String,
    pub version: ApacheVersion,
}

/// A balancer as shown in its cluster table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub name: String,
    pub sticky_session: String,
    pub disable_failover: Option<bool>,
    pub timeout: u64,
    pub failover_attempts: u64,
    pub method: String,
    pub path: Option<String>,
    pub active: Option<bool>,
    pub max_members: Option<u32>,
    pub max_members_used: Option<u32>,
}

/// Route status flags that can be changed through the console
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFlag {
    IgnoreErrors,
    DrainingMode,
    Disabled,
    HotStandby,
}

impl StatusFlag {
    /// All mutable flags, in form-field order
    pub const ALL: [StatusFlag; 4] = [
        Self::IgnoreErrors,
        Self::DrainingMode,
        Self::Disabled,
        Self::HotStandby,
    ];

    /// Attribute name, e.g. `status_disabled`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IgnoreErrors => "status_ignore_errors",
            Self::DrainingMode => "status_draining_mode",
            Self::Disabled => "status_disabled",
            Self::HotStandby => "status_hot_standby",
        }
    }

    /// Form field the console expects for this flag
    pub fn form_key(&self) -> &'static str {
        match self {
            Self::IgnoreErrors => "w_status_I",
            Self::DrainingMode => "w_status_N",
            Self::Disabled => "w_status_D",
            Self::HotStandby => "w_status_H",
        }
    }

    /// Accepts both `status_disabled` and `disabled`
    pub fn parse(s: &str) -> Option<Self> {
        let name = s.trim().to_lowercase();
        let name = name.strip_prefix("status_").unwrap_or(&name);
        match name {
            "ignore_errors" => Some(Self::IgnoreErrors),
            "draining_mode" => Some(Self::DrainingMode),
            "disabled" => Some(Self::Disabled),
            "hot_standby" => Some(Self::HotStandby),
            _ => None,
        }
    }
}

impl fmt::Display for StatusFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a route as shown in the Status column
///
/// `init`, `ok` and `error` are computed by the server and read-only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteStatus {
    pub init: bool,
    pub ok: bool,
    pub error: bool,
    pub ignore_errors: bool,
    pub draining_mode: bool,
    pub disabled: bool,
    pub hot_standby: bool,
}

impl RouteStatus {
    /// Decode the Status cell text (`Init Ok`, `Init Dis Stby`, ...)
    pub fn from_codes(text: &str) -> Self {
        Self {
            init: text.contains("Init"),
            ok: text.contains("Ok"),
            error: text.contains("Err"),
            ignore_errors: text.contains("Ign"),
            draining_mode: text.contains("Drn"),
            disabled: text.contains("Dis"),
            hot_standby: text.contains("Stby"),
        }
    }

    pub fn get(&self, flag: StatusFlag) -> bool {
        match flag {
            StatusFlag::IgnoreErrors => self.ignore_errors,
            StatusFlag::DrainingMode => self.draining_mode,
            StatusFlag::Disabled => self.disabled,
            StatusFlag::HotStandby => self.hot_standby,
        }
    }

    pub fn set(&mut self, flag: StatusFlag, value: bool) {
        match flag {
            StatusFlag::IgnoreErrors => self.ignore_errors = value,
            StatusFlag::DrainingMode => self.draining_mode = value,
            StatusFlag::Disabled => self.disabled = value,
            StatusFlag::HotStandby => self.hot_standby = value,
        }
    }
}

/// One worker of a cluster, as of `fetched_at`
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub cluster: Arc<Cluster>,
    pub endpoint: Arc<EndpointInfo>,

    /// Worker URL (anchor text of the first column)
    pub worker: String,

    /// Route identifier
    pub name: String,

    pub route_redir: String,
    pub factor: u32,
    pub set: u32,
    pub status: RouteStatus,
    pub elected: u64,
    pub busy: Option<u64>,
    pub load: Option<i64>,

    pub traffic_to: String,
    pub traffic_to_raw: u64,
    pub traffic_from: String,
    pub traffic_from_raw: u64,

    /// Nonce required to post changes for this route
    pub session_nonce: Option<Uuid>,

    pub fetched_at: DateTime<Utc>,
}

impl Route {
    pub fn cluster_name(&self) -> &str {
        &self.cluster.name
    }

    /// Whether this route was read from the page at `url`
    pub fn belongs_to(&self, url: &str) -> bool {
        self.endpoint.url == url
    }
}

/// Result of one fetch of one endpoint
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub endpoint: Arc<EndpointInfo>,

    /// Clusters in first-seen order
    pub clusters: Vec<Arc<Cluster>>,

    /// Routes in document order
    pub routes: Vec<Route>,

    pub fetched_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn cluster(&self, name: &str) -> Option<&Arc<Cluster>> {
        self.clusters.iter().find(|c| c.name == name)
    }

    pub fn routes_in<'a>(&'a self, cluster: &'a str) -> impl Iterator<Item = &'a Route> + 'a {
        self.routes.iter().filter(move |r| r.cluster.name == cluster)
    }

    pub fn route(&self, cluster: &str, name: &str) -> Option<&Route> {
        self.routes
            .iter()
            .find(|r| r.cluster.name == cluster && r.name == name)
    }

    pub fn into_routes(self) -> Vec<Route> {
        self.routes
    }
}
