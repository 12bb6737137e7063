//! Typed model construction from parsed page records
//!
//! Turns the textual [`RawPage`] into a [`Snapshot`]. Conversion is strict:
//! a number that does not parse is reported with the field name and the
//! offending text instead of being replaced by a default.

use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

use crate::models::{Cluster, EndpointInfo, Route, RouteStatus, Snapshot};
use crate::parser::page::{RawCluster, RawPage, RawRoute};
use crate::utils::error::ParseError;
use crate::utils::{parse_human_size, parse_number, parse_switch};

/// Build the typed snapshot of one fetch
///
/// Routes are grouped into clusters by name, one [`Cluster`] per distinct
/// name in first-seen order. Every route gets the same `fetched_at`.
///
/// # Errors
///
/// Returns `ParseError::InvalidField` when a field cannot be converted and
/// `ParseError::MissingField` when a route has no cluster name or its
/// cluster table lacks a required column.
pub fn build(
    raw: RawPage,
    endpoint_url: &str,
    fetched_at: DateTime<Utc>,
) -> Result<Snapshot, ParseError> {
    let endpoint = Arc::new(EndpointInfo {
        url: endpoint_url.to_string(),
        version: raw.version,
    });

    let mut clusters: Vec<Arc<Cluster>> = Vec::new();
    let mut routes = Vec::with_capacity(raw.routes.len());

    for raw_route in &raw.routes {
        let table = raw.clusters.get(raw_route.cluster_index);

        let name = raw_route
            .cluster
            .clone()
            .or_else(|| table.and_then(|t| t.name_hint.clone()))
            .ok_or_else(|| ParseError::missing("cluster"))?;

        let cluster = match clusters.iter().find(|c| c.name == name) {
            Some(existing) => Arc::clone(existing),
            None => {
                let table = table.ok_or_else(|| ParseError::missing("cluster table"))?;
                let created = Arc::new(build_cluster(name, table)?);
                clusters.push(Arc::clone(&created));
                created
            }
        };

        routes.push(build_route(
            raw_route,
            cluster,
            Arc::clone(&endpoint),
            fetched_at,
        )?);
    }

    Ok(Snapshot {
        endpoint,
        clusters,
        routes,
        fetched_at,
    })
}

fn required<'a>(table: &'a RawCluster, header: &str, field: &str) -> Result<&'a str, ParseError> {
    table.field(header).ok_or_else(|| ParseError::missing(field))
}

fn optional<'a>(table: &'a RawCluster, header: &str) -> Option<&'a str> {
    table.field(header).filter(|v| !v.trim().is_empty())
}

/// Parse `MaxMembers` text such as `8 [2 Used]` into `(max, used)`
pub fn parse_max_members(text: &str) -> Result<(u32, Option<u32>), ParseError> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^\s*(\d+)\s*(?:\[\s*(\d+)\s+Used\s*\])?\s*$").expect("Invalid regex pattern")
    });

    let caps = re
        .captures(text)
        .ok_or_else(|| ParseError::invalid("max_members", text))?;

    let max = parse_number("max_members", &caps[1])?;
    let used = caps
        .get(2)
        .map(|m| parse_number("max_members_used", m.as_str()))
        .transpose()?;

    Ok((max, used))
}

/// Parse the load factor; Apache 2.4.31+ prints it as `1.00`
pub fn parse_factor(text: &str) -> Result<u32, ParseError> {
    let trimmed = text.trim();
    if let Ok(value) = trimmed.parse::<u32>() {
        return Ok(value);
    }

    match trimmed.parse::<f64>() {
        Ok(value) if value >= 0.0 && value.fract() == 0.0 && value <= f64::from(u32::MAX) => {
            Ok(value as u32)
        }
        _ => Err(ParseError::invalid("factor", text)),
    }
}

fn build_cluster(name: String, table: &RawCluster) -> Result<Cluster, ParseError> {
    let (max_members, max_members_used) = match optional(table, "MaxMembers") {
        Some(text) => {
            let (max, used) = parse_max_members(text)?;
            (Some(max), used)
        }
        None => (None, None),
    };

    Ok(Cluster {
        sticky_session: required(table, "StickySession", "sticky_session")?.to_string(),
        disable_failover: optional(table, "DisableFailover")
            .map(|v| parse_switch("disable_failover", v))
            .transpose()?,
        timeout: parse_number("timeout", required(table, "Timeout", "timeout")?)?,
        failover_attempts: parse_number(
            "failover_attempts",
            required(table, "FailoverAttempts", "failover_attempts")?,
        )?,
        method: required(table, "Method", "method")?.to_string(),
        path: optional(table, "Path").map(str::to_string),
        active: optional(table, "Active")
            .map(|v| parse_switch("active", v))
            .transpose()?,
        max_members,
        max_members_used,
        name,
    })
}

fn optional_number<T: std::str::FromStr>(
    field: &str,
    text: Option<&String>,
) -> Result<Option<T>, ParseError> {
    text.filter(|t| !t.trim().is_empty())
        .map(|t| parse_number(field, t))
        .transpose()
}

fn build_route(
    raw: &RawRoute,
    cluster: Arc<Cluster>,
    endpoint: Arc<EndpointInfo>,
    fetched_at: DateTime<Utc>,
) -> Result<Route, ParseError> {
    let session_nonce = raw
        .nonce
        .as_deref()
        .map(|n| Uuid::parse_str(n).map_err(|_| ParseError::invalid("nonce", n)))
        .transpose()?;

    Ok(Route {
        cluster,
        endpoint,
        worker: raw.worker.clone(),
        name: raw.route.clone(),
        route_redir: raw.route_redir.clone(),
        factor: parse_factor(&raw.factor)?,
        set: parse_number("set", &raw.set)?,
        status: RouteStatus::from_codes(&raw.status),
        elected: parse_number("elected", &raw.elected)?,
        busy: optional_number("busy", raw.busy.as_ref())?,
        load: optional_number("load", raw.load.as_ref())?,
        traffic_to: raw.traffic_to.clone(),
        traffic_to_raw: parse_human_size("traffic_to", &raw.traffic_to)?,
        traffic_from: raw.traffic_from.clone(),
        traffic_from_raw: parse_human_size("traffic_from", &raw.traffic_from)?,
        session_nonce,
        fetched_at,
    })
}
