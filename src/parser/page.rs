//! Balancer-manager page parser
//!
//! The page alternates two kinds of tables: one describing a balancer
//! (cluster) followed by one listing its workers. This module walks that
//! structure and returns raw, still-textual records; converting them into
//! typed values is the job of [`crate::models::builder`].
//!
//! Supported worker table layouts:
//! - Apache 2.4: Worker URL, Route, RouteRedir, Factor, Set, Status,
//!   Elected, Busy, Load, To, From
//! - Apache 2.2: the same without Busy and Load

use regex::Regex;
use scraper::{ElementRef, Html};
use std::sync::OnceLock;

use crate::parser::selectors::{ANCHOR, BALANCER_HEADING, CELL, HEADER_CELL, ROW, TABLE};
use crate::parser::version::{detect, ApacheVersion};
use crate::utils::error::ParseError;
use crate::utils::normalize_whitespace;

/// Cell count of an Apache 2.4 worker row
const WIDE_ROW_CELLS: usize = 11;

/// Cell count of an Apache 2.2 worker row
const NARROW_ROW_CELLS: usize = 9;

/// Everything read from one balancer-manager page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    pub version: ApacheVersion,
    pub clusters: Vec<RawCluster>,
    pub routes: Vec<RawRoute>,
}

/// Header/value pairs of one cluster table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCluster {
    /// Name from the `balancer://<name>` heading above the table
    pub name_hint: Option<String>,

    /// `(header, value)` in column order
    pub fields: Vec<(String, String)>,
}

impl RawCluster {
    /// Value of the column whose header equals `header` (case-insensitive)
    pub fn field(&self, header: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(h, _)| h.eq_ignore_ascii_case(header))
            .map(|(_, v)| v.as_str())
    }
}

/// One worker row, still as text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRoute {
    /// Index into [`RawPage::clusters`] of the table pair this row belongs to
    pub cluster_index: usize,

    /// Cluster name decoded from the worker href (`b=`)
    pub cluster: Option<String>,

    /// Anchor text of the first cell: the worker URL
    pub worker: String,

    /// Management link of the worker
    pub href: String,

    pub route: String,
    pub route_redir: String,
    pub factor: String,
    pub set: String,

    /// Status cell, e.g. `Init Ok` or `Init Dis Stby`
    pub status: String,

    pub elected: String,
    pub busy: Option<String>,
    pub load: Option<String>,
    pub traffic_to: String,
    pub traffic_from: String,

    /// Session nonce decoded from the worker href
    pub nonce: Option<String>,
}

impl RawRoute {
    pub fn status_has(&self, code: &str) -> bool {
        self.status.contains(code)
    }
}

fn cluster_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[?&]b=([^&#]+)").expect("Invalid regex pattern"))
}

fn nonce_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"[?&]nonce=([0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12})(?:[&#]|$)",
        )
        .expect("Invalid regex pattern")
    })
}

fn heading_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"balancer://([^\s\[\]]+)").expect("Invalid regex pattern"))
}

/// Cluster name carried by a worker management link
pub fn cluster_from_href(href: &str) -> Option<String> {
    cluster_name_re()
        .captures(href)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Session nonce carried by a worker management link
pub fn nonce_from_href(href: &str) -> Option<String> {
    nonce_re()
        .captures(href)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Parse a balancer-manager page
///
/// # Errors
///
/// Returns `ParseError::NotBalancerManager` if the page carries no Apache
/// server version. Rows that are too short or lack a worker link are
/// skipped rather than reported.
pub fn parse_page(html: &str) -> Result<RawPage, ParseError> {
    let document = Html::parse_document(html);
    let version = detect(&document)?;

    let headings: Vec<Option<String>> = document
        .select(&BALANCER_HEADING)
        .map(|h| {
            let text = h.text().collect::<String>();
            heading_name_re()
                .captures(&text)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
        })
        .filter(Option::is_some)
        .collect();

    let mut clusters = Vec::new();
    let mut routes = Vec::new();

    for (position, table) in document.select(&TABLE).enumerate() {
        let cluster_index = position / 2;

        if position % 2 == 0 {
            let mut cluster = read_cluster_table(table);
            cluster.name_hint = headings.get(cluster_index).cloned().flatten();
            clusters.push(cluster);
        } else {
            routes.extend(
                table
                    .select(&ROW)
                    .filter_map(|row| read_worker_row(row, cluster_index)),
            );
        }
    }

    tracing::debug!(
        version = %version,
        clusters = clusters.len(),
        routes = routes.len(),
        "Parsed balancer-manager page"
    );

    Ok(RawPage {
        version,
        clusters,
        routes,
    })
}

fn cell_text(cell: ElementRef<'_>) -> String {
    normalize_whitespace(&cell.text().collect::<String>())
}

fn read_cluster_table(table: ElementRef<'_>) -> RawCluster {
    let headers: Vec<String> = table.select(&HEADER_CELL).map(cell_text).collect();

    let values: Vec<String> = table
        .select(&ROW)
        .map(|row| row.select(&CELL).map(cell_text).collect::<Vec<_>>())
        .find(|cells| !cells.is_empty())
        .unwrap_or_default();

    RawCluster {
        name_hint: None,
        fields: headers.into_iter().zip(values).collect(),
    }
}

fn read_worker_row(row: ElementRef<'_>, cluster_index: usize) -> Option<RawRoute> {
    let cells: Vec<ElementRef<'_>> = row.select(&CELL).collect();

    let wide = match cells.len() {
        n if n >= WIDE_ROW_CELLS => true,
        n if n >= NARROW_ROW_CELLS => false,
        _ => return None,
    };

    let anchor = cells[0].select(&ANCHOR).next()?;
    let href = anchor.value().attr("href").unwrap_or_default().to_string();
    let text = |idx: usize| cell_text(cells[idx]);

    let (busy, load, to_idx) = if wide {
        (Some(text(7)), Some(text(8)), 9)
    } else {
        (None, None, 7)
    };

    Some(RawRoute {
        cluster_index,
        cluster: cluster_from_href(&href),
        nonce: nonce_from_href(&href),
        worker: cell_text(anchor),
        href,
        route: text(1),
        route_redir: text(2),
        factor: text(3),
        set: text(4),
        status: text(5),
        elected: text(6),
        busy,
        load,
        traffic_to: text(to_idx),
        traffic_from: text(to_idx + 1),
    })
}
