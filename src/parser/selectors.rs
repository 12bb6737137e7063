//! CSS selectors for the balancer-manager page
//!
//! The console has no classes or ids to hook onto, so everything is located
//! by element structure.

use lazy_static::lazy_static;
use scraper::Selector;

// Helper macro to parse selectors safely at compile time
macro_rules! parse_selector {
    ($s:expr) => {
        Selector::parse($s).expect(concat!("Invalid CSS selector: ", $s))
    };
}

lazy_static! {
    /// Definition terms; the first one carries the server version
    pub static ref FIRST_DT: Selector = parse_selector!("dt");

    /// Cluster and worker tables, in document order
    pub static ref TABLE: Selector = parse_selector!("table");

    pub static ref ROW: Selector = parse_selector!("tr");

    pub static ref HEADER_CELL: Selector = parse_selector!("th");

    pub static ref CELL: Selector = parse_selector!("td");

    pub static ref ANCHOR: Selector = parse_selector!("a");

    /// `LoadBalancer Status for <a>balancer://name</a>` headings
    pub static ref BALANCER_HEADING: Selector = parse_selector!("h3");
}
