//! Error types for scenario generation.
//!
//! Every [`ScenarioError`] is fatal: generation stops before any document is
//! produced. Recoverable conditions (invalid regions, zero correlation,
//! unmatched seeds) never surface here; they are counted in the reports.

use cellgen_geo::GeoError;
use cellgen_types::RegionId;

use crate::template::TemplateError;

/// Fatal errors raised while generating a scenario.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// A region or geometry lookup failed.
    #[error("geometry error: {source}")]
    Geo {
        /// The underlying lookup error.
        #[from]
        source: GeoError,
    },

    /// A template document is malformed.
    #[error("template error: {source}")]
    Template {
        /// The underlying template error.
        #[from]
        source: TemplateError,
    },

    /// A region id collides with the template entry key in `cells`.
    #[error("region id {0:?} is reserved for the default cell template")]
    ReservedCellId(RegionId),
}
