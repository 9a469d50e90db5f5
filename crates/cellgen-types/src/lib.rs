//! Shared type definitions for cellgen scenario documents.
//!
//! This crate is the single source of truth for the document shape consumed
//! by the cell-based epidemic simulator. Cell and neighborhood types also
//! flow to `TypeScript` via `ts-rs` for the GIS web viewer.
//!
//! # Modules
//!
//! - [`ids`] -- The [`RegionId`] string identifier
//! - [`structs`] -- Adjacency input, cells, neighborhoods, and the scenario
//!   document

pub mod ids;
pub mod structs;

pub use ids::RegionId;
pub use structs::{
    AdjacencyPair, Cell, DEFAULT_CELL_KEY, NeighborhoodEntry, Scenario, ScenarioCells,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // Files are written to `bindings/` relative to the crate root.
        use ts_rs::TS;

        let _ = crate::ids::RegionId::export_all();
        let _ = crate::structs::NeighborhoodEntry::export_all();
        let _ = crate::structs::Cell::export_all();
    }
}
