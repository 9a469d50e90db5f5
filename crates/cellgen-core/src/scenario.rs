//! Scenario document assembly: cells plus the template entry and fields.

use cellgen_types::{Scenario, ScenarioCells};

use crate::graph::CellGraph;
use crate::template::{DefaultCellTemplate, FieldsTemplate};

/// Wrap a finished cell graph into the document handed to the serializer.
///
/// The `default` entry and the `fields` block are copied verbatim; the graph
/// is consumed so no cell can be mutated after this point.
pub fn build_scenario(
    graph: CellGraph,
    default_cell: &DefaultCellTemplate,
    fields: &FieldsTemplate,
) -> Scenario {
    Scenario {
        cells: ScenarioCells {
            default: default_cell.raw().clone(),
            cells: graph.into_cells(),
        },
        fields: fields.value().clone(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn templates_copied_verbatim() {
        let default_doc = json!({"default": {
            "delay": "inertial",
            "state": {"population": 0},
            "neighborhood": {"default_cell_id": {
                "correlation": 1.0, "infection_correction_factors": {"0.2": 0.4}
            }}
        }});
        let Ok(default_cell) = DefaultCellTemplate::from_value(default_doc.clone()) else {
            return;
        };
        let Ok(fields) = FieldsTemplate::from_value(json!({"fields": {"infected": [2, 3]}}))
        else {
            return;
        };

        let scenario = build_scenario(CellGraph::new(), &default_cell, &fields);
        let value = serde_json::to_value(&scenario).unwrap_or_default();
        assert_eq!(value["cells"]["default"], default_doc["default"]);
        assert_eq!(value["fields"], json!({"infected": [2, 3]}));
        assert_eq!(value["cells"].as_object().map(serde_json::Map::len), Some(1));
    }
}
