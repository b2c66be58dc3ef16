//! JSON rendering of kernel results.
//!
//! Missing samples (NaN) come out as `null`.

use serde_json::{json, Value};

use grid_slicer::{Checked, Condition, Slice, SliceGeometry, SliceResult};

pub fn conditions_json(conditions: &[Condition]) -> Value {
    Value::Array(
        conditions
            .iter()
            .map(|c| json!({ "condition": c, "message": c.to_string() }))
            .collect(),
    )
}

fn geometry_json(geometry: &SliceGeometry) -> Value {
    match geometry {
        SliceGeometry::Transect {
            axis,
            positions,
            levels,
        } => json!({
            "kind": "transect",
            "distance_unit": axis.unit,
            "distances": axis.distances,
            "positions": positions.iter().map(|(lat, lon)| json!([lat, lon])).collect::<Vec<_>>(),
            "levels": levels,
        }),
        SliceGeometry::Plane { horizontal, level } => {
            let (nx, ny) = horizontal.shape();
            json!({
                "kind": "plane",
                "shape": [nx, ny],
                "level": level,
            })
        }
        SliceGeometry::Scattered { positions } => json!({
            "kind": "scattered",
            "positions": positions,
        }),
    }
}

pub fn slice_json(slice: &Slice) -> Value {
    json!({
        "field": slice.field_id,
        "unit": slice.unit,
        "mode": slice.mode,
        "geometry": geometry_json(&slice.geometry),
        "times": slice.times,
        "columns": slice.columns,
        "rows": slice.rows,
        "values": slice.values,
    })
}

pub fn result_json(result: &Checked<SliceResult>) -> Value {
    let (status, slice) = match &result.value {
        SliceResult::Ready(slice) => ("ready", Some(slice)),
        SliceResult::Retained(slice) => ("retained", slice.as_ref()),
        SliceResult::Missing => ("missing", None),
    };
    json!({
        "status": status,
        "slice": slice.map(slice_json),
        "conditions": conditions_json(&result.conditions),
    })
}
