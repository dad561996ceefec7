//! Bulk point loading from `x,y` text records.
//!
//! Each non-blank, non-comment line holds one point. Points are inserted one
//! at a time, so a failure part-way leaves the earlier points in the tree.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::debug;

use crate::rtree::{RTree, SpatialError, SpatialResult};

const COMMENT_PREFIX: char = '#';
const FIELD_SEPARATOR: char = ',';

/// Reads `x,y` records from `reader` into `tree`.
///
/// The payload of each point is its 0-based record index among the loaded
/// points. Returns the number of points inserted.
///
/// # Errors
///
/// * [`SpatialError::Parse`] with the 1-based line number of a malformed record
/// * [`SpatialError::Io`] if reading fails
pub fn load_points(reader: impl BufRead, tree: &mut RTree<u64>) -> SpatialResult<usize> {
    let mut loaded = 0usize;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let record = line.trim();
        if record.is_empty() || record.starts_with(COMMENT_PREFIX) {
            continue;
        }

        let line_no = idx + 1;
        let (x, y) = parse_record(record).map_err(|message| SpatialError::Parse {
            line: line_no,
            message,
        })?;

        tree.insert_point(x, y, loaded as u64)?;
        loaded += 1;
    }

    debug!("Loaded {} points, tree height {}", loaded, tree.height());
    Ok(loaded)
}

/// Opens `path` and loads its records with [`load_points`].
pub fn load_points_from_path<P: AsRef<Path>>(
    path: P,
    tree: &mut RTree<u64>,
) -> SpatialResult<usize> {
    let file = File::open(path.as_ref())?;
    load_points(BufReader::new(file), tree)
}

fn parse_record(record: &str) -> Result<(f64, f64), String> {
    let mut fields = record.split(FIELD_SEPARATOR);
    let (Some(x), Some(y), None) = (fields.next(), fields.next(), fields.next()) else {
        return Err(format!("expected two comma-separated fields, got '{}'", record));
    };
    Ok((parse_coordinate(x)?, parse_coordinate(y)?))
}

fn parse_coordinate(field: &str) -> Result<f64, String> {
    let field = field.trim();
    let value: f64 = field
        .parse()
        .map_err(|e| format!("invalid coordinate '{}': {}", field, e))?;
    if !value.is_finite() {
        return Err(format!("coordinate '{}' is not finite", field));
    }
    Ok(value)
}
