use crate::{error::ToolpathError, geometry::Point};
use glam::DVec3;
use std::fs;
use std::path::Path;

/// Parses a JSON array of `[x, y, z]` triples.
pub fn parse_points(bytes: &[u8]) -> Result<Vec<Point>, ToolpathError> {
    let raw: Vec<[f64; 3]> = serde_json::from_slice(bytes)?;
    Ok(raw.into_iter().map(DVec3::from_array).collect())
}

/// Reads a toolpath file from disk.
pub fn read_file(path: &Path) -> Result<Vec<Point>, ToolpathError> {
    let bytes = fs::read(path).map_err(|source| ToolpathError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let points = parse_points(&bytes)?;
    log::debug!("Read {} points from {}", points.len(), path.display());
    Ok(points)
}

/// Writes `points` in the same format `read_file` accepts.
pub fn write_file(path: &Path, points: &[Point]) -> Result<(), ToolpathError> {
    let raw: Vec<[f64; 3]> = points.iter().map(|p| p.to_array()).collect();
    let bytes = serde_json::to_vec(&raw)?;
    fs::write(path, bytes).map_err(|source| ToolpathError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_triples() {
        let points = parse_points(b"[[0, 0, 0], [1.5, -2, 3.25]]").unwrap();

        assert_eq!(points, vec![DVec3::ZERO, DVec3::new(1.5, -2.0, 3.25)]);
    }

    #[test]
    fn empty_array_is_empty_toolpath() {
        assert!(parse_points(b"[]").unwrap().is_empty());
    }

    #[test]
    fn rejects_wrong_arity_and_garbage() {
        assert!(matches!(
            parse_points(b"[[1, 2]]"),
            Err(ToolpathError::Parse(_))
        ));
        assert!(matches!(
            parse_points(b"G0 X1 Y2"),
            Err(ToolpathError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let path = std::env::temp_dir().join("toolpath-io-test-does-not-exist.json");
        let err = read_file(&path).unwrap_err();

        assert!(matches!(err, ToolpathError::Io { .. }));
        assert!(err.to_string().contains("toolpath-io-test-does-not-exist.json"));
    }

    #[test]
    fn write_then_read_file() {
        let path = std::env::temp_dir().join(format!(
            "toolpath-io-test-{}.json",
            std::process::id()
        ));
        let points = vec![DVec3::new(0.0, 1.0, 2.0), DVec3::new(-3.0, 4.5, 0.0)];

        write_file(&path, &points).unwrap();
        let read = read_file(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(read, points);
    }
}
