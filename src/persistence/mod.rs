use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::geodesic::{Geodesic, chamfer, dodecahedron};
use crate::planet::Planet;

/// Errors crossing the disk boundary. A missing file is not an error at
/// this layer: loaders return `None` and the caller regenerates. Anything
/// unreadable or unparsable is fatal.
#[derive(Debug)]
pub enum PersistenceError {
    Io(io::Error),
    Corrupt(PathBuf, String),
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistenceError::Io(e) => write!(f, "I/O error: {}", e),
            PersistenceError::Corrupt(path, reason) => {
                write!(f, "Corrupt file {}: {}", path.display(), reason)
            }
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<io::Error> for PersistenceError {
    fn from(e: io::Error) -> Self {
        PersistenceError::Io(e)
    }
}

/// Cache file for one refinement level.
fn sphere_path(dir: &Path, level: usize) -> PathBuf {
    dir.join(format!("sphere-{:02}.json", level))
}

/// Planets are identified by their generation seed.
pub fn planet_path(dir: &Path, seed: i64) -> PathBuf {
    dir.join(format!("{}.json", seed))
}

/// Write `value` as JSON via a temp file and atomic rename, so a crashed
/// write never leaves a truncated file behind.
fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let encoded = serde_json::to_vec(value)
        .map_err(|e| PersistenceError::Corrupt(path.to_path_buf(), e.to_string()))?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("tellus");
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));
    if let Err(e) = fs::write(&tmp, &encoded) {
        let _ = fs::remove_file(&tmp);
        return Err(PersistenceError::Io(e));
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(PersistenceError::Io(e));
    }
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, PersistenceError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(PersistenceError::Io(e)),
    };
    let value = serde_json::from_slice(&bytes)
        .map_err(|e| PersistenceError::Corrupt(path.to_path_buf(), e.to_string()))?;
    Ok(Some(value))
}

/// Load the hierarchy up to `size` from the cache directory, generating
/// and caching any missing level. Cached levels carry no edge map; it is
/// rebuilt from the level below before the level can be chamfered further.
pub fn load_or_build_spheres(dir: &Path, size: usize) -> Result<Vec<Geodesic>, PersistenceError> {
    let mut spheres: Vec<Geodesic> = Vec::with_capacity(size + 1);
    for level in 0..=size {
        let path = sphere_path(dir, level);
        let sphere = match read_json::<Geodesic>(&path)? {
            Some(mut cached) => {
                if cached.centers.len() != cached.faces.len() {
                    return Err(PersistenceError::Corrupt(
                        path,
                        format!(
                            "{} centers but {} nodes",
                            cached.centers.len(),
                            cached.faces.len()
                        ),
                    ));
                }
                info!(level, faces = cached.faces.len(), "read cached sphere");
                cached.rebuild_edges(if level == 0 {
                    None
                } else {
                    Some(&spheres[level - 1])
                });
                cached
            }
            None => {
                info!(level, "generating sphere");
                let built = if level == 0 {
                    dodecahedron()
                } else {
                    chamfer(&spheres[level - 1])
                };
                write_json(&path, &built)?;
                built
            }
        };
        spheres.push(sphere);
    }
    Ok(spheres)
}

/// Load a planet by seed, trimming every array to the face count of
/// `size`. Returns `None` when no file exists yet.
pub fn load_planet(dir: &Path, seed: i64, size: usize) -> Result<Option<Planet>, PersistenceError> {
    let path = planet_path(dir, seed);
    let Some(mut planet) = read_json::<Planet>(&path)? else {
        return Ok(None);
    };
    planet.truncate_to(size);
    planet.check_lengths();
    Ok(Some(planet))
}

pub fn save_planet(dir: &Path, seed: i64, planet: &Planet) -> Result<PathBuf, PersistenceError> {
    let path = planet_path(dir, seed);
    write_json(&path, planet)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::climate::seed_climates;
    use crate::geodesic::build_hierarchy;
    use tempfile::TempDir;

    #[test]
    fn spheres_generate_then_reload_identically() {
        let dir = TempDir::new().unwrap();
        let built = load_or_build_spheres(dir.path(), 3).unwrap();
        assert_eq!(built.len(), 4);

        let reloaded = load_or_build_spheres(dir.path(), 3).unwrap();
        for (level, (a, b)) in built.iter().zip(reloaded.iter()).enumerate() {
            assert_eq!(a.centers, b.centers, "centers differ at level {level}");
            assert_eq!(a.faces, b.faces, "adjacency differs at level {level}");
            assert_eq!(a.edges, b.edges, "edge ids differ at level {level}");
        }
    }

    #[test]
    fn cached_prefix_extends_to_a_deeper_hierarchy() {
        let dir = TempDir::new().unwrap();
        load_or_build_spheres(dir.path(), 2).unwrap();
        // Levels 0..=2 come from disk, level 3 is chamfered from the
        // reloaded level 2. That only works if the reloaded edge map was
        // rebuilt in creation order.
        let deeper = load_or_build_spheres(dir.path(), 3).unwrap();
        let reference = build_hierarchy(3);
        assert_eq!(deeper[3].centers, reference[3].centers);
        assert_eq!(deeper[3].faces, reference[3].faces);
    }

    #[test]
    fn corrupt_sphere_cache_is_fatal() {
        let dir = TempDir::new().unwrap();
        fs::write(sphere_path(dir.path(), 0), b"{ not json").unwrap();
        let err = load_or_build_spheres(dir.path(), 0).unwrap_err();
        assert!(matches!(err, PersistenceError::Corrupt(..)), "got {err}");
    }

    #[test]
    fn mismatched_sphere_arrays_are_fatal() {
        let dir = TempDir::new().unwrap();
        fs::write(
            sphere_path(dir.path(), 0),
            br#"{"centers":[{"x":0.0,"y":0.0,"z":1.0}],"nodes":[]}"#,
        )
        .unwrap();
        let err = load_or_build_spheres(dir.path(), 0).unwrap_err();
        assert!(matches!(err, PersistenceError::Corrupt(..)), "got {err}");
    }

    fn small_planet() -> Planet {
        let spheres = build_hierarchy(1);
        let sphere = spheres.last().unwrap();
        let mut planet = Planet::new(1);
        planet.heights = (0..42).map(|i| i as f64 / 42.0 - 0.5).collect();
        planet.waters = vec![0.1; 42];
        planet.flows = vec![0.0; 42];
        planet.climates = seed_climates(&planet.waters, sphere);
        planet
    }

    #[test]
    fn planet_round_trips_through_json() {
        let dir = TempDir::new().unwrap();
        let planet = small_planet();
        save_planet(dir.path(), 1234, &planet).unwrap();

        let restored = load_planet(dir.path(), 1234, 1).unwrap().unwrap();
        assert_eq!(planet, restored);
    }

    #[test]
    fn missing_planet_is_none_not_error() {
        let dir = TempDir::new().unwrap();
        assert!(load_planet(dir.path(), 777, 1).unwrap().is_none());
    }

    #[test]
    fn corrupt_planet_is_fatal() {
        let dir = TempDir::new().unwrap();
        fs::write(planet_path(dir.path(), 9), b"]]").unwrap();
        let err = load_planet(dir.path(), 9, 1).unwrap_err();
        assert!(matches!(err, PersistenceError::Corrupt(..)), "got {err}");
    }

    #[test]
    fn loading_truncates_to_the_requested_size() {
        let dir = TempDir::new().unwrap();
        let planet = small_planet();
        save_planet(dir.path(), 55, &planet).unwrap();

        let coarse = load_planet(dir.path(), 55, 0).unwrap().unwrap();
        assert_eq!(coarse.size, 0);
        assert_eq!(coarse.heights.len(), 12);
        assert_eq!(&coarse.heights[..], &planet.heights[..12]);
    }

    #[test]
    fn optional_arrays_are_omitted_when_empty() {
        let dir = TempDir::new().unwrap();
        let mut planet = Planet::new(1);
        planet.heights = vec![0.0; 42];
        let path = save_planet(dir.path(), 3, &planet).unwrap();

        let raw = fs::read_to_string(path).unwrap();
        assert!(raw.contains("\"heights\""));
        assert!(!raw.contains("\"waters\""), "empty waters should be omitted");
        assert!(!raw.contains("\"climates\""));

        let back = load_planet(dir.path(), 3, 1).unwrap().unwrap();
        assert!(back.waters.is_empty());
    }

    #[test]
    fn no_temp_files_remain_after_save() {
        let dir = TempDir::new().unwrap();
        save_planet(dir.path(), 42, &small_planet()).unwrap();
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_str().is_some_and(|n| n.starts_with('.')))
            .collect();
        assert!(leftovers.is_empty(), "temp files left: {leftovers:?}");
    }
}
