use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::predict::error::PredictError;
use crate::predict::types::OrbitalElements;

/// Satellites read from a folder of TLE files, keyed by NORAD id.
pub struct TleLoader {
    tle_dir: PathBuf,
    satellites: BTreeMap<u32, OrbitalElements>,
}

impl TleLoader {
    pub fn new(tle_dir: PathBuf) -> Self {
        Self {
            tle_dir,
            satellites: BTreeMap::new(),
        }
    }

    /// Load all TLE files from the directory
    pub fn load_all(&mut self) -> Result<(), PredictError> {
        if !self.tle_dir.exists() {
            return Err(PredictError::DirectoryNotFound(
                self.tle_dir.display().to_string(),
            ));
        }

        self.satellites.clear();

        for entry in fs::read_dir(&self.tle_dir)? {
            let path = entry?.path();
            let is_tle = path
                .extension()
                .is_some_and(|ext| ext == "tle" || ext == "txt");
            if !path.is_file() || !is_tle {
                continue;
            }

            match parse_tle_file(&path) {
                Ok(entries) => {
                    for elements in entries {
                        self.satellites.insert(elements.norad_id, elements);
                    }
                }
                Err(e) => {
                    log::warn!("Failed to parse TLE file {}: {}", path.display(), e);
                }
            }
        }

        log::info!(
            "loaded {} satellites from {}",
            self.satellites.len(),
            self.tle_dir.display()
        );
        Ok(())
    }

    pub fn satellites(&self) -> impl Iterator<Item = &OrbitalElements> {
        self.satellites.values()
    }

    pub fn get(&self, norad_id: u32) -> Option<&OrbitalElements> {
        self.satellites.get(&norad_id)
    }

    pub fn len(&self) -> usize {
        self.satellites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.satellites.is_empty()
    }
}

/// Parse a single TLE file (may contain multiple satellites)
fn parse_tle_file(path: &Path) -> Result<Vec<OrbitalElements>, PredictError> {
    let content = fs::read_to_string(path)?;
    let filename = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();

    parse_multi_tle(&content)
        .into_iter()
        .map(|(name, line1, line2)| {
            OrbitalElements::from_tle(name, &line1, &line2).map_err(|e| PredictError::InvalidTle {
                file: filename.clone(),
                message: e.to_string(),
            })
        })
        .collect()
}

/// Parse multi-satellite TLE content
pub fn parse_multi_tle(content: &str) -> Vec<(Option<String>, String, String)> {
    let lines: Vec<&str> = content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let mut result = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if lines[i].starts_with("1 ") && i + 1 < lines.len() && lines[i + 1].starts_with("2 ") {
            // 2-line TLE (no name)
            result.push((None, lines[i].to_string(), lines[i + 1].to_string()));
            i += 2;
        } else if i + 2 < lines.len()
            && lines[i + 1].starts_with("1 ")
            && lines[i + 2].starts_with("2 ")
        {
            // 3-line TLE (with name)
            result.push((
                Some(lines[i].to_string()),
                lines[i + 1].to_string(),
                lines[i + 2].to_string(),
            ));
            i += 3;
        } else {
            i += 1;
        }
    }

    result
}

/// Parse exactly one TLE, with or without a name line.
pub fn parse_tle(tle: &str) -> Result<OrbitalElements, PredictError> {
    let invalid = |message: &str| PredictError::InvalidTle {
        file: "<inline>".into(),
        message: message.into(),
    };
    match parse_multi_tle(tle).as_slice() {
        [(name, line1, line2)] => OrbitalElements::from_tle(name.clone(), line1, line2)
            .map_err(|e| invalid(&e.to_string())),
        [] => Err(invalid("no element set found")),
        _ => Err(invalid("expected a single element set")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISS: &str = "ISS (ZARYA)
1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927
2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537
";

    #[test]
    fn splits_named_and_unnamed_sets() {
        let content = format!(
            "{ISS}\n\n1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927\n2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537\nstray line\n"
        );
        let sets = parse_multi_tle(&content);
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].0.as_deref(), Some("ISS (ZARYA)"));
        assert_eq!(sets[1].0, None);
    }

    #[test]
    fn parses_single_inline_tle() {
        let elements = parse_tle(ISS).unwrap();
        assert_eq!(elements.norad_id, 25544);
        assert_eq!(elements.display_name(), "ISS (ZARYA)");
        assert!(parse_tle("just a name").is_err());
    }

    #[test]
    fn missing_directory_is_reported() {
        let mut loader = TleLoader::new(PathBuf::from("/nonexistent/satpass/tle"));
        assert!(matches!(
            loader.load_all(),
            Err(PredictError::DirectoryNotFound(_))
        ));
    }

    #[test]
    fn loads_catalog_from_folder() {
        let dir = std::env::temp_dir().join(format!("satpass-tle-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("stations.tle"), ISS).unwrap();
        fs::write(dir.join("broken.txt"), "X\n1 bad\n2 bad\n").unwrap();
        fs::write(dir.join("notes.md"), ISS).unwrap();

        let mut loader = TleLoader::new(dir.clone());
        loader.load_all().unwrap();
        assert_eq!(loader.len(), 1);
        assert!(loader.get(25544).is_some());

        fs::remove_dir_all(&dir).unwrap();
    }
}
