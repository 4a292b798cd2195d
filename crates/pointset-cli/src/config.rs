use crate::error::{CliError, Result};
use nalgebra::Vector3;
use pointset::{PointSet, PointSetArray, PointSetCollection};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// One array of a pack manifest.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct ArrayEntry {
    /// Optional label, used only in log output.
    pub name: Option<String>,
    /// The sets of the array, each a list of `[x, y, z]` points.
    #[serde(default)]
    pub sets: Vec<PointSet>,
    /// Displacement applied to every set of the array.
    pub translate: Option<[f64; 3]>,
    /// Move the array so that its bounding box is centered on the origin.
    #[serde(rename = "center-on-origin", default)]
    pub center_on_origin: bool,
}

/// A TOML description of a collection to pack.
///
/// ```toml
/// [[arrays]]
/// name = "ligand"
/// sets = [[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]], [[2.0, 2.0, 2.0]]]
/// translate = [1.0, 0.0, 0.0]
/// ```
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PackManifest {
    #[serde(default)]
    pub arrays: Vec<ArrayEntry>,
}

impl PackManifest {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading pack manifest from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Builds the collection the manifest describes.
    pub fn build(&self) -> Result<PointSetCollection> {
        let arrays = self
            .arrays
            .iter()
            .enumerate()
            .map(|(index, entry)| entry.build(index))
            .collect::<Result<Vec<_>>>()?;
        Ok(PointSetCollection::try_from_arrays(&arrays)?)
    }
}

impl ArrayEntry {
    fn label(&self, index: usize) -> String {
        self.name.clone().unwrap_or_else(|| format!("#{index}"))
    }

    fn build(&self, index: usize) -> Result<PointSetArray> {
        let sets = match self.translate {
            Some(delta) => {
                let delta = Vector3::from(delta);
                if !delta.iter().all(|c| c.is_finite()) {
                    return Err(CliError::Config(format!(
                        "array {} has a non-finite translation",
                        self.label(index)
                    )));
                }
                debug!("Translating array {} by {:?}", self.label(index), delta);
                self.sets
                    .iter()
                    .map(|set| set.edit().translate(&delta).commit())
                    .collect()
            }
            None => self.sets.clone(),
        };

        let mut array = PointSetArray::try_from_sets(&sets)?;
        if self.center_on_origin {
            let bbox = array.bounding_box();
            if !bbox.is_null() {
                let shift = -bbox.center().coords;
                debug!("Centering array {} (shift {:?})", self.label(index), shift);
                array.translate(&shift);
            }
        }
        Ok(array)
    }
}
