use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::camera::{Intrinsic, IntrinsicId};
use crate::error::CameraInitError;
use crate::view::{View, ViewId};

/// Views and intrinsics of a reconstruction project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SfmData {
    /// Views indexed by id
    #[serde(default)]
    pub views: BTreeMap<ViewId, View>,
    /// Intrinsics indexed by id
    #[serde(default)]
    pub intrinsics: BTreeMap<IntrinsicId, Intrinsic>,
}

impl SfmData {
    /// Create a dataset from a list of views, without intrinsics.
    pub fn from_views(views: impl IntoIterator<Item = View>) -> Self {
        Self {
            views: views.into_iter().map(|v| (v.view_id, v)).collect(),
            intrinsics: BTreeMap::new(),
        }
    }

    /// Intrinsic referenced by a view, if the reference resolves.
    pub fn intrinsic_of(&self, view_id: ViewId) -> Option<&Intrinsic> {
        let id = self.views.get(&view_id)?.intrinsic_id?;
        self.intrinsics.get(&id)
    }

    /// Read a dataset from a JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, CameraInitError> {
        let file = File::open(path)?;
        let data = serde_json::from_reader(BufReader::new(file))?;
        Ok(data)
    }

    /// Write the dataset to a JSON file, creating the parent folder if needed.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), CameraInitError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}
