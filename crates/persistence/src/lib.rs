#![deny(warnings)]

//! Save/load layer: a versioned, serializable wrapper around the engine
//! state. JSON for inspectable saves, bincode for compact ones. Restoring
//! recomputes nothing; stored values are authoritative.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use thiserror::Error;
use tracing::info;

use econ_core::{ConfigError, EconomyConfig, ItemCatalog};
use econ_sim::{Economy, EconomyState};

/// Bumped whenever the save shape changes incompatibly.
pub const SAVE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),
    #[error("unsupported save version {0} (expected {SAVE_VERSION})")]
    UnsupportedVersion(u32),
    #[error("invalid config in save: {0}")]
    Config(#[from] ConfigError),
}

/// Everything needed to resume a session: catalog, config, and the full
/// mutable state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SaveGame {
    pub version: u32,
    pub config: EconomyConfig,
    pub catalog: ItemCatalog,
    pub state: EconomyState,
}

impl SaveGame {
    pub fn from_economy(economy: &Economy) -> Self {
        Self {
            version: SAVE_VERSION,
            config: economy.config().clone(),
            catalog: economy.catalog().clone(),
            state: economy.export_state(),
        }
    }

    /// Rebuild a live engine. The RNG is re-seeded from the stored seed.
    pub fn into_economy(self) -> Result<Economy, SaveError> {
        if self.version != SAVE_VERSION {
            return Err(SaveError::UnsupportedVersion(self.version));
        }
        Ok(Economy::from_state(self.catalog, self.config, self.state)?)
    }

    pub fn to_json_writer<W: Write>(&self, writer: W) -> Result<(), SaveError> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, SaveError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn to_bincode_writer<W: Write>(&self, writer: W) -> Result<(), SaveError> {
        bincode::serialize_into(writer, self)?;
        Ok(())
    }

    pub fn from_bincode_reader<R: Read>(reader: R) -> Result<Self, SaveError> {
        Ok(bincode::deserialize_from(reader)?)
    }
}

/// Write a JSON save file.
pub fn save_json<P: AsRef<Path>>(economy: &Economy, path: P) -> Result<(), SaveError> {
    let file = BufWriter::new(File::create(&path)?);
    SaveGame::from_economy(economy).to_json_writer(file)?;
    info!(target: "persistence", path = %path.as_ref().display(), "saved json");
    Ok(())
}

/// Read a JSON save file back into a live engine.
pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Economy, SaveError> {
    let file = BufReader::new(File::open(&path)?);
    let save = SaveGame::from_json_reader(file)?;
    info!(target: "persistence", path = %path.as_ref().display(), "loaded json");
    save.into_economy()
}

/// Write a compact binary save file.
pub fn save_bin<P: AsRef<Path>>(economy: &Economy, path: P) -> Result<(), SaveError> {
    let file = BufWriter::new(File::create(&path)?);
    SaveGame::from_economy(economy).to_bincode_writer(file)?;
    info!(target: "persistence", path = %path.as_ref().display(), "saved bincode");
    Ok(())
}

/// Read a binary save file back into a live engine.
pub fn load_bin<P: AsRef<Path>>(path: P) -> Result<Economy, SaveError> {
    let file = BufReader::new(File::open(&path)?);
    let save = SaveGame::from_bincode_reader(file)?;
    info!(target: "persistence", path = %path.as_ref().display(), "loaded bincode");
    save.into_economy()
}
