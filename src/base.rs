use std::{
    fs::{create_dir_all, File},
    io::{BufReader, BufWriter},
    path::Path,
};

use log::info;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::IndexError;

pub type DocId = u64;

/// Number of occurrences of a term within a document
pub type Frequency = u32;

pub const INDEX_CBOR: &str = "index.cbor";

/// Serializes a value into `INDEX_CBOR` within the given folder
pub fn save_cbor<T: Serialize>(value: &T, path: &Path) -> Result<(), IndexError> {
    if !path.is_dir() {
        info!("Creating path {}", path.display());
        create_dir_all(path)?;
    }

    let info_path = path.join(INDEX_CBOR);
    let info_file = File::options()
        .write(true)
        .truncate(true)
        .create(true)
        .open(&info_path)?;

    ciborium::ser::into_writer(value, BufWriter::new(info_file))
        .map_err(|e| IndexError::Serialization(e.to_string()))?;

    info!("Saved index information in {}", info_path.display());
    Ok(())
}

/// Deserializes a value from `INDEX_CBOR` within the given folder
pub fn load_cbor<T: DeserializeOwned>(path: &Path) -> Result<T, IndexError> {
    let info_path = path.join(INDEX_CBOR);
    let info_file = File::options().read(true).open(&info_path)?;

    let value = ciborium::de::from_reader(BufReader::new(info_file))
        .map_err(|e| IndexError::Serialization(e.to_string()))?;

    info!("Loaded index information from {}", info_path.display());
    Ok(value)
}
