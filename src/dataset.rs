use crate::model::{Dataset, SongPlay};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, instrument};

pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let dataset =
        read_dataset(file).with_context(|| format!("failed to load {}", path.display()))?;
    info!(rows = dataset.len(), path = %path.display(), "loaded dataset");
    Ok(dataset)
}

#[instrument(skip_all, level = "trace")]
pub fn read_dataset<R: Read>(reader: R) -> Result<Dataset> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (index, record) in csv_reader.deserialize::<SongPlay>().enumerate() {
        let row = record.with_context(|| format!("invalid row {}", index + 1))?;
        rows.push(row);
    }
    Ok(Dataset::new(rows))
}
