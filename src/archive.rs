use std::io::{Cursor, Write};

use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Result, TsuyakuError};
use crate::job::TranslatedFile;

/// Packages translated files into one flat zip archive
pub struct ArchiveBuilder;

impl ArchiveBuilder {
    /// Build the archive in memory, one entry per output filename.
    ///
    /// Zip entries must be unique, so a repeated name keeps the position of
    /// its first occurrence and the content of its last.
    pub fn build(files: &[&TranslatedFile]) -> Result<Vec<u8>> {
        let mut entries: Vec<(&str, &[u8])> = Vec::with_capacity(files.len());
        for file in files {
            match entries.iter_mut().find(|(name, _)| *name == file.filename) {
                Some(entry) => {
                    debug!("{} from {} replaces an earlier entry", file.filename, file.source_filename);
                    entry.1 = file.bytes.as_slice();
                }
                None => entries.push((file.filename.as_str(), file.bytes.as_slice())),
            }
        }

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, bytes) in &entries {
            writer.start_file(*name, options)?;
            writer
                .write_all(bytes)
                .map_err(|e| TsuyakuError::Archive(format!("Failed to write {}: {}", name, e)))?;
        }

        let archive = writer.finish()?.into_inner();
        info!("Built archive with {} entries ({} bytes)", entries.len(), archive.len());
        Ok(archive)
    }

    /// Fill the `{target}` placeholder of an archive name template
    pub fn archive_name(template: &str, target: &str) -> String {
        template.replace("{target}", target)
    }
}
