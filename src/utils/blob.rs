use crate::error::{Error, Result};
use crate::models::MatchId;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Component, Path, PathBuf};

/// Raw match payloads on disk, one `<match_id>.json` file per match. Locators
/// are file names relative to the cache directory.
#[derive(Debug, Clone)]
pub struct BlobCache {
    dir: PathBuf,
}

impl BlobCache {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Writes the payload and checks it landed before handing back a locator.
    pub fn store(&self, match_id: &MatchId, payload: &[u8]) -> Result<String> {
        let locator = format!("{match_id}.json");
        let path = self.dir.join(&locator);
        let tmp = self.dir.join(format!(".{match_id}.json.tmp"));

        let write = || -> std::io::Result<()> {
            let mut file = File::create(&tmp)?;
            file.write_all(payload)?;
            file.sync_all()?;
            fs::rename(&tmp, &path)
        };
        if let Err(e) = write() {
            let _ = fs::remove_file(&tmp);
            return Err(Error::WriteFailure {
                locator,
                reason: e.to_string(),
            });
        }

        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() && meta.len() == payload.len() as u64 => {
                tracing::debug!(%locator, bytes = payload.len(), "payload stored");
                Ok(locator)
            }
            Ok(meta) => Err(Error::WriteFailure {
                locator,
                reason: format!(
                    "expected {} bytes on disk, found {}",
                    payload.len(),
                    meta.len()
                ),
            }),
            Err(e) => Err(Error::WriteFailure {
                locator,
                reason: e.to_string(),
            }),
        }
    }

    pub fn load(&self, locator: &str) -> Result<Vec<u8>> {
        let path = self.resolve(locator)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::BlobNotFound(locator.to_string()))
            }
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn resolve(&self, locator: &str) -> Result<PathBuf> {
        let relative = Path::new(locator);
        let contained = !locator.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !contained {
            return Err(Error::BlobNotFound(locator.to_string()));
        }
        Ok(self.dir.join(relative))
    }
}
