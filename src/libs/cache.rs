use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::HamError;

/// Leading magic of every cache file ("BHAM").
const CACHE_MAGIC: u32 = 0x4248_414D;
/// Bumped whenever the serialised layout changes; old files then surface
/// as corrupt and the operator deletes them.
const CACHE_VERSION: u32 = 1;

const KEY_SEPARATOR: &str = "&";

/// Cache key: one entry per (phenotype, genome, strain subset, chromosome).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub phenotype_name: String,
    pub genome_name: String,
    /// Sorted on construction so equivalent subsets share an entry
    pub strains: Vec<String>,
    pub chromosome: i32,
}

impl CacheKey {
    pub fn new(
        phenotype_name: &str,
        genome_name: &str,
        strains: &[String],
        chromosome: i32,
    ) -> Self {
        let mut strains = strains.to_vec();
        strains.sort();
        Self {
            phenotype_name: phenotype_name.to_string(),
            genome_name: genome_name.to_string(),
            strains,
            chromosome,
        }
    }

    fn to_key_string(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}{sep}{}",
            self.phenotype_name,
            self.genome_name,
            self.strains.join(","),
            self.chromosome,
            sep = KEY_SEPARATOR
        )
    }
}

/// On-disk memoiser for expensive per-chromosome result lists.
///
/// Writes are serialised per key through create-exclusive file creation:
/// whoever creates the file runs the producer, everyone else deserialises.
/// Files created by this registry are deleted when it is dropped.
#[derive(Debug)]
pub struct ResultCache {
    directory: PathBuf,
    files: HashMap<String, PathBuf>,
    created: Vec<PathBuf>,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultCache {
    /// Cache in the system temp directory.
    pub fn new() -> Self {
        Self::with_directory(std::env::temp_dir())
    }

    pub fn with_directory<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            files: HashMap::new(),
            created: Vec::new(),
        }
    }

    fn cache_file(&mut self, key: &CacheKey) -> PathBuf {
        let key_string = key.to_key_string();
        if let Some(path) = self.files.get(&key_string) {
            return path.clone();
        }
        let path = self
            .directory
            .join(format!("ham-cache-{}.bahm", self.files.len()));
        self.files.insert(key_string, path.clone());
        path
    }

    /// Return the cached value for `key`, running `producer` only on a
    /// cache miss. Corrupted entries fail with `CacheCorrupt` and are not
    /// regenerated.
    pub fn get_or_compute<T, F>(&mut self, key: &CacheKey, producer: F) -> Result<T, HamError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T, HamError>,
    {
        let path = self.cache_file(key);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(file) => {
                self.created.push(path.clone());
                let value = producer()?;
                let mut writer = std::io::BufWriter::new(file);
                writer.write_all(&CACHE_MAGIC.to_le_bytes())?;
                writer.write_all(&CACHE_VERSION.to_le_bytes())?;
                bincode::serialize_into(&mut writer, &value).map_err(|e| {
                    HamError::Io(std::io::Error::new(std::io::ErrorKind::Other, e))
                })?;
                writer.flush()?;
                Ok(value)
            }
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                self.read_entry(&path)
            }
            Err(err) => Err(HamError::Io(err)),
        }
    }

    fn read_entry<T: DeserializeOwned>(&self, path: &Path) -> Result<T, HamError> {
        let file = std::fs::File::open(path)?;
        let mut reader = std::io::BufReader::new(file);

        let mut word = [0u8; 4];
        reader.read_exact(&mut word).map_err(|_| {
            HamError::CacheCorrupt(format!("{}: truncated header", path.display()))
        })?;
        if u32::from_le_bytes(word) != CACHE_MAGIC {
            return Err(HamError::CacheCorrupt(format!(
                "{}: bad magic",
                path.display()
            )));
        }
        reader.read_exact(&mut word).map_err(|_| {
            HamError::CacheCorrupt(format!("{}: truncated header", path.display()))
        })?;
        let version = u32::from_le_bytes(word);
        if version != CACHE_VERSION {
            return Err(HamError::CacheCorrupt(format!(
                "{}: version {} (expected {})",
                path.display(),
                version,
                CACHE_VERSION
            )));
        }

        let mut payload = Vec::new();
        reader.read_to_end(&mut payload).map_err(|_| {
            HamError::CacheCorrupt(format!("{}: truncated payload", path.display()))
        })?;
        bincode::deserialize(&payload)
            .map_err(|e| HamError::CacheCorrupt(format!("{}: {}", path.display(), e)))
    }
}

impl Drop for ResultCache {
    fn drop(&mut self) {
        for path in &self.created {
            let _ = std::fs::remove_file(path);
        }
    }
}
