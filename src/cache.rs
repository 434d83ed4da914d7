use crate::transform::{TransformOptions, TransformOutput};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize)]
pub struct CacheEntry {
    pub hash: String,
    pub output: TransformOutput,
}

/// Instrumented outputs keyed by the hash of the pristine source and the
/// transform options that produced them.
pub struct IncrementalCache {
    cache_dir: PathBuf,
}

impl IncrementalCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        let cache_dir = cache_dir.into();
        if !cache_dir.exists() {
            if let Err(e) = fs::create_dir_all(&cache_dir) {
                tracing::warn!(dir = %cache_dir.display(), error = %e, "cannot create cache directory");
            }
        }
        Self { cache_dir }
    }

    pub fn compute_hash(source: &str, options: &TransformOptions) -> String {
        let mut hasher = Sha256::new();
        hasher.update(options.fingerprint().as_bytes());
        hasher.update([0u8]);
        hasher.update(source.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn get_cache_path(&self, file_path: &Path) -> PathBuf {
        // Create a stable file name for the cache entry
        let safe_name = file_path
            .to_string_lossy()
            .replace(['/', '\\', ':'], "_");
        self.cache_dir.join(format!("{}.json", safe_name))
    }

    pub fn get(
        &self,
        file_path: &Path,
        source: &str,
        options: &TransformOptions,
    ) -> Option<TransformOutput> {
        let cache_path = self.get_cache_path(file_path);
        if !cache_path.exists() {
            return None;
        }

        let data = fs::read_to_string(&cache_path).ok()?;

        let entry: CacheEntry = match serde_json::from_str(&data) {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(
                    file = %file_path.display(),
                    error = %e,
                    "cache entry is corrupt, discarding"
                );
                fs::remove_file(cache_path).ok();
                return None;
            }
        };

        if entry.hash == Self::compute_hash(source, options) {
            Some(entry.output)
        } else {
            None
        }
    }

    /// Best effort: a failed write only costs a re-transform next time.
    pub fn set(
        &self,
        file_path: &Path,
        source: &str,
        options: &TransformOptions,
        output: &TransformOutput,
    ) {
        let cache_path = self.get_cache_path(file_path);
        let entry = CacheEntry {
            hash: Self::compute_hash(source, options),
            output: output.clone(),
        };

        match serde_json::to_string(&entry) {
            Ok(data) => {
                if let Err(e) = fs::write(&cache_path, data) {
                    tracing::debug!(path = %cache_path.display(), error = %e, "cache write failed");
                }
            }
            Err(e) => tracing::debug!(error = %e, "cache serialization failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(source: &str) -> TransformOutput {
        TransformOutput {
            source: source.to_string(),
            instrumented: vec!["greet".to_string()],
            skipped: Vec::new(),
        }
    }

    #[test]
    fn test_hit_requires_same_source_and_options() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IncrementalCache::new(dir.path().join("cache"));
        let file = Path::new("/work/src/greet.rs");
        let options = TransformOptions::default();

        assert!(cache.get(file, "fn greet() {}", &options).is_none());
        cache.set(file, "fn greet() {}", &options, &output("instrumented"));

        assert_eq!(
            cache.get(file, "fn greet() {}", &options),
            Some(output("instrumented"))
        );
        assert!(cache.get(file, "fn greet() { changed(); }", &options).is_none());
        assert!(cache
            .get(file, "fn greet() {}", &TransformOptions::named(["greet"]))
            .is_none());
    }

    #[test]
    fn test_corrupt_entry_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IncrementalCache::new(dir.path());
        let file = Path::new("src/lib.rs");
        let entry_path = cache.get_cache_path(file);
        fs::write(&entry_path, "not json").unwrap();

        assert!(cache.get(file, "", &TransformOptions::default()).is_none());
        assert!(!entry_path.exists());
    }
}
