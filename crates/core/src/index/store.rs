//! On-disk bundle: three JSON blobs plus a manifest carrying their digests.
//!
//! Every `save` writes its blobs into a fresh numbered generation directory
//! (`gen-000001/`, `gen-000002/`, ...) inside the target directory, then
//! replaces `manifest.json` with a single rename. The manifest names the
//! generation its blobs live in, so a reader sees either the old bundle or the
//! new one. A failed save leaves the old manifest, and therefore the old
//! bundle, untouched.
//!
//! Generation directories are never modified once published. The generation
//! the replaced manifest pointed at survives until the following save, so a
//! reader that picked up the old manifest can still finish. A reader that
//! spans two saves finds its blobs pruned; `load` then re-reads the manifest
//! and retries once against the newer generation.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{IndexArtifacts, NameIndex};
use crate::domain::product::Product;
use crate::errors::ArtifactError;
use crate::similarity::SimilarityMatrix;

pub const FORMAT_VERSION: u32 = 2;

pub const PRODUCTS_BLOB: &str = "products";
pub const SIMILARITY_BLOB: &str = "similarity";
pub const NAME_INDEX_BLOB: &str = "name_index";
pub const MANIFEST_BLOB: &str = "manifest";

const GENERATION_PREFIX: &str = "gen-";
const STAGING_SUFFIX: &str = ".staging";
const MANIFEST_STAGING_FILE: &str = ".manifest.json.staging";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: u32,
    /// Generation directory holding this bundle's blobs.
    pub generation: u64,
    pub built_at: DateTime<Utc>,
    pub product_count: usize,
    pub vocabulary_size: usize,
    /// blake3 hex digest per blob name.
    pub digests: BTreeMap<String, String>,
}

#[derive(Clone, Debug)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn manifest_path(&self) -> PathBuf {
        blob_file(&self.dir, MANIFEST_BLOB)
    }

    /// Writes `artifacts` as a new generation and points the manifest at it.
    pub fn save(&self, artifacts: &IndexArtifacts) -> Result<Manifest, ArtifactError> {
        fs::create_dir_all(&self.dir).map_err(|source| io_error(&self.dir, source))?;

        let previous = self.read_manifest().ok().map(|manifest| manifest.generation);
        let generation = self.next_generation()?;
        let manifest = self.write_generation(artifacts, generation)?;
        self.prune(generation, previous);

        info!(
            event_name = "build.artifacts_saved",
            dir = %self.dir.display(),
            generation,
            product_count = manifest.product_count,
            "artifact bundle written"
        );
        Ok(manifest)
    }

    /// Loads and verifies the bundle the manifest currently points at. Any
    /// missing blob, digest mismatch or cross-blob inconsistency fails the
    /// whole load.
    pub fn load(&self) -> Result<IndexArtifacts, ArtifactError> {
        let manifest = self.read_manifest()?;
        self.load_from(manifest)
    }

    pub fn read_manifest(&self) -> Result<Manifest, ArtifactError> {
        let bytes = read_file(&self.manifest_path())?;
        decode(MANIFEST_BLOB, &bytes)
    }

    fn load_from(&self, manifest: Manifest) -> Result<IndexArtifacts, ArtifactError> {
        match self.load_generation(&manifest) {
            Err(error @ (ArtifactError::Missing { .. } | ArtifactError::Corrupt { .. })) => {
                match self.read_manifest() {
                    Ok(latest) if latest != manifest => {
                        debug!(
                            event_name = "index.load_retried",
                            stale_generation = manifest.generation,
                            generation = latest.generation,
                            "manifest changed during load"
                        );
                        self.load_generation(&latest)
                    }
                    _ => Err(error),
                }
            }
            result => result,
        }
    }

    fn load_generation(&self, manifest: &Manifest) -> Result<IndexArtifacts, ArtifactError> {
        if manifest.format_version != FORMAT_VERSION {
            return Err(corrupt(
                MANIFEST_BLOB,
                format!(
                    "unsupported format version {} (expected {FORMAT_VERSION})",
                    manifest.format_version
                ),
            ));
        }

        let dir = self.generation_dir(manifest.generation);
        let products: Vec<Product> = read_verified(&dir, manifest, PRODUCTS_BLOB)?;
        let similarity: SimilarityMatrix = read_verified(&dir, manifest, SIMILARITY_BLOB)?;
        let names: NameIndex = read_verified(&dir, manifest, NAME_INDEX_BLOB)?;

        if products.len() != manifest.product_count {
            return Err(corrupt(
                PRODUCTS_BLOB,
                format!(
                    "{} products stored but manifest records {}",
                    products.len(),
                    manifest.product_count
                ),
            ));
        }
        similarity.validate().map_err(|reason| corrupt(SIMILARITY_BLOB, reason))?;

        let artifacts = IndexArtifacts {
            products,
            similarity,
            names,
            vocabulary_size: manifest.vocabulary_size,
        };
        artifacts.check_consistency().map_err(|reason| corrupt(NAME_INDEX_BLOB, reason))?;

        info!(
            event_name = "index.loaded",
            dir = %self.dir.display(),
            generation = manifest.generation,
            product_count = artifacts.products.len(),
            built_at = %manifest.built_at,
            "artifact bundle loaded"
        );
        Ok(artifacts)
    }

    fn generation_dir(&self, generation: u64) -> PathBuf {
        self.dir.join(generation_name(generation))
    }

    /// One past the highest generation on disk or in the manifest.
    fn next_generation(&self) -> Result<u64, ArtifactError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| io_error(&self.dir, source))?;
        let on_disk = entries
            .filter_map(Result::ok)
            .filter_map(|entry| parse_generation(&entry.file_name().to_string_lossy()));
        let recorded = self.read_manifest().ok().map(|manifest| manifest.generation);
        let highest = on_disk.chain(recorded).max().unwrap_or(0);
        highest.checked_add(1).ok_or_else(|| {
            corrupt(MANIFEST_BLOB, "generation counter is exhausted".to_string())
        })
    }

    /// Stages the blobs, renames them into their generation directory and
    /// publishes the manifest. Anything written is removed again on failure.
    fn write_generation(
        &self,
        artifacts: &IndexArtifacts,
        generation: u64,
    ) -> Result<Manifest, ArtifactError> {
        let target = self.generation_dir(generation);
        let staging =
            self.dir.join(format!(".{}{STAGING_SUFFIX}", generation_name(generation)));

        let staged = write_blobs(artifacts, &staging).and_then(|digests| {
            fs::rename(&staging, &target).map_err(|source| io_error(&target, source))?;
            Ok(digests)
        });
        let digests = match staged {
            Ok(digests) => digests,
            Err(error) => {
                discard_dir(&staging);
                return Err(error);
            }
        };

        let manifest = Manifest {
            format_version: FORMAT_VERSION,
            generation,
            built_at: Utc::now(),
            product_count: artifacts.products.len(),
            vocabulary_size: artifacts.vocabulary_size,
            digests,
        };
        if let Err(error) = self.publish(&manifest) {
            discard_dir(&target);
            return Err(error);
        }
        Ok(manifest)
    }

    fn publish(&self, manifest: &Manifest) -> Result<(), ArtifactError> {
        let bytes = encode(MANIFEST_BLOB, manifest)?;
        let staging = self.dir.join(MANIFEST_STAGING_FILE);
        let manifest_path = self.manifest_path();

        let published = fs::write(&staging, bytes)
            .map_err(|source| io_error(&staging, source))
            .and_then(|()| {
                fs::rename(&staging, &manifest_path)
                    .map_err(|source| io_error(&manifest_path, source))
            });
        if published.is_err() {
            let _ = fs::remove_file(&staging);
        }
        published
    }

    /// Removes every generation except `current` and the one the replaced
    /// manifest pointed at, plus staging leftovers from interrupted saves.
    fn prune(&self, current: u64, previous: Option<u64>) {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(error) => {
                warn!(event_name = "build.prune_failed", error = %error, "could not list artifacts");
                return;
            }
        };

        for entry in entries.filter_map(Result::ok) {
            let name = entry.file_name().to_string_lossy().into_owned();
            let stale = match parse_generation(&name) {
                Some(generation) => generation != current && Some(generation) != previous,
                None => name.starts_with(&format!(".{GENERATION_PREFIX}"))
                    && name.ends_with(STAGING_SUFFIX),
            };
            if stale {
                discard_dir(&entry.path());
            }
        }
    }
}

fn write_blobs(
    artifacts: &IndexArtifacts,
    staging: &Path,
) -> Result<BTreeMap<String, String>, ArtifactError> {
    remove_dir_if_present(staging)?;
    fs::create_dir_all(staging).map_err(|source| io_error(staging, source))?;

    let encoded = [
        (PRODUCTS_BLOB, encode(PRODUCTS_BLOB, &artifacts.products)?),
        (SIMILARITY_BLOB, encode(SIMILARITY_BLOB, &artifacts.similarity)?),
        (NAME_INDEX_BLOB, encode(NAME_INDEX_BLOB, &artifacts.names)?),
    ];

    let mut digests = BTreeMap::new();
    for (blob, bytes) in &encoded {
        let path = blob_file(staging, blob);
        fs::write(&path, bytes).map_err(|source| io_error(&path, source))?;
        digests.insert((*blob).to_string(), blake3::hash(bytes).to_hex().to_string());
    }
    Ok(digests)
}

fn read_verified<T: DeserializeOwned>(
    dir: &Path,
    manifest: &Manifest,
    blob: &'static str,
) -> Result<T, ArtifactError> {
    let bytes = read_file(&blob_file(dir, blob))?;
    let expected = manifest
        .digests
        .get(blob)
        .ok_or_else(|| corrupt(MANIFEST_BLOB, format!("no digest recorded for `{blob}`")))?;
    if blake3::hash(&bytes).to_hex().as_str() != expected.as_str() {
        return Err(corrupt(blob, "digest does not match manifest".to_string()));
    }
    decode(blob, &bytes)
}

fn read_file(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    fs::read(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => ArtifactError::Missing { path: path.to_path_buf() },
        _ => io_error(path, source),
    })
}

fn blob_file(dir: &Path, blob: &str) -> PathBuf {
    dir.join(format!("{blob}.json"))
}

fn generation_name(generation: u64) -> String {
    format!("{GENERATION_PREFIX}{generation:06}")
}

fn parse_generation(name: &str) -> Option<u64> {
    name.strip_prefix(GENERATION_PREFIX)?.parse().ok()
}

fn encode<T: Serialize>(blob: &'static str, value: &T) -> Result<Vec<u8>, ArtifactError> {
    serde_json::to_vec(value).map_err(|source| ArtifactError::Encode { blob, source })
}

fn decode<T: DeserializeOwned>(blob: &'static str, bytes: &[u8]) -> Result<T, ArtifactError> {
    serde_json::from_slice(bytes).map_err(|error| corrupt(blob, error.to_string()))
}

fn corrupt(blob: &'static str, reason: String) -> ArtifactError {
    ArtifactError::Corrupt { blob, reason }
}

fn io_error(path: &Path, source: std::io::Error) -> ArtifactError {
    ArtifactError::Io { path: path.to_path_buf(), source }
}

fn remove_dir_if_present(path: &Path) -> Result<(), ArtifactError> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(io_error(path, source)),
    }
}

fn discard_dir(path: &Path) {
    if let Err(error) = remove_dir_if_present(path) {
        warn!(event_name = "build.cleanup_failed", error = %error, "could not remove artifact directory");
    }
}
