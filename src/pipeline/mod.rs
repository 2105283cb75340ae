// Pipeline bookkeeping module
// Records what each generation session wrote

pub mod manifest;

pub use manifest::{read_manifest, ManifestEntry, ManifestError, ManifestWriter, MANIFEST_FILE};
