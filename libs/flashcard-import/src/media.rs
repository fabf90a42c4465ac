//! Media manifest parsing and audio asset extraction.

use crate::container::{PackageContainer, MEDIA_MANIFEST_ENTRY};
use crate::diagnostics::{ImportDiagnostics, ImportWarning};
use crate::types::MediaAsset;
use base64::{engine::general_purpose, Engine as _};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

/// Numeric entry name -> original media file name.
pub type MediaManifest = BTreeMap<String, String>;

/// Original file name -> extracted asset.
pub type MediaAssets = HashMap<String, Arc<MediaAsset>>;

/// Extensions kept as audio assets.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "m4a", "webm", "aac", "flac"];

/// MIME type for audio with an unrecognized extension.
pub const DEFAULT_AUDIO_MIME: &str = "audio/mpeg";

/// Read the media manifest. A missing or unreadable manifest yields an empty mapping.
pub fn build_manifest(
    container: &mut PackageContainer<'_>,
    diagnostics: &mut ImportDiagnostics,
) -> MediaManifest {
    let bytes = match container.read_entry(MEDIA_MANIFEST_ENTRY) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            tracing::debug!("package has no media manifest");
            diagnostics.push(ImportWarning::MissingManifest);
            return MediaManifest::new();
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to read media manifest");
            diagnostics.push(ImportWarning::InvalidManifest {
                reason: e.to_string(),
            });
            return MediaManifest::new();
        }
    };

    match serde_json::from_slice::<MediaManifest>(&bytes) {
        Ok(manifest) => manifest,
        Err(e) => {
            tracing::warn!(error = %e, "media manifest is not valid JSON");
            diagnostics.push(ImportWarning::InvalidManifest {
                reason: e.to_string(),
            });
            MediaManifest::new()
        }
    }
}

/// Extract every audio file listed in the manifest as a data URI asset.
pub fn resolve_assets(
    container: &mut PackageContainer<'_>,
    manifest: &MediaManifest,
    diagnostics: &mut ImportDiagnostics,
) -> MediaAssets {
    let mut assets = MediaAssets::with_capacity(manifest.len());

    for (media_id, file_name) in manifest {
        let Some(extension) = extension_of(file_name) else {
            continue;
        };
        if !is_audio_extension(&extension) {
            tracing::trace!(file = %file_name, "skipping non-audio media");
            continue;
        }

        let bytes = match container.read_entry(media_id) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                tracing::warn!(
                    media_id = %media_id,
                    file = %file_name,
                    "media blob missing from package"
                );
                diagnostics.push(ImportWarning::MissingMediaBlob {
                    media_id: media_id.clone(),
                    file_name: file_name.clone(),
                });
                continue;
            }
            Err(e) => {
                tracing::warn!(
                    media_id = %media_id,
                    file = %file_name,
                    error = %e,
                    "media blob unreadable"
                );
                diagnostics.push(ImportWarning::MissingMediaBlob {
                    media_id: media_id.clone(),
                    file_name: file_name.clone(),
                });
                continue;
            }
        };

        let asset = encode_asset(file_name, &extension, &bytes);
        assets.insert(file_name.clone(), Arc::new(asset));
    }

    tracing::debug!(count = assets.len(), "resolved audio assets");
    assets
}

/// MIME type for an audio file extension (case-insensitive).
pub fn mime_for_extension(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "m4a" => "audio/mp4",
        "webm" => "audio/webm",
        "aac" => "audio/aac",
        "flac" => "audio/flac",
        _ => DEFAULT_AUDIO_MIME,
    }
}

pub fn is_audio_extension(extension: &str) -> bool {
    AUDIO_EXTENSIONS
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(extension))
}

fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

fn encode_asset(file_name: &str, extension: &str, bytes: &[u8]) -> MediaAsset {
    let mime_type = mime_for_extension(extension);
    MediaAsset {
        file_name: file_name.to_string(),
        mime_type: mime_type.to_string(),
        data_uri: format!(
            "data:{};base64,{}",
            mime_type,
            general_purpose::STANDARD.encode(bytes)
        ),
    }
}
