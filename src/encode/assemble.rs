use crate::encode::sink::SegmentRange;
use crate::encode::tool::MediaTool;
use crate::foundation::error::{WeaveError, WeaveResult};
use std::path::{Path, PathBuf};

/// Joins segment files into the final movie and muxes in the audio track.
pub struct Assembler<'a> {
    tool: &'a dyn MediaTool,
    partial_dir: PathBuf,
    extension: String,
    manifest_path: PathBuf,
}

impl<'a> Assembler<'a> {
    pub fn new(
        tool: &'a dyn MediaTool,
        partial_dir: impl Into<PathBuf>,
        extension: impl Into<String>,
        manifest_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            tool,
            partial_dir: partial_dir.into(),
            extension: extension.into(),
            manifest_path: manifest_path.into(),
        }
    }

    /// Segment files present on disk with an index in `range`, sorted by index.
    ///
    /// Missing indices (dropped segments) are simply absent from the result.
    pub fn list_segments(&self, range: SegmentRange) -> WeaveResult<Vec<(u64, PathBuf)>> {
        let entries = match std::fs::read_dir(&self.partial_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(WeaveError::assembly(format!(
                    "failed to list '{}': {e}",
                    self.partial_dir.display()
                )));
            }
        };

        let mut found = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                WeaveError::assembly(format!(
                    "failed to list '{}': {e}",
                    self.partial_dir.display()
                ))
            })?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let Some(stem) = name.strip_suffix(self.extension.as_str()) else {
                continue;
            };
            if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
                continue;
            }
            let Ok(index) = stem.parse::<u64>() else {
                continue;
            };
            if range.contains(index) && entry.path().is_file() {
                found.push((index, entry.path()));
            }
        }
        found.sort_by_key(|(index, _)| *index);
        Ok(found)
    }

    /// Write the concat manifest: one `file '<path>'` line per segment, in order.
    pub fn write_manifest(&self, files: &[PathBuf]) -> WeaveResult<()> {
        let mut body = String::new();
        for file in files {
            let abs = std::path::absolute(file).map_err(|e| {
                WeaveError::assembly(format!("failed to resolve '{}': {e}", file.display()))
            })?;
            let text = abs.to_string_lossy().replace('\\', "/").replace('\'', r"'\''");
            body.push_str(&format!("file '{text}'\n"));
        }
        if let Some(parent) = self.manifest_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                WeaveError::assembly(format!("failed to create '{}': {e}", parent.display()))
            })?;
        }
        std::fs::write(&self.manifest_path, body).map_err(|e| {
            WeaveError::assembly(format!(
                "failed to write manifest '{}': {e}",
                self.manifest_path.display()
            ))
        })
    }

    /// Concatenate the segments in `range` into `out` without re-encoding.
    ///
    /// Returns `Ok(None)` when no segment file exists. On failure no file is left at `out`.
    #[tracing::instrument(skip(self))]
    pub fn concatenate(&self, range: SegmentRange, out: &Path) -> WeaveResult<Option<PathBuf>> {
        let segments = self.list_segments(range)?;
        if segments.is_empty() {
            tracing::info!("nothing to assemble");
            return Ok(None);
        }
        let files: Vec<PathBuf> = segments.into_iter().map(|(_, p)| p).collect();
        self.write_manifest(&files)?;

        let temp = temp_sibling(out);
        let _ = std::fs::remove_file(&temp);
        let exit = self.tool.concat(&self.manifest_path, &temp)?;
        if !exit.success {
            let _ = std::fs::remove_file(&temp);
            return Err(WeaveError::assembly(exit.detail));
        }
        replace_file(&temp, out)?;
        tracing::debug!(segments = files.len(), out = %out.display(), "segments concatenated");
        Ok(Some(out.to_path_buf()))
    }

    /// Replace `video` with a copy carrying `audio`, then delete `audio`.
    #[tracing::instrument(skip(self))]
    pub fn mux_audio(&self, video: &Path, audio: &Path, bitrate: &str) -> WeaveResult<PathBuf> {
        let temp = temp_sibling(video);
        let _ = std::fs::remove_file(&temp);
        let exit = self.tool.mux_audio(video, audio, &temp, bitrate)?;
        if !exit.success {
            let _ = std::fs::remove_file(&temp);
            return Err(WeaveError::assembly(exit.detail));
        }
        replace_file(&temp, video)?;
        if let Err(e) = std::fs::remove_file(audio) {
            tracing::warn!(path = %audio.display(), error = %e, "could not remove audio export");
        }
        Ok(video.to_path_buf())
    }
}

/// `dir/name_temp.ext` next to `path`.
fn temp_sibling(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}_temp.{}", ext.to_string_lossy()),
        None => format!("{stem}_temp"),
    };
    path.with_file_name(name)
}

fn replace_file(from: &Path, to: &Path) -> WeaveResult<()> {
    std::fs::rename(from, to).map_err(|e| {
        let _ = std::fs::remove_file(from);
        WeaveError::assembly(format!(
            "failed to move '{}' to '{}': {e}",
            from.display(),
            to.display()
        ))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/encode/assemble.rs"]
mod tests;
