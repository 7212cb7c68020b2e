use std::io::Write;

use crate::artifact::Artifact;

use super::{ArtifactListWriter, WriteError};

/// `[{"filePath": …, "fileTags": […]}]` 形式の配列を出力する。
pub struct ArtifactListJsonWriter;

impl ArtifactListWriter for ArtifactListJsonWriter {
    fn write(&self, artifacts: &[Artifact], out: &mut dyn Write) -> Result<(), WriteError> {
        serde_json::to_writer_pretty(&mut *out, artifacts)?;
        writeln!(out)?;
        Ok(())
    }
}
