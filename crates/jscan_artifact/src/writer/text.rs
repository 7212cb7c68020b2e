use std::io::Write;

use crate::artifact::Artifact;

use super::{ArtifactListWriter, WriteError};

/// 1成果物につき `パス: タグ,タグ` の1行を出力する。
pub struct ArtifactListTextWriter;

impl ArtifactListWriter for ArtifactListTextWriter {
    fn write(&self, artifacts: &[Artifact], out: &mut dyn Write) -> Result<(), WriteError> {
        for artifact in artifacts {
            writeln!(out, "{}: {}", artifact.file_path, artifact.file_tags.join(","))?;
        }
        Ok(())
    }
}
