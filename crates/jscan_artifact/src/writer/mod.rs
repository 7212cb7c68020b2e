use std::io::Write;

use thiserror::Error;

use crate::artifact::Artifact;

mod json;
mod text;
mod xml;

pub use json::ArtifactListJsonWriter;
pub use text::ArtifactListTextWriter;
pub use xml::ArtifactListXmlWriter;

/// 既定の人間可読テキスト形式を選択するキー。
pub const FORMAT_TEXT: &str = "human-readable-text";
/// JSON 形式を選択するキー。
pub const FORMAT_JSON: &str = "json";
/// XML 形式を選択するキー。
pub const FORMAT_XML: &str = "xml1";

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("未対応の出力形式です: '{0}'")]
    UnknownFormat(String),
    #[error("成果物リストの書き込み中にIOエラーが発生しました: {0}")]
    Io(#[from] std::io::Error),
    #[error("成果物リストのJSON生成に失敗しました: {0}")]
    Json(#[from] serde_json::Error),
    #[error("成果物リストのXML生成に失敗しました: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// 成果物リストを1つの出力形式へ直列化する。
///
/// 実装は成果物の並び・タグの並びを登録順のまま出力しなければならない。
pub trait ArtifactListWriter {
    fn write(&self, artifacts: &[Artifact], out: &mut dyn Write) -> Result<(), WriteError>;
}

/// 形式キーに対応するライターを返す。未知のキーは
/// [`WriteError::UnknownFormat`] で拒否する。
pub fn writer_for_format(format: &str) -> Result<&'static dyn ArtifactListWriter, WriteError> {
    match format {
        FORMAT_TEXT => Ok(&ArtifactListTextWriter),
        FORMAT_JSON => Ok(&ArtifactListJsonWriter),
        FORMAT_XML => Ok(&ArtifactListXmlWriter),
        other => Err(WriteError::UnknownFormat(other.to_string())),
    }
}
