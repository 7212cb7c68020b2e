use std::io::{Cursor, Write};

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::artifact::Artifact;

use super::{ArtifactListWriter, WriteError};

/// `<artifacts>` ドキュメントを出力する。
///
/// 成果物ごとに `<artifact>` 要素を生成し、`<filePath>` と
/// `<fileTags>/<fileTag>` を登録順のまま書き出す。
pub struct ArtifactListXmlWriter;

impl ArtifactListWriter for ArtifactListXmlWriter {
    fn write(&self, artifacts: &[Artifact], out: &mut dyn Write) -> Result<(), WriteError> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 4);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.write_event(Event::Start(BytesStart::new("artifacts")))?;

        for artifact in artifacts {
            writer.write_event(Event::Start(BytesStart::new("artifact")))?;
            write_simple(&mut writer, "filePath", &artifact.file_path)?;

            writer.write_event(Event::Start(BytesStart::new("fileTags")))?;
            for tag in &artifact.file_tags {
                write_simple(&mut writer, "fileTag", tag)?;
            }
            writer.write_event(Event::End(BytesEnd::new("fileTags")))?;

            writer.write_event(Event::End(BytesEnd::new("artifact")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("artifacts")))?;

        out.write_all(&writer.into_inner().into_inner())?;
        out.write_all(b"\n")?;
        Ok(())
    }
}

fn write_simple(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    tag: &str,
    value: &str,
) -> Result<(), WriteError> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(value)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{TAG_CLASS_FILE, TAG_HEADER_FILE};
    use quick_xml::Reader;

    fn render(artifacts: &[Artifact]) -> String {
        let mut buffer = Vec::new();
        ArtifactListXmlWriter
            .write(artifacts, &mut buffer)
            .expect("write xml");
        String::from_utf8(buffer).expect("utf-8 output")
    }

    // テスト用の逆方向パーサー。要素名だけを頼りに成果物を復元する。
    fn parse(xml: &str) -> Vec<Artifact> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut artifacts = Vec::new();
        let mut element_stack: Vec<String> = Vec::new();
        let mut file_path = String::new();
        let mut file_tags = Vec::new();

        loop {
            match reader.read_event().expect("well-formed xml") {
                Event::Start(start) => {
                    let name = String::from_utf8(start.name().as_ref().to_vec()).expect("utf-8");
                    if name == "artifact" {
                        file_path.clear();
                        file_tags = Vec::new();
                    }
                    element_stack.push(name);
                }
                Event::Text(text) => {
                    let value = text.unescape().expect("unescape").into_owned();
                    match element_stack.last().map(String::as_str) {
                        Some("filePath") => file_path = value,
                        Some("fileTag") => file_tags.push(value),
                        _ => {}
                    }
                }
                Event::End(end) => {
                    if end.name().as_ref() == b"artifact" {
                        artifacts.push(Artifact::new(file_path.clone(), std::mem::take(&mut file_tags)));
                    }
                    element_stack.pop();
                }
                Event::Eof => break,
                _ => {}
            }
        }

        artifacts
    }

    #[test]
    fn round_trips_through_reader() {
        let artifacts = vec![
            Artifact::tagged("/out/a/B.class", TAG_CLASS_FILE),
            Artifact::tagged("/hdr/a_B.h", TAG_HEADER_FILE),
            Artifact::untagged("/out/res/strings.properties"),
        ];
        assert_eq!(parse(&render(&artifacts)), artifacts);
    }

    #[test]
    fn document_carries_declaration_and_root_element() {
        let xml = render(&[Artifact::tagged("/out/A.class", TAG_CLASS_FILE)]);
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<artifacts>"));
        assert!(xml.trim_end().ends_with("</artifacts>"));
        assert!(xml.ends_with('\n'));
    }

    #[test]
    fn escapes_reserved_characters_in_paths() {
        let artifacts = vec![Artifact::untagged("/out/a&b/<C>.class")];
        let xml = render(&artifacts);
        assert!(xml.contains("/out/a&amp;b/&lt;C&gt;.class"));
        assert_eq!(parse(&xml), artifacts);
    }

    #[test]
    fn empty_list_renders_empty_root() {
        let xml = render(&[]);
        assert!(!xml.contains("<artifact>"));
        assert!(xml.contains("<artifacts>"));
    }
}
