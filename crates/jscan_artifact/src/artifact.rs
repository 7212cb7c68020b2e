use serde::{Deserialize, Serialize};

/// コンパイル済みクラスファイルを示すタグ。
pub const TAG_CLASS_FILE: &str = "class-file";
/// 生成されたネイティブヘッダーを示すタグ。
pub const TAG_HEADER_FILE: &str = "header-file";
/// 注釈処理などで生成されたソースファイルを示すタグ。
pub const TAG_SOURCE_FILE: &str = "source-file";

/// コンパイル1回分の出力ファイルを表す。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// 出力ファイルのパス。
    pub file_path: String,
    /// ファイル種別タグ。挿入順を保持する。
    pub file_tags: Vec<String>,
}

impl Artifact {
    pub fn new(file_path: impl Into<String>, file_tags: Vec<String>) -> Self {
        Self {
            file_path: file_path.into(),
            file_tags,
        }
    }

    /// タグを1つだけ持つ成果物を作る。
    pub fn tagged(file_path: impl Into<String>, tag: &str) -> Self {
        Self::new(file_path, vec![tag.to_string()])
    }

    /// タグなしの成果物を作る。ヘッダーでもクラスでもない出力に使う。
    pub fn untagged(file_path: impl Into<String>) -> Self {
        Self::new(file_path, Vec::new())
    }
}

/// 成果物リスト。同一パスは最初に登録された1件だけを保持する。
///
/// 後から同じパスで追加してもタグはマージされない。登録順がそのまま
/// 出力順になる。
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ArtifactList {
    entries: Vec<Artifact>,
}

impl ArtifactList {
    pub fn new() -> Self {
        Self::default()
    }

    /// 成果物を追加する。同じパスが登録済みの場合は何もせず `false` を返す。
    pub fn insert(&mut self, artifact: Artifact) -> bool {
        if self.contains_path(&artifact.file_path) {
            return false;
        }
        self.entries.push(artifact);
        true
    }

    pub fn contains_path(&self, file_path: &str) -> bool {
        self.entries.iter().any(|a| a.file_path == file_path)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Artifact> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[Artifact] {
        &self.entries
    }
}

impl<'a> IntoIterator for &'a ArtifactList {
    type Item = &'a Artifact;
    type IntoIter = std::slice::Iter<'a, Artifact>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl From<Vec<Artifact>> for ArtifactList {
    fn from(artifacts: Vec<Artifact>) -> Self {
        let mut list = ArtifactList::new();
        for artifact in artifacts {
            list.insert(artifact);
        }
        list
    }
}
