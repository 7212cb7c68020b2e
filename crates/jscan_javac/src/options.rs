use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

const OPTION_CLASS_DIR: &str = "-d";
const OPTION_HEADER_DIR: &str = "-h";
const OPTION_SOURCE_RELEASE: &str = "-source";

/// Words that cannot appear as a segment of a qualified type name.
const RESERVED_WORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "final", "finally", "float",
    "for", "goto", "if", "implements", "import", "instanceof", "int", "interface", "long",
    "native", "new", "package", "private", "protected", "public", "return", "short", "static",
    "strictfp", "super", "switch", "synchronized", "this", "throw", "throws", "transient", "try",
    "void", "volatile", "while", "true", "false", "null",
];

#[derive(Error, Debug)]
pub enum ArgumentError {
    #[error("Option '{option}' expects {expected} parameter(s)")]
    MalformedOption { option: String, expected: usize },
    #[error("Unrecognized argument: {0}")]
    UnrecognizedArgument(String),
    #[error("invalid source release: {0}")]
    InvalidSourceRelease(String),
}

/// A source release level, counted the way the toolchain counts them:
/// release 0 is the 1.0 language, release 8 the last of the `1.x` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourceRelease(pub u32);

impl SourceRelease {
    /// First release whose compiler generates native headers itself.
    pub const RELEASE_8: SourceRelease = SourceRelease(8);

    pub fn ordinal(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SourceRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mirrors the option query a javac-shaped tool answers: how many
/// parameter tokens an option consumes, or `None` for tokens the
/// recognizer does not know.
pub trait OptionRecognizer {
    fn recognize(&self, token: &str) -> Option<usize>;
}

/// The structured form of one compiler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Recognized option tokens with their parameters, original order.
    pub recognized_options: Vec<String>,
    pub source_files: BTreeSet<PathBuf>,
    pub class_names: BTreeSet<String>,
    pub output_class_dir: Option<String>,
    pub output_header_dir: Option<String>,
    pub source_release: SourceRelease,
}

impl CompilerOptions {
    /// Classifies every raw token as a recognized option (with its
    /// parameters), an existing source file or an explicit type name.
    /// Anything else fails the parse.
    pub fn parse(
        arguments: &[String],
        recognizers: &[&dyn OptionRecognizer],
        latest_release: SourceRelease,
    ) -> Result<Self, ArgumentError> {
        let mut recognized_options = Vec::new();
        let mut source_files = BTreeSet::new();
        let mut class_names = BTreeSet::new();
        let mut output_class_dir = None;
        let mut output_header_dir = None;
        let mut source_spelling: Option<String> = None;
        let mut source_ordinal = latest_release.ordinal();

        let mut index = 0;
        while index < arguments.len() {
            let token = &arguments[index];
            let arity = recognizers.iter().find_map(|r| r.recognize(token));

            match arity {
                Some(arity) => {
                    if index + arity >= arguments.len() {
                        return Err(ArgumentError::MalformedOption {
                            option: token.clone(),
                            expected: arity,
                        });
                    }

                    if arity == 1 {
                        let parameter = &arguments[index + 1];
                        match token.as_str() {
                            OPTION_CLASS_DIR => output_class_dir = Some(parameter.clone()),
                            OPTION_HEADER_DIR => output_header_dir = Some(parameter.clone()),
                            OPTION_SOURCE_RELEASE => {
                                // Unknown spellings keep the latest-known
                                // default; the literal token is still
                                // passed through below.
                                if let Some(release) = release_from_spelling(parameter) {
                                    source_ordinal = release.ordinal();
                                }
                                source_spelling = Some(parameter.clone());
                            }
                            _ => {}
                        }
                    }

                    recognized_options.extend(arguments[index..=index + arity].iter().cloned());
                    index += arity + 1;
                }
                None => {
                    let path = Path::new(token);
                    if path.exists() {
                        source_files.insert(path.to_path_buf());
                    } else if is_qualified_type_name(token) {
                        class_names.insert(token.clone());
                    } else {
                        return Err(ArgumentError::UnrecognizedArgument(token.clone()));
                    }
                    index += 1;
                }
            }
        }

        if source_ordinal > latest_release.ordinal() {
            let spelling =
                source_spelling.unwrap_or_else(|| source_ordinal.to_string());
            return Err(ArgumentError::InvalidSourceRelease(spelling));
        }

        Ok(Self {
            recognized_options,
            source_files,
            class_names,
            output_class_dir,
            output_header_dir,
            source_release: SourceRelease(source_ordinal),
        })
    }
}

/// The fixed `-source` spelling table. Both the `1.x` and the bare forms
/// are accepted up to release 8; anything newer is not in the table.
fn release_from_spelling(spelling: &str) -> Option<SourceRelease> {
    let ordinal = match spelling {
        "1.0" => 0,
        "1.1" => 1,
        "1.2" => 2,
        "1.3" => 3,
        "1.4" => 4,
        "1.5" | "5" => 5,
        "1.6" | "6" => 6,
        "1.7" | "7" => 7,
        "1.8" | "8" => 8,
        _ => return None,
    };
    Some(SourceRelease(ordinal))
}

/// Whether a token is a syntactically valid dot-separated type name.
fn is_qualified_type_name(token: &str) -> bool {
    !token.is_empty() && token.split('.').all(is_identifier)
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    let valid_start = chars
        .next()
        .map_or(false, |ch| ch.is_alphabetic() || ch == '_' || ch == '$');
    valid_start
        && chars.all(|ch| ch.is_alphanumeric() || ch == '_' || ch == '$')
        && !RESERVED_WORDS.contains(&segment)
}
