use std::fs;
use std::io;
use std::path::{MAIN_SEPARATOR_STR, Path, PathBuf};
use std::process::{Command, Stdio};

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::jdk::{ToolchainError, discover_javac};
use crate::options::{CompilerOptions, OptionRecognizer, SourceRelease};
use crate::toolchain::{CompileObserver, CompileOutcome, OutputKind, Toolchain};

/// Standard options of the javac tool itself, with their arities.
const COMPILER_OPTIONS: &[(&str, usize)] = &[
    ("-deprecation", 0),
    ("-g", 0),
    ("-g:none", 0),
    ("-nowarn", 0),
    ("-parameters", 0),
    ("-proc:none", 0),
    ("-proc:only", 0),
    ("-processor", 1),
    ("-release", 1),
    ("-source", 1),
    ("-target", 1),
    ("-verbose", 0),
    ("-Werror", 0),
];

/// Options the standard file manager implements.
const FILE_MANAGER_OPTIONS: &[(&str, usize)] = &[
    ("-bootclasspath", 1),
    ("-classpath", 1),
    ("-cp", 1),
    ("-d", 1),
    ("-encoding", 1),
    ("-endorseddirs", 1),
    ("-extdirs", 1),
    ("-h", 1),
    ("-processorpath", 1),
    ("-s", 1),
    ("-sourcepath", 1),
];

/// Arity lookup over a fixed option table.
pub struct TableRecognizer {
    table: &'static [(&'static str, usize)],
}

impl OptionRecognizer for TableRecognizer {
    fn recognize(&self, token: &str) -> Option<usize> {
        self.table
            .iter()
            .find(|(option, _)| *option == token)
            .map(|(_, arity)| *arity)
    }
}

/// Recognizer for the compiler's own options.
pub static COMPILER_RECOGNIZER: TableRecognizer = TableRecognizer {
    table: COMPILER_OPTIONS,
};
/// Recognizer for the file manager's options.
pub static FILE_MANAGER_RECOGNIZER: TableRecognizer = TableRecognizer {
    table: FILE_MANAGER_OPTIONS,
};

fn recognized_arity(token: &str) -> usize {
    COMPILER_RECOGNIZER
        .recognize(token)
        .or_else(|| FILE_MANAGER_RECOGNIZER.recognize(token))
        .unwrap_or(0)
}

/// The system javac, driven as a subprocess.
///
/// Output directories are redirected into a scratch directory for the
/// duration of one compile; every file javac writes there is reported to
/// the observer under the path the invocation configured, then the
/// scratch is dropped. A scan therefore never writes real outputs.
pub struct JavacToolchain {
    javac_path: PathBuf,
    latest_release: SourceRelease,
}

impl JavacToolchain {
    /// Binds the system javac found through the discovery cascade.
    pub fn discover() -> Result<Self, ToolchainError> {
        let info = discover_javac()?;
        Ok(Self::from_parts(info.javac_path, info.latest_release))
    }

    /// Binds a specific javac binary with a known latest release.
    pub fn from_parts(javac_path: PathBuf, latest_release: SourceRelease) -> Self {
        Self {
            javac_path,
            latest_release,
        }
    }

    pub fn javac_path(&self) -> &Path {
        &self.javac_path
    }
}

impl Toolchain for JavacToolchain {
    fn latest_release(&self) -> SourceRelease {
        self.latest_release
    }

    fn option_recognizers(&self) -> Vec<&dyn OptionRecognizer> {
        vec![&COMPILER_RECOGNIZER, &FILE_MANAGER_RECOGNIZER]
    }

    fn provides_declarations(&self) -> bool {
        // A subprocess cannot hand declaration trees back.
        false
    }

    fn compile(
        &self,
        options: &CompilerOptions,
        observer: &mut dyn CompileObserver,
    ) -> CompileOutcome {
        let scratch = match TempDir::new() {
            Ok(scratch) => scratch,
            Err(error) => {
                warn!(%error, "could not create scratch output directory");
                return CompileOutcome::Failed;
            }
        };

        let (arguments, remaps) = redirected_arguments(options, scratch.path());

        let mut command = Command::new(&self.javac_path);
        for argument in &arguments {
            command.arg(argument);
        }
        for class_name in &options.class_names {
            command.arg(class_name);
        }
        for file in &options.source_files {
            command.arg(file);
        }

        let output = match command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
        {
            Ok(output) => output,
            Err(error) => {
                warn!(javac = %self.javac_path.display(), %error, "failed to spawn javac");
                return CompileOutcome::Failed;
            }
        };

        // Diagnostics are swallowed; discovery has to work over broken
        // sources too.
        let diagnostics = String::from_utf8_lossy(&output.stderr);
        if !diagnostics.trim().is_empty() {
            debug!(diagnostics = %diagnostics.trim(), "javac reported diagnostics");
        }

        for remap in &remaps {
            report_outputs(remap, observer);
        }

        if output.status.success() {
            CompileOutcome::Succeeded
        } else {
            CompileOutcome::Failed
        }
    }
}

/// How files written under one scratch directory map back to the
/// directory the invocation configured.
struct OutputRemap {
    scratch_dir: PathBuf,
    reported_dir: String,
    kind: OutputKind,
}

/// Rewrites the recognized options so every output directory points into
/// the scratch root. `-d` is forced when absent, since javac would
/// otherwise write class files next to their sources.
fn redirected_arguments(
    options: &CompilerOptions,
    scratch_root: &Path,
) -> (Vec<String>, Vec<OutputRemap>) {
    let scratch_classes = scratch_root.join("classes");
    let scratch_headers = scratch_root.join("headers");
    let scratch_sources = scratch_root.join("sources");

    let mut arguments = Vec::new();
    let mut remaps = Vec::new();
    let mut saw_class_dir = false;

    let tokens = &options.recognized_options;
    let mut index = 0;
    while index < tokens.len() {
        let token = &tokens[index];
        let redirect = match token.as_str() {
            "-d" => Some((&scratch_classes, OutputKind::Class)),
            "-h" => Some((&scratch_headers, OutputKind::Resource)),
            "-s" => Some((&scratch_sources, OutputKind::Source)),
            _ => None,
        };

        match (redirect, tokens.get(index + 1)) {
            (Some((scratch_dir, kind)), Some(configured_dir)) => {
                arguments.push(token.clone());
                arguments.push(path_string(scratch_dir));
                if matches!(kind, OutputKind::Class) {
                    saw_class_dir = true;
                }
                remaps.push(OutputRemap {
                    scratch_dir: scratch_dir.clone(),
                    reported_dir: configured_dir.clone(),
                    kind,
                });
                index += 2;
            }
            _ => {
                let arity = recognized_arity(token);
                for offset in 0..=arity {
                    if let Some(argument) = tokens.get(index + offset) {
                        arguments.push(argument.clone());
                    }
                }
                index += arity + 1;
            }
        }
    }

    if !saw_class_dir {
        arguments.push("-d".to_string());
        arguments.push(path_string(&scratch_classes));
        remaps.push(OutputRemap {
            scratch_dir: scratch_classes.clone(),
            reported_dir: options
                .output_class_dir
                .clone()
                .unwrap_or_else(|| ".".to_string()),
            kind: OutputKind::Class,
        });
    }

    (arguments, remaps)
}

fn report_outputs(remap: &OutputRemap, observer: &mut dyn CompileObserver) {
    let mut written = Vec::new();
    if let Err(error) = collect_files(&remap.scratch_dir, &mut written) {
        debug!(dir = %remap.scratch_dir.display(), %error, "scratch walk failed");
    }
    written.sort();

    for file in written {
        let path = reported_path(&remap.reported_dir, &remap.scratch_dir, &file);
        // The returned sink is dropped unused; the scratch directory
        // holds the only copy of the bytes and dies with the run.
        let _ = observer.output_write(&path, remap.kind);
    }
}

fn collect_files(dir: &Path, found: &mut Vec<PathBuf>) -> io::Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, found)?;
        } else {
            found.push(path);
        }
    }
    Ok(())
}

/// Maps a file written under the scratch directory back to the path the
/// invocation configured.
fn reported_path(reported_dir: &str, scratch_dir: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(scratch_dir).unwrap_or(file);
    Path::new(&reported_dir.replace('/', MAIN_SEPARATOR_STR))
        .join(relative)
        .to_string_lossy()
        .into_owned()
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn options_with(recognized: &[&str], class_dir: Option<&str>) -> CompilerOptions {
        CompilerOptions {
            recognized_options: recognized.iter().map(|s| s.to_string()).collect(),
            source_files: BTreeSet::new(),
            class_names: BTreeSet::new(),
            output_class_dir: class_dir.map(str::to_string),
            output_header_dir: None,
            source_release: SourceRelease(21),
        }
    }

    #[test]
    fn recognizer_tables_cover_the_distinguished_options() {
        assert_eq!(COMPILER_RECOGNIZER.recognize("-source"), Some(1));
        assert_eq!(COMPILER_RECOGNIZER.recognize("-g"), Some(0));
        assert_eq!(FILE_MANAGER_RECOGNIZER.recognize("-d"), Some(1));
        assert_eq!(FILE_MANAGER_RECOGNIZER.recognize("-h"), Some(1));
        assert_eq!(FILE_MANAGER_RECOGNIZER.recognize("-s"), Some(1));
        assert_eq!(COMPILER_RECOGNIZER.recognize("--wat"), None);
        assert_eq!(FILE_MANAGER_RECOGNIZER.recognize("--wat"), None);
    }

    #[test]
    fn output_directories_are_redirected_into_scratch() {
        let scratch = Path::new("/scratch");
        let options = options_with(&["-d", "/out", "-h", "/hdr", "-verbose"], Some("/out"));

        let (arguments, remaps) = redirected_arguments(&options, scratch);

        assert_eq!(arguments[0], "-d");
        assert_eq!(arguments[1], path_string(&scratch.join("classes")));
        assert_eq!(arguments[2], "-h");
        assert_eq!(arguments[3], path_string(&scratch.join("headers")));
        assert_eq!(arguments[4], "-verbose");

        assert_eq!(remaps.len(), 2);
        assert_eq!(remaps[0].reported_dir, "/out");
        assert!(matches!(remaps[0].kind, OutputKind::Class));
        assert_eq!(remaps[1].reported_dir, "/hdr");
        assert!(matches!(remaps[1].kind, OutputKind::Resource));
    }

    #[test]
    fn class_directory_is_forced_when_absent() {
        let scratch = Path::new("/scratch");
        let options = options_with(&["-verbose"], None);

        let (arguments, remaps) = redirected_arguments(&options, scratch);

        assert_eq!(
            arguments,
            vec![
                "-verbose".to_string(),
                "-d".to_string(),
                path_string(&scratch.join("classes")),
            ]
        );
        assert_eq!(remaps.len(), 1);
        assert_eq!(remaps[0].reported_dir, ".");
    }

    #[test]
    fn generated_source_directory_is_redirected() {
        let scratch = Path::new("/scratch");
        let options = options_with(&["-s", "/gen"], Some("/out"));

        let (_, remaps) = redirected_arguments(&options, scratch);

        let source_remap = remaps
            .iter()
            .find(|remap| matches!(remap.kind, OutputKind::Source))
            .expect("source remap");
        assert_eq!(source_remap.reported_dir, "/gen");
        assert_eq!(source_remap.scratch_dir, scratch.join("sources"));
    }

    #[test]
    fn non_output_options_pass_through_with_parameters() {
        let scratch = Path::new("/scratch");
        let options = options_with(&["-classpath", "/libs", "-source", "8"], None);

        let (arguments, _) = redirected_arguments(&options, scratch);

        assert_eq!(arguments[0], "-classpath");
        assert_eq!(arguments[1], "/libs");
        assert_eq!(arguments[2], "-source");
        assert_eq!(arguments[3], "8");
    }

    #[cfg(unix)]
    #[test]
    fn reported_path_rebases_scratch_files() {
        let scratch = Path::new("/scratch/classes");
        let file = scratch.join("a").join("b").join("C$D.class");
        assert_eq!(reported_path("/out", scratch, &file), "/out/a/b/C$D.class");
    }
}
