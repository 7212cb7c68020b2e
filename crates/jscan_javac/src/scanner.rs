use std::collections::BTreeSet;
use std::fmt;
use std::io::{self, Write};

use tracing::{debug, warn};

use jscan_artifact::{
    Artifact, ArtifactList, TAG_CLASS_FILE, TAG_HEADER_FILE, TAG_SOURCE_FILE, WriteError,
    writer_for_format,
};

use crate::decl::CompilationUnit;
use crate::options::{ArgumentError, CompilerOptions};
use crate::paths::{predicted_class_path, predicted_header_path};
use crate::predict::{ArtifactPredictor, PredictorEnv};
use crate::toolchain::{CompileObserver, OutputKind, Toolchain};

/// Runs one compiler invocation with output interception and owns the
/// resulting artifact list.
///
/// When the toolchain can deliver declaration trees the scan works in
/// deferred mode: artifacts are predicted from the declarations and the
/// intercepted writes only serve as a cross-check. Without declarations
/// every intercepted write becomes an artifact directly.
pub struct CompilationScanner<'a> {
    toolchain: &'a dyn Toolchain,
    output_format: String,
    artifacts: ArtifactList,
}

impl<'a> CompilationScanner<'a> {
    pub fn new(toolchain: &'a dyn Toolchain) -> Self {
        Self {
            toolchain,
            output_format: jscan_artifact::FORMAT_TEXT.to_string(),
            artifacts: ArtifactList::new(),
        }
    }

    pub fn output_format(&self) -> &str {
        &self.output_format
    }

    pub fn set_output_format(&mut self, format: impl Into<String>) {
        self.output_format = format.into();
    }

    pub fn artifacts(&self) -> &ArtifactList {
        &self.artifacts
    }

    /// Parses the invocation, runs the compiler with interception and
    /// rebuilds the artifact list from scratch. Returns the process exit
    /// code: 0 when the scan discovered at least one artifact, 1 when it
    /// found none. The compiler's own pass/fail signal never decides it.
    pub fn run(&mut self, arguments: &[String]) -> Result<i32, ArgumentError> {
        self.artifacts.clear();

        let recognizers = self.toolchain.option_recognizers();
        let options =
            CompilerOptions::parse(arguments, &recognizers, self.toolchain.latest_release())?;

        if self.toolchain.provides_declarations() {
            self.run_deferred(&options);
        } else {
            self.run_immediate(&options);
        }

        Ok(if self.artifacts.is_empty() { 1 } else { 0 })
    }

    /// Serializes the artifact list in the configured output format.
    pub fn write(&self, out: &mut dyn Write) -> Result<(), WriteError> {
        writer_for_format(&self.output_format)?.write(self.artifacts.as_slice(), out)
    }

    fn run_deferred(&mut self, options: &CompilerOptions) {
        let mut predictor = ArtifactPredictor::new(options.source_release);
        predictor.bind(PredictorEnv {
            latest_release: self.toolchain.latest_release(),
        });

        let mut observed = BTreeSet::new();
        let outcome = {
            let mut observer = DeferredObserver {
                predictor: &mut predictor,
                observed: &mut observed,
            };
            self.toolchain.compile(options, &mut observer)
        };
        // Even a failed compile yields a usable partial declaration set.
        debug!(outcome = ?outcome, "compilation finished");

        let names = predictor.into_names();

        match options.output_class_dir.as_deref() {
            Some(class_dir) => {
                for binary_name in &names.declared_types {
                    self.artifacts.insert(Artifact::tagged(
                        predicted_class_path(class_dir, binary_name),
                        TAG_CLASS_FILE,
                    ));
                }
            }
            None if !names.declared_types.is_empty() => {
                debug!("no class output directory; skipping class file predictions");
            }
            None => {}
        }

        match options.output_header_dir.as_deref() {
            Some(header_dir) => {
                for binary_name in &names.native_header_types {
                    self.artifacts.insert(Artifact::tagged(
                        predicted_header_path(header_dir, binary_name),
                        TAG_HEADER_FILE,
                    ));
                }
            }
            None if !names.native_header_types.is_empty() => {
                debug!("no header output directory; skipping header predictions");
            }
            None => {}
        }

        let predicted: BTreeSet<String> = self
            .artifacts
            .iter()
            .map(|artifact| artifact.file_path.clone())
            .collect();
        if let Some(report) = reconcile(&predicted, &observed) {
            eprintln!("{report}");
        }
    }

    fn run_immediate(&mut self, options: &CompilerOptions) {
        let outcome = {
            let mut observer = ImmediateObserver {
                artifacts: &mut self.artifacts,
            };
            self.toolchain.compile(options, &mut observer)
        };
        debug!(outcome = ?outcome, "compilation finished");
    }
}

/// Deferred policy: observed paths are recorded for reconciliation and
/// declarations forwarded to the predictor; all bytes go to a discard
/// sink.
struct DeferredObserver<'a> {
    predictor: &'a mut ArtifactPredictor,
    observed: &'a mut BTreeSet<String>,
}

impl CompileObserver for DeferredObserver<'_> {
    fn unit_compiled(&mut self, unit: &CompilationUnit) {
        if let Err(error) = self.predictor.scan_unit(unit) {
            warn!(%error, "declaration scan skipped");
        }
    }

    fn output_write(&mut self, path: &str, _kind: OutputKind) -> Box<dyn Write> {
        self.observed.insert(path.to_string());
        Box::new(io::sink())
    }
}

/// Immediate policy: every intercepted write becomes an artifact, tagged
/// by what the compiler said it was writing.
struct ImmediateObserver<'a> {
    artifacts: &'a mut ArtifactList,
}

impl CompileObserver for ImmediateObserver<'_> {
    fn unit_compiled(&mut self, _unit: &CompilationUnit) {}

    fn output_write(&mut self, path: &str, kind: OutputKind) -> Box<dyn Write> {
        let artifact = match kind {
            OutputKind::Class => Artifact::tagged(path, TAG_CLASS_FILE),
            OutputKind::Source => Artifact::tagged(path, TAG_SOURCE_FILE),
            OutputKind::Resource if path.ends_with(".h") => {
                Artifact::tagged(path, TAG_HEADER_FILE)
            }
            OutputKind::Resource => Artifact::untagged(path),
        };
        self.artifacts.insert(artifact);
        Box::new(io::sink())
    }
}

/// Output paths the compiler wrote that prediction did not cover, with
/// both full sets for context. All three lists are sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MismatchReport {
    pub predicted: Vec<String>,
    pub observed: Vec<String>,
    pub missing: Vec<String>,
}

/// Compares predicted against observed output paths. Paths the compiler
/// wrote without a matching prediction produce a report; predictions the
/// compiler never wrote are expected when a compile stops early.
pub fn reconcile(
    predicted: &BTreeSet<String>,
    observed: &BTreeSet<String>,
) -> Option<MismatchReport> {
    let missing: Vec<String> = observed.difference(predicted).cloned().collect();
    if missing.is_empty() {
        return None;
    }

    Some(MismatchReport {
        predicted: predicted.iter().cloned().collect(),
        observed: observed.iter().cloned().collect(),
        missing,
    })
}

impl fmt::Display for MismatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "The set of output files determined by source code parsing:"
        )?;
        writeln!(f)?;
        writeln!(f, "{}", self.predicted.join("\n"))?;
        writeln!(f)?;
        writeln!(
            f,
            "is missing some files from the list that would be produced by the compiler:"
        )?;
        writeln!(f)?;
        writeln!(f, "{}", self.observed.join("\n"))?;
        writeln!(f)?;
        writeln!(f, "The missing files are:")?;
        writeln!(f)?;
        writeln!(f, "{}", self.missing.join("\n"))?;
        writeln!(f)?;
        write!(
            f,
            "Compilation will still continue, though a build error *might* appear later."
        )
    }
}
