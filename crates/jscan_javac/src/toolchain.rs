use std::io::Write;

use crate::decl::CompilationUnit;
use crate::options::{CompilerOptions, OptionRecognizer, SourceRelease};

/// What kind of output the compiler is about to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// A compiled class file.
    Class,
    /// A generated source file, annotation processing output.
    Source,
    /// Any other file the compiler writes, headers included.
    Resource,
}

/// Whether the underlying compile reported success. Scans record this
/// for logging only and never let it fail a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileOutcome {
    Succeeded,
    Failed,
}

/// Hooks a scan installs around one compilation run.
pub trait CompileObserver {
    /// Called once per compiled unit with its declaration tree. Only
    /// toolchains that report `provides_declarations` deliver units.
    fn unit_compiled(&mut self, unit: &CompilationUnit);

    /// Called for every file the compiler wants to create. Scans hand
    /// back a discarding sink so nothing real lands on disk; toolchains
    /// running out of process may never feed the returned writer.
    fn output_write(&mut self, path: &str, kind: OutputKind) -> Box<dyn Write>;
}

/// The compiler a scan runs against. Production code binds the system
/// javac; tests substitute scripted implementations.
pub trait Toolchain {
    /// Latest source release the running toolchain supports.
    fn latest_release(&self) -> SourceRelease;

    /// Option recognizers in query order: the compiler's own options
    /// first, then the file manager's.
    fn option_recognizers(&self) -> Vec<&dyn OptionRecognizer>;

    /// Whether `compile` reports declaration trees through the observer.
    /// Scans without declarations fall back to classifying intercepted
    /// writes directly.
    fn provides_declarations(&self) -> bool;

    /// Runs the compiler over the parsed invocation, routing every
    /// output write through the observer.
    fn compile(
        &self,
        options: &CompilerOptions,
        observer: &mut dyn CompileObserver,
    ) -> CompileOutcome;
}
