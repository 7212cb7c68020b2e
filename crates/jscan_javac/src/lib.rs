// jscan_javac - javac invocation scanning and output artifact prediction

//! Scans javac invocations and determines the output artifacts a
//! compilation produces, either by predicting them from declaration
//! trees or by intercepting the compiler's file writes.

// Module declarations
pub mod decl;
pub mod javac;
pub mod jdk;
pub mod options;
pub mod paths;
pub mod predict;
pub mod scanner;
pub mod toolchain;

// Re-export all public types for convenient access
pub use decl::{CompilationUnit, Declaration, FieldDecl, MethodDecl, TypeDecl, binary_name};
pub use javac::{COMPILER_RECOGNIZER, FILE_MANAGER_RECOGNIZER, JavacToolchain, TableRecognizer};
pub use jdk::{JavacInfo, ToolchainError, discover_javac};
pub use options::{ArgumentError, CompilerOptions, OptionRecognizer, SourceRelease};
pub use paths::{predicted_class_path, predicted_header_path};
pub use predict::{ArtifactPredictor, BinaryNameSets, PredictError, PredictorEnv};
pub use scanner::{CompilationScanner, MismatchReport, reconcile};
pub use toolchain::{CompileObserver, CompileOutcome, OutputKind, Toolchain};
