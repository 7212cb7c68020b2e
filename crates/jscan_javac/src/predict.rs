use std::collections::BTreeSet;

use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::debug;

use crate::decl::{CompilationUnit, Declaration, binary_name};
use crate::options::SourceRelease;

/// Marker annotation that forces a native header for a constant field.
pub const NATIVE_ANNOTATION: &str = "java.lang.annotation.Native";

#[derive(Error, Debug)]
pub enum PredictError {
    #[error("Declaration scan attempted before the toolchain environment was bound")]
    EnvironmentNotBound,
}

/// Toolchain facts the predictor needs before it can scan declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictorEnv {
    pub latest_release: SourceRelease,
}

/// Binary names collected while scanning, sorted for deterministic
/// artifact ordering downstream.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BinaryNameSets {
    /// Every declared type.
    pub declared_types: BTreeSet<String>,
    /// Types that make the compiler emit a native header.
    pub native_header_types: BTreeSet<String>,
}

/// Collects the binary names of declared types and of types needing a
/// native header, one predictor per compilation run.
///
/// The predictor must be bound to the toolchain environment before the
/// first [`scan_unit`](Self::scan_unit) call. Binding is first-wins so a
/// toolchain that initializes once per processing round, possibly from
/// another thread, stays safe.
#[derive(Debug)]
pub struct ArtifactPredictor {
    env: OnceCell<PredictorEnv>,
    requested_release: SourceRelease,
    names: BinaryNameSets,
}

impl ArtifactPredictor {
    pub fn new(requested_release: SourceRelease) -> Self {
        Self {
            env: OnceCell::new(),
            requested_release,
            names: BinaryNameSets::default(),
        }
    }

    /// The `-source` level the invocation asked for. Header eligibility
    /// deliberately does not read this.
    pub fn requested_release(&self) -> SourceRelease {
        self.requested_release
    }

    /// Binds the toolchain environment. The first bind wins; later calls
    /// are no-ops.
    pub fn bind(&self, env: PredictorEnv) {
        let _ = self.env.set(env);
    }

    pub fn is_bound(&self) -> bool {
        self.env.get().is_some()
    }

    /// Walks one unit's declaration tree and records binary names.
    pub fn scan_unit(&mut self, unit: &CompilationUnit) -> Result<(), PredictError> {
        let env = *self.env.get().ok_or(PredictError::EnvironmentNotBound)?;
        for declaration in &unit.declarations {
            self.scan_declaration(declaration, unit.package_name.as_deref(), None, env);
        }
        Ok(())
    }

    fn scan_declaration(
        &mut self,
        declaration: &Declaration,
        package_name: Option<&str>,
        enclosing_type: Option<&str>,
        env: PredictorEnv,
    ) {
        match declaration {
            Declaration::Type(type_decl) => {
                let name = binary_name(package_name, enclosing_type, &type_decl.simple_name);
                debug!(binary_name = %name, "declared type");
                self.names.declared_types.insert(name.clone());
                for member in &type_decl.members {
                    self.scan_declaration(member, package_name, Some(&name), env);
                }
            }
            Declaration::Method(method) => {
                if method.is_native && native_headers_supported(env) {
                    self.record_header_type(enclosing_type);
                }
            }
            Declaration::Field(field) => {
                if native_headers_supported(env)
                    && field.annotations.iter().any(|name| name == NATIVE_ANNOTATION)
                {
                    self.record_header_type(enclosing_type);
                }
            }
        }
    }

    fn record_header_type(&mut self, enclosing_type: Option<&str>) {
        if let Some(enclosing) = enclosing_type {
            debug!(binary_name = %enclosing, "native header type");
            self.names.native_header_types.insert(enclosing.to_string());
        }
    }

    pub fn names(&self) -> &BinaryNameSets {
        &self.names
    }

    /// Consumes the predictor, yielding the collected sets. The sets are
    /// read exactly once per run.
    pub fn into_names(self) -> BinaryNameSets {
        self.names
    }
}

// Header generation depends on the running toolchain's release, not the
// requested -source level.
fn native_headers_supported(env: PredictorEnv) -> bool {
    env.latest_release >= SourceRelease::RELEASE_8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::{FieldDecl, MethodDecl, TypeDecl};

    fn unit_with(package_name: Option<&str>, declarations: Vec<Declaration>) -> CompilationUnit {
        CompilationUnit {
            package_name: package_name.map(str::to_string),
            declarations,
        }
    }

    fn native_method(name: &str) -> Declaration {
        Declaration::Method(MethodDecl {
            name: name.to_string(),
            is_native: true,
        })
    }

    fn plain_type(simple_name: &str, members: Vec<Declaration>) -> Declaration {
        Declaration::Type(TypeDecl {
            simple_name: simple_name.to_string(),
            members,
        })
    }

    fn bound_predictor(latest: u32) -> ArtifactPredictor {
        let predictor = ArtifactPredictor::new(SourceRelease(latest));
        predictor.bind(PredictorEnv {
            latest_release: SourceRelease(latest),
        });
        predictor
    }

    #[test]
    fn scan_before_bind_is_rejected() {
        let mut predictor = ArtifactPredictor::new(SourceRelease(21));
        let unit = unit_with(None, vec![plain_type("C", vec![])]);
        assert!(matches!(
            predictor.scan_unit(&unit),
            Err(PredictError::EnvironmentNotBound)
        ));
    }

    #[test]
    fn first_bind_wins() {
        let predictor = ArtifactPredictor::new(SourceRelease(21));
        assert!(!predictor.is_bound());
        predictor.bind(PredictorEnv {
            latest_release: SourceRelease(21),
        });
        predictor.bind(PredictorEnv {
            latest_release: SourceRelease(7),
        });
        assert!(predictor.is_bound());

        let mut predictor = predictor;
        let unit = unit_with(
            Some("a"),
            vec![plain_type("C", vec![native_method("m")])],
        );
        predictor.scan_unit(&unit).expect("scan");
        // Still gated on the first environment, release 21.
        assert!(predictor.names().native_header_types.contains("a.C"));
    }

    #[test]
    fn nested_types_get_dollar_separated_names() {
        let mut predictor = bound_predictor(21);
        let unit = unit_with(
            Some("a.b"),
            vec![plain_type("C", vec![plain_type("D", vec![])])],
        );
        predictor.scan_unit(&unit).expect("scan");

        let names: Vec<&str> = predictor
            .names()
            .declared_types
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(names, vec!["a.b.C", "a.b.C$D"]);
    }

    #[test]
    fn three_native_methods_yield_one_header_type() {
        let mut predictor = bound_predictor(21);
        let unit = unit_with(
            Some("a"),
            vec![plain_type(
                "C",
                vec![native_method("m1"), native_method("m2"), native_method("m3")],
            )],
        );
        predictor.scan_unit(&unit).expect("scan");

        assert_eq!(predictor.names().native_header_types.len(), 1);
        assert!(predictor.names().native_header_types.contains("a.C"));
    }

    #[test]
    fn non_native_methods_do_not_mark_header_types() {
        let mut predictor = bound_predictor(21);
        let unit = unit_with(
            Some("a"),
            vec![plain_type(
                "C",
                vec![Declaration::Method(MethodDecl {
                    name: "plain".to_string(),
                    is_native: false,
                })],
            )],
        );
        predictor.scan_unit(&unit).expect("scan");
        assert!(predictor.names().native_header_types.is_empty());
    }

    #[test]
    fn native_annotated_field_marks_enclosing_type() {
        let mut predictor = bound_predictor(21);
        let unit = unit_with(
            Some("a"),
            vec![plain_type(
                "C",
                vec![Declaration::Field(FieldDecl {
                    name: "VALUE".to_string(),
                    annotations: vec![NATIVE_ANNOTATION.to_string()],
                })],
            )],
        );
        predictor.scan_unit(&unit).expect("scan");
        assert!(predictor.names().native_header_types.contains("a.C"));
    }

    #[test]
    fn other_annotations_are_ignored() {
        let mut predictor = bound_predictor(21);
        let unit = unit_with(
            Some("a"),
            vec![plain_type(
                "C",
                vec![Declaration::Field(FieldDecl {
                    name: "VALUE".to_string(),
                    annotations: vec!["java.lang.Deprecated".to_string()],
                })],
            )],
        );
        predictor.scan_unit(&unit).expect("scan");
        assert!(predictor.names().native_header_types.is_empty());
    }

    // The gate reads the running toolchain's release, never the -source
    // level the invocation requested.
    #[test]
    fn header_gate_follows_toolchain_release_not_requested_release() {
        let old_request = ArtifactPredictor::new(SourceRelease(5));
        old_request.bind(PredictorEnv {
            latest_release: SourceRelease(21),
        });
        let mut old_request = old_request;
        let unit = unit_with(
            Some("a"),
            vec![plain_type("C", vec![native_method("m")])],
        );
        old_request.scan_unit(&unit).expect("scan");
        assert!(old_request.names().native_header_types.contains("a.C"));

        let old_toolchain = ArtifactPredictor::new(SourceRelease(7));
        old_toolchain.bind(PredictorEnv {
            latest_release: SourceRelease(7),
        });
        let mut old_toolchain = old_toolchain;
        old_toolchain.scan_unit(&unit).expect("scan");
        assert!(old_toolchain.names().native_header_types.is_empty());
        // Declared types are still collected either way.
        assert!(old_toolchain.names().declared_types.contains("a.C"));
    }

    #[test]
    fn native_method_nested_in_inner_type_marks_the_inner_type() {
        let mut predictor = bound_predictor(21);
        let unit = unit_with(
            Some("a.b"),
            vec![plain_type(
                "C",
                vec![plain_type("D", vec![native_method("m")])],
            )],
        );
        predictor.scan_unit(&unit).expect("scan");
        assert!(predictor.names().native_header_types.contains("a.b.C$D"));
        assert!(!predictor.names().native_header_types.contains("a.b.C"));
    }

    #[test]
    fn into_names_moves_the_collected_sets() {
        let mut predictor = bound_predictor(21);
        let unit = unit_with(None, vec![plain_type("C", vec![])]);
        predictor.scan_unit(&unit).expect("scan");

        let names = predictor.into_names();
        assert!(names.declared_types.contains("C"));
    }
}
