/// Package separator in binary names.
pub const PACKAGE_SEPARATOR: char = '.';
/// Nested-type separator in binary names.
pub const NESTED_SEPARATOR: char = '$';

/// The declaration tree of one compiled source file, reduced to the
/// facts output prediction needs. Types nest through [`TypeDecl::members`];
/// methods and fields are leaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationUnit {
    /// `None` for the unnamed package.
    pub package_name: Option<String>,
    pub declarations: Vec<Declaration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    Type(TypeDecl),
    Method(MethodDecl),
    Field(FieldDecl),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub simple_name: String,
    pub members: Vec<Declaration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    pub name: String,
    pub is_native: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: String,
    /// Fully qualified annotation names carried by the field.
    pub annotations: Vec<String>,
}

/// Resolves the binary name of a type declaration. Nested types join
/// their enclosing type with `$`; top-level types join their package
/// with `.`.
pub fn binary_name(
    package_name: Option<&str>,
    enclosing_type: Option<&str>,
    simple_name: &str,
) -> String {
    if let Some(enclosing) = enclosing_type {
        return format!("{enclosing}{NESTED_SEPARATOR}{simple_name}");
    }
    match package_name {
        Some(package) if !package.is_empty() => {
            format!("{package}{PACKAGE_SEPARATOR}{simple_name}")
        }
        _ => simple_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_type_joins_package_with_dot() {
        assert_eq!(binary_name(Some("a.b"), None, "C"), "a.b.C");
    }

    #[test]
    fn unnamed_package_uses_simple_name() {
        assert_eq!(binary_name(None, None, "C"), "C");
        assert_eq!(binary_name(Some(""), None, "C"), "C");
    }

    #[test]
    fn nested_type_joins_enclosing_with_dollar() {
        assert_eq!(binary_name(Some("a.b"), Some("a.b.C"), "D"), "a.b.C$D");
    }

    #[test]
    fn deeply_nested_types_accumulate_separators() {
        let outer = binary_name(Some("a"), None, "C");
        let middle = binary_name(Some("a"), Some(&outer), "D");
        let inner = binary_name(Some("a"), Some(&middle), "E");
        assert_eq!(inner, "a.C$D$E");
    }
}
