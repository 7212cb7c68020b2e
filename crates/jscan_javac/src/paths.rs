use std::path::{MAIN_SEPARATOR, MAIN_SEPARATOR_STR};

use crate::decl::{NESTED_SEPARATOR, PACKAGE_SEPARATOR};

/// Path the compiler will give a class file: output directory plus the
/// binary name with package separators turned into path separators. The
/// nested-type separator stays in the file name.
pub fn predicted_class_path(class_dir: &str, binary_name: &str) -> String {
    format!(
        "{}{}{}.class",
        class_dir.replace('/', MAIN_SEPARATOR_STR),
        MAIN_SEPARATOR,
        binary_name.replace(PACKAGE_SEPARATOR, MAIN_SEPARATOR_STR)
    )
}

/// Path the compiler will give a native header: output directory plus
/// the binary name with both separators flattened to underscores.
pub fn predicted_header_path(header_dir: &str, binary_name: &str) -> String {
    format!(
        "{}{}{}.h",
        header_dir.replace('/', MAIN_SEPARATOR_STR),
        MAIN_SEPARATOR,
        binary_name
            .replace(PACKAGE_SEPARATOR, "_")
            .replace(NESTED_SEPARATOR, "_")
    )
}
