use std::env;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::debug;

use crate::options::SourceRelease;

#[derive(Error, Debug)]
pub enum ToolchainError {
    #[error("JDK not found: {0}")]
    JdkNotFound(String),
    #[error("Failed to parse javac version: {0}")]
    VersionParse(String),
}

/// A javac binary bound to the release it supports.
#[derive(Debug, Clone)]
pub struct JavacInfo {
    pub javac_path: PathBuf,
    pub latest_release: SourceRelease,
}

/// Locates the system javac and probes its latest supported release.
pub fn discover_javac() -> Result<JavacInfo, ToolchainError> {
    let javac_path = find_javac().ok_or_else(|| {
        ToolchainError::JdkNotFound("Unable to locate 'javac'. Ensure a JDK is installed.".into())
    })?;

    let latest_release = probe_release(&javac_path)?;
    debug!(javac = %javac_path.display(), release = %latest_release, "discovered javac");

    Ok(JavacInfo {
        javac_path,
        latest_release,
    })
}

/// Discovery cascade: `JAVA_HOME`/`JDK_HOME`, the `PATH`, then the
/// platform's usual installation roots.
pub fn find_javac() -> Option<PathBuf> {
    find_javac_from_env()
        .or_else(find_javac_in_path)
        .or_else(search_known_installations)
}

fn find_javac_from_env() -> Option<PathBuf> {
    for var in ["JAVA_HOME", "JDK_HOME"] {
        if let Ok(value) = env::var(var) {
            if let Some(javac) = javac_from_home(Path::new(&value)) {
                return Some(javac);
            }
        }
    }
    None
}

fn find_javac_in_path() -> Option<PathBuf> {
    which::which("javac").ok()
}

fn search_known_installations() -> Option<PathBuf> {
    for root in known_jdk_roots() {
        if let Some(found) = search_root_for_javac(&root) {
            return Some(found);
        }
    }
    None
}

fn known_jdk_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();

    #[cfg(target_os = "windows")]
    {
        roots.push(PathBuf::from(r"C:\Program Files\Java"));
        roots.push(PathBuf::from(r"C:\Program Files\Eclipse Adoptium"));
        roots.push(PathBuf::from(r"C:\Program Files\Microsoft"));
        if let Some(dir) = env::var_os("ProgramFiles").map(PathBuf::from) {
            roots.push(dir.join("Java"));
            roots.push(dir.join("Zulu"));
        }
    }

    #[cfg(target_os = "macos")]
    {
        roots.push(PathBuf::from("/Library/Java/JavaVirtualMachines"));
        roots.push(PathBuf::from("/usr/local/Cellar/openjdk"));
        roots.push(PathBuf::from("/opt/homebrew/Cellar/openjdk"));
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        roots.push(PathBuf::from("/usr/lib/jvm"));
        roots.push(PathBuf::from("/usr/java"));
        roots.push(PathBuf::from("/opt/java"));
        roots.push(PathBuf::from("/opt/jdk"));
    }

    roots
}

fn search_root_for_javac(root: &Path) -> Option<PathBuf> {
    if !root.is_dir() {
        return None;
    }

    if let Some(javac) = javac_from_home(root) {
        return Some(javac);
    }

    if let Ok(entries) = fs::read_dir(root) {
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }

            // macOS bundles keep the JDK under Contents/Home.
            #[cfg(target_os = "macos")]
            let candidate = {
                let contents_home = path.join("Contents").join("Home");
                if contents_home.exists() {
                    contents_home
                } else {
                    path
                }
            };

            #[cfg(not(target_os = "macos"))]
            let candidate = path;

            if let Some(javac) = javac_from_home(&candidate) {
                return Some(javac);
            }
        }
    }

    None
}

fn javac_from_home(home: &Path) -> Option<PathBuf> {
    let exe_name = javac_executable();

    let candidate = home.join("bin").join(exe_name);
    if candidate.exists() {
        return Some(candidate);
    }

    if home.ends_with("bin") {
        let candidate = home.join(exe_name);
        if candidate.exists() {
            return Some(candidate);
        }
    }

    if home.file_name() == Some(OsStr::new(exe_name)) && home.is_file() {
        return Some(home.to_path_buf());
    }

    None
}

/// Runs `javac -version` and interprets the reported version. Modern
/// JDKs print to stdout, JDK 8 and older to stderr.
pub fn probe_release(javac_path: &Path) -> Result<SourceRelease, ToolchainError> {
    let output = Command::new(javac_path)
        .arg("-version")
        .output()
        .map_err(|error| {
            ToolchainError::JdkNotFound(format!(
                "Failed to run '{} -version': {}",
                javac_path.display(),
                error
            ))
        })?;

    let mut version_output = String::from_utf8_lossy(&output.stdout).to_string();
    if version_output.trim().is_empty() {
        version_output = String::from_utf8_lossy(&output.stderr).to_string();
    }

    parse_release(&version_output).map_err(|error| ToolchainError::VersionParse(error.to_string()))
}

fn parse_release(output: &str) -> Result<SourceRelease, &'static str> {
    if let Some(token) = extract_version_token(output) {
        return interpret_version_token(token)
            .map(SourceRelease)
            .ok_or("Unsupported version token format");
    }
    Err("Failed to locate version token in output")
}

/// Picks the version token out of `javac -version` output, e.g.
/// `javac 21.0.2` or `javac 1.8.0_362`. Some launchers quote the token.
fn extract_version_token(output: &str) -> Option<&str> {
    for line in output.lines() {
        for word in line.split_whitespace() {
            let word = word.trim_matches('"');
            if word.chars().next().map_or(false, |ch| ch.is_ascii_digit()) {
                return Some(word);
            }
        }
    }
    None
}

fn interpret_version_token(token: &str) -> Option<u32> {
    if let Some(stripped) = token.strip_prefix("1.") {
        let mut parts = stripped.split(|ch| ch == '.' || ch == '_' || ch == '-');
        let minor = parts.next()?;
        return minor
            .chars()
            .take_while(|ch| ch.is_ascii_digit())
            .collect::<String>()
            .parse::<u32>()
            .ok();
    }

    let digits: String = token.chars().take_while(|ch| ch.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else {
        digits.parse::<u32>().ok()
    }
}

fn javac_executable() -> &'static str {
    if cfg!(windows) { "javac.exe" } else { "javac" }
}
