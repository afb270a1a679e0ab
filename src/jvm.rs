use log::debug;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::process::Command;

/// Major feature release of a Java runtime, e.g. `8`, `11` or `17`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct JavaVersion(pub u32);

impl JavaVersion {
    /// Parse a version string as printed by `java -version`.
    ///
    /// Handles both the legacy `1.8.0_292` scheme and the modern
    /// `17.0.2` / `16` / `11-ea` schemes.
    pub fn parse(version: &str) -> Option<Self> {
        let mut parts = version
            .trim()
            .split(|c: char| matches!(c, '.' | '_' | '-' | '+'));
        let first: u32 = parts.next()?.parse().ok()?;
        if first == 1 {
            parts.next()?.parse().ok().map(JavaVersion)
        } else {
            Some(JavaVersion(first))
        }
    }

    pub fn is_compatible_with(&self, major: u32) -> bool {
        self.0 >= major
    }

    pub fn is_java11_compatible(&self) -> bool {
        self.is_compatible_with(11)
    }
}

impl Display for JavaVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// GraalVM image token for the given Java version.
pub fn jdk_version_token(version: Option<JavaVersion>) -> &'static str {
    match version {
        Some(version) if version.is_compatible_with(16) => "java16",
        Some(version) if version.is_java11_compatible() => "java11",
        _ => "java8",
    }
}

/// Tag of the function runtime SDK image matching the given Java version.
pub fn fdk_version_tag(version: Option<JavaVersion>) -> &'static str {
    match version {
        Some(version) if version.is_java11_compatible() => "jre11-latest",
        _ => "latest",
    }
}

/// Extract the quoted version from a `java -version` banner, e.g.
/// `openjdk version "17.0.2" 2022-01-18`.
fn parse_banner(banner: &str) -> Option<JavaVersion> {
    let start = banner.find('"')? + 1;
    let end = banner[start..].find('"')? + start;
    JavaVersion::parse(&banner[start..end])
}

/// Detect the Java version of the JVM in `JAVA_HOME`, or the first `java` on `PATH`.
///
/// Any failure to run or parse is reported as an unknown version.
pub fn detect() -> Option<JavaVersion> {
    let java = std::env::var_os("JAVA_HOME")
        .map(|home| PathBuf::from(home).join("bin").join("java"))
        .unwrap_or_else(|| PathBuf::from("java"));

    let output = match Command::new(&java).arg("-version").output() {
        Ok(output) => output,
        Err(err) => {
            debug!("Unable to run {}: {err}", java.display());
            return None;
        }
    };

    // The banner goes to stderr on every JDK we know of.
    let version = parse_banner(&String::from_utf8_lossy(&output.stderr))
        .or_else(|| parse_banner(&String::from_utf8_lossy(&output.stdout)));
    match version {
        Some(version) => debug!("Detected Java {version} from {}", java.display()),
        None => debug!("Could not determine Java version from {}", java.display()),
    }
    version
}
