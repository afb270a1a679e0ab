use crate::config::file;
use crate::dockerfile::Instruction;
use crate::jvm::{self, JavaVersion};
use crate::strategy::BuildStrategy;
use log::debug;

/// Fully resolved settings for one synthesis run.
///
/// Every default has been applied by the time this value exists, so nothing
/// downstream needs to consult the environment or the settings file.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub strategy: BuildStrategy,
    /// GraalVM JDK token, e.g. `java11`.
    pub jdk_version: String,
    pub graalvm_version: String,
    pub builder_image: String,
    /// `None` means "use the strategy default".
    pub base_image: Option<String>,
    pub args: Vec<String>,
    pub exposed_ports: Vec<u16>,
    /// `None` means "use the platform handler".
    pub default_command: Option<String>,
    /// Tag of the function runtime SDK image.
    pub fdk_version: String,
    pub instructions: Vec<Instruction>,
}

/// Blank strings are treated the same as a missing setting.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

/// `value`, or the built-in default when it is unset or blank.
fn or_builtin(value: Option<String>, builtin: Option<String>) -> String {
    non_blank(value).or(non_blank(builtin)).unwrap_or_default()
}

impl Config {
    /// Resolve `cfg` against the built-in defaults and the detected Java version.
    pub fn new(cfg: &file::File, java_version: Option<JavaVersion>) -> Self {
        let cfg = cfg.clone();
        let builtin = file::File::default();

        let jdk_version = non_blank(cfg.jdk_version)
            .unwrap_or_else(|| jvm::jdk_version_token(java_version).to_string());
        let graalvm_version = or_builtin(cfg.graalvm_version, builtin.graalvm_version);
        let builder_image = non_blank(cfg.builder_image).unwrap_or_else(|| {
            let registry = or_builtin(cfg.graalvm_registry, builtin.graalvm_registry);
            format!("{registry}/graalvm-ce:{jdk_version}-{graalvm_version}")
        });

        let mut exposed_ports: Vec<u16> = Vec::new();
        for port in cfg.exposed_ports.unwrap_or_default() {
            if !exposed_ports.contains(&port) {
                exposed_ports.push(port);
            }
        }

        let config = Self {
            strategy: cfg.strategy.unwrap_or_default(),
            jdk_version,
            graalvm_version,
            builder_image,
            base_image: non_blank(cfg.base_image),
            args: cfg.args.unwrap_or_default(),
            exposed_ports,
            default_command: non_blank(cfg.default_command),
            fdk_version: jvm::fdk_version_tag(java_version).to_string(),
            instructions: cfg.instructions.unwrap_or_default(),
        };
        debug!("Resolved configuration: {config:?}");
        config
    }
}

#[cfg(test)]
pub mod tests {
    use super::Config;
    use crate::config::file::File;
    use crate::jvm::JavaVersion;
    use crate::strategy::BuildStrategy;

    /// Built-in defaults resolved against a Java 11 runtime.
    pub fn config(strategy: BuildStrategy) -> Config {
        let file = File {
            strategy: Some(strategy),
            ..File::default()
        };
        Config::new(&file, Some(JavaVersion(11)))
    }

    #[test]
    fn defaults() {
        let cfg = config(BuildStrategy::Default);
        assert_eq!(cfg.jdk_version, "java11");
        assert_eq!(cfg.graalvm_version, "21.2.0");
        assert_eq!(cfg.builder_image, "ghcr.io/graalvm/graalvm-ce:java11-21.2.0");
        assert_eq!(cfg.base_image, None);
        assert_eq!(cfg.default_command, None);
        assert_eq!(cfg.fdk_version, "jre11-latest");
        assert!(cfg.args.is_empty());
        assert!(cfg.exposed_ports.is_empty());
        assert!(cfg.instructions.is_empty());
    }

    #[test]
    fn builder_image_follows_versions() {
        let file = File {
            graalvm_version: Some("21.3.0".into()),
            ..File::default()
        };
        let cfg = Config::new(&file, Some(JavaVersion(17)));
        assert_eq!(cfg.jdk_version, "java16");
        assert_eq!(cfg.builder_image, "ghcr.io/graalvm/graalvm-ce:java16-21.3.0");

        let file = File {
            jdk_version: Some("java11".into()),
            ..File::default()
        };
        let cfg = Config::new(&file, None);
        assert_eq!(cfg.builder_image, "ghcr.io/graalvm/graalvm-ce:java11-21.2.0");
        assert_eq!(cfg.fdk_version, "latest");
    }

    #[test]
    fn explicit_builder_image_is_kept() {
        let file = File {
            builder_image: Some("registry.local/graal:custom".into()),
            graalvm_version: Some("22.0.0".into()),
            ..File::default()
        };
        let cfg = Config::new(&file, Some(JavaVersion(11)));
        assert_eq!(cfg.builder_image, "registry.local/graal:custom");
    }

    #[test]
    fn unknown_java_version_falls_back_to_java8() {
        let cfg = Config::new(&File::default(), None);
        assert_eq!(cfg.jdk_version, "java8");
        assert_eq!(cfg.builder_image, "ghcr.io/graalvm/graalvm-ce:java8-21.2.0");
    }

    #[test]
    fn blank_settings_are_unset() {
        let file = File {
            base_image: Some("".into()),
            default_command: Some("  ".into()),
            ..File::default()
        };
        let cfg = Config::new(&file, Some(JavaVersion(11)));
        assert_eq!(cfg.base_image, None);
        assert_eq!(cfg.default_command, None);
    }

    #[test]
    fn duplicate_ports_are_dropped() {
        let file = File {
            exposed_ports: Some(vec![8080, 8443, 8080]),
            ..File::default()
        };
        let cfg = Config::new(&file, Some(JavaVersion(11)));
        assert_eq!(cfg.exposed_ports, vec![8080, 8443]);
    }

    #[test]
    fn blank_versions_fall_back_to_builtin_defaults() {
        let user = File::parse(
            r#"
            graalvm_version = ""
            graalvm_registry = " "
            "#,
            "nid.toml",
        )
        .unwrap();
        let cfg = Config::new(&File::default().overlay(user), Some(JavaVersion(11)));
        assert_eq!(cfg.graalvm_version, "21.2.0");
        assert_eq!(cfg.builder_image, "ghcr.io/graalvm/graalvm-ce:java11-21.2.0");
    }

    #[test]
    fn empty_file_resolves_to_builtin_defaults() {
        let cfg = Config::new(&File::empty(), None);
        assert_eq!(cfg.graalvm_version, "21.2.0");
        assert_eq!(cfg.builder_image, "ghcr.io/graalvm/graalvm-ce:java8-21.2.0");
    }
}
