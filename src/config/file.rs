use crate::dockerfile::Instruction;
use crate::strategy::BuildStrategy;
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_CONFIG: &str = include_str!("../../default.toml");

#[derive(Error, Debug)]
pub enum Error {
    #[error("read {path}: {err}")]
    ReadFile { err: std::io::Error, path: String },

    #[error("parse {path}: {err}")]
    Parse { err: toml::de::Error, path: String },
}

/// A nid.toml file.
///
/// Every setting is optional so that files can be layered on top of each other;
/// see [`File::overlay`].
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct File {
    pub description: Option<String>,
    pub strategy: Option<BuildStrategy>,
    /// GraalVM JDK token, e.g. `java11`. Detected from the local JVM when unset.
    pub jdk_version: Option<String>,
    pub graalvm_version: Option<String>,
    pub graalvm_registry: Option<String>,
    /// Overrides the image derived from registry, JDK and GraalVM version.
    pub builder_image: Option<String>,
    pub base_image: Option<String>,
    /// Arguments passed to the executable when the container starts.
    pub args: Option<Vec<String>>,
    pub exposed_ports: Option<Vec<u16>>,
    /// Function platform handler; the platform default is used when unset.
    pub default_command: Option<String>,
    /// Custom instructions spliced into the final stage.
    pub instructions: Option<Vec<Instruction>>,
}

impl Default for File {
    fn default() -> Self {
        // The default config is compiled into the program, so
        // make sure to test default() to catch panics compile-time.
        toml::from_str(DEFAULT_CONFIG).unwrap()
    }
}

impl File {
    /// A file with no settings at all.
    pub fn empty() -> Self {
        Self {
            description: None,
            strategy: None,
            jdk_version: None,
            graalvm_version: None,
            graalvm_registry: None,
            builder_image: None,
            base_image: None,
            args: None,
            exposed_ports: None,
            default_command: None,
            instructions: None,
        }
    }

    pub fn parse(toml_string: &str, path: &str) -> Result<Self, Error> {
        toml::from_str(toml_string).map_err(|err| Error::Parse {
            err,
            path: path.to_string(),
        })
    }

    pub fn parse_file(path: &str) -> Result<Self, Error> {
        Self::parse(
            &std::fs::read_to_string(path).map_err(|err| Error::ReadFile {
                err,
                path: path.to_string(),
            })?,
            path,
        )
    }

    /// Read a user configuration file and layer it over the built-in defaults.
    pub fn default_with_user_config_file(path: &str) -> Result<Self, Error> {
        Ok(Self::default().overlay(Self::parse_file(path)?))
    }

    /// Settings present in `top` replace the ones in `self`.
    pub fn overlay(self, top: File) -> Self {
        Self {
            description: top.description.or(self.description),
            strategy: top.strategy.or(self.strategy),
            jdk_version: top.jdk_version.or(self.jdk_version),
            graalvm_version: top.graalvm_version.or(self.graalvm_version),
            graalvm_registry: top.graalvm_registry.or(self.graalvm_registry),
            builder_image: top.builder_image.or(self.builder_image),
            base_image: top.base_image.or(self.base_image),
            args: top.args.or(self.args),
            exposed_ports: top.exposed_ports.or(self.exposed_ports),
            default_command: top.default_command.or(self.default_command),
            instructions: top.instructions.or(self.instructions),
        }
    }
}

#[cfg(test)]
pub mod test {
    use super::File;
    use crate::dockerfile::Instruction;
    use crate::strategy::BuildStrategy;
    use std::io::Write;

    #[test]
    pub fn load_default_configuration() {
        let cfg = File::default();
        assert_eq!(cfg.description, Some("Default configuration file".into()));
        assert_eq!(cfg.strategy, Some(BuildStrategy::Default));
        assert_eq!(cfg.graalvm_version, Some("21.2.0".into()));
        assert_eq!(cfg.graalvm_registry, Some("ghcr.io/graalvm".into()));
        assert_eq!(cfg.base_image, None);
        assert_eq!(cfg.default_command, None);
    }

    #[test]
    pub fn user_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"
            strategy = "managed-lambda"
            base_image = "scratch"
            args = ["--port=8080"]

            [[instructions]]
            type = "env"
            key = "MODE"
            value = "prod"
            "#,
        )
        .unwrap();

        let cfg = File::default_with_user_config_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(cfg.strategy, Some(BuildStrategy::ManagedLambda));
        assert_eq!(cfg.base_image, Some("scratch".into()));
        assert_eq!(cfg.args, Some(vec!["--port=8080".to_string()]));
        assert_eq!(cfg.instructions, Some(vec![Instruction::env("MODE", "prod")]));
        // untouched settings keep their defaults
        assert_eq!(cfg.graalvm_version, Some("21.2.0".into()));
    }

    #[test]
    pub fn unknown_settings_are_rejected() {
        let err = File::parse("base_imgae = \"scratch\"", "nid.toml").unwrap_err();
        assert!(err.to_string().starts_with("parse nid.toml:"));
    }

    #[test]
    pub fn missing_file_is_an_error() {
        let err = File::parse_file("/nonexistent/nid.toml").unwrap_err();
        assert!(matches!(err, super::Error::ReadFile { .. }));
    }
}
