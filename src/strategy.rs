use crate::config::runtime::Config;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Runtime image used when no base image is configured.
pub const DEFAULT_BASE_IMAGE: &str = "frolvlad/alpine-glibc:alpine-3.12";

/// Runtime image used for managed lambdas when no base image is configured.
pub const LAMBDA_BASE_IMAGE: &str = "amazonlinux:latest";

/// How the native executable is packaged.
#[derive(Serialize, Deserialize, ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BuildStrategy {
    /// Generic container running the executable directly.
    #[default]
    Default,

    /// Function platform container built on the function runtime SDK.
    #[serde(alias = "oracle-function")]
    #[value(alias = "oracle-function")]
    FunctionPlatform,

    /// Managed lambda runtime, packaged as a zipped `bootstrap` + executable.
    #[serde(alias = "lambda")]
    #[value(alias = "lambda")]
    ManagedLambda,
}

impl Display for BuildStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            BuildStrategy::Default => "default",
            BuildStrategy::FunctionPlatform => "function-platform",
            BuildStrategy::ManagedLambda => "managed-lambda",
        })
    }
}

impl BuildStrategy {
    /// The configured base image verbatim, or this strategy's default.
    pub fn resolve_base_image(&self, configured: Option<&str>) -> String {
        match (configured, self) {
            (Some(image), _) => image.to_string(),
            (None, BuildStrategy::ManagedLambda) => LAMBDA_BASE_IMAGE.to_string(),
            (None, _) => DEFAULT_BASE_IMAGE.to_string(),
        }
    }
}

/// Where the GraalVM toolchain comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toolchain {
    /// A published GraalVM image that only lacks the native-image component.
    Image(String),

    /// No published image fits the target, so GraalVM is downloaded and installed
    /// on a generic Linux base.
    Bootstrap {
        jdk_version: String,
        graalvm_version: String,
    },
}

/// Images chosen for a single synthesis run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub base_image: String,
    pub toolchain: Toolchain,
}

pub fn resolve(config: &Config) -> Resolved {
    let toolchain = match config.strategy {
        BuildStrategy::ManagedLambda => Toolchain::Bootstrap {
            jdk_version: config.jdk_version.clone(),
            graalvm_version: config.graalvm_version.clone(),
        },
        BuildStrategy::Default | BuildStrategy::FunctionPlatform => {
            Toolchain::Image(config.builder_image.clone())
        }
    };

    Resolved {
        base_image: config
            .strategy
            .resolve_base_image(config.base_image.as_deref()),
        toolchain,
    }
}
