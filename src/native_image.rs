//! The native compile task that feeds the Dockerfile, and the changes
//! the synthesis asks its owner to make.

use crate::dockerfile::Instruction;
use serde::{Deserialize, Serialize};
use serde_inline_default::serde_inline_default;
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// Executable name of the native-image tool inside the builder stage.
pub const NATIVE_IMAGE_EXECUTABLE: &str = "native-image";

/// Name of the executable produced inside the builder stage.
pub const IMAGE_NAME: &str = "application";

#[derive(Error, Debug)]
pub enum Error {
    #[error("read {path}: {err}")]
    ReadFile { err: std::io::Error, path: String },

    #[error("deserialize: {0}")]
    Deserialize(#[from] serde_json::Error),
}

/// Native image compile task, as resolved by the host build.
#[serde_inline_default]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct NativeImageTask {
    #[serde_inline_default(NATIVE_IMAGE_EXECUTABLE.to_string())]
    pub executable: String,

    #[serde(default)]
    pub image_name: Option<String>,

    /// Entry class compiled into the executable.
    #[serde(default)]
    pub main: Option<String>,

    /// The project's application main class setting.
    #[serde(default)]
    pub main_class: Option<String>,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub jvm_args: Vec<String>,

    #[serde(default)]
    pub system_properties: BTreeMap<String, String>,

    #[serde(default)]
    pub classpath: Vec<String>,

    /// Host directories holding native-image configuration and resources.
    #[serde(default)]
    pub config_directories: Vec<PathBuf>,

    /// Instructions staging the resource directories into the builder stage.
    #[serde(default)]
    pub staging: Vec<Instruction>,
}

impl Default for NativeImageTask {
    fn default() -> Self {
        Self {
            executable: NATIVE_IMAGE_EXECUTABLE.to_string(),
            image_name: None,
            main: None,
            main_class: None,
            args: vec![],
            jvm_args: vec![],
            system_properties: BTreeMap::new(),
            classpath: vec![],
            config_directories: vec![],
            staging: vec![],
        }
    }
}

impl NativeImageTask {
    pub fn parse(json_string: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json_string)?)
    }

    pub fn parse_file(path: &str) -> Result<Self, Error> {
        Self::parse(
            &std::fs::read_to_string(path).map_err(|err| Error::ReadFile {
                err,
                path: path.to_string(),
            })?,
        )
    }

    /// The native-image invocation, one token per element.
    pub fn command_line(&self) -> Vec<String> {
        let mut line = vec![self.executable.clone()];
        if !self.classpath.is_empty() {
            line.push("-cp".to_string());
            line.push(self.classpath.join(":"));
        }
        line.extend(self.jvm_args.iter().map(|arg| format!("-J{arg}")));
        line.extend(
            self.system_properties
                .iter()
                .map(|(key, value)| format!("-D{key}={value}")),
        );
        if let Some(image_name) = &self.image_name {
            line.push(format!("-H:Name={image_name}"));
        }
        if let Some(main) = &self.main {
            line.push(format!("-H:Class={main}"));
        }
        line.extend(self.args.iter().cloned());
        line
    }

    /// A copy of this task with `patch` applied.
    pub fn patched(&self, patch: &TaskPatch) -> Self {
        let mut task = self.clone();
        if patch.clear_classpath {
            task.classpath.clear();
        }
        if let Some(executable) = &patch.executable {
            task.executable = executable.clone();
        }
        if let Some(image_name) = &patch.image_name {
            task.image_name = Some(image_name.clone());
        }
        if let Some(main) = &patch.main {
            task.main = Some(main.clone());
        }
        if let Some(main_class) = &patch.main_class {
            task.main_class = Some(main_class.clone());
        }
        task.args.extend(patch.extra_args.iter().cloned());
        task
    }
}

/// Changes the Dockerfile synthesis needs applied to the native compile task
/// and the project, so that the in-container build matches the Dockerfile.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskPatch {
    /// The classpath is baked into the container; the host classpath is irrelevant.
    pub clear_classpath: bool,
    pub executable: Option<String>,
    pub image_name: Option<String>,
    pub main: Option<String>,
    pub main_class: Option<String>,
    /// Appended to the task's compile arguments.
    pub extra_args: Vec<String>,
}
