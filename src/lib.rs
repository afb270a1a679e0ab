//! Dockerfile generation for GraalVM native image builds.
//!
//! Given a resolved [`config::runtime::Config`] and the native compile task of the
//! host build, [`assembler::synthesize`] produces a multi-stage Dockerfile that
//! compiles the native executable in a GraalVM stage and packages it for one
//! of the [`strategy::BuildStrategy`] targets.

pub mod assembler;
pub mod command_line;
pub mod config;
pub mod docker;
pub mod dockerfile;
pub mod jvm;
pub mod native_image;
pub mod strategy;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration file: {0}")]
    ConfigParse(#[from] config::file::Error),

    #[error("native image task: {0}")]
    NativeImageTask(#[from] native_image::Error),

    #[error("generate Dockerfile: {0}")]
    Synthesis(#[from] assembler::Error),

    #[error("write Dockerfile: {0}")]
    Docker(#[from] docker::Error),

    #[error("serialize task patch: {0}")]
    Serialize(#[from] serde_json::Error),
}
