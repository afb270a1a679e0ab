//! Assembles the multi-stage Dockerfile that compiles a native executable and
//! packages it for the configured build strategy.

use crate::command_line;
use crate::config::runtime::Config;
use crate::dockerfile::{Dockerfile, Instruction};
use crate::native_image::{NativeImageTask, TaskPatch, IMAGE_NAME, NATIVE_IMAGE_EXECUTABLE};
use crate::strategy::{self, BuildStrategy, Toolchain};
use log::{debug, info, warn};
use thiserror::Error;

/// Stage that holds GraalVM and compiles the executable.
pub const TOOLCHAIN_STAGE: &str = "graalvm";

/// Second compile stage of the managed lambda toolchain bootstrap.
pub const BUILDER_STAGE: &str = "builder";

/// Stage holding the function runtime SDK libraries.
pub const FDK_STAGE: &str = "fnfdk";

/// Path of the compiled executable inside the compile stage.
pub const COMPILED_EXECUTABLE: &str = "/home/app/application";

const GRAALVM_HOME: &str = "/usr/lib/graalvm";
const GRAALVM_RELEASES: &str = "https://github.com/graalvm/graalvm-ce-builds/releases/download";
const LAMBDA_TOOLCHAIN_BASE_IMAGE: &str = "amazonlinux:latest";
const LAMBDA_TOOLCHAIN_PACKAGES: &str =
    "gcc gcc-c++ libc6-dev zlib1g-dev curl bash zlib zlib-devel zlib-static zip tar gzip";
const LAMBDA_RUNTIME_MAIN: &str = "io.micronaut.function.aws.runtime.MicronautLambdaRuntime";

const FDK_IMAGE: &str = "fnproject/fn-java-fdk";
const FUNCTION_DIR: &str = "/function";
const FUNCTION_MAIN: &str = "com.fnproject.fn.runtime.EntryPoint";
const FUNCTION_HANDLER: &str = "io.micronaut.oraclecloud.function.http.HttpFunction::handleRequest";

const APPLICATION_PATH: &str = "/app/application";

/// Base images carrying this marker need the C++ runtime installed.
const ALPINE_GLIBC_MARKER: &str = "alpine-glibc";

#[derive(Error, Debug)]
pub enum Error {
    #[error("no native image task present, a native compile task is required to generate the Dockerfile")]
    NoNativeImageTask,
}

/// Result of a synthesis run.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    pub dockerfile: Dockerfile,

    /// Changes the owner of the native compile task must apply.
    pub patch: TaskPatch,
}

/// Changes to the compile task required by `strategy`.
pub fn task_patch(strategy: BuildStrategy, task: &NativeImageTask) -> TaskPatch {
    let mut patch = TaskPatch {
        clear_classpath: true,
        executable: Some(NATIVE_IMAGE_EXECUTABLE.to_string()),
        image_name: Some(IMAGE_NAME.to_string()),
        ..Default::default()
    };

    match strategy {
        BuildStrategy::Default => {}
        BuildStrategy::FunctionPlatform => {
            patch.main = Some(FUNCTION_MAIN.to_string());
            patch.main_class = Some(FUNCTION_MAIN.to_string());
            patch
                .extra_args
                .push("--report-unsupported-elements-at-runtime".to_string());
        }
        BuildStrategy::ManagedLambda => {
            if task.main.is_none() {
                patch.main = Some(LAMBDA_RUNTIME_MAIN.to_string());
            }
            if task.main_class.is_none() {
                patch.main_class = Some(LAMBDA_RUNTIME_MAIN.to_string());
            }
        }
    }

    debug!("Native image task patch: {patch:?}");
    patch
}

/// Generate the Dockerfile for `config`.
///
/// Fails before producing anything when there is no native compile task.
pub fn synthesize(config: &Config, task: Option<&NativeImageTask>) -> Result<Synthesis, Error> {
    let task = task.ok_or(Error::NoNativeImageTask)?;
    let resolved = strategy::resolve(config);
    info!(
        "Generating {} Dockerfile with base image {}",
        config.strategy, resolved.base_image
    );

    let patch = task_patch(config.strategy, task);
    let compile = command_line::rewrite(
        task.patched(&patch).command_line(),
        &task.config_directories,
        &resolved.base_image,
    );

    let mut instructions = toolchain(&resolved.toolchain);
    instructions.extend(task.staging.iter().cloned());
    instructions.push(Instruction::run(command_line::render(&compile)));

    let custom = config.instructions.as_slice();
    instructions.extend(match config.strategy {
        BuildStrategy::Default => default_stage(config, &resolved.base_image, custom),
        BuildStrategy::FunctionPlatform => {
            if !custom.is_empty() {
                warn!(
                    "Ignoring {} custom instruction(s), they are not supported by the {} strategy",
                    custom.len(),
                    config.strategy
                );
            }
            function_stage(config, &resolved.base_image)
        }
        BuildStrategy::ManagedLambda => lambda_stage(config, &resolved.base_image, custom),
    });

    Ok(Synthesis {
        dockerfile: Dockerfile::new(instructions),
        patch,
    })
}

/// Stage(s) providing GraalVM with the native-image component.
fn toolchain(toolchain: &Toolchain) -> Vec<Instruction> {
    match toolchain {
        Toolchain::Image(image) => vec![
            Instruction::from_stage(image, TOOLCHAIN_STAGE),
            Instruction::run("gu install native-image"),
        ],
        Toolchain::Bootstrap {
            jdk_version,
            graalvm_version,
        } => {
            let archive = format!("graalvm-ce-{jdk_version}-linux-amd64-{graalvm_version}.tar.gz");
            vec![
                Instruction::from_stage(LAMBDA_TOOLCHAIN_BASE_IMAGE, TOOLCHAIN_STAGE),
                Instruction::env("LANG", "en_US.UTF-8"),
                Instruction::run(format!("yum install -y {LAMBDA_TOOLCHAIN_PACKAGES}")),
                Instruction::run(format!(
                    "curl -4 -L {GRAALVM_RELEASES}/vm-{graalvm_version}/{archive} -o /tmp/{archive}"
                )),
                Instruction::run(format!(
                    "tar -zxf /tmp/{archive} -C /tmp && mv /tmp/graalvm-ce-{jdk_version}-{graalvm_version} {GRAALVM_HOME}"
                )),
                Instruction::run("rm -rf /tmp/*"),
                Instruction::run(format!("{GRAALVM_HOME}/bin/gu install native-image")),
                Instruction::cmd(format!("{GRAALVM_HOME}/bin/native-image")),
                Instruction::env("PATH", format!("{GRAALVM_HOME}/bin:${{PATH}}")),
                Instruction::from_stage(TOOLCHAIN_STAGE, BUILDER_STAGE),
            ]
        }
    }
}

fn default_stage(config: &Config, base_image: &str, custom: &[Instruction]) -> Vec<Instruction> {
    let mut instructions = vec![Instruction::from_image(base_image)];
    if base_image.contains(ALPINE_GLIBC_MARKER) {
        instructions.push(Instruction::run("apk update && apk add libstdc++"));
    }
    if !config.exposed_ports.is_empty() {
        instructions.push(Instruction::Expose {
            ports: config.exposed_ports.clone(),
        });
    }
    instructions.extend(custom.iter().cloned());
    instructions.push(Instruction::copy_from(
        TOOLCHAIN_STAGE,
        COMPILED_EXECUTABLE,
        APPLICATION_PATH,
    ));
    instructions.push(Instruction::entrypoint(
        std::iter::once(APPLICATION_PATH.to_string()).chain(config.args.iter().cloned()),
    ));
    instructions
}

fn function_stage(config: &Config, base_image: &str) -> Vec<Instruction> {
    let argv = std::iter::once("./func".to_string())
        .chain(config.args.iter().cloned())
        .chain(std::iter::once(format!("-Djava.library.path={FUNCTION_DIR}")));

    vec![
        Instruction::from_stage(format!("{FDK_IMAGE}:{}", config.fdk_version), FDK_STAGE),
        Instruction::from_image(base_image),
        Instruction::workdir(FUNCTION_DIR),
        Instruction::copy_from(
            TOOLCHAIN_STAGE,
            COMPILED_EXECUTABLE,
            format!("{FUNCTION_DIR}/func"),
        ),
        Instruction::copy_from(FDK_STAGE, format!("{FUNCTION_DIR}/runtime/lib/*"), "."),
        Instruction::entrypoint(argv),
        Instruction::cmd(
            config
                .default_command
                .as_deref()
                .unwrap_or(FUNCTION_HANDLER),
        ),
    ]
}

fn lambda_stage(config: &Config, base_image: &str, custom: &[Instruction]) -> Vec<Instruction> {
    let invocation = std::iter::once("./func".to_string())
        .chain(config.args.iter().cloned())
        .chain(std::iter::once("-Djava.library.path=$(pwd)".to_string()))
        .collect::<Vec<_>>()
        .join(" ");

    let mut instructions = vec![
        Instruction::from_image(base_image),
        Instruction::workdir(FUNCTION_DIR),
        Instruction::run("yum install -y zip"),
        Instruction::copy_from(BUILDER_STAGE, COMPILED_EXECUTABLE, format!("{FUNCTION_DIR}/func")),
        Instruction::run(format!(
            "echo \"#!/bin/sh\" >> bootstrap && echo \"set -euo pipefail\" >> bootstrap && echo \"{invocation}\" >> bootstrap"
        )),
        Instruction::run("chmod 777 bootstrap"),
        Instruction::run("chmod 777 func"),
        Instruction::run("zip -j function.zip bootstrap func"),
    ];
    instructions.extend(custom.iter().cloned());
    // The lambda runtime invokes `bootstrap`; args only reach the executable through it.
    instructions.push(Instruction::entrypoint([format!("{FUNCTION_DIR}/func")]));
    instructions
}
