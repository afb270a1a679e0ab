use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// A single Dockerfile instruction.
///
/// Custom instructions and resource staging instructions are supplied
/// through TOML or JSON, tagged by `type`:
///
/// ```toml
/// [[instructions]]
/// type = "run"
/// command = "apk add curl"
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Instruction {
    /// `FROM <image> [AS <stage>]`
    From {
        image: String,
        stage: Option<String>,
    },
    /// `RUN <command>`
    Run { command: String },
    /// `COPY [--from=<stage>] <source> <destination>`
    Copy {
        source: String,
        destination: String,
        stage: Option<String>,
    },
    /// `ENV <key>=<value>`
    Env { key: String, value: String },
    /// `WORKDIR <path>`
    #[serde(rename = "workdir")]
    WorkDir { path: String },
    /// `EXPOSE <port>...`
    Expose { ports: Vec<u16> },
    /// `ENTRYPOINT ["argv", ...]`
    #[serde(rename = "entrypoint")]
    EntryPoint { argv: Vec<String> },
    /// `CMD ["text"]`
    Cmd { text: String },
}

impl Instruction {
    pub fn from_image(image: impl Into<String>) -> Self {
        Self::From {
            image: image.into(),
            stage: None,
        }
    }

    pub fn from_stage(image: impl Into<String>, stage: impl Into<String>) -> Self {
        Self::From {
            image: image.into(),
            stage: Some(stage.into()),
        }
    }

    pub fn run(command: impl Into<String>) -> Self {
        Self::Run {
            command: command.into(),
        }
    }

    /// Copy a file out of an earlier build stage.
    pub fn copy_from(
        stage: impl Into<String>,
        source: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self::Copy {
            source: source.into(),
            destination: destination.into(),
            stage: Some(stage.into()),
        }
    }

    pub fn env(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Env {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn workdir(path: impl Into<String>) -> Self {
        Self::WorkDir { path: path.into() }
    }

    pub fn entrypoint<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::EntryPoint {
            argv: argv.into_iter().map(Into::into).collect(),
        }
    }

    pub fn cmd(text: impl Into<String>) -> Self {
        Self::Cmd { text: text.into() }
    }
}

/// Exec form arrays are JSON string arrays, elements separated by `", "`.
fn exec_form(argv: &[String]) -> Result<String, std::fmt::Error> {
    let elements = argv
        .iter()
        .map(|arg| serde_json::to_string(arg).map_err(|_| std::fmt::Error))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("[{}]", elements.join(", ")))
}

impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Instruction::From { image, stage: None } => write!(f, "FROM {image}"),
            Instruction::From {
                image,
                stage: Some(stage),
            } => write!(f, "FROM {image} AS {stage}"),
            Instruction::Run { command } => write!(f, "RUN {command}"),
            Instruction::Copy {
                source,
                destination,
                stage,
            } => match stage {
                Some(stage) => write!(f, "COPY --from={stage} {source} {destination}"),
                None => write!(f, "COPY {source} {destination}"),
            },
            Instruction::Env { key, value } => {
                if value.chars().any(char::is_whitespace) {
                    let quoted = serde_json::to_string(value).map_err(|_| std::fmt::Error)?;
                    write!(f, "ENV {key}={quoted}")
                } else {
                    write!(f, "ENV {key}={value}")
                }
            }
            Instruction::WorkDir { path } => write!(f, "WORKDIR {path}"),
            Instruction::Expose { ports } => {
                let ports = ports
                    .iter()
                    .map(u16::to_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                write!(f, "EXPOSE {ports}")
            }
            Instruction::EntryPoint { argv } => write!(f, "ENTRYPOINT {}", exec_form(argv)?),
            Instruction::Cmd { text } => {
                write!(f, "CMD {}", exec_form(std::slice::from_ref(text))?)
            }
        }
    }
}

/// An ordered, possibly multi-stage, sequence of instructions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dockerfile {
    instructions: Vec<Instruction>,
}

impl Dockerfile {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Names of all named stages, in declaration order.
    pub fn stages(&self) -> Vec<&str> {
        self.instructions
            .iter()
            .filter_map(|instruction| match instruction {
                Instruction::From {
                    stage: Some(stage), ..
                } => Some(stage.as_str()),
                _ => None,
            })
            .collect()
    }

    /// The argv of the last `ENTRYPOINT`, which is the one Docker honours.
    pub fn entrypoint(&self) -> Option<&[String]> {
        self.instructions
            .iter()
            .rev()
            .find_map(|instruction| match instruction {
                Instruction::EntryPoint { argv } => Some(argv.as_slice()),
                _ => None,
            })
    }
}

impl Display for Dockerfile {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for instruction in &self.instructions {
            writeln!(f, "{instruction}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Dockerfile, Instruction};

    #[test]
    fn render_instructions() {
        let cases = [
            (Instruction::from_image("scratch"), "FROM scratch"),
            (
                Instruction::from_stage("ghcr.io/graalvm/graalvm-ce:java11-21.2.0", "graalvm"),
                "FROM ghcr.io/graalvm/graalvm-ce:java11-21.2.0 AS graalvm",
            ),
            (Instruction::run("gu install native-image"), "RUN gu install native-image"),
            (
                Instruction::copy_from("graalvm", "/home/app/application", "/app/application"),
                "COPY --from=graalvm /home/app/application /app/application",
            ),
            (
                Instruction::Copy {
                    source: "config".into(),
                    destination: "/home/app/config".into(),
                    stage: None,
                },
                "COPY config /home/app/config",
            ),
            (Instruction::env("LANG", "en_US.UTF-8"), "ENV LANG=en_US.UTF-8"),
            (Instruction::env("GREETING", "hello world"), "ENV GREETING=\"hello world\""),
            (Instruction::workdir("/function"), "WORKDIR /function"),
            (Instruction::Expose { ports: vec![8080, 8443] }, "EXPOSE 8080 8443"),
            (
                Instruction::entrypoint(["/app/application", "--port=8080"]),
                r#"ENTRYPOINT ["/app/application", "--port=8080"]"#,
            ),
            (
                Instruction::cmd("io.micronaut.oraclecloud.function.http.HttpFunction::handleRequest"),
                r#"CMD ["io.micronaut.oraclecloud.function.http.HttpFunction::handleRequest"]"#,
            ),
        ];

        for (instruction, expected) in cases {
            assert_eq!(instruction.to_string(), expected);
        }
    }

    #[test]
    fn entrypoint_arguments_are_escaped() {
        let instruction = Instruction::entrypoint(["./func", "--greeting=\"hi\""]);
        assert_eq!(
            instruction.to_string(),
            r#"ENTRYPOINT ["./func", "--greeting=\"hi\""]"#
        );
    }

    #[test]
    fn empty_entrypoint_renders_empty_array() {
        assert_eq!(
            Instruction::entrypoint(Vec::<String>::new()).to_string(),
            "ENTRYPOINT []"
        );
    }

    #[test]
    fn dockerfile_renders_one_instruction_per_line() {
        let dockerfile = Dockerfile::new(vec![
            Instruction::from_stage("builder-image", "graalvm"),
            Instruction::run("make"),
            Instruction::from_image("scratch"),
            Instruction::entrypoint(["/app"]),
        ]);
        assert_eq!(
            dockerfile.to_string(),
            "FROM builder-image AS graalvm\nRUN make\nFROM scratch\nENTRYPOINT [\"/app\"]\n"
        );
        assert_eq!(dockerfile.stages(), vec!["graalvm"]);
        assert_eq!(dockerfile.entrypoint(), Some(&["/app".to_string()][..]));
    }

    #[test]
    fn deserialize_tagged_instructions() {
        #[derive(serde::Deserialize)]
        struct Wrapper {
            instructions: Vec<Instruction>,
        }

        let parsed: Wrapper = toml::from_str(
            r#"
            [[instructions]]
            type = "run"
            command = "apk add curl"

            [[instructions]]
            type = "copy"
            source = "/src"
            destination = "/dst"
            stage = "graalvm"

            [[instructions]]
            type = "workdir"
            path = "/srv"
            "#,
        )
        .unwrap();

        assert_eq!(
            parsed.instructions,
            vec![
                Instruction::run("apk add curl"),
                Instruction::copy_from("graalvm", "/src", "/dst"),
                Instruction::workdir("/srv"),
            ]
        );
    }
}
