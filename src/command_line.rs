//! Rewrites the host's native-image command line so it runs inside the builder stage.

use log::debug;
use std::path::{Path, PathBuf};

/// Where resource directories are staged inside the builder stage.
pub const RESOURCES_DIR: &str = "/home/app/resources";

/// Dependency jars inside the builder stage.
pub const LIBS_DIR: &str = "/home/app/libs";

/// Application jar inside the builder stage.
pub const APPLICATION_JAR: &str = "/home/app/application.jar";

/// Produce a fully static executable; only usable on `scratch`.
pub const STATIC_FLAG: &str = "--static";

/// Produce a static executable that still links libc dynamically, for distroless images.
pub const STATIC_DYNAMIC_LIBC_FLAG: &str = "-H:+StaticExecutableWithDynamicLibC";

const PATH_SEPARATOR: &str = ":";

/// Classpath of the application inside the builder stage.
pub fn container_classpath() -> String {
    let libs = format!("{LIBS_DIR}/*.jar");
    [libs.as_str(), RESOURCES_DIR, APPLICATION_JAR].join(PATH_SEPARATOR)
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Replace the first resource directory found in `token` with [`RESOURCES_DIR`].
fn rewrite_token(token: String, resource_dirs: &[String]) -> String {
    match resource_dirs.iter().find(|dir| token.contains(dir.as_str())) {
        Some(dir) => {
            let rewritten = token.replace(dir.as_str(), RESOURCES_DIR);
            debug!("Rewrote resource path: {token} -> {rewritten}");
            rewritten
        }
        None => token,
    }
}

fn has_flag(line: &[String], flag: &str) -> bool {
    line.iter().any(|token| token == flag)
}

/// Rewrite `tokens` for the builder stage of an image based on `base_image`.
pub fn rewrite(tokens: Vec<String>, resource_dirs: &[PathBuf], base_image: &str) -> Vec<String> {
    let resource_dirs: Vec<String> = resource_dirs
        .iter()
        .map(|dir| absolute(dir).to_string_lossy().into_owned())
        .filter(|dir| !dir.is_empty())
        .collect();

    let mut line: Vec<String> = tokens
        .into_iter()
        .map(|token| rewrite_token(token, &resource_dirs))
        .collect();

    line.push("-cp".to_string());
    line.push(container_classpath());

    if base_image.eq_ignore_ascii_case("scratch") && !has_flag(&line, STATIC_FLAG) {
        debug!("Base image is scratch, adding {STATIC_FLAG}");
        line.push(STATIC_FLAG.to_string());
    }

    if base_image.contains("distroless") && !has_flag(&line, STATIC_DYNAMIC_LIBC_FLAG) {
        debug!("Base image {base_image} is distroless, adding {STATIC_DYNAMIC_LIBC_FLAG}");
        line.push(STATIC_DYNAMIC_LIBC_FLAG.to_string());
    }

    line
}

/// Render tokens as a shell command.
pub fn render(tokens: &[String]) -> String {
    tokens.join(" ")
}
