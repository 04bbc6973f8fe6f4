//! Desktop launcher integration for Linux installs.

use std::fs;
use std::path::Path;

use crate::error::SetupError;
use crate::fs_ops::ensure_parent;
use crate::paths::DesktopEntryPaths;

const ICON_KEY: &str = "Icon=";
const EXEC_KEY: &str = "Exec=";

/// Points `Icon=` and the program of every `Exec=` line at absolute paths.
/// Every other byte of the template, line endings included, is kept.
pub fn rewrite_desktop_entry(template: &str, icon: &Path, exec: &Path) -> String {
    let exec = quote_exec_program(&exec.to_string_lossy());
    let mut out = String::with_capacity(template.len() + 128);
    for segment in template.split_inclusive('\n') {
        let (line, ending) = split_line_ending(segment);
        if line.starts_with(ICON_KEY) {
            out.push_str(ICON_KEY);
            out.push_str(&icon.to_string_lossy());
        } else if let Some(command) = line.strip_prefix(EXEC_KEY) {
            let args_start = command
                .find(char::is_whitespace)
                .unwrap_or(command.len());
            out.push_str(EXEC_KEY);
            out.push_str(&exec);
            out.push_str(&command[args_start..]);
        } else {
            out.push_str(line);
        }
        out.push_str(ending);
    }
    out
}

pub fn write_desktop_entry(desktop: &DesktopEntryPaths) -> Result<(), SetupError> {
    let template = fs::read_to_string(&desktop.template).map_err(|err| {
        SetupError::ExtractionFailure(format!(
            "desktop template missing at {}: {err}",
            desktop.template.display()
        ))
    })?;
    let rendered = rewrite_desktop_entry(&template, &desktop.icon, &desktop.exec);
    ensure_parent(&desktop.destination)?;
    fs::write(&desktop.destination, rendered)?;
    Ok(())
}

fn split_line_ending(segment: &str) -> (&str, &str) {
    if let Some(line) = segment.strip_suffix("\r\n") {
        (line, "\r\n")
    } else if let Some(line) = segment.strip_suffix('\n') {
        (line, "\n")
    } else {
        (segment, "")
    }
}

fn quote_exec_program(program: &str) -> String {
    if program.contains(char::is_whitespace) || program.contains('"') {
        let escaped = program.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{escaped}\"")
    } else {
        program.to_string()
    }
}
