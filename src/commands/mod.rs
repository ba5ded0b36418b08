//! Command implementations for guardfile.
//!
//! Each command opens one handle and performs a single operation on it.

use crate::cli::{AppendArgs, CheckArgs, Command, MoveArgs, PathArgs};
use guardfile::{Error, FileOptions, Format, GuardedFile, Result};
use serde::de::IgnoredAny;
use std::io::{self, Read, Write};
use std::path::Path;

/// Dispatch a command to its implementation.
pub fn dispatch(command: Command, options: FileOptions) -> Result<()> {
    match command {
        Command::Cat(args) => cmd_cat(args, options, &mut io::stdout().lock()),
        Command::Write(args) => cmd_write(args, options, &mut io::stdin().lock()),
        Command::Append(args) => cmd_append(args, options),
        Command::Mv(args) => cmd_mv(args, options),
        Command::Check(args) => cmd_check(args, options, &mut io::stdout().lock()),
    }
}

/// Load options from `path`, or defaults when none is given.
pub fn load_options(path: Option<&Path>) -> Result<FileOptions> {
    match path {
        Some(path) => FileOptions::load(path),
        None => Ok(FileOptions::default()),
    }
}

fn cmd_cat(args: PathArgs, options: FileOptions, out: &mut impl Write) -> Result<()> {
    let file = GuardedFile::with_options(&args.path, options)?;
    let bytes = file.read()?;
    out.write_all(&bytes)
        .map_err(|e| Error::io("write to stdout", "<stdout>", e))
}

fn cmd_write(args: PathArgs, options: FileOptions, input: &mut impl Read) -> Result<()> {
    let file = GuardedFile::with_options(&args.path, options)?;
    let mut writer = file.open_writer()?;
    io::copy(input, &mut writer).map_err(|e| Error::io("write", &args.path, e))?;
    writer.close()
}

fn cmd_append(args: AppendArgs, options: FileOptions) -> Result<()> {
    let file = GuardedFile::with_options(&args.path, options)?;
    let mut text = args.text;
    if args.line {
        text.push('\n');
    }
    file.append_string(&text)
}

fn cmd_mv(args: MoveArgs, options: FileOptions) -> Result<()> {
    if !args.from.exists() {
        return Err(Error::Usage(format!(
            "'{}' does not exist",
            args.from.display()
        )));
    }
    let file = GuardedFile::with_options(&args.from, options)?;
    file.rename(&args.to)
}

fn cmd_check(args: CheckArgs, options: FileOptions, out: &mut impl Write) -> Result<()> {
    let format = resolve_format(&args)?;
    let file = GuardedFile::with_options(&args.path, options)?;

    match format {
        Format::Json => file.read_structured::<serde_json::Value>(format).map(|_| ()),
        Format::Yaml => file.read_structured::<serde_yaml::Value>(format).map(|_| ()),
        Format::Xml => file.read_structured::<IgnoredAny>(format).map(|_| ()),
    }?;

    writeln!(out, "{}: valid {}", file.path().display(), format)
        .map_err(|e| Error::io("write to stdout", "<stdout>", e))
}

fn resolve_format(args: &CheckArgs) -> Result<Format> {
    match &args.format {
        Some(name) => Format::from_str(name)
            .ok_or_else(|| Error::Usage(format!("unknown format '{}'", name))),
        None => Format::from_path(&args.path).ok_or_else(|| {
            Error::Usage(format!(
                "cannot guess format of '{}'; pass --format",
                args.path.display()
            ))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guardfile::ErrorKind;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_write_then_cat() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.txt");

        cmd_write(
            PathArgs { path: path.clone() },
            FileOptions::default(),
            &mut &b"from stdin"[..],
        )
        .unwrap();

        let mut out = Vec::new();
        cmd_cat(PathArgs { path }, FileOptions::default(), &mut out).unwrap();
        assert_eq!(out, b"from stdin");
    }

    #[test]
    fn test_append_line() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("log.txt");
        for text in ["one", "two"] {
            cmd_append(
                AppendArgs {
                    path: path.clone(),
                    text: text.to_string(),
                    line: true,
                },
                FileOptions::default(),
            )
            .unwrap();
        }

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn test_mv_missing_source_is_usage_error() {
        let temp = TempDir::new().unwrap();
        let err = cmd_mv(
            MoveArgs {
                from: temp.path().join("nope"),
                to: temp.path().join("dest"),
            },
            FileOptions::default(),
        )
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Usage);
        assert!(!temp.path().join("nope").exists());
    }

    #[test]
    fn test_mv_renames() {
        let temp = TempDir::new().unwrap();
        let from = temp.path().join("a.txt");
        std::fs::write(&from, "x").unwrap();

        cmd_mv(
            MoveArgs {
                from: from.clone(),
                to: temp.path().join("b.txt"),
            },
            FileOptions::default(),
        )
        .unwrap();

        assert!(!from.exists());
        assert!(temp.path().join("b.txt").exists());
    }

    #[test]
    fn test_check_reports_decode_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.json");
        std::fs::write(&path, "{oops").unwrap();

        let err = cmd_check(
            CheckArgs { path, format: None },
            FileOptions::default(),
            &mut Vec::new(),
        )
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_check_valid_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("good.yml");
        std::fs::write(&path, "a: 1\nb: [x, y]\n").unwrap();

        let mut out = Vec::new();
        cmd_check(CheckArgs { path, format: None }, FileOptions::default(), &mut out).unwrap();

        assert!(String::from_utf8(out).unwrap().contains("valid YAML"));
    }

    #[test]
    fn test_resolve_format_rejects_unknown() {
        let args = CheckArgs {
            path: PathBuf::from("data.bin"),
            format: None,
        };
        assert_eq!(resolve_format(&args).unwrap_err().kind(), ErrorKind::Usage);

        let args = CheckArgs {
            path: PathBuf::from("data.bin"),
            format: Some("toml".to_string()),
        };
        assert_eq!(resolve_format(&args).unwrap_err().kind(), ErrorKind::Usage);
    }

    #[test]
    fn test_load_options_defaults_without_path() {
        assert_eq!(load_options(None).unwrap(), FileOptions::default());
    }
}
