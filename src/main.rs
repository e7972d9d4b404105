//! # snapdoc CLI
//!
//! Usage:
//!   snapdoc region.json -o invoice.pdf
//!   cat region.json | snapdoc -o invoice.pdf --page Letter --scale 2
//!   snapdoc --example > region.json

use std::env;
use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

use snapdoc::{ExportError, ExportOptions, PageSize};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
Usage: snapdoc [region.json] [-o output.pdf] [--page A4|A3|A5|Letter|Legal]
               [--width PT] [--quality 0..1] [--scale S]
       snapdoc --example

Reads a laid-out region as JSON (from a file or stdin) and writes it as a
single-page PDF. Logging is controlled with RUST_LOG (default: warn).";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("{USAGE}");
        return ExitCode::SUCCESS;
    }
    if args.iter().any(|a| a == "--example") {
        print!("{}", example_region_json());
        return ExitCode::SUCCESS;
    }

    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(msg) => {
            eprintln!("ERROR: {msg}\n\n{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    match run(&cli) {
        Ok(len) => {
            eprintln!("OK: wrote {} bytes to {}", len, cli.output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("ERROR: {e}");
            ExitCode::FAILURE
        }
    }
}

struct Cli {
    input: Option<String>,
    output: String,
    options: ExportOptions,
}

fn parse_args(args: &[String]) -> Result<Cli, String> {
    let mut cli = Cli {
        input: None,
        output: format!("output.{}", snapdoc::FILE_EXTENSION),
        options: ExportOptions::default(),
    };

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("{flag} needs a value"))
        };
        match arg.as_str() {
            "-o" | "--output" => cli.output = value(arg)?,
            "--page" => {
                let name = value(arg)?;
                cli.options.page =
                    PageSize::from_name(&name).ok_or_else(|| format!("unknown page size '{name}'"))?;
            }
            "--width" => {
                let width = value(arg)?;
                let width = width
                    .parse()
                    .map_err(|_| format!("--width expects points, got '{width}'"))?;
                cli.options.page = PageSize::Custom { width };
            }
            "--quality" => {
                let q = value(arg)?;
                cli.options.quality = q
                    .parse()
                    .map_err(|_| format!("--quality expects a number, got '{q}'"))?;
            }
            "--scale" => {
                let s = value(arg)?;
                cli.options.scale = s
                    .parse()
                    .map_err(|_| format!("--scale expects a number, got '{s}'"))?;
            }
            other if other.starts_with('-') => return Err(format!("unknown flag '{other}'")),
            path => {
                if cli.input.replace(path.to_string()).is_some() {
                    return Err("only one input file is accepted".to_string());
                }
            }
        }
    }
    Ok(cli)
}

fn run(cli: &Cli) -> Result<usize, ExportError> {
    let json = match &cli.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let region = snapdoc::model::parse_region(&json)?;
    let bytes = snapdoc::export_region(&region, &cli.options)?;
    // Only touch the output path once the whole export has succeeded.
    fs::write(&cli.output, &bytes)?;
    Ok(bytes.len())
}

fn example_region_json() -> &'static str {
    r##"{
  "tag": "section",
  "style": "font-family: Helvetica, Arial, sans-serif; font-size: 12px; color: #1a1a26; background: #ffffff; padding: 24px",
  "frame": { "x": 0, "y": 0, "width": 480, "height": 260 },
  "children": [
    {
      "tag": "h1",
      "style": "font-size: 24px; font-weight: bold",
      "frame": { "x": 24, "y": 24, "width": 432, "height": 32 },
      "children": [{ "text": "INVOICE #INV-2026-001" }]
    },
    {
      "tag": "div",
      "style": "color: #666; font-size: 10px",
      "frame": { "x": 24, "y": 60, "width": 432, "height": 16 },
      "children": [{ "text": "Acme Corp, 123 Business St, Suite 100" }]
    },
    {
      "tag": "div",
      "style": "border-top: 1px solid #ccc; border-bottom: 1px solid #ccc; padding: 8px 0",
      "frame": { "x": 24, "y": 96, "width": 432, "height": 40 },
      "children": [{ "text": "Consulting services, March 2026" }]
    },
    {
      "tag": "div",
      "style": "text-align: right; font-weight: 700; font-size: 14px",
      "frame": { "x": 24, "y": 148, "width": 432, "height": 20 },
      "children": [{ "text": "Total due: EUR 1,250.00" }]
    },
    {
      "tag": "div",
      "style": "background-color: #f4f4f8; border: 1px dashed #9999aa; border-radius: 4px; padding: 8px",
      "frame": { "x": 24, "y": 184, "width": 432, "height": 52 },
      "children": [{ "text": "Payment reference: RF18 5390 0754 7034" }]
    }
  ]
}
"##
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args_defaults() {
        let cli = parse_args(&[]).unwrap();
        assert_eq!(cli.input, None);
        assert_eq!(cli.output, "output.pdf");
        assert_eq!(cli.options, ExportOptions::default());
    }

    #[test]
    fn test_parse_args_flags() {
        let cli = parse_args(&args(&[
            "in.json", "-o", "out.pdf", "--page", "letter", "--quality", "0.5", "--scale", "2",
        ]))
        .unwrap();
        assert_eq!(cli.input.as_deref(), Some("in.json"));
        assert_eq!(cli.output, "out.pdf");
        assert_eq!(cli.options.page, PageSize::Letter);
        assert_eq!(cli.options.quality, 0.5);
        assert_eq!(cli.options.scale, 2.0);
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(parse_args(&args(&["-o"])).is_err());
        assert!(parse_args(&args(&["--page", "B9"])).is_err());
        assert!(parse_args(&args(&["--bogus"])).is_err());
        assert!(parse_args(&args(&["a.json", "b.json"])).is_err());
    }

    fn cli_for(dir: &tempfile::TempDir, region_json: &str) -> Cli {
        let input = dir.path().join("region.json");
        fs::write(&input, region_json).unwrap();
        Cli {
            input: Some(input.to_string_lossy().into_owned()),
            output: dir.path().join("out.pdf").to_string_lossy().into_owned(),
            options: ExportOptions::default(),
        }
    }

    #[test]
    fn test_run_invalid_json_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cli = cli_for(&dir, r#"{ "tag": "div", "children": [ }"#);
        assert!(matches!(run(&cli), Err(ExportError::Config { .. })));
        assert!(!std::path::Path::new(&cli.output).exists());
    }

    #[test]
    fn test_run_failed_export_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cli = cli_for(
            &dir,
            r#"{ "frame": { "x": 0, "y": 0, "width": 0, "height": 40 } }"#,
        );
        assert!(matches!(run(&cli), Err(ExportError::EmptySnapshot { .. })));
        assert!(!std::path::Path::new(&cli.output).exists());
    }

    #[test]
    fn test_example_region_parses() {
        let region = snapdoc::model::parse_region(example_region_json()).unwrap();
        assert_eq!(region.children.len(), 5);
    }
}
