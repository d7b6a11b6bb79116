//! Utility to export post-split annotation directories as CSV label tables.

use std::path::PathBuf;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    if let Err(err) = vocsplit::logging::init() {
        eprintln!("Logging disabled: {err}");
    }
    let Some(options) = parse_args(std::env::args().skip(1).collect())? else {
        return Ok(());
    };

    for folder in &options.folders {
        let dir = options.root.join(folder);
        let out_path = options.root.join(format!("{folder}_labels.csv"));
        let summary =
            vocsplit::export::export_label_csv(&dir, &out_path).map_err(|err| err.to_string())?;
        println!(
            "{folder}: {} rows from {} annotations ({} skipped) -> {}",
            summary.rows,
            summary.files,
            summary.skipped,
            out_path.display()
        );
    }
    Ok(())
}

struct Options {
    root: PathBuf,
    folders: Vec<String>,
}

fn parse_args(args: Vec<String>) -> Result<Option<Options>, String> {
    let mut root = PathBuf::new();
    let mut folders = vec!["train".to_string(), "validation".to_string()];

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => {
                println!("{}", help_text());
                return Ok(None);
            }
            "--root" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--root requires a value".to_string())?;
                root = PathBuf::from(value);
            }
            "--folders" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--folders requires a value".to_string())?;
                folders = value
                    .split(',')
                    .map(|folder| folder.trim().to_string())
                    .filter(|folder| !folder.is_empty())
                    .collect();
                if folders.is_empty() {
                    return Err(format!("Invalid --folders value: {value}"));
                }
            }
            unknown => {
                return Err(format!("Unknown argument: {unknown}\n\n{}", help_text()));
            }
        }
        idx += 1;
    }

    if root.as_os_str().is_empty() {
        return Err("--root is required".to_string());
    }

    Ok(Some(Options { root, folders }))
}

fn help_text() -> String {
    [
        "vocsplit-export-csv",
        "",
        "Converts Pascal VOC annotations in post-split directories into CSV",
        "label tables, one row per labeled object.",
        "",
        "Usage:",
        "  vocsplit-export-csv --root <dir> [--folders train,validation]",
        "",
        "Options:",
        "  --root <dir>       Directory containing the split folders (required).",
        "  --folders <list>   Comma-separated folder names (default: train,validation).",
    ]
    .join("\n")
}
