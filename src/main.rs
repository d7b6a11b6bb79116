#![deny(missing_docs)]

//! Entry point for the stratified dataset splitter CLI.

use std::path::PathBuf;

use vocsplit::config::{SplitConfig, SplitRatios, load_config};
use vocsplit::logging;
use vocsplit::pipeline::{RunSummary, run_split};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }
    let Some(invocation) = parse_args(std::env::args().skip(1).collect())? else {
        return Ok(());
    };

    let summary = run_split(&invocation.config).map_err(|err| err.to_string())?;
    print_summary(&summary);

    if let Some(path) = invocation.summary_json {
        let file = std::fs::File::create(&path)
            .map_err(|err| format!("Failed to create {}: {err}", path.display()))?;
        serde_json::to_writer_pretty(file, &summary)
            .map_err(|err| format!("Failed to write {}: {err}", path.display()))?;
        println!("Summary written to {}", path.display());
    }
    Ok(())
}

struct Invocation {
    config: SplitConfig,
    summary_json: Option<PathBuf>,
}

fn parse_args(args: Vec<String>) -> Result<Option<Invocation>, String> {
    // --config is applied first so later flags can override file values.
    let mut config = match find_config_path(&args)? {
        Some(path) => load_config(&path).map_err(|err| err.to_string())?,
        None => SplitConfig::default(),
    };
    let mut summary_json = None;

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => {
                println!("{}", help_text());
                return Ok(None);
            }
            "--config" => {
                // Already applied.
                idx += 1;
            }
            "--source" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--source requires a value".to_string())?;
                config.source_dir = PathBuf::from(value);
            }
            "--labelmap" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--labelmap requires a value".to_string())?;
                config.labelmap_path = PathBuf::from(value);
            }
            "--train" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--train requires a value".to_string())?;
                config.output_dirs.train = PathBuf::from(value);
            }
            "--val" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--val requires a value".to_string())?;
                config.output_dirs.validation = PathBuf::from(value);
            }
            "--test" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--test requires a value".to_string())?;
                config.output_dirs.test = PathBuf::from(value);
            }
            "--ratios" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--ratios requires a value".to_string())?;
                config.split_ratios = parse_ratios(value)?;
            }
            "--seed" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--seed requires a value".to_string())?;
                config.random_seed = value
                    .parse::<u64>()
                    .map_err(|_| format!("Invalid --seed value: {value}"))?;
            }
            "--summary-json" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--summary-json requires a value".to_string())?;
                summary_json = Some(PathBuf::from(value));
            }
            "--dry-run" => {
                config.dry_run = true;
            }
            "--overwrite" => {
                config.overwrite = true;
            }
            unknown => {
                return Err(format!("Unknown argument: {unknown}\n\n{}", help_text()));
            }
        }
        idx += 1;
    }

    Ok(Some(Invocation {
        config,
        summary_json,
    }))
}

fn find_config_path(args: &[String]) -> Result<Option<PathBuf>, String> {
    for (idx, arg) in args.iter().enumerate() {
        if arg == "--config" {
            let value = args
                .get(idx + 1)
                .ok_or_else(|| "--config requires a value".to_string())?;
            return Ok(Some(PathBuf::from(value)));
        }
    }
    Ok(None)
}

fn parse_ratios(value: &str) -> Result<SplitRatios, String> {
    let parts: Vec<&str> = value.split(',').collect();
    let &[train, val, test] = parts.as_slice() else {
        return Err(format!(
            "Invalid --ratios value: {value} (expected train,val,test)"
        ));
    };
    let parse = |part: &str| {
        part.trim()
            .parse::<f64>()
            .map_err(|_| format!("Invalid ratio: {part}"))
    };
    Ok(SplitRatios {
        train: parse(train)?,
        val: parse(val)?,
        test: parse(test)?,
    })
}

fn print_summary(summary: &RunSummary) {
    if summary.dry_run {
        println!("Dry run: no files were moved.");
    }
    println!(
        "Discovered {} images; paired {} samples",
        summary.images_seen, summary.samples_paired
    );
    println!(
        "Total train: {}\nTotal val: {}\nTotal test: {}",
        summary.totals.train, summary.totals.validation, summary.totals.test
    );
    if !summary.per_class.is_empty() {
        println!("Per-class counts:");
        for class in &summary.per_class {
            println!(
                "  {}: train {}, val {}, test {}",
                class.class, class.counts.train, class.counts.validation, class.counts.test
            );
        }
    }
    if summary.missing_annotation > 0 {
        println!(
            "Skipped {} images without annotations",
            summary.missing_annotation
        );
    }
    if summary.duplicate_stems > 0 {
        println!("Skipped {} duplicate-stem images", summary.duplicate_stems);
    }
    for skipped in &summary.skipped_samples {
        let reason = match &skipped.reason {
            vocsplit::grouping::SkipReason::UnparsableAnnotation { detail } => detail.as_str(),
            vocsplit::grouping::SkipReason::NoValidClass => "no class from the label map",
        };
        println!("Skipped sample {}: {reason}", skipped.stem);
    }
    for small in &summary.skipped_small_classes {
        println!(
            "Class {} has {} sample(s), too few to split; left in place",
            small.class, small.samples
        );
    }
}

fn help_text() -> String {
    [
        "vocsplit",
        "",
        "Stratified train/validation/test split of a Pascal VOC dataset.",
        "Pairs each image with its same-stem .xml annotation, stratifies by",
        "representative class, and moves the pairs into partition directories.",
        "",
        "Usage:",
        "  vocsplit [--config <file.toml>] [options]",
        "",
        "Options:",
        "  --config <path>        TOML config file; flags below override it.",
        "  --source <dir>         Source directory (default: dataset/all).",
        "  --labelmap <path>      Ordered class list (default: labelmap.txt).",
        "  --train <dir>          Train output dir (default: dataset/train).",
        "  --val <dir>            Validation output dir (default: dataset/validation).",
        "  --test <dir>           Test output dir (default: dataset/test).",
        "  --ratios <t,v,te>      Split ratios summing to 1.0 (default: 0.7,0.15,0.15).",
        "  --seed <u64>           Shuffle seed (default: 42).",
        "  --summary-json <path>  Also write the run summary as JSON.",
        "  --dry-run              Plan and report without moving anything.",
        "  --overwrite            Replace existing destination files.",
    ]
    .join("\n")
}
