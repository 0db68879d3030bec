use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use target_squeeze::cli::{Args, Commands, SearchArgs};
use target_squeeze::config::ConfigSources;
use target_squeeze::logger;
use target_squeeze::progress::{BarProgress, JsonLinesProgress, NoProgress, ProgressEvent, ProgressSink};
use target_squeeze::utils::format_file_size;
use target_squeeze::{BatchOrchestrator, BatchSummary, SearchParams};
use tracing::warn;

fn main() -> Result<()> {
    let args = Args::parse();
    logger::init(args.verbose, args.quiet);

    match args.command {
        Commands::Batch {
            input,
            output,
            search,
            exclude_file,
            config_file,
            report_name,
            json_events,
        } => {
            let defaults = ConfigSources::in_dir(&input);
            let sources = ConfigSources {
                exclude_file: exclude_file.unwrap_or(defaults.exclude_file),
                override_file: config_file.unwrap_or(defaults.override_file),
            };
            let sink: Box<dyn ProgressSink> = if json_events {
                Box::new(JsonLinesProgress)
            } else if args.quiet {
                Box::new(NoProgress)
            } else {
                Box::new(BarProgress::new())
            };

            let summary = run_batch(input, output, &search, &sources, report_name, sink.as_ref())?;
            if !json_events {
                print_summary(&summary);
            }
            if summary.cancelled {
                return Err(anyhow!("batch interrupted; remaining files were not processed"));
            }
        }
        Commands::Compress {
            input,
            output,
            search,
        } => {
            compress_one(&input, &output, &search)?;
        }
    }

    Ok(())
}

/// Runs the batch on a worker thread while this thread drains its progress
/// events into `sink`.
fn run_batch(
    input: PathBuf,
    output: PathBuf,
    search: &SearchArgs,
    sources: &ConfigSources,
    report_name: String,
    sink: &dyn ProgressSink,
) -> Result<BatchSummary> {
    let params = SearchParams::new(search.start_quality, search.min_quality, search.step)?;
    let (config, warnings) = sources.load(search.target_kb)?;
    for warning in &warnings {
        warn!("{}", warning);
    }

    // Ctrl-C stops the batch after the file in progress.
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))?;

    let orchestrator = BatchOrchestrator::new(params)
        .report_name(report_name)
        .cancel_flag(cancel);
    let (tx, rx) = mpsc::channel::<ProgressEvent>();

    let worker = thread::spawn(move || orchestrator.run(&input, &output, &config, &tx));

    for event in rx {
        sink.on_event(event);
    }

    let mut summary = worker
        .join()
        .map_err(|_| anyhow!("batch worker thread panicked"))??;
    summary.config_warnings = warnings.len();
    Ok(summary)
}

fn compress_one(input: &Path, output: &Path, search: &SearchArgs) -> Result<()> {
    let params = SearchParams::new(search.start_quality, search.min_quality, search.step)?;
    if search.target_kb == 0 {
        return Err(target_squeeze::CompressionError::InvalidTargetSize(0).into());
    }

    println!("🗜️  Compressing image: {:?}", input);
    let outcome = BatchOrchestrator::new(params).process_file(input, output, search.target_kb);
    if !outcome.success {
        return Err(anyhow!("failed to compress {:?}: {}", input, outcome.error));
    }

    if let Some(path) = &outcome.output_path {
        println!("📁 Output: {:?}", path);
    }
    println!("📊 Original size: {:.2} KB", outcome.original_size_kb);
    println!(
        "📈 Final size: {:.2} KB (target {} KB, quality {})",
        outcome.final_size_kb, outcome.target_kb, outcome.quality_used
    );
    println!("🎯 Compression: {:.1}%", outcome.compression_percent);
    if !outcome.reached_target {
        println!("⚠️  Target not reached even at the lowest quality");
    }
    Ok(())
}

fn print_summary(summary: &BatchSummary) {
    let total_before: f64 = summary.outcomes.iter().map(|o| o.original_size_kb).sum();
    let total_after: f64 = summary.outcomes.iter().map(|o| o.final_size_kb).sum();

    println!("\n📊 Batch Compression Summary:");
    println!("  📁 Total files processed: {}", summary.total());
    println!("  ✅ Succeeded: {}", summary.succeeded());
    if summary.failed() > 0 {
        println!("  ⚠️  Failed files: {}", summary.failed());
    }
    if summary.config_warnings > 0 {
        println!("  ⚠️  Config warnings: {}", summary.config_warnings);
    }
    if summary.cancelled {
        println!("  🛑 Interrupted: remaining files were recorded as cancelled");
    }
    println!(
        "  📦 Total size: {} -> {}",
        format_file_size((total_before * 1024.0) as u64),
        format_file_size((total_after * 1024.0) as u64)
    );
    println!("  ⏱️  Total time: {:.2?}", summary.elapsed);
    println!("  📁 Output folder: {}", summary.output_dir.display());
    match (&summary.report_path, &summary.report_error) {
        (Some(path), _) => println!("  📄 Report: {}", path.display()),
        (None, Some(error)) => println!("  ⚠️  Report not written: {}", error),
        (None, None) => {}
    }
}
