use crate::constants::{
    DEFAULT_MIN_QUALITY, DEFAULT_QUALITY_STEP, DEFAULT_START_QUALITY, DEFAULT_TARGET_KB,
    REPORT_FILE_NAME,
};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "target-squeeze",
    about = "Compress a folder of images down to a target file size per image",
    long_about = "target-squeeze re-encodes each image at the highest quality that fits a size budget. \
                  It walks quality downwards in fixed steps, keeps the original resolution, and writes \
                  a CSV report with one row per processed file.",
    version,
    after_help = "EXAMPLES:\n  \
    target-squeeze batch ./photos ./compressed -t 250\n  \
    target-squeeze batch ./photos ./compressed --exclude-file skip.txt --config-file sizes.csv\n  \
    target-squeeze compress hero.png ./compressed -t 120"
)]
pub struct Args {
    #[arg(short, long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Only log warnings and errors")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct SearchArgs {
    #[arg(
        short = 't',
        long,
        default_value_t = DEFAULT_TARGET_KB,
        help = "Target size per image in KB",
        long_help = "Maximum desired output size in kilobytes (1 KB = 1024 bytes). \
                     Per-file overrides in the config table take precedence in batch mode."
    )]
    pub target_kb: u64,

    #[arg(
        long,
        default_value_t = DEFAULT_START_QUALITY,
        help = "First quality level tried (1-100)"
    )]
    pub start_quality: u8,

    #[arg(
        long,
        default_value_t = DEFAULT_MIN_QUALITY,
        help = "Lowest quality level tried (1-100)",
        long_help = "The search stops below this quality and keeps its last attempt, \
                     even when that attempt is still above the target."
    )]
    pub min_quality: u8,

    #[arg(
        long,
        default_value_t = DEFAULT_QUALITY_STEP,
        help = "Quality decrement between attempts"
    )]
    pub step: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(
        about = "Compress every image in a folder",
        long_about = "Process the jpg, jpeg, png and webp files directly inside INPUT_DIR one after \
                      another and write the results plus a CSV report into OUTPUT_DIR. \
                      Extensions are matched case-sensitively and subfolders are not visited."
    )]
    Batch {
        #[arg(help = "Folder containing the images")]
        input: PathBuf,

        #[arg(help = "Folder the compressed images and the report are written to")]
        output: PathBuf,

        #[command(flatten)]
        search: SearchArgs,

        #[arg(
            long,
            help = "File listing names to skip (default: INPUT_DIR/exclude.txt)",
            long_help = "Newline-separated list of file names that are left out of the batch. \
                         A missing file means nothing is excluded."
        )]
        exclude_file: Option<PathBuf>,

        #[arg(
            long,
            help = "Per-file targets as filename,target_kb (default: INPUT_DIR/config.csv)",
            long_help = "CSV table with the header filename,target_kb. Rows with a non-integer \
                         or non-positive target are skipped with a warning."
        )]
        config_file: Option<PathBuf>,

        #[arg(long, default_value = REPORT_FILE_NAME, help = "Report file name inside OUTPUT_DIR")]
        report_name: String,

        #[arg(
            long,
            help = "Print progress events as JSON lines on stdout instead of a progress bar"
        )]
        json_events: bool,
    },

    #[command(
        about = "Compress a single image",
        long_about = "Run the same pipeline as batch mode on one file and print the outcome."
    )]
    Compress {
        #[arg(help = "Input image file path")]
        input: PathBuf,

        #[arg(help = "Folder the compressed image is written to")]
        output: PathBuf,

        #[command(flatten)]
        search: SearchArgs,
    },
}
