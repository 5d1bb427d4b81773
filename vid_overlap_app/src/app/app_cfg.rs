use std::path::PathBuf;

use vid_overlap_lib::CompareOptions;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReportVerbosity {
    Quiet,
    Default,
    Verbose,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutputFormat {
    Normal,
    Json,
}

// What to do, and the extractor output files to do it with.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Compare {
        original: PathBuf,
        suspect: PathBuf,
        options: CompareOptions,
    },
    CompareFrames {
        first: PathBuf,
        second: PathBuf,
    },
    Certificate {
        fingerprint: PathBuf,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppCfg {
    pub command: Command,
    pub format: OutputFormat,
    pub verbosity: ReportVerbosity,
}
