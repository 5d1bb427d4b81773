use std::{
    error::Error,
    io::{BufWriter, Write},
    path::Path,
};

use serde::de::DeserializeOwned;
use vid_overlap_lib::*;

use crate::app::{report_output::FrameComparison, report_output::Report, *};

// * read cfg
// * load fingerprints
// * compare
// * output results

pub fn run_app() -> i32 {
    let cfg = arg_parse::parse_args();
    configure_logs(cfg.verbosity);

    let ret = match run_app_inner(&cfg) {
        Ok(()) => 0,
        Err(fatal_error) => {
            print_fatal_err(fatal_error, cfg.verbosity);
            1
        }
    };

    ret
}

fn run_app_inner(cfg: &AppCfg) -> eyre::Result<()> {
    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match &cfg.command {
        Command::Compare {
            original,
            suspect,
            options,
        } => {
            let original = load_sequence(original)?;
            let suspect = load_sequence(suspect)?;
            info!(
                target: "app",
                "Comparing {} suspect frames against {} original frames",
                suspect.len(),
                original.len()
            );

            let result = compare_sequences(&original, &suspect, options);
            result.write_to(&mut out, cfg.format)?;
        }

        Command::CompareFrames { first, second } => {
            let first = load_frame(first)?;
            let second = load_frame(second)?;

            let report = FrameComparison {
                similarity: compare_frames(&first, &second),
                signals: PairwiseSimilarity::signals(&first, &second),
            };
            report.write_to(&mut out, cfg.format)?;
        }

        Command::Certificate { fingerprint } => {
            let fingerprint = load_frame(fingerprint)?;
            if !fingerprint.has_signal() {
                warn!(target: "app", "The fingerprint holds no signals");
            }

            FingerprintCertificate::from_fingerprint(&fingerprint).write_to(&mut out, cfg.format)?;
        }
    }

    out.flush().map_err(AppError::from)?;
    Ok(())
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let text = std::fs::read_to_string(path).map_err(|source| AppError::ReadInput {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&text).map_err(|source| AppError::ParseInput {
        path: path.to_path_buf(),
        source,
    })
}

/// Read the extractor's output for a sequence of frames: a JSON list of frame fingerprints.
pub(super) fn load_sequence(path: &Path) -> Result<FingerprintSequence, AppError> {
    let seq: FingerprintSequence = load_json(path)?;
    debug!(target: "app", "Loaded {} frames from {}", seq.len(), path.display());
    Ok(seq)
}

/// Read the extractor's output for a single frame or image.
pub(super) fn load_frame(path: &Path) -> Result<FrameFingerprint, AppError> {
    load_json(path)
}

fn print_fatal_err(fatal_err: eyre::Report, verbosity: ReportVerbosity) {
    error!(target: "app-errorlog", "{}", fatal_err);

    if verbosity == ReportVerbosity::Verbose {
        let mut source: Option<&(dyn Error + 'static)> = fatal_err.source();
        while let Some(e) = source {
            error!(target: "app-errorlog", "    caused by: {}", e);
            source = e.source();
        }
    }
}

pub fn configure_logs(verbosity: ReportVerbosity) {
    use simplelog::*;

    let min_loglevel = match verbosity {
        ReportVerbosity::Quiet => LevelFilter::Warn,
        ReportVerbosity::Default => LevelFilter::Info,
        ReportVerbosity::Verbose => LevelFilter::Trace,
    };

    TermLogger::init(
        min_loglevel,
        ConfigBuilder::new().build(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .expect("TermLogger failed to initialize");
}
