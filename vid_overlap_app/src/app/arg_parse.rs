use std::path::PathBuf;

use clap::{builder::RangedU64ValueParser, value_parser, ArgAction::*};
use vid_overlap_lib::CompareOptions;

use crate::app::*;

// subcommands
const CMD_COMPARE: &str = "compare";
const CMD_COMPARE_FRAMES: &str = "compare-frames";
const CMD_CERTIFICATE: &str = "certificate";

// input specification
const ORIGINAL_PATH: &str = "Original fingerprints";
const SUSPECT_PATH: &str = "Suspect fingerprints";
const FIRST_FRAME_PATH: &str = "First frame fingerprint";
const SECOND_FRAME_PATH: &str = "Second frame fingerprint";
const FINGERPRINT_PATH: &str = "Fingerprint";

//comparison configuration
const MATCH_THRESHOLD: &str = "Match threshold";
const MIN_RUN: &str = "Minimum run length";
const MAX_MATCHES: &str = "Maximum matches";
const MAX_FRAMES: &str = "Maximum frames";
const CERTIFICATE_MODE: &str = "Certificate mode";

//output settings
const OUTPUT_FORMAT: &str = "Format";

//Verbosity
const VERBOSITY_QUIET: &str = "Quiet";
const VERBOSITY_VERBOSE: &str = "Verbose";

const DISPLAY_ORDERING: [&str; 13] = [
    //
    // input specification
    ORIGINAL_PATH,
    SUSPECT_PATH,
    FIRST_FRAME_PATH,
    SECOND_FRAME_PATH,
    FINGERPRINT_PATH,
    //
    //comparison modifiers
    MATCH_THRESHOLD,
    MIN_RUN,
    MAX_MATCHES,
    MAX_FRAMES,
    CERTIFICATE_MODE,
    //
    //outputs
    OUTPUT_FORMAT,
    //
    //verbosity
    VERBOSITY_QUIET,
    VERBOSITY_VERBOSE,
];

fn get_ordering(arg_name: &str) -> usize {
    match DISPLAY_ORDERING.iter().position(|x| *x == arg_name) {
        Some(idx) => idx,
        None => {
            panic!("argument not assigned a display order: {arg_name:?}");
        }
    }
}

fn parse_unit_interval(text: &str) -> Result<f64, String> {
    let value = text.parse::<f64>().map_err(|e| e.to_string())?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is not between 0.0 and 1.0"))
    }
}

fn build_compare_cmd() -> clap::Command {
    //clap wants default values as strings, so render the library defaults once.
    let defaults = CompareOptions::default();

    let mut cmd = clap::Command::new(CMD_COMPARE)
        .about("Compare a suspect video's frame fingerprints against an original's");

    cmd = cmd.arg(
        clap::Arg::new(ORIGINAL_PATH)
            .long("original")
            .required(true)
            .num_args(1)
            .value_parser(value_parser!(PathBuf))
            .help("JSON file holding the original's frame fingerprints, as a list of frames")
            .display_order(get_ordering(ORIGINAL_PATH)),
    );

    cmd = cmd.arg(
        clap::Arg::new(SUSPECT_PATH)
            .long("suspect")
            .required(true)
            .num_args(1)
            .value_parser(value_parser!(PathBuf))
            .help("JSON file holding the suspect's frame fingerprints, as a list of frames")
            .display_order(get_ordering(SUSPECT_PATH)),
    );

    cmd = cmd.arg(
        clap::Arg::new(MATCH_THRESHOLD)
            .long("threshold")
            .num_args(1)
            .value_parser(parse_unit_interval)
            .help(format!(
                "Mean similarity (0.0 to 1.0) a run of frames must reach to count as a sequence match. Defaults to {}, or {} with --certificate-mode",
                defaults.match_threshold,
                CompareOptions::certificate().match_threshold
            ))
            .display_order(get_ordering(MATCH_THRESHOLD)),
    );

    cmd = cmd.arg(
        clap::Arg::new(MIN_RUN)
            .long("min-run")
            .num_args(1)
            .value_parser(RangedU64ValueParser::<usize>::new().range(1..))
            .default_value(defaults.min_sequence_length.to_string())
            .help("Minimum number of consecutive frames in a sequence match")
            .display_order(get_ordering(MIN_RUN)),
    );

    cmd = cmd.arg(
        clap::Arg::new(MAX_MATCHES)
            .long("max-matches")
            .num_args(1)
            .value_parser(value_parser!(usize))
            .default_value(defaults.max_matches.to_string())
            .help("Maximum number of sequence matches to report")
            .display_order(get_ordering(MAX_MATCHES)),
    );

    cmd = cmd.arg(
        clap::Arg::new(MAX_FRAMES)
            .long("max-frames")
            .num_args(1)
            .value_parser(RangedU64ValueParser::<usize>::new().range(1..))
            .default_value(defaults.max_frames_per_sequence.to_string())
            .help("Longer inputs are sampled down to this many evenly spaced frames")
            .display_order(get_ordering(MAX_FRAMES)),
    );

    cmd = cmd.arg(
        clap::Arg::new(CERTIFICATE_MODE)
            .long("certificate-mode")
            .num_args(0)
            .action(SetTrue)
            .help("Use the stricter settings applied when the comparison backs a certificate")
            .display_order(get_ordering(CERTIFICATE_MODE)),
    );

    cmd
}

fn build_compare_frames_cmd() -> clap::Command {
    let mut cmd = clap::Command::new(CMD_COMPARE_FRAMES)
        .about("Compare the fingerprints of two single frames or images");

    cmd = cmd.arg(
        clap::Arg::new(FIRST_FRAME_PATH)
            .required(true)
            .value_parser(value_parser!(PathBuf))
            .help("JSON file holding one frame fingerprint")
            .display_order(get_ordering(FIRST_FRAME_PATH)),
    );

    cmd = cmd.arg(
        clap::Arg::new(SECOND_FRAME_PATH)
            .required(true)
            .value_parser(value_parser!(PathBuf))
            .help("JSON file holding one frame fingerprint")
            .display_order(get_ordering(SECOND_FRAME_PATH)),
    );

    cmd
}

fn build_certificate_cmd() -> clap::Command {
    clap::Command::new(CMD_CERTIFICATE)
        .about("Summarize an image fingerprint for an ownership certificate")
        .arg(
            clap::Arg::new(FINGERPRINT_PATH)
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("JSON file holding one frame fingerprint")
                .display_order(get_ordering(FINGERPRINT_PATH)),
        )
}

pub(super) fn build_app() -> clap::Command {
    //args are not added through method chaining because rustfmt struggles with very long expressions.
    let mut clap_app = clap::Command::new("Video overlap finder")
        .version(clap::crate_version!())
        .about("Measure how much of an original video (or image) a suspect reuses")
        .subcommand_required(true)
        .arg_required_else_help(true);

    clap_app = clap_app.arg(
        clap::Arg::new(OUTPUT_FORMAT)
            .long("format")
            .global(true)
            .num_args(1)
            .value_parser(value_parser!(OutputFormat))
            .default_value("normal")
            .help("Print a human readable report, or JSON")
            .display_order(get_ordering(OUTPUT_FORMAT)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(VERBOSITY_QUIET)
            .short('q')
            .long("quiet")
            .global(true)
            .num_args(0)
            .action(SetTrue)
            .conflicts_with(VERBOSITY_VERBOSE)
            .help("Only log warnings and errors")
            .display_order(get_ordering(VERBOSITY_QUIET)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(VERBOSITY_VERBOSE)
            .short('v')
            .long("verbose")
            .global(true)
            .num_args(0)
            .action(SetTrue)
            .help("Log every stage of the comparison, and the cause of any error")
            .display_order(get_ordering(VERBOSITY_VERBOSE)),
    );

    clap_app
        .subcommand(build_compare_cmd())
        .subcommand(build_compare_frames_cmd())
        .subcommand(build_certificate_cmd())
}

pub fn parse_args() -> AppCfg {
    let args = build_app().get_matches();
    cfg_from_matches(&args)
}

pub(super) fn cfg_from_matches(args: &clap::ArgMatches) -> AppCfg {
    let path = |matches: &clap::ArgMatches, id: &str| -> PathBuf {
        matches
            .get_one::<PathBuf>(id)
            .cloned()
            .expect("This argument is required")
    };

    let (command, sub_args) = match args.subcommand() {
        Some((CMD_COMPARE, sub_args)) => {
            let base = if sub_args.get_flag(CERTIFICATE_MODE) {
                CompareOptions::certificate()
            } else {
                CompareOptions::default()
            };

            let mut options = base
                .with_min_sequence_length(*sub_args.get_one::<usize>(MIN_RUN).expect("This argument has a default value"))
                .with_max_matches(*sub_args.get_one::<usize>(MAX_MATCHES).expect("This argument has a default value"))
                .with_max_frames_per_sequence(
                    *sub_args.get_one::<usize>(MAX_FRAMES).expect("This argument has a default value"),
                );
            if let Some(threshold) = sub_args.get_one::<f64>(MATCH_THRESHOLD) {
                options = options.with_match_threshold(*threshold);
            }

            let command = Command::Compare {
                original: path(sub_args, ORIGINAL_PATH),
                suspect: path(sub_args, SUSPECT_PATH),
                options,
            };
            (command, sub_args)
        }

        Some((CMD_COMPARE_FRAMES, sub_args)) => {
            let command = Command::CompareFrames {
                first: path(sub_args, FIRST_FRAME_PATH),
                second: path(sub_args, SECOND_FRAME_PATH),
            };
            (command, sub_args)
        }

        Some((CMD_CERTIFICATE, sub_args)) => {
            let command = Command::Certificate {
                fingerprint: path(sub_args, FINGERPRINT_PATH),
            };
            (command, sub_args)
        }

        _ => unreachable!("clap requires a known subcommand"),
    };

    //global args are visible on the subcommand's matches.
    let verbosity = if sub_args.get_flag(VERBOSITY_QUIET) {
        ReportVerbosity::Quiet
    } else if sub_args.get_flag(VERBOSITY_VERBOSE) {
        ReportVerbosity::Verbose
    } else {
        ReportVerbosity::Default
    };

    let format = *sub_args
        .get_one::<OutputFormat>(OUTPUT_FORMAT)
        .expect("This argument has a default value");

    AppCfg {
        command,
        format,
        verbosity,
    }
}
