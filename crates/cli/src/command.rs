//! crates/cli/src/command.rs
//!
//! The `clap` command tree.

use std::path::PathBuf;

use checksums::{HashAlgorithm, RollingChecksumAlgorithm};
use clap::builder::PathBufValueParser;
use clap::{Arg, ArgAction, Command, value_parser};
use signature::DEFAULT_CHUNK_SIZE;

pub(crate) const PROGRAM_NAME: &str = "rdelta";

fn algorithm_names<T: std::fmt::Display>(all: &[T]) -> String {
    all.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

fn path_arg(name: &'static str, value_name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .value_name(value_name)
        .help(help)
        .value_parser(PathBufValueParser::new())
}

fn signature_command() -> Command {
    Command::new("signature")
        .about("Write the signature of a basis file")
        .arg(path_arg("basis", "BASIS", "File the signature describes").required(true))
        .arg(path_arg(
            "signature",
            "SIGNATURE",
            "Where to write the signature (defaults to BASIS.sig)",
        ))
        .arg(
            Arg::new("chunk-size")
                .long("chunk-size")
                .value_name("BYTES")
                .help(format!("Chunk size in bytes, 128 to 31744 (default {DEFAULT_CHUNK_SIZE})"))
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("rolling-checksum")
                .long("rolling-checksum")
                .value_name("NAME")
                .help(format!(
                    "Rolling checksum: {}",
                    algorithm_names(&RollingChecksumAlgorithm::ALL)
                ))
                .value_parser(|value: &str| value.parse::<RollingChecksumAlgorithm>()),
        )
        .arg(
            Arg::new("hash")
                .long("hash")
                .value_name("NAME")
                .help(format!("Chunk hash: {}", algorithm_names(&HashAlgorithm::ALL)))
                .value_parser(|value: &str| value.parse::<HashAlgorithm>()),
        )
}

fn delta_command() -> Command {
    Command::new("delta")
        .about("Write the delta that turns the signature's basis into a target file")
        .arg(path_arg("signature", "SIGNATURE", "Signature of the basis").required(true))
        .arg(path_arg("target", "TARGET", "File the delta should reproduce").required(true))
        .arg(path_arg("delta", "DELTA", "Where to write the delta (defaults to TARGET.delta)"))
}

fn patch_command() -> Command {
    Command::new("patch")
        .about("Apply a delta to a basis file")
        .arg(path_arg("basis", "BASIS", "File the delta was computed against").required(true))
        .arg(path_arg("delta", "DELTA", "Delta to apply").required(true))
        .arg(path_arg("output", "OUTPUT", "Where to write the reconstructed file").required(true))
        .arg(
            Arg::new("skip-verification")
                .long("skip-verification")
                .help("Do not compare the output hash with the one stored in the delta")
                .action(ArgAction::SetTrue),
        )
}

fn explain_command() -> Command {
    Command::new("explain-delta")
        .about("Print the header and commands of a delta")
        .arg(path_arg("delta", "DELTA", "Delta to describe").required(true))
}

/// Builds the command used for parsing.
pub(crate) fn clap_command() -> Command {
    Command::new(PROGRAM_NAME)
        .version(env!("CARGO_PKG_VERSION"))
        .about("Signatures, deltas and patches for large binary files")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("progress")
                .long("progress")
                .global(true)
                .help("Report progress on standard error")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .help("Increase log verbosity (repeatable)")
                .action(ArgAction::Count),
        )
        .subcommand(signature_command())
        .subcommand(delta_command())
        .subcommand(patch_command())
        .subcommand(explain_command())
}

/// Appends `suffix` to the final component of `path`.
pub(crate) fn with_suffix(path: &std::path::Path, suffix: &str) -> PathBuf {
    let mut raw = path.as_os_str().to_owned();
    raw.push(suffix);
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        clap_command().debug_assert();
    }

    #[test]
    fn algorithm_flags_reject_unknown_names() {
        let err = clap_command()
            .try_get_matches_from([PROGRAM_NAME, "signature", "basis", "--hash", "CRC32"])
            .expect_err("unknown hash");
        assert!(err.to_string().contains("unsupported hash algorithm 'CRC32'"));
    }

    #[test]
    fn default_output_paths_append_extensions() {
        assert_eq!(
            with_suffix(std::path::Path::new("dir/file.bin"), ".sig"),
            PathBuf::from("dir/file.bin.sig")
        );
    }
}
