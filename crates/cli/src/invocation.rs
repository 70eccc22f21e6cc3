//! crates/cli/src/invocation.rs
//!
//! Parsed command line.

use std::ffi::OsString;
use std::path::PathBuf;

use checksums::{HashAlgorithm, RollingChecksumAlgorithm};
use clap::ArgMatches;

use crate::command::{clap_command, with_suffix};

/// What to run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Action {
    Signature {
        basis: PathBuf,
        output: PathBuf,
        chunk_size: Option<usize>,
        rolling_checksum: Option<RollingChecksumAlgorithm>,
        hash: Option<HashAlgorithm>,
    },
    Delta {
        signature: PathBuf,
        target: PathBuf,
        output: PathBuf,
    },
    Patch {
        basis: PathBuf,
        delta: PathBuf,
        output: PathBuf,
        skip_verification: bool,
    },
    ExplainDelta {
        delta: PathBuf,
    },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Invocation {
    pub(crate) action: Action,
    pub(crate) progress: bool,
    pub(crate) verbosity: u8,
}

impl Invocation {
    pub(crate) fn parse<I, S>(arguments: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString> + Clone,
    {
        let mut matches = clap_command().try_get_matches_from(arguments)?;
        let progress = matches.get_flag("progress");
        let verbosity = matches.get_count("verbose");
        let action = match matches.remove_subcommand() {
            Some((name, sub)) => action_from(&name, sub),
            None => None,
        };
        let Some(action) = action else {
            return Err(clap_command().error(
                clap::error::ErrorKind::MissingSubcommand,
                "a subcommand is required",
            ));
        };
        Ok(Self {
            action,
            progress,
            verbosity,
        })
    }
}

fn path(matches: &mut ArgMatches, id: &str) -> Option<PathBuf> {
    matches.remove_one::<PathBuf>(id)
}

fn action_from(name: &str, mut matches: ArgMatches) -> Option<Action> {
    let action = match name {
        "signature" => {
            let basis = path(&mut matches, "basis")?;
            let output = path(&mut matches, "signature").unwrap_or_else(|| with_suffix(&basis, ".sig"));
            Action::Signature {
                basis,
                output,
                chunk_size: matches.remove_one::<usize>("chunk-size"),
                rolling_checksum: matches.remove_one::<RollingChecksumAlgorithm>("rolling-checksum"),
                hash: matches.remove_one::<HashAlgorithm>("hash"),
            }
        }
        "delta" => {
            let signature = path(&mut matches, "signature")?;
            let target = path(&mut matches, "target")?;
            let output = path(&mut matches, "delta").unwrap_or_else(|| with_suffix(&target, ".delta"));
            Action::Delta {
                signature,
                target,
                output,
            }
        }
        "patch" => Action::Patch {
            basis: path(&mut matches, "basis")?,
            delta: path(&mut matches, "delta")?,
            output: path(&mut matches, "output")?,
            skip_verification: matches.get_flag("skip-verification"),
        },
        "explain-delta" => Action::ExplainDelta {
            delta: path(&mut matches, "delta")?,
        },
        _ => return None,
    };
    Some(action)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Invocation {
        Invocation::parse(std::iter::once("rdelta").chain(args.iter().copied())).expect("parse")
    }

    #[test]
    fn signature_defaults_output_next_to_basis() {
        let invocation = parse(&["signature", "data/basis.bin"]);
        assert_eq!(
            invocation.action,
            Action::Signature {
                basis: PathBuf::from("data/basis.bin"),
                output: PathBuf::from("data/basis.bin.sig"),
                chunk_size: None,
                rolling_checksum: None,
                hash: None,
            }
        );
        assert!(!invocation.progress);
        assert_eq!(invocation.verbosity, 0);
    }

    #[test]
    fn signature_algorithms_are_parsed_by_name() {
        let invocation = parse(&[
            "signature",
            "basis",
            "out.sig",
            "--chunk-size",
            "4096",
            "--rolling-checksum",
            "Adler32V2",
            "--hash",
            "SHA1",
        ]);
        let Action::Signature {
            output,
            chunk_size,
            rolling_checksum,
            hash,
            ..
        } = invocation.action
        else {
            panic!("expected signature action");
        };
        assert_eq!(output, PathBuf::from("out.sig"));
        assert_eq!(chunk_size, Some(4096));
        assert_eq!(rolling_checksum, Some(RollingChecksumAlgorithm::Adler32V2));
        assert_eq!(hash, Some(HashAlgorithm::Sha1));
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let invocation = parse(&["patch", "b", "d", "o", "--skip-verification", "-vv", "--progress"]);
        assert!(invocation.progress);
        assert_eq!(invocation.verbosity, 2);
        assert!(matches!(
            invocation.action,
            Action::Patch {
                skip_verification: true,
                ..
            }
        ));
    }

    #[test]
    fn delta_defaults_output_next_to_target() {
        let invocation = parse(&["delta", "basis.sig", "target.bin"]);
        assert!(matches!(
            invocation.action,
            Action::Delta { ref output, .. } if output == &PathBuf::from("target.bin.delta")
        ));
    }

    #[test]
    fn missing_operands_are_rejected() {
        assert!(Invocation::parse(["rdelta", "patch", "basis"]).is_err());
        assert!(Invocation::parse(["rdelta"]).is_err());
    }
}
