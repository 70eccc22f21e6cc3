#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `cli` is the command-line front-end of rdelta. It exposes four
//! subcommands:
//!
//! - `signature BASIS [SIGNATURE]` writes the signature of a basis file.
//! - `delta SIGNATURE TARGET [DELTA]` writes the delta that turns the basis
//!   into the target.
//! - `patch BASIS DELTA OUTPUT` applies a delta and verifies the result.
//! - `explain-delta DELTA` prints a delta's header and commands.
//!
//! # Design
//!
//! [`run`] parses arguments with a `clap` builder, installs the tracing
//! subscriber for the requested verbosity and dispatches to a file-level
//! driver. Outputs are staged in a temporary file and renamed into place on
//! success only. With the `async` feature, `delta` and `patch` go through the
//! tokio drivers of the `matching` crate; the bytes written are the same.
//!
//! # Errors
//!
//! Diagnostics go to the error stream prefixed with the program name. A
//! patch whose output does not match the hash stored in the delta exits with
//! [`EXIT_VERIFICATION_FAILED`]; every other failure exits with
//! [`EXIT_FAILURE`].
//!
//! # Examples
//!
//! ```
//! let mut stdout = Vec::new();
//! let mut stderr = Vec::new();
//! let status = cli::run(["rdelta", "--version"], &mut stdout, &mut stderr);
//!
//! assert_eq!(status, 0);
//! assert!(String::from_utf8(stdout).unwrap().starts_with("rdelta "));
//! ```

use std::ffi::OsString;
use std::io::Write;

use matching::{ApplyOptions, DeltaOptions};
use signature::SignatureOptions;

mod command;
mod drivers;
mod error;
mod invocation;
mod progress;

pub use error::{CliError, EXIT_FAILURE, EXIT_SUCCESS, EXIT_VERIFICATION_FAILED};

use command::PROGRAM_NAME;
use invocation::{Action, Invocation};
use progress::with_progress;

/// Maximum exit code representable by a process.
const MAX_EXIT_CODE: i32 = u8::MAX as i32;

/// Runs the command line `arguments`, writing to the given streams.
///
/// Returns the process exit status.
pub fn run<I, S, Out, Err>(arguments: I, stdout: &mut Out, stderr: &mut Err) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<OsString> + Clone,
    Out: Write,
    Err: Write,
{
    let invocation = match Invocation::parse(arguments) {
        Ok(invocation) => invocation,
        Err(error) => {
            let rendered = error.render().to_string();
            return if error.use_stderr() {
                let _ = write!(stderr, "{rendered}");
                EXIT_FAILURE
            } else {
                let _ = write!(stdout, "{rendered}");
                EXIT_SUCCESS
            };
        }
    };

    logging::init(invocation.verbosity);
    match execute(invocation, stdout, stderr) {
        Ok(()) => EXIT_SUCCESS,
        Err(error) => {
            let _ = writeln!(stderr, "{PROGRAM_NAME}: {error}");
            error.exit_code()
        }
    }
}

fn execute<Out, Err>(invocation: Invocation, stdout: &mut Out, stderr: &mut Err) -> Result<(), CliError>
where
    Out: Write,
    Err: Write,
{
    let progress = invocation.progress;
    match invocation.action {
        Action::Signature {
            basis,
            output,
            chunk_size,
            rolling_checksum,
            hash,
        } => {
            let mut options = SignatureOptions::default();
            if let Some(size) = chunk_size {
                options = options.with_chunk_size(size)?;
            }
            if let Some(algorithm) = rolling_checksum {
                options = options.with_rolling_checksum(algorithm);
            }
            if let Some(algorithm) = hash {
                options = options.with_chunk_hash(algorithm);
            }
            with_progress(progress, stderr, |sender| {
                let options = match sender {
                    Some(sender) => options.with_progress(sender),
                    None => options,
                };
                drivers::blocking::write_signature(&basis, &output, options)
            })?;
            tracing::info!(target: logging::TARGET_SIGNATURE, output = %output.display(), "signature written");
        }
        Action::Delta {
            signature,
            target,
            output,
        } => {
            let options = DeltaOptions::default().with_aggregate_copies(true);
            with_progress(progress, stderr, |sender| {
                let options = match sender {
                    Some(sender) => options.with_progress(sender),
                    None => options,
                };
                drivers::write_delta(&signature, &target, &output, options)
            })?;
            tracing::info!(target: logging::TARGET_DELTA, output = %output.display(), "delta written");
        }
        Action::Patch {
            basis,
            delta,
            output,
            skip_verification,
        } => {
            let options = ApplyOptions::default().with_skip_hash_check(skip_verification);
            let summary = with_progress(progress, stderr, |sender| {
                let options = match sender {
                    Some(sender) => options.with_progress(sender),
                    None => options,
                };
                drivers::apply_delta(&basis, &delta, &output, options)
            })?;
            tracing::info!(target: logging::TARGET_PATCH, %summary, output = %output.display(), "patch applied");
        }
        Action::ExplainDelta { delta } => {
            drivers::blocking::explain_delta(&delta, stdout)?;
        }
    }
    Ok(())
}

/// Converts a numeric exit code into an [`std::process::ExitCode`].
#[must_use]
pub fn exit_code_from(status: i32) -> std::process::ExitCode {
    let clamped = status.clamp(0, MAX_EXIT_CODE);
    std::process::ExitCode::from(clamped as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_goes_to_stdout() {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        assert_eq!(run(["rdelta", "--help"], &mut stdout, &mut stderr), EXIT_SUCCESS);
        let help = String::from_utf8(stdout).expect("utf8");
        for subcommand in ["signature", "delta", "patch", "explain-delta"] {
            assert!(help.contains(subcommand), "help lists {subcommand}");
        }
        assert!(stderr.is_empty());
    }

    #[test]
    fn usage_errors_exit_with_failure() {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let status = run(["rdelta", "signature"], &mut stdout, &mut stderr);
        assert_eq!(status, EXIT_FAILURE);
        assert!(!stderr.is_empty());
    }

    #[test]
    fn chunk_size_out_of_range_is_reported() {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let status = run(
            ["rdelta", "signature", "whatever", "--chunk-size", "64"],
            &mut stdout,
            &mut stderr,
        );
        assert_eq!(status, EXIT_FAILURE);
        let message = String::from_utf8(stderr).expect("utf8");
        assert!(message.starts_with("rdelta: "), "{message}");
        assert!(message.contains("64"), "{message}");
    }
}
