//! crates/cli/src/drivers/blocking.rs
//!
//! Drivers on blocking `std::fs` I/O.

use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use matching::DeltaSummary;
#[cfg(not(feature = "async"))]
use matching::{ApplyOptions, DeltaApplier, DeltaBuilder, DeltaOptions};
use protocol::{DeltaReader, SignatureWriter};
#[cfg(not(feature = "async"))]
use protocol::DeltaWriter;
use signature::{SignatureBuilder, SignatureOptions};

use super::{open, persist, staged_output};
use crate::error::CliError;

pub(crate) fn write_signature(basis: &Path, output: &Path, options: SignatureOptions) -> Result<(), CliError> {
    let mut basis_file = open(basis)?;
    let staged = staged_output(output)?;
    {
        let mut writer = SignatureWriter::new(BufWriter::new(staged.as_file()));
        SignatureBuilder::new(options).build(&mut basis_file, &mut writer)?;
        writer.into_inner().flush()?;
    }
    persist(staged, output)
}

#[cfg(not(feature = "async"))]
pub(crate) fn write_delta(
    signature: &Path,
    target: &Path,
    output: &Path,
    options: DeltaOptions,
) -> Result<(), CliError> {
    let signature = super::read_signature(signature, options.progress())?;
    let mut target_file = open(target)?;
    let staged = staged_output(output)?;
    {
        let mut writer = DeltaWriter::new(BufWriter::new(staged.as_file()));
        DeltaBuilder::new(options).build_delta(&mut target_file, &signature, &mut writer)?;
    }
    persist(staged, output)
}

#[cfg(not(feature = "async"))]
pub(crate) fn apply_delta(
    basis: &Path,
    delta: &Path,
    output: &Path,
    options: ApplyOptions,
) -> Result<DeltaSummary, CliError> {
    let mut basis_file = open(basis)?;
    let mut reader = DeltaReader::new(BufReader::new(open(delta)?))?;
    let staged = staged_output(output)?;
    let summary = {
        let mut writer = BufWriter::new(staged.as_file());
        DeltaApplier::new(options).apply(&mut basis_file, &mut reader, &mut writer)?
    };
    persist(staged, output)?;
    Ok(summary)
}

pub(crate) fn explain_delta<W: Write>(delta: &Path, out: &mut W) -> Result<DeltaSummary, CliError> {
    let mut reader = DeltaReader::new(BufReader::new(open(delta)?))?;
    Ok(matching::explain(&mut reader, out)?)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn signature_is_only_visible_after_success() {
        let dir = tempfile::tempdir().expect("tempdir");
        let output = dir.path().join("missing.sig");
        let err = write_signature(&dir.path().join("missing"), &output, SignatureOptions::default())
            .expect_err("missing basis");
        assert!(matches!(err, CliError::Open { .. }));
        assert!(!output.exists());

        let basis = dir.path().join("basis");
        fs::write(&basis, vec![3u8; 5000]).expect("write basis");
        write_signature(&basis, &output, SignatureOptions::default()).expect("signature");
        let leftovers = fs::read_dir(dir.path())
            .expect("read dir")
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(".rdelta-"))
            .count();
        assert_eq!(leftovers, 0);
        assert!(fs::metadata(&output).expect("signature").len() > 0);
    }

    #[test]
    fn explain_reports_a_malformed_delta() {
        let dir = tempfile::tempdir().expect("tempdir");
        let delta = dir.path().join("bad.delta");
        fs::write(&delta, b"not a delta at all").expect("write");
        let err = explain_delta(&delta, &mut Vec::new()).expect_err("malformed");
        assert!(matches!(err, CliError::Format(_)));
    }
}
