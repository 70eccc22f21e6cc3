//! crates/cli/src/drivers/tokio_io.rs
//!
//! Delta and patch drivers on a current-thread tokio runtime.

use std::path::Path;

use matching::{ApplyOptions, DeltaApplier, DeltaBuilder, DeltaOptions, DeltaSummary};
use protocol::AsyncDeltaReader;
use signature::Signature;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufReader, BufWriter};
use tokio::runtime::{Builder, Runtime};

use super::{persist, staged_output};
use crate::error::CliError;

fn runtime() -> Result<Runtime, CliError> {
    Ok(Builder::new_current_thread().enable_all().build()?)
}

async fn open(path: &Path) -> Result<File, CliError> {
    File::open(path).await.map_err(CliError::open(path))
}

pub(crate) fn write_delta(
    signature: &Path,
    target: &Path,
    output: &Path,
    options: DeltaOptions,
) -> Result<(), CliError> {
    runtime()?.block_on(async {
        let signature = Signature::read_async(&mut open(signature).await?, options.progress()).await?;
        let mut target_file = open(target).await?;
        let staged = staged_output(output)?;
        {
            let mut writer = BufWriter::new(File::from_std(staged.as_file().try_clone()?));
            DeltaBuilder::new(options)
                .build_delta_async(&mut target_file, &signature, &mut writer, None)
                .await?;
            writer.shutdown().await?;
        }
        persist(staged, output)
    })
}

pub(crate) fn apply_delta(
    basis: &Path,
    delta: &Path,
    output: &Path,
    options: ApplyOptions,
) -> Result<DeltaSummary, CliError> {
    runtime()?.block_on(async {
        let mut basis_file = open(basis).await?;
        let mut reader = AsyncDeltaReader::new(BufReader::new(open(delta).await?)).await?;
        let staged = staged_output(output)?;
        let summary = {
            let mut writer = BufWriter::new(File::from_std(staged.as_file().try_clone()?));
            let summary = DeltaApplier::new(options)
                .apply_async(&mut basis_file, &mut reader, &mut writer, None)
                .await?;
            writer.shutdown().await?;
            summary
        };
        persist(staged, output)?;
        Ok::<_, CliError>(summary)
    })
}
