//! crates/match/src/builder.rs
//!
//! Delta construction: target bytes plus a basis signature in, commands out.

use std::io::{self, Read, Seek, SeekFrom};

use protocol::{AggregateCopies, DeltaMetadata, DeltaSink, FileHash};
use signature::progress::ProgressTracker;
use signature::{ProgressOperation, Signature};
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::error::DeltaError;
use crate::options::DeltaOptions;
use crate::scan::{ScanStatus, Scanner};

/// Computes deltas with a fixed configuration.
#[derive(Clone, Debug, Default)]
pub struct DeltaBuilder {
    options: DeltaOptions,
}

impl DeltaBuilder {
    /// Creates a builder.
    #[must_use]
    pub const fn new(options: DeltaOptions) -> Self {
        Self { options }
    }

    /// Configuration in use.
    #[must_use]
    pub const fn options(&self) -> &DeltaOptions {
        &self.options
    }

    /// Emits the delta that turns the signature's basis into `target`.
    ///
    /// The target is read twice: once to compute the expected-output hash
    /// that goes into the header, then again to scan for matches.
    #[cfg_attr(
        feature = "tracing",
        instrument(skip_all, fields(chunks = signature.chunks().len()), name = "build_delta")
    )]
    pub fn build_delta<R, S>(&self, target: &mut R, signature: &Signature, sink: S) -> Result<(), DeltaError>
    where
        R: Read + Seek,
        S: DeltaSink,
    {
        let total = target.seek(SeekFrom::End(0))?;
        target.seek(SeekFrom::Start(0))?;
        let expected = self.hash_target(target, total)?;
        target.seek(SeekFrom::Start(0))?;
        self.emit(target, total, expected, signature, sink)
    }

    /// Like [`build_delta`](Self::build_delta) for targets that cannot be
    /// rewound. The caller supplies the expected-output hash.
    #[cfg_attr(
        feature = "tracing",
        instrument(skip_all, fields(chunks = signature.chunks().len()), name = "build_delta")
    )]
    pub fn build_delta_with_hash<R, S>(
        &self,
        target: &mut R,
        expected: FileHash,
        signature: &Signature,
        sink: S,
    ) -> Result<(), DeltaError>
    where
        R: Read,
        S: DeltaSink,
    {
        self.emit(target, 0, expected, signature, sink)
    }

    fn hash_target<R: Read + ?Sized>(&self, target: &mut R, total: u64) -> io::Result<FileHash> {
        let algorithm = self.options.file_hash_algorithm();
        let mut hashing = ProgressTracker::new(self.options.progress(), ProgressOperation::HashingFile, total);
        hashing.update(0);
        let digest = algorithm.compute_reader(target, |position| hashing.update(position))?;
        Ok(FileHash { algorithm, digest })
    }

    pub(crate) fn metadata(expected: FileHash, signature: &Signature) -> DeltaMetadata {
        DeltaMetadata {
            hash_algorithm: signature.chunk_hash_algorithm(),
            expected_file_hash: expected,
            base_file_hash: signature.base_file_hash().cloned(),
        }
    }

    pub(crate) fn scanner<'a>(&self, signature: &'a Signature) -> Scanner<'a> {
        Scanner::new(signature, |max_chunk_len| self.options.read_buffer_size_for(max_chunk_len))
    }

    fn emit<R, S>(
        &self,
        target: &mut R,
        total: u64,
        expected: FileHash,
        signature: &Signature,
        sink: S,
    ) -> Result<(), DeltaError>
    where
        R: Read + ?Sized,
        S: DeltaSink,
    {
        let metadata = Self::metadata(expected, signature);
        if self.options.aggregate_copies() {
            self.run(target, total, &metadata, signature, AggregateCopies::new(sink))
        } else {
            self.run(target, total, &metadata, signature, sink)
        }
    }

    fn run<R, S>(
        &self,
        target: &mut R,
        total: u64,
        metadata: &DeltaMetadata,
        signature: &Signature,
        mut sink: S,
    ) -> Result<(), DeltaError>
    where
        R: Read + ?Sized,
        S: DeltaSink,
    {
        sink.write_metadata(metadata)?;

        let mut scanner = self.scanner(signature);
        let mut scanning = ProgressTracker::new(self.options.progress(), ProgressOperation::BuildingDelta, total);
        scanning.update(0);
        loop {
            if scanner.needs_input() {
                let read = read_some(target, scanner.input_buffer())?;
                scanner.commit_input(read);
            }
            let status = scanner.scan(&mut sink)?;
            scanning.update(scanner.stats().scanned);
            if status == ScanStatus::Finished {
                break;
            }
        }
        sink.finish()?;

        let stats = scanner.stats();
        logging::trace_delta!(
            scanned = stats.scanned,
            copies = stats.copies,
            copied_bytes = stats.copied_bytes,
            literal_bytes = stats.literal_bytes,
            "delta built"
        );
        Ok(())
    }
}

fn read_some<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(buf) {
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    use checksums::HashAlgorithm;
    use protocol::SignatureWriter;
    use signature::{ProgressReport, SignatureBuilder, SignatureOptions};

    use super::*;
    use crate::test_support::{Command, Recorder, noise};

    fn signature_of(basis: &[u8], chunk_size: usize) -> Signature {
        let options = SignatureOptions::default()
            .with_chunk_size(chunk_size)
            .expect("chunk size");
        let mut writer = SignatureWriter::new(Vec::new());
        SignatureBuilder::new(options)
            .build(&mut Cursor::new(basis), &mut writer)
            .expect("signature");
        Signature::from_bytes(&writer.into_inner()).expect("parse")
    }

    fn record(builder: &DeltaBuilder, target: &[u8], signature: &Signature) -> Recorder {
        let mut recorder = Recorder::default();
        builder
            .build_delta(&mut Cursor::new(target), signature, &mut recorder)
            .expect("delta");
        recorder
    }

    #[test]
    fn header_carries_expected_and_base_hashes() {
        let basis = noise(3000, 1);
        let signature = signature_of(&basis, 1024);
        let recorder = record(&DeltaBuilder::default(), &basis, &signature);

        let metadata = recorder.metadata.expect("metadata");
        assert_eq!(metadata.hash_algorithm, HashAlgorithm::Xxh64);
        assert_eq!(metadata.expected_file_hash, FileHash::compute(HashAlgorithm::Md5, &basis));
        assert_eq!(metadata.base_file_hash.as_ref(), signature.base_file_hash());
        assert!(recorder.finished);
    }

    #[test]
    fn unchanged_file_is_copied_chunk_by_chunk() {
        let basis = noise(3000, 2);
        let signature = signature_of(&basis, 1024);
        let recorder = record(&DeltaBuilder::default(), &basis, &signature);
        assert_eq!(
            recorder.commands,
            [
                Command::Copy(0, 1024),
                Command::Copy(1024, 1024),
                Command::Copy(2048, 952),
            ]
        );
    }

    #[test]
    fn aggregation_merges_adjacent_copies() {
        let basis = noise(3000, 3);
        let signature = signature_of(&basis, 1024);
        let builder = DeltaBuilder::new(DeltaOptions::default().with_aggregate_copies(true));
        let recorder = record(&builder, &basis, &signature);
        assert_eq!(recorder.commands, [Command::Copy(0, 3000)]);
    }

    #[test]
    fn inserted_bytes_become_one_data_command() {
        let basis = noise(4096, 4);
        let signature = signature_of(&basis, 1024);
        let mut target = basis[..2048].to_vec();
        target.extend_from_slice(b"inserted");
        target.extend_from_slice(&basis[2048..]);

        let builder = DeltaBuilder::new(DeltaOptions::default().with_aggregate_copies(true));
        let recorder = record(&builder, &target, &signature);
        assert_eq!(
            recorder.commands,
            [
                Command::Copy(0, 2048),
                Command::Data(b"inserted".to_vec()),
                Command::Copy(2048, 2048),
            ]
        );
    }

    #[test]
    fn empty_basis_yields_one_literal() {
        let signature = signature_of(&[], 1024);
        let recorder = record(&DeltaBuilder::default(), b"fresh content", &signature);
        assert_eq!(recorder.commands, [Command::Data(b"fresh content".to_vec())]);
    }

    #[test]
    fn empty_target_yields_header_only() {
        let signature = signature_of(&noise(500, 5), 128);
        let recorder = record(&DeltaBuilder::default(), &[], &signature);
        assert!(recorder.metadata.is_some());
        assert!(recorder.commands.is_empty());
    }

    #[test]
    fn forward_only_target_uses_supplied_hash() {
        let basis = noise(2000, 6);
        let signature = signature_of(&basis, 512);
        let expected = FileHash::compute(HashAlgorithm::Sha1, &basis);
        let mut recorder = Recorder::default();
        DeltaBuilder::default()
            .build_delta_with_hash(&mut basis.as_slice(), expected.clone(), &signature, &mut recorder)
            .expect("delta");
        assert_eq!(recorder.metadata.expect("metadata").expected_file_hash, expected);
        assert_eq!(recorder.commands.len(), 4);
    }

    #[test]
    fn progress_covers_hashing_and_scanning() {
        let basis = noise(10_000, 7);
        let signature = signature_of(&basis, 1024);
        let reports = Arc::new(Mutex::new(Vec::<ProgressReport>::new()));
        let sink = Arc::clone(&reports);
        let builder = DeltaBuilder::new(
            DeltaOptions::default()
                .with_read_buffer_size(4096)
                .with_progress(move |report: ProgressReport| sink.lock().expect("lock").push(report)),
        );
        record(&builder, &basis, &signature);

        let reports = reports.lock().expect("lock");
        let last_scan = reports
            .iter()
            .rev()
            .find(|report| report.operation == ProgressOperation::BuildingDelta)
            .expect("scan report");
        assert_eq!(last_scan.current_position, 10_000);
        assert_eq!(last_scan.total, 10_000);
        assert!(
            reports
                .iter()
                .any(|report| report.operation == ProgressOperation::HashingFile)
        );
    }
}
