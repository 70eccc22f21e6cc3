//! Randomised round trips through build and apply.

use std::io::Cursor;

use matching::{DeltaApplier, DeltaBuilder, DeltaOptions};
use proptest::prelude::*;
use protocol::{DeltaReader, DeltaWriter, SignatureWriter};
use signature::{Signature, SignatureBuilder, SignatureOptions};

#[derive(Clone, Debug)]
enum Edit {
    Insert(usize, Vec<u8>),
    Delete(usize, usize),
    Overwrite(usize, Vec<u8>),
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (any::<usize>(), prop::collection::vec(any::<u8>(), 1..300)).prop_map(|(at, bytes)| Edit::Insert(at, bytes)),
        (any::<usize>(), 1usize..500).prop_map(|(at, len)| Edit::Delete(at, len)),
        (any::<usize>(), prop::collection::vec(any::<u8>(), 1..64)).prop_map(|(at, bytes)| Edit::Overwrite(at, bytes)),
    ]
}

fn apply_edits(basis: &[u8], edits: &[Edit]) -> Vec<u8> {
    let mut target = basis.to_vec();
    for edit in edits {
        match edit {
            Edit::Insert(at, bytes) => {
                let at = at % (target.len() + 1);
                target.splice(at..at, bytes.iter().copied());
            }
            Edit::Delete(at, len) if !target.is_empty() => {
                let at = at % target.len();
                let end = (at + len).min(target.len());
                target.drain(at..end);
            }
            Edit::Overwrite(at, bytes) if !target.is_empty() => {
                let at = at % target.len();
                for (offset, byte) in bytes.iter().enumerate() {
                    if let Some(slot) = target.get_mut(at + offset) {
                        *slot = *byte;
                    }
                }
            }
            _ => {}
        }
    }
    target
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn edited_targets_are_reconstructed(
        basis in prop::collection::vec(any::<u8>(), 0..20_000),
        edits in prop::collection::vec(edit(), 0..6),
        chunk_size in 128usize..1024,
        aggregate in any::<bool>(),
        read_buffer in 1usize..8192,
    ) {
        let target = apply_edits(&basis, &edits);

        let options = SignatureOptions::default().with_chunk_size(chunk_size).expect("chunk size");
        let mut signature = SignatureWriter::new(Vec::new());
        SignatureBuilder::new(options)
            .build(&mut Cursor::new(&basis), &mut signature)
            .expect("signature");
        let signature = Signature::from_bytes(signature.get_ref()).expect("parse");

        let builder = DeltaBuilder::new(
            DeltaOptions::default()
                .with_aggregate_copies(aggregate)
                .with_read_buffer_size(read_buffer),
        );
        let mut delta = DeltaWriter::new(Vec::new());
        builder
            .build_delta(&mut Cursor::new(&target), &signature, &mut delta)
            .expect("delta");

        let mut reader = DeltaReader::new(Cursor::new(delta.into_inner())).expect("header");
        let mut output = Vec::new();
        let summary = DeltaApplier::default()
            .apply(&mut Cursor::new(&basis), &mut reader, &mut output)
            .expect("apply");
        prop_assert_eq!(&output, &target);
        prop_assert_eq!(summary.target_len(), target.len() as u64);
    }
}
