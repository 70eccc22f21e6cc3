//! Published test vectors for every registered strong hash.

use checksums::HashAlgorithm;

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[test]
fn md5_vectors() {
    let md5 = HashAlgorithm::Md5;
    assert_eq!(hex(&md5.compute(b"abc")), "900150983cd24fb0d6963f7d28e17f72");
    assert_eq!(
        hex(&md5.compute(b"The quick brown fox jumps over the lazy dog")),
        "9e107d9d372bb6826bd81d3542a419d6"
    );
}

#[test]
fn sha1_vectors() {
    let sha1 = HashAlgorithm::Sha1;
    assert_eq!(hex(&sha1.compute(b"")), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
    assert_eq!(
        hex(&sha1.compute(b"The quick brown fox jumps over the lazy dog")),
        "2fd4e1c67a2d28fced849ee1bb76e7391b93eb12"
    );
}

#[test]
fn xxhash_vectors() {
    assert_eq!(hex(&HashAlgorithm::Xxh64.compute(b"")), "ef46db3751d8e999");
    assert_eq!(hex(&HashAlgorithm::Xxh3.compute(b"")), "2d06800538d394c2");
}

#[test]
fn names_resolve_to_the_same_algorithm() {
    for name in ["XXH64", "XXH3", "MD5", "SHA1"] {
        let algorithm = HashAlgorithm::from_name(name).expect("registered");
        assert_eq!(algorithm.name(), name);
        assert_eq!(name.parse::<HashAlgorithm>(), Ok(algorithm));
    }
}

#[test]
fn hashing_is_deterministic() {
    let data = vec![0xa5u8; 10_000];
    for algorithm in HashAlgorithm::ALL {
        assert_eq!(algorithm.compute(&data), algorithm.compute(&data));
    }
}
