//! Stored (uncompressed) zip archive writer.
//!
//! Produces a single-disk archive: a local header followed by the raw bytes for each
//! entry, then the central directory and the end-of-central-directory record. All
//! multi-byte fields are little endian. Dates, flags and attributes are zero, so the
//! output depends only on the entries.

use thiserror::Error;
use tracing::debug;

const LOCAL_HEADER_SIGNATURE: u32 = 0x0403_4b50;
const CENTRAL_HEADER_SIGNATURE: u32 = 0x0201_4b50;
const END_OF_CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x0605_4b50;
/// Version 2.0: the minimum for stored entries.
const VERSION: u16 = 20;
const CRC32_POLYNOMIAL: u32 = 0xEDB8_8320;

const LOCAL_HEADER_LEN: usize = 30;
const CENTRAL_HEADER_LEN: usize = 46;
const END_RECORD_LEN: usize = 22;

static CRC_TABLE: [u32; 256] = crc_table();

const fn crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut c = i as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 {
                CRC32_POLYNOMIAL ^ (c >> 1)
            } else {
                c >> 1
            };
            k += 1;
        }
        table[i] = c;
        i += 1;
    }
    table
}

/// Reflected CRC-32 (polynomial `0xEDB88320`) as used by zip.
///
/// # Example
/// ```
/// assert_eq!(slicer::crc32(b"123456789"), 0xCBF4_3926);
/// assert_eq!(slicer::crc32(b""), 0);
/// ```
pub fn crc32(data: &[u8]) -> u32 {
    !data.iter().fold(u32::MAX, |crc, &byte| {
        CRC_TABLE[((crc ^ u32::from(byte)) & 0xff) as usize] ^ (crc >> 8)
    })
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ArchiveError {
    #[error("Entry {name} is {size} bytes, over the 4 GiB limit")]
    EntryTooLarge { name: String, size: usize },

    #[error("Entry name is {length} bytes, over the 65535 byte limit")]
    NameTooLong { length: usize },

    #[error("Archive holds {0} entries, over the 65535 entry limit")]
    TooManyEntries(usize),

    #[error("Archive grows past the 4 GiB offset limit")]
    ArchiveTooLarge,
}

/// A named file to store in the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ArchiveEntry {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

trait PutLe {
    fn put_u16(&mut self, value: u16);
    fn put_u32(&mut self, value: u32);
}

impl PutLe for Vec<u8> {
    fn put_u16(&mut self, value: u16) {
        self.extend_from_slice(&value.to_le_bytes());
    }

    fn put_u32(&mut self, value: u32) {
        self.extend_from_slice(&value.to_le_bytes());
    }
}

/// Fields shared by the local header and the central directory record.
struct EntryHeader<'a> {
    name: &'a [u8],
    crc: u32,
    size: u32,
    offset: u32,
}

impl EntryHeader<'_> {
    fn write_local(&self, out: &mut Vec<u8>) {
        out.put_u32(LOCAL_HEADER_SIGNATURE);
        out.put_u16(VERSION); // version needed
        out.put_u16(0); // flags
        out.put_u16(0); // compression: stored
        out.put_u16(0); // mod time
        out.put_u16(0); // mod date
        out.put_u32(self.crc);
        out.put_u32(self.size); // compressed
        out.put_u32(self.size); // uncompressed
        out.put_u16(self.name.len() as u16);
        out.put_u16(0); // extra field length
        out.extend_from_slice(self.name);
    }

    fn write_central(&self, out: &mut Vec<u8>) {
        out.put_u32(CENTRAL_HEADER_SIGNATURE);
        out.put_u16(VERSION); // version made by
        out.put_u16(VERSION); // version needed
        out.put_u16(0); // flags
        out.put_u16(0); // compression: stored
        out.put_u16(0); // mod time
        out.put_u16(0); // mod date
        out.put_u32(self.crc);
        out.put_u32(self.size); // compressed
        out.put_u32(self.size); // uncompressed
        out.put_u16(self.name.len() as u16);
        out.put_u16(0); // extra field length
        out.put_u16(0); // comment length
        out.put_u16(0); // disk number start
        out.put_u16(0); // internal attributes
        out.put_u32(0); // external attributes
        out.put_u32(self.offset);
        out.extend_from_slice(self.name);
    }
}

/// Packages `entries`, in order, into a stored zip archive.
///
/// The same entries always produce the same bytes. Zero entries yield a bare
/// end-of-central-directory record; zero-length entries are stored as such. Entry
/// names are written as given and are not checked for uniqueness.
///
/// # Errors
/// Returns [`ArchiveError`] when a size, name length, entry count or offset does not
/// fit the format's 16/32-bit fields.
///
/// # Example
/// ```
/// use slicer::{build_archive, ArchiveEntry};
///
/// let archive = build_archive(&[ArchiveEntry::new("a.txt", b"hello".to_vec())]).unwrap();
/// assert_eq!(&archive[..4], b"PK\x03\x04");
/// assert_eq!(archive.len(), 30 + 5 + 5 + 46 + 5 + 22);
/// ```
pub fn build_archive(entries: &[ArchiveEntry]) -> Result<Vec<u8>, ArchiveError> {
    let count =
        u16::try_from(entries.len()).map_err(|_| ArchiveError::TooManyEntries(entries.len()))?;

    let mut out: Vec<u8> = Vec::with_capacity(
        entries
            .iter()
            .map(|e| LOCAL_HEADER_LEN + CENTRAL_HEADER_LEN + 2 * e.name.len() + e.bytes.len())
            .sum::<usize>()
            + END_RECORD_LEN,
    );
    let mut central: Vec<u8> = Vec::with_capacity(
        entries
            .iter()
            .map(|e| CENTRAL_HEADER_LEN + e.name.len())
            .sum(),
    );

    for entry in entries {
        let name = entry.name.as_bytes();
        if u16::try_from(name.len()).is_err() {
            return Err(ArchiveError::NameTooLong { length: name.len() });
        }
        let size = u32::try_from(entry.bytes.len()).map_err(|_| ArchiveError::EntryTooLarge {
            name: entry.name.clone(),
            size: entry.bytes.len(),
        })?;
        let offset = u32::try_from(out.len()).map_err(|_| ArchiveError::ArchiveTooLarge)?;

        let header = EntryHeader {
            name,
            crc: crc32(&entry.bytes),
            size,
            offset,
        };
        header.write_local(&mut out);
        out.extend_from_slice(&entry.bytes);
        header.write_central(&mut central);
    }

    let central_offset = u32::try_from(out.len()).map_err(|_| ArchiveError::ArchiveTooLarge)?;
    let central_len = u32::try_from(central.len()).map_err(|_| ArchiveError::ArchiveTooLarge)?;
    out.extend_from_slice(&central);

    out.put_u32(END_OF_CENTRAL_DIRECTORY_SIGNATURE);
    out.put_u16(0); // this disk
    out.put_u16(0); // disk with central directory
    out.put_u16(count); // entries on this disk
    out.put_u16(count); // entries total
    out.put_u32(central_len);
    out.put_u32(central_offset);
    out.put_u16(0); // comment length

    debug!(
        entries = entries.len(),
        bytes = out.len(),
        "Built archive"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    /// One entry as listed by the central directory and its local header.
    #[derive(Debug, PartialEq)]
    struct Listed {
        name: String,
        crc: u32,
        size: u32,
        bytes: Vec<u8>,
    }

    fn u16_at(data: &[u8], at: usize) -> u16 {
        u16::from_le_bytes([data[at], data[at + 1]])
    }

    fn u32_at(data: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
    }

    /// Reads an archive the way a zip reader does: end record, then central
    /// directory, then each local header it points at.
    fn read_archive(data: &[u8]) -> Vec<Listed> {
        let end = data.len() - END_RECORD_LEN;
        assert_eq!(u32_at(data, end), END_OF_CENTRAL_DIRECTORY_SIGNATURE);
        let count = u16_at(data, end + 10) as usize;
        assert_eq!(u16_at(data, end + 8) as usize, count);
        let central_len = u32_at(data, end + 12) as usize;
        let mut at = u32_at(data, end + 16) as usize;
        assert_eq!(at + central_len, end);

        let mut listed = Vec::new();
        for _ in 0..count {
            assert_eq!(u32_at(data, at), CENTRAL_HEADER_SIGNATURE);
            assert_eq!(u16_at(data, at + 10), 0, "stored entries only");
            let crc = u32_at(data, at + 16);
            let compressed = u32_at(data, at + 20);
            let size = u32_at(data, at + 24);
            assert_eq!(compressed, size);
            let name_len = u16_at(data, at + 28) as usize;
            let local = u32_at(data, at + 42) as usize;
            let name = String::from_utf8(data[at + 46..at + 46 + name_len].to_vec()).unwrap();

            assert_eq!(u32_at(data, local), LOCAL_HEADER_SIGNATURE);
            assert_eq!(u32_at(data, local + 14), crc);
            assert_eq!(u32_at(data, local + 22), size);
            assert_eq!(u16_at(data, local + 26) as usize, name_len);
            let body = local + LOCAL_HEADER_LEN + name_len;
            let bytes = data[body..body + size as usize].to_vec();

            listed.push(Listed {
                name,
                crc,
                size,
                bytes,
            });
            at += CENTRAL_HEADER_LEN + name_len;
        }
        listed
    }

    #[test_case(b"" => 0; "empty input")]
    #[test_case(b"a" => 0xE8B7_BE43; "single byte")]
    #[test_case(b"123456789" => 0xCBF4_3926; "check value")]
    #[test_case(b"The quick brown fox jumps over the lazy dog" => 0x414F_A339; "pangram")]
    fn test_crc32(data: &[u8]) -> u32 {
        crc32(data)
    }

    #[test]
    fn test_empty_archive_is_end_record_only() {
        let archive = build_archive(&[]).unwrap();
        assert_eq!(
            archive,
            vec![0x50, 0x4b, 0x05, 0x06, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]
        );
        assert!(read_archive(&archive).is_empty());
    }

    #[test]
    fn test_single_entry_layout() {
        let archive = build_archive(&[ArchiveEntry::new("a", b"xyz".to_vec())]).unwrap();
        let crc = crc32(b"xyz").to_le_bytes();

        let mut expected = vec![0x50, 0x4b, 0x03, 0x04, 20, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        expected.extend_from_slice(&crc);
        expected.extend_from_slice(&[3, 0, 0, 0, 3, 0, 0, 0, 1, 0, 0, 0, b'a']);
        expected.extend_from_slice(b"xyz");
        expected.extend_from_slice(&[0x50, 0x4b, 0x01, 0x02, 20, 0, 20, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        expected.extend_from_slice(&crc);
        expected.extend_from_slice(&[3, 0, 0, 0, 3, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        expected.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 0, b'a']);
        expected.extend_from_slice(&[0x50, 0x4b, 0x05, 0x06, 0, 0, 0, 0, 1, 0, 1, 0]);
        expected.extend_from_slice(&[47, 0, 0, 0, 34, 0, 0, 0, 0, 0]);

        assert_eq!(archive, expected);
    }

    #[test]
    fn test_zero_length_entry() {
        let entries = [
            ArchiveEntry::new("empty.bin", Vec::<u8>::new()),
            ArchiveEntry::new("one.bin", vec![7u8]),
        ];
        let listed = read_archive(&build_archive(&entries).unwrap());
        assert_eq!(
            listed,
            vec![
                Listed {
                    name: "empty.bin".into(),
                    crc: 0,
                    size: 0,
                    bytes: vec![],
                },
                Listed {
                    name: "one.bin".into(),
                    crc: crc32(&[7]),
                    size: 1,
                    bytes: vec![7],
                },
            ]
        );
    }

    #[test]
    fn test_name_too_long() {
        let entries = [ArchiveEntry::new("n".repeat(70_000), Vec::<u8>::new())];
        assert_eq!(
            build_archive(&entries),
            Err(ArchiveError::NameTooLong { length: 70_000 })
        );
    }

    #[test]
    fn test_too_many_entries() {
        let entries = vec![ArchiveEntry::new("x", Vec::<u8>::new()); 70_000];
        assert_eq!(
            build_archive(&entries),
            Err(ArchiveError::TooManyEntries(70_000))
        );
    }

    proptest! {
        #[test]
        fn test_archive_lists_entries_proptest(
            payloads in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..300), 0..12)
        ) {
            let entries: Vec<ArchiveEntry> = payloads
                .into_iter()
                .enumerate()
                .map(|(i, bytes)| ArchiveEntry::new(format!("slice-{}.png", i + 1), bytes))
                .collect();

            let archive = build_archive(&entries).unwrap();
            prop_assert_eq!(&archive, &build_archive(&entries).unwrap());

            let listed = read_archive(&archive);
            prop_assert_eq!(listed.len(), entries.len());
            for (entry, listed) in entries.iter().zip(&listed) {
                prop_assert_eq!(&listed.name, &entry.name);
                prop_assert_eq!(listed.size as usize, entry.bytes.len());
                prop_assert_eq!(listed.crc, crc32(&entry.bytes));
                prop_assert_eq!(&listed.bytes, &entry.bytes);
            }
        }
    }
}
