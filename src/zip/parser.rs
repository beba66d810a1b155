//! Low-level ZIP archive parser.
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) at the file's end
//! 2. If ZIP64, read the ZIP64 EOCD for large file support
//! 3. Read the Central Directory to get metadata for all files
//! 4. For extraction, read each file's Local File Header and data
//!
//! Listing an archive only touches its trailer, which keeps it cheap over
//! HTTP Range requests.

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use log::debug;

use super::structures::*;
use crate::error::{ReadError, ReadResult};
use crate::resource::Resource;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
pub const MAX_COMMENT_SIZE: u64 = 65535;

/// Number of trailing bytes that may hold the EOCD, its comment and the
/// ZIP64 locator.
pub const TRAILER_SIZE: u64 =
    MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE as u64 + Zip64Locator::SIZE as u64;

/// Parses ZIP structures out of any [`Resource`].
pub struct ZipParser<'a, R: Resource + ?Sized> {
    reader: &'a R,
    /// Total size of the archive in bytes
    size: u64,
}

impl<'a, R: Resource + ?Sized> ZipParser<'a, R> {
    pub fn new(reader: &'a R, size: u64) -> Self {
        Self { reader, size }
    }

    /// Reads exactly `len` bytes at `offset`.
    async fn read_exact_at(&self, offset: u64, len: u64) -> ReadResult<Vec<u8>> {
        let data = self.reader.read(Some(offset..offset.saturating_add(len))).await?;
        if (data.len() as u64) < len {
            return Err(ReadError::decoding(format!(
                "ZIP archive truncated: expected {} bytes at offset {}, got {}",
                len,
                offset,
                data.len()
            )));
        }
        Ok(data)
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// Returns the record and its offset in the archive.
    pub async fn find_eocd(&self) -> ReadResult<(EndOfCentralDirectory, u64)> {
        let eocd_size = EndOfCentralDirectory::SIZE as u64;
        if self.size < eocd_size {
            return Err(ReadError::decoding("not a valid ZIP archive"));
        }

        // Common case: no archive comment.
        let offset = self.size - eocd_size;
        let buf = self.read_exact_at(offset, eocd_size).await?;
        if &buf[0..4] == EndOfCentralDirectory::SIGNATURE && buf[20..22] == [0, 0] {
            return Ok((EndOfCentralDirectory::from_bytes(&buf)?, offset));
        }

        // Search backwards for the signature, the comment length must match
        // the remaining bytes.
        let search_size = (MAX_COMMENT_SIZE + eocd_size).min(self.size);
        let search_start = self.size - search_size;
        let buf = self.read_exact_at(search_start, search_size).await?;
        for i in (0..=buf.len() - EndOfCentralDirectory::SIZE).rev() {
            if &buf[i..i + 4] != EndOfCentralDirectory::SIGNATURE {
                continue;
            }
            let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;
            if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                let record = &buf[i..i + EndOfCentralDirectory::SIZE];
                let eocd = EndOfCentralDirectory::from_bytes(record)?;
                return Ok((eocd, search_start + i as u64));
            }
        }

        Err(ReadError::decoding("not a valid ZIP archive"))
    }

    /// Read the ZIP64 End of Central Directory record, through the locator
    /// placed right before the regular EOCD.
    pub async fn read_zip64_eocd(
        &self,
        eocd_offset: u64,
    ) -> ReadResult<Zip64EndOfCentralDirectory> {
        let locator_offset = eocd_offset
            .checked_sub(Zip64Locator::SIZE as u64)
            .ok_or_else(|| ReadError::decoding("missing ZIP64 locator"))?;
        let locator_buf = self.read_exact_at(locator_offset, Zip64Locator::SIZE as u64).await?;
        let locator = Zip64Locator::from_bytes(&locator_buf)?;

        let eocd64_buf = self
            .read_exact_at(locator.eocd64_offset, Zip64EndOfCentralDirectory::MIN_SIZE as u64)
            .await?;
        Zip64EndOfCentralDirectory::from_bytes(&eocd64_buf)
    }

    /// List all entries of the archive from its Central Directory.
    pub async fn list_entries(&self) -> ReadResult<Vec<ZipEntry>> {
        let (eocd, eocd_offset) = self.find_eocd().await?;

        let (cd_offset, cd_size, total_entries) = if eocd.is_zip64() {
            let eocd64 = self.read_zip64_eocd(eocd_offset).await?;
            (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries)
        } else {
            (eocd.cd_offset as u64, eocd.cd_size as u64, eocd.total_entries as u64)
        };
        debug!(
            "central directory: {} entries, {} bytes at offset {}",
            total_entries, cd_size, cd_offset
        );
        if cd_offset.saturating_add(cd_size) > self.size {
            return Err(ReadError::decoding("ZIP central directory out of bounds"));
        }

        let cd_data = self.read_exact_at(cd_offset, cd_size).await?;
        let mut cursor = Cursor::new(cd_data.as_slice());
        // Each header takes at least 46 bytes, don't trust the count blindly.
        let mut entries = Vec::with_capacity(total_entries.min(cd_size / 46) as usize);
        for _ in 0..total_entries {
            entries.push(parse_cdfh(&mut cursor)?);
        }

        Ok(entries)
    }

    /// Offset where the data of `entry` starts, after its Local File Header.
    pub async fn data_offset(&self, entry: &ZipEntry) -> ReadResult<u64> {
        let lfh = self.read_exact_at(entry.lfh_offset, LFH_SIZE as u64).await?;
        if &lfh[0..4] != LFH_SIGNATURE {
            return Err(ReadError::decoding(format!(
                "invalid local file header for {}",
                entry.path
            )));
        }

        let mut cursor = Cursor::new(&lfh[26..]);
        let file_name_length = cursor.read_u16::<LittleEndian>()? as u64;
        let extra_field_length = cursor.read_u16::<LittleEndian>()? as u64;

        entry
            .lfh_offset
            .checked_add(LFH_SIZE as u64 + file_name_length + extra_field_length)
            .ok_or_else(|| ReadError::decoding(format!("invalid data offset for {}", entry.path)))
    }
}

/// Parse a Central Directory File Header from a cursor.
fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> ReadResult<ZipEntry> {
    let mut sig = [0u8; 4];
    cursor.read_exact(&mut sig)?;
    if sig != CDFH_SIGNATURE {
        return Err(ReadError::decoding("invalid central directory file header"));
    }

    // version made by, version needed, flags
    cursor.set_position(cursor.position() + 6);
    let compression_method = cursor.read_u16::<LittleEndian>()?;
    let last_mod_time = cursor.read_u16::<LittleEndian>()?;
    let last_mod_date = cursor.read_u16::<LittleEndian>()?;
    let crc32 = cursor.read_u32::<LittleEndian>()?;
    let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let file_name_length = cursor.read_u16::<LittleEndian>()?;
    let extra_field_length = cursor.read_u16::<LittleEndian>()?;
    let file_comment_length = cursor.read_u16::<LittleEndian>()?;
    // disk number start, internal and external attributes
    cursor.set_position(cursor.position() + 8);
    let mut lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

    let mut file_name_bytes = vec![0u8; file_name_length as usize];
    cursor.read_exact(&mut file_name_bytes)?;
    let path = String::from_utf8_lossy(&file_name_bytes).into_owned();

    // ZIP64 extended information lives in extra field 0x0001, each value is
    // present only when the header field is saturated.
    let extra_field_end = cursor.position() + extra_field_length as u64;
    while cursor.position() + 4 <= extra_field_end {
        let header_id = cursor.read_u16::<LittleEndian>()?;
        let field_size = cursor.read_u16::<LittleEndian>()? as u64;
        let field_end = cursor.position() + field_size;

        if header_id == 0x0001 {
            if uncompressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                uncompressed_size = cursor.read_u64::<LittleEndian>()?;
            }
            if compressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                compressed_size = cursor.read_u64::<LittleEndian>()?;
            }
            if lfh_offset == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                lfh_offset = cursor.read_u64::<LittleEndian>()?;
            }
        }
        cursor.set_position(field_end);
    }

    cursor.set_position(extra_field_end + file_comment_length as u64);

    Ok(ZipEntry {
        path,
        compression_method: CompressionMethod::from_u16(compression_method),
        compressed_size,
        uncompressed_size,
        crc32,
        lfh_offset,
        last_mod_time,
        last_mod_date,
    })
}
