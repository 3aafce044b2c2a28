//! LL/CP field stream parsing for reply trailers.
//!
//! Replies carry their variable data as a run of fields, each framed as
//! a 4-byte length (counting itself), a 2-byte code point, and a
//! payload. The same walk serves the start-server trailer, the signon
//! replies, and the attribute round-trip tests.

use crate::ebcdic;
use crate::error::{DbHostError, Result};

use super::CP_JOB_NAME;

/// One field lifted out of a reply trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailerField<'a> {
    /// The field's 2-byte code point.
    pub code_point: u16,
    /// Payload bytes, `LL - 6` of them.
    pub payload: &'a [u8],
}

/// Iterator over the LL/CP fields of a trailer slice.
///
/// Trailing bytes too short to hold another field header are treated as
/// padding and ignored, matching the server's framing.
#[derive(Debug)]
pub struct FieldReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    /// Read fields from `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl<'a> Iterator for FieldReader<'a> {
    type Item = Result<TrailerField<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.len() - self.pos < 6 {
            return None;
        }
        let ll = match read_u32(self.data, self.pos) {
            Ok(ll) => ll as usize,
            Err(e) => return Some(Err(e)),
        };
        let code_point = match read_u16(self.data, self.pos + 4) {
            Ok(cp) => cp,
            Err(e) => return Some(Err(e)),
        };
        if ll < 6 || self.pos + ll > self.data.len() {
            self.pos = self.data.len(); // poison: stop iterating
            return Some(Err(DbHostError::Protocol(format!(
                "field {code_point:#06X} length {ll} overruns the trailer"
            ))));
        }
        let payload = &self.data[self.pos + 6..self.pos + ll];
        self.pos += ll;
        Some(Ok(TrailerField {
            code_point,
            payload,
        }))
    }
}

/// Walk a start-server reply trailer and extract the job name, if any.
///
/// The loop mirrors the server's framing: fields are consumed while more
/// than 10 bytes remain, the job name field carries 4 reserved bytes
/// ahead of its EBCDIC payload, and whatever is left after the last
/// field is padding. Each iteration accounts for exactly `LL` bytes.
pub fn extract_job_name(trailer: &[u8]) -> Result<Option<String>> {
    let mut job_name = None;
    let mut remaining = trailer.len() as i64;
    let mut pos = 0usize;

    while remaining > 10 {
        let ll = read_u32(trailer, pos)? as usize;
        let code_point = read_u16(trailer, pos + 4)?;
        pos += 6;
        remaining -= 6;

        if ll < 6 || pos + (ll - 6) > trailer.len() {
            return Err(DbHostError::Protocol(format!(
                "trailer field {code_point:#06X} length {ll} overruns the reply"
            )));
        }

        if code_point == CP_JOB_NAME {
            if ll < 10 {
                return Err(DbHostError::Protocol(format!(
                    "job name field too short: length {ll}"
                )));
            }
            pos += 4; // reserved
            let payload = &trailer[pos..pos + (ll - 10)];
            job_name = Some(ebcdic::to_string(payload));
            pos += ll - 10;
        } else {
            pos += ll - 6;
        }
        remaining -= (ll - 6) as i64;
    }

    // Anything after the last field is padding.
    Ok(job_name)
}

fn read_u32(data: &[u8], pos: usize) -> Result<u32> {
    data.get(pos..pos + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| DbHostError::Protocol("truncated field length".to_string()))
}

fn read_u16(data: &[u8], pos: usize) -> Result<u16> {
    data.get(pos..pos + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or_else(|| DbHostError::Protocol("truncated code point".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::buffer::RequestBuffer;

    fn job_name_field(name: &str) -> Vec<u8> {
        let encoded = ebcdic::from_str(name).unwrap();
        let mut buf = RequestBuffer::new();
        buf.write_u32(10 + encoded.len() as u32);
        buf.write_u16(CP_JOB_NAME);
        buf.write_u32(0); // reserved
        buf.write_bytes(&encoded);
        buf.freeze().to_vec()
    }

    #[test]
    fn test_single_job_name_field() {
        let trailer = job_name_field("QDBSRV01");
        let job = extract_job_name(&trailer).unwrap();
        assert_eq!(job.as_deref(), Some("QDBSRV01"));
    }

    #[test]
    fn test_unknown_field_before_job_name() {
        let mut trailer = Vec::new();
        // An unrelated 12-byte field the walker must step over.
        trailer.extend_from_slice(&12u32.to_be_bytes());
        trailer.extend_from_slice(&0x1234u16.to_be_bytes());
        trailer.extend_from_slice(&[0xAA; 6]);
        trailer.extend_from_slice(&job_name_field("QZDASOINIT"));

        let job = extract_job_name(&trailer).unwrap();
        assert_eq!(job.as_deref(), Some("QZDASOINIT"));
    }

    #[test]
    fn test_trailing_padding_is_skipped() {
        let mut trailer = job_name_field("QDBSRV01");
        trailer.extend_from_slice(&[0u8; 8]); // padding, below the 10-byte floor
        let job = extract_job_name(&trailer).unwrap();
        assert_eq!(job.as_deref(), Some("QDBSRV01"));
    }

    #[test]
    fn test_missing_job_name_yields_none() {
        let mut trailer = Vec::new();
        trailer.extend_from_slice(&12u32.to_be_bytes());
        trailer.extend_from_slice(&0x1234u16.to_be_bytes());
        trailer.extend_from_slice(&[0u8; 6]);
        assert_eq!(extract_job_name(&trailer).unwrap(), None);
    }

    #[test]
    fn test_overrunning_field_is_an_error() {
        let mut trailer = Vec::new();
        trailer.extend_from_slice(&64u32.to_be_bytes()); // claims more than we have
        trailer.extend_from_slice(&0x1234u16.to_be_bytes());
        trailer.extend_from_slice(&[0u8; 8]);
        assert!(extract_job_name(&trailer).is_err());
    }

    #[test]
    fn test_field_reader_lifts_all_fields() {
        let mut data = Vec::new();
        data.extend_from_slice(&10u32.to_be_bytes());
        data.extend_from_slice(&0x1101u16.to_be_bytes());
        data.extend_from_slice(&7u32.to_be_bytes());
        data.extend_from_slice(&8u32.to_be_bytes());
        data.extend_from_slice(&0x1102u16.to_be_bytes());
        data.extend_from_slice(&10u16.to_be_bytes());

        let fields: Vec<_> = FieldReader::new(&data).collect::<Result<_>>().unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].code_point, 0x1101);
        assert_eq!(fields[0].payload, 7u32.to_be_bytes());
        assert_eq!(fields[1].code_point, 0x1102);
        assert_eq!(fields[1].payload, 10u16.to_be_bytes());
    }
}
