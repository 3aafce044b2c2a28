//! Common request header serialization.

use super::buffer::RequestBuffer;
use super::correlation::CorrelationCounter;
use super::{HEADER_SERVER_ID, HEADER_SIZE};

/// Write the 20-byte common header shared by all correlated requests.
///
/// `total_length` is caller-computed: this header plus every template
/// and variable field that follows. Advances `correlation` as a side
/// effect, one id per message.
pub fn write_envelope(
    buf: &mut RequestBuffer,
    total_length: u32,
    request_id: u16,
    correlation: &mut CorrelationCounter,
) {
    buf.write_u32(total_length);
    buf.write_u32(HEADER_SERVER_ID);
    buf.write_u32(0); // CS instance
    buf.write_u32(correlation.next());
    buf.write_u16(HEADER_SIZE as u16); // Template length
    buf.write_u16(request_id);
}
