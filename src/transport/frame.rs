//! Datagram framing
//!
//! One UDP datagram carries exactly one packet.
//!
//! Wire format:
//! ```text
//! +0   Kind (1 byte: 0x01 interest, 0x02 data)
//! +1   Name Length (2 bytes LE16)
//! +3   Name (UTF-8)
//! --- data frames only ---
//! +3+n Payload Length (4 bytes LE32)
//! +7+n Payload
//! ```

use crate::core::{
    FRAME_KIND_DATA, FRAME_KIND_INTEREST, FrameError, Incoming, MAX_DATAGRAM_SIZE,
};

/// Kind byte plus name length
pub const FRAME_HEADER_SIZE: usize = 3;

/// Size of the payload length field on data frames
pub const PAYLOAD_LENGTH_SIZE: usize = 4;

/// A decoded datagram
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Interest, no body
    Interest {
        /// Packet name
        name: String,
    },
    /// Data reply
    Data {
        /// Packet name
        name: String,
        /// Reply body
        payload: Vec<u8>,
    },
}

impl Frame {
    /// Build a frame from the arguments of [`Transport::send`](crate::core::Transport::send)
    pub fn from_parts(name: &str, payload: Option<&[u8]>) -> Self {
        match payload {
            None => Self::Interest {
                name: name.to_string(),
            },
            Some(payload) => Self::Data {
                name: name.to_string(),
                payload: payload.to_vec(),
            },
        }
    }

    /// Packet name
    pub fn name(&self) -> &str {
        match self {
            Self::Interest { name } | Self::Data { name, .. } => name,
        }
    }

    /// Total wire size
    pub fn wire_size(&self) -> usize {
        match self {
            Self::Interest { name } => FRAME_HEADER_SIZE + name.len(),
            Self::Data { name, payload } => {
                FRAME_HEADER_SIZE + name.len() + PAYLOAD_LENGTH_SIZE + payload.len()
            }
        }
    }

    /// Encode to wire format
    pub fn encode(&self) -> Result<Vec<u8>, FrameError> {
        let size = self.wire_size();
        if size > MAX_DATAGRAM_SIZE {
            return Err(FrameError::TooLarge {
                size,
                max: MAX_DATAGRAM_SIZE,
            });
        }

        let name = self.name().as_bytes();
        let mut buf = Vec::with_capacity(size);
        match self {
            Self::Interest { .. } => buf.push(FRAME_KIND_INTEREST),
            Self::Data { .. } => buf.push(FRAME_KIND_DATA),
        }
        // Bounded by MAX_DATAGRAM_SIZE, so both lengths fit their fields
        buf.extend_from_slice(&(name.len() as u16).to_le_bytes());
        buf.extend_from_slice(name);
        if let Self::Data { payload, .. } = self {
            buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            buf.extend_from_slice(payload);
        }
        Ok(buf)
    }

    /// Decode from wire format
    ///
    /// Bytes past the declared lengths are ignored.
    pub fn decode(data: &[u8]) -> Result<Self, FrameError> {
        let header: [u8; FRAME_HEADER_SIZE] = read_array(data, 0)?;
        let kind = header[0];
        if kind != FRAME_KIND_INTEREST && kind != FRAME_KIND_DATA {
            return Err(FrameError::UnknownKind(kind));
        }

        let name_len = u16::from_le_bytes([header[1], header[2]]) as usize;
        let name_end = FRAME_HEADER_SIZE + name_len;
        let name = data
            .get(FRAME_HEADER_SIZE..name_end)
            .ok_or(FrameError::TooShort {
                expected: name_end,
                actual: data.len(),
            })?;
        let name = std::str::from_utf8(name)
            .map_err(|_| FrameError::InvalidName)?
            .to_string();

        if kind == FRAME_KIND_INTEREST {
            return Ok(Self::Interest { name });
        }

        let payload_len = u32::from_le_bytes(read_array(data, name_end)?) as usize;
        let payload_start = name_end + PAYLOAD_LENGTH_SIZE;
        let payload_end = payload_start.saturating_add(payload_len);
        let payload = data
            .get(payload_start..payload_end)
            .ok_or(FrameError::TooShort {
                expected: payload_end,
                actual: data.len(),
            })?;

        Ok(Self::Data {
            name,
            payload: payload.to_vec(),
        })
    }
}

impl From<Frame> for Incoming {
    fn from(frame: Frame) -> Self {
        match frame {
            Frame::Interest { name } => Incoming::Interest { name },
            Frame::Data { name, payload } => Incoming::Data { name, payload },
        }
    }
}

fn read_array<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N], FrameError> {
    data.get(offset..offset + N)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(FrameError::TooShort {
            expected: offset + N,
            actual: data.len(),
        })
}
