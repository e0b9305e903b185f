use bincode::{ErrorKind, deserialize, serialize};
use serde::{Serialize, de::DeserializeOwned};
use std::io::{self, Read, Write};

/// Maximum allowed message size (1MB) so a bogus length prefix can't
/// trigger an unbounded allocation.
const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Reads one u32-length-prefixed bincode message.
///
/// # Errors
///
/// Returns `InvalidData` for oversized or malformed payloads, or the
/// underlying I/O error. A `WouldBlock` while reading the payload is
/// reported as `InvalidData`: a sender that wrote a length without
/// the data to follow it almost certainly doesn't speak the prefix
/// protocol.
pub fn read_prefixed<T: DeserializeOwned, R: Read>(reader: &mut R) -> io::Result<T> {
    let mut len_bytes = [0; 4];
    reader.read_exact(&mut len_bytes)?;
    let len = u32::from_le_bytes(len_bytes) as usize;

    if len > MAX_MESSAGE_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("message size {len} exceeds the {MAX_MESSAGE_SIZE} byte limit"),
        ));
    }

    let mut buf = vec![0; len];
    if let Err(error) = reader.read_exact(&mut buf) {
        let kind = match error.kind() {
            io::ErrorKind::WouldBlock => io::ErrorKind::InvalidData,
            kind => kind,
        };
        return Err(kind.into());
    }

    match deserialize(&buf) {
        Ok(value) => Ok(value),
        Err(error) => match *error {
            ErrorKind::Io(error) => Err(error),
            _ => Err(io::ErrorKind::InvalidData.into()),
        },
    }
}

/// Writes one u32-length-prefixed bincode message.
///
/// The prefix and payload go out in a single write so a reader can't
/// observe the length without the data behind it.
///
/// # Errors
///
/// Returns `InvalidData` for oversized or unencodable values, or the
/// underlying I/O error.
pub fn write_prefixed<T: Serialize, W: Write>(writer: &mut W, value: &T) -> io::Result<()> {
    match serialize(&value) {
        Ok(serialized) => {
            if serialized.len() > MAX_MESSAGE_SIZE {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "serialized message size {} exceeds the {MAX_MESSAGE_SIZE} byte limit",
                        serialized.len()
                    ),
                ));
            }

            let size = serialized.len() as u32;
            let mut buf = Vec::from(size.to_le_bytes());
            buf.extend(serialized);
            writer.write_all(&buf)?;
            Ok(())
        }
        Err(error) => match *error {
            ErrorKind::Io(error) => Err(error),
            _ => Err(io::ErrorKind::InvalidData.into()),
        },
    }
}
