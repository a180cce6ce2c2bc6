use serde::{Serialize, de::DeserializeOwned};
use std::io::{self, Read, Write};

use super::errors::{Result, TransportError};

/// Maximum allowed payload size (1MB) to prevent unbounded allocation
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

const PREFIX_LEN: usize = 4;

fn check_size(len: usize) -> Result<()> {
    if len > MAX_MESSAGE_SIZE {
        return Err(TransportError::MessageTooLarge {
            actual: len,
            max: MAX_MESSAGE_SIZE,
        });
    }
    Ok(())
}

/// Serialize `value` as JSON behind a little-endian `u32` length prefix.
pub fn encode_frame<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let payload = serde_json::to_vec(value)?;
    check_size(payload.len())?;

    // Size and payload go out in one chunk to prevent read-side EOF races.
    let size = payload.len() as u32;
    let mut buf = Vec::with_capacity(PREFIX_LEN + payload.len());
    buf.extend(size.to_le_bytes());
    buf.extend(payload);
    Ok(buf)
}

/// Pop one complete payload off the front of `buf`, leaving any trailing
/// partial frame in place. Returns `None` until a whole frame is buffered.
pub fn split_frame(buf: &mut Vec<u8>) -> Result<Option<Vec<u8>>> {
    let Some(prefix) = buf.first_chunk::<PREFIX_LEN>() else {
        return Ok(None);
    };
    let len = u32::from_le_bytes(*prefix) as usize;
    check_size(len)?;
    if buf.len() < PREFIX_LEN + len {
        return Ok(None);
    }
    let payload = buf[PREFIX_LEN..PREFIX_LEN + len].to_vec();
    buf.drain(..PREFIX_LEN + len);
    Ok(Some(payload))
}

/// Blocking read of one frame.
pub fn read_prefixed<T: DeserializeOwned, R: Read>(reader: &mut R) -> Result<T> {
    let mut len_bytes = [0; PREFIX_LEN];
    reader.read_exact(&mut len_bytes)?;
    let len = u32::from_le_bytes(len_bytes) as usize;
    check_size(len)?;

    // A would-block mid-payload means the sender doesn't follow the prefix
    // protocol.
    let mut buf = vec![0; len];
    if let Err(error) = reader.read_exact(&mut buf) {
        let kind = match error.kind() {
            io::ErrorKind::WouldBlock => io::ErrorKind::InvalidData,
            kind => kind,
        };
        return Err(io::Error::from(kind).into());
    }

    Ok(serde_json::from_slice(&buf)?)
}

pub fn write_prefixed<T: Serialize, W: Write>(writer: &mut W, value: &T) -> Result<()> {
    let buf = encode_frame(value)?;
    writer.write_all(&buf)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};
    use std::net::{TcpListener, TcpStream};

    use super::*;
    use crate::game::entities::Username;
    use crate::net::messages::{ClientMessage, ServerMessage};

    fn setup() -> (TcpStream, TcpStream) {
        let server = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = server.local_addr().unwrap();
        let client = TcpStream::connect(addr).unwrap();
        let (stream, _) = server.accept().unwrap();
        (client, stream)
    }

    #[test]
    fn write_and_read() {
        let (mut client, mut stream) = setup();
        let msg = ServerMessage::Eliminated {
            name: Username::new("alice"),
        };
        write_prefixed(&mut stream, &msg).unwrap();
        let received: ServerMessage = read_prefixed(&mut client).unwrap();
        assert_eq!(received, msg);
    }

    #[test]
    fn write_and_read_multiple_messages() {
        let (mut client, mut stream) = setup();
        let msgs = ["first", "second", "third"];
        for name in msgs {
            let msg = ClientMessage::Register {
                name: Some(name.to_string()),
            };
            write_prefixed(&mut stream, &msg).unwrap();
        }
        for name in msgs {
            let received: ClientMessage = read_prefixed(&mut client).unwrap();
            assert_eq!(
                received,
                ClientMessage::Register {
                    name: Some(name.to_string())
                }
            );
        }
    }

    #[test]
    fn read_truncated_payload() {
        let (mut client, mut stream) = setup();
        let payload = br#"{"type":"REGISTER"}"#;
        stream
            .write_all(&(payload.len() as u32 + 2).to_le_bytes())
            .unwrap();
        stream.write_all(payload).unwrap();
        drop(stream);
        assert!(matches!(
            read_prefixed::<ClientMessage, _>(&mut client),
            Err(TransportError::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof
        ));
    }

    #[test]
    fn reject_oversized_message() {
        let mut reader = Cursor::new(2_000_000_000u32.to_le_bytes().to_vec());
        assert!(matches!(
            read_prefixed::<ClientMessage, _>(&mut reader),
            Err(TransportError::MessageTooLarge { .. })
        ));
    }

    #[test]
    fn reject_non_json_payload() {
        let mut bytes = 3u32.to_le_bytes().to_vec();
        bytes.extend(b"???");
        let mut reader = Cursor::new(bytes);
        assert!(matches!(
            read_prefixed::<ClientMessage, _>(&mut reader),
            Err(TransportError::InvalidFormat(_))
        ));
    }

    #[test]
    fn split_frame_waits_for_whole_frame() {
        let frame = encode_frame(&ClientMessage::Register { name: None }).unwrap();
        let (head, tail) = frame.split_at(frame.len() - 3);

        let mut buf = head[..2].to_vec();
        assert!(split_frame(&mut buf).unwrap().is_none());
        buf.extend(&head[2..]);
        assert!(split_frame(&mut buf).unwrap().is_none());
        buf.extend(tail);
        buf.extend(&frame);

        let first = split_frame(&mut buf).unwrap().unwrap();
        let msg: ClientMessage = serde_json::from_slice(&first).unwrap();
        assert_eq!(msg, ClientMessage::Register { name: None });
        assert_eq!(buf, frame);
        assert!(split_frame(&mut buf).unwrap().is_some());
        assert!(buf.is_empty());
    }

    #[test]
    fn split_frame_rejects_oversized_prefix() {
        let mut buf = u32::MAX.to_le_bytes().to_vec();
        assert!(matches!(
            split_frame(&mut buf),
            Err(TransportError::MessageTooLarge { .. })
        ));
    }
}
