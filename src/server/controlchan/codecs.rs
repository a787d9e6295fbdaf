use super::{command::Command, error::ControlChanError, error::ControlChanErrorKind, Reply};

use bytes::BytesMut;
use std::io::Write;
use tokio_util::codec::{Decoder, Encoder};

// The maximum length of a command line, terminator included. Longer
// lines are discarded and answered with a syntax error.
const MAX_LINE_LEN: usize = 8192;

// FtpCodec implements tokio's `Decoder` and `Encoder` traits for the
// control channel, decoding FTP commands and encoding their replies.
pub struct FtpCodec {
    // Stored index of the next index to examine for a '\n' character.
    // Saves rescanning the buffer when a command arrives in pieces.
    next_index: usize,
}

impl FtpCodec {
    pub fn new() -> Self {
        FtpCodec { next_index: 0 }
    }
}

impl Decoder for FtpCodec {
    // Parse failures are carried inside the item: a decoder `Err` would
    // terminate the framed stream, but a garbled command line must only
    // cost the client an error reply, not the session.
    type Item = Result<Command, ControlChanError>;
    type Error = ControlChanError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(newline_offset) = buf[self.next_index..].iter().position(|b| *b == b'\n') {
            let newline_index = newline_offset + self.next_index;
            let line = buf.split_to(newline_index + 1);
            self.next_index = 0;
            if line.len() > MAX_LINE_LEN {
                return Ok(Some(Err(ControlChanErrorKind::LineTooLong.into())));
            }
            Ok(Some(Command::parse(line).map_err(ControlChanError::from)))
        } else if buf.len() > MAX_LINE_LEN {
            // Discard the oversized garbage so the session can recover.
            buf.clear();
            self.next_index = 0;
            Ok(Some(Err(ControlChanErrorKind::LineTooLong.into())))
        } else {
            self.next_index = buf.len();
            Ok(None)
        }
    }
}

impl Encoder<Reply> for FtpCodec {
    type Error = ControlChanError;

    fn encode(&mut self, reply: Reply, buf: &mut BytesMut) -> Result<(), Self::Error> {
        let mut buffer = vec![];
        match reply {
            Reply::None => {
                return Ok(());
            }
            Reply::CodeAndMsg { code, msg } => {
                if msg.is_empty() {
                    writeln!(buffer, "{}\r", code as u32)?;
                } else {
                    writeln!(buffer, "{} {}\r", code as u32, msg)?;
                }
            }
            Reply::MultiLine { code, mut lines } => {
                // The last line carries the code followed by a space.
                let last_line = lines.pop().unwrap_or_default();

                // Lines starting with a digit must be indented so that
                // clients don't mistake them for the final line.
                for it in lines.iter_mut() {
                    if it.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                        it.insert(0, ' ');
                    }
                }
                if lines.is_empty() {
                    writeln!(buffer, "{} {}\r", code as u32, last_line)?;
                } else {
                    write!(buffer, "{}-{}\r\n{} {}\r\n", code as u32, lines.join("\r\n"), code as u32, last_line)?;
                }
            }
        }
        buf.extend(&buffer);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn encode(reply: Reply) -> String {
        let mut codec = FtpCodec::new();
        let mut buf = BytesMut::new();
        codec.encode(reply, &mut buf).unwrap();
        String::from_utf8(buf.to_vec()).unwrap()
    }

    #[test]
    fn encodes_single_line_reply() {
        let reply = Reply::new(super::super::ReplyCode::CommandOkay, "NOOP ok");
        assert_eq!(encode(reply), "200 NOOP ok\r\n");
    }

    #[test]
    fn encodes_multi_line_reply() {
        let reply = Reply::new_multiline(super::super::ReplyCode::SystemStatus, vec!["Extensions supported:", " SIZE", "End"]);
        assert_eq!(encode(reply), "211-Extensions supported:\r\n SIZE\r\n211 End\r\n");
    }

    #[test]
    fn encodes_nothing_for_none() {
        assert_eq!(encode(Reply::none()), "");
    }

    #[test]
    fn decodes_command_lines() {
        let mut codec = FtpCodec::new();
        let mut buf = BytesMut::from("NOOP\r\nQUIT\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap().unwrap(), Command::Noop);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap().unwrap(), Command::Quit);
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn decodes_partial_input() {
        let mut codec = FtpCodec::new();
        let mut buf = BytesMut::from("NO");
        assert!(codec.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(b"OP\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap().unwrap(), Command::Noop);
    }

    #[test]
    fn garbled_lines_do_not_end_the_stream() {
        let mut codec = FtpCodec::new();
        let mut buf = BytesMut::from("MLSD\r\nNOOP\r\n");
        let item = codec.decode(&mut buf).unwrap().unwrap();
        assert!(matches!(item.unwrap_err().kind(), ControlChanErrorKind::UnknownCommand { .. }));
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap().unwrap(), Command::Noop);
    }

    #[test]
    fn rejects_oversized_lines() {
        let mut codec = FtpCodec::new();
        let long = vec![b'a'; MAX_LINE_LEN + 1];
        let mut buf = BytesMut::from(&long[..]);
        let item = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(*item.unwrap_err().kind(), ControlChanErrorKind::LineTooLong);
        assert!(buf.is_empty());
    }
}
