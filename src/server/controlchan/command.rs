use super::commands::{ModeParam, Opt, StruParam};
use super::parse_error::{ParseError, Result};
use crate::server::password::Password;
use crate::server::session::TransferType;

use bytes::Bytes;
use std::net::{IpAddr, SocketAddr, SocketAddrV4};
use std::{fmt, str};

/// A parsed command from the client, verb plus argument.
#[derive(Debug, PartialEq, Clone)]
pub enum Command {
    User {
        /// The username the client wants to log in with.
        username: Bytes,
    },
    Pass {
        /// The password belonging to the pending username.
        password: Password,
    },
    Syst,
    Stat {
        /// The path information is requested about, if given.
        path: Option<String>,
    },
    Feat,
    Help,
    Noop,
    Quit,
    Type {
        /// The transfer type to switch to. Only ASCII and Image.
        param: TransferType,
    },
    Stru {
        /// The file structure the client asks for. Only `File` is
        /// supported.
        structure: StruParam,
    },
    Mode {
        /// The transfer mode the client asks for. Only `Stream` is
        /// supported.
        mode: ModeParam,
    },
    Pasv,
    Epsv,
    Port {
        /// The client endpoint to dial for the next transfer.
        addr: SocketAddrV4,
    },
    Eprt {
        /// The client endpoint to dial for the next transfer.
        addr: SocketAddr,
    },
    Retr {
        /// The file the client would like to retrieve.
        path: String,
    },
    Stor {
        /// The file the client would like to store.
        path: String,
    },
    Appe {
        /// The file the client would like to append to.
        path: String,
    },
    List {
        /// The directory or file to list, defaults to the cwd.
        path: Option<String>,
    },
    Nlst {
        /// The directory to list, defaults to the cwd.
        path: Option<String>,
    },
    Pwd,
    Cwd {
        /// The directory to change to.
        path: String,
    },
    Cdup,
    Dele {
        /// The (regular) file to delete.
        path: String,
    },
    Rmd {
        /// The directory to remove.
        path: String,
    },
    Mkd {
        /// The directory to create.
        path: String,
    },
    Rnfr {
        /// The file or directory to be renamed.
        path: String,
    },
    Rnto {
        /// The name to rename to.
        path: String,
    },
    Size {
        /// The file to report the size of.
        path: String,
    },
    Mdtm {
        /// The file to report the modification time of.
        path: String,
    },
    Rest {
        /// Where to resume the next RETR/STOR.
        offset: u64,
    },
    Abor,
    Allo,
    Opts {
        /// The option the client wants to set.
        option: Opt,
    },
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl Command {
    /// Parse the given bytes into a [`Command`].
    ///
    /// [`Command`]: ./enum.Command.html
    pub fn parse<T: AsRef<[u8]> + Into<Bytes>>(buf: T) -> Result<Command> {
        let vec = buf.into().to_vec();
        let mut iter = vec.splitn(2, |&b| b == b' ' || b == b'\r' || b == b'\n');
        let cmd_token = normalize(iter.next().unwrap())?;
        let cmd_params = String::from(str::from_utf8(iter.next().unwrap_or(&[]))?);

        let cmd = match &*cmd_token {
            "USER" => {
                let username = parse_to_eol(cmd_params)?;
                if username.is_empty() {
                    return Err(ParseError::InvalidCommand);
                }
                Command::User { username }
            }
            "PASS" => {
                let password = parse_to_eol(cmd_params)?;
                Command::Pass {
                    password: Password::new(password),
                }
            }
            "SYST" => Command::Syst,
            "STAT" => {
                let params = parse_to_eol(cmd_params)?;
                let path = if params.is_empty() { None } else { Some(text(&params)) };
                Command::Stat { path }
            }
            "FEAT" => {
                expect_no_params(cmd_params)?;
                Command::Feat
            }
            "HELP" => Command::Help,
            "NOOP" => {
                expect_no_params(cmd_params)?;
                Command::Noop
            }
            "QUIT" => {
                expect_no_params(cmd_params)?;
                Command::Quit
            }
            "TYPE" => {
                let params = parse_to_eol(cmd_params)?;
                let param = match params.as_ref() {
                    b"A" | b"a" => TransferType::Ascii,
                    b"I" | b"i" => TransferType::Image,
                    _ => return Err(ParseError::InvalidCommand),
                };
                Command::Type { param }
            }
            "STRU" => {
                let params = parse_to_eol(cmd_params)?;
                if params.len() > 1 {
                    return Err(ParseError::InvalidCommand);
                }
                match params.first() {
                    Some(b'F') | Some(b'f') => Command::Stru { structure: StruParam::File },
                    Some(b'R') | Some(b'r') => Command::Stru { structure: StruParam::Record },
                    Some(b'P') | Some(b'p') => Command::Stru { structure: StruParam::Page },
                    _ => return Err(ParseError::InvalidCommand),
                }
            }
            "MODE" => {
                let params = parse_to_eol(cmd_params)?;
                if params.len() > 1 {
                    return Err(ParseError::InvalidCommand);
                }
                match params.first() {
                    Some(b'S') | Some(b's') => Command::Mode { mode: ModeParam::Stream },
                    Some(b'B') | Some(b'b') => Command::Mode { mode: ModeParam::Block },
                    Some(b'C') | Some(b'c') => Command::Mode { mode: ModeParam::Compressed },
                    _ => return Err(ParseError::InvalidCommand),
                }
            }
            "PASV" => {
                expect_no_params(cmd_params)?;
                Command::Pasv
            }
            "EPSV" => {
                // The optional protocol argument is irrelevant for the
                // reply; "EPSV ALL" is accepted on the same grounds.
                let _ = parse_to_eol(cmd_params)?;
                Command::Epsv
            }
            "PORT" => {
                let params = parse_to_eol(cmd_params)?;
                Command::Port {
                    addr: parse_port_argument(&text(&params))?,
                }
            }
            "EPRT" => {
                let params = parse_to_eol(cmd_params)?;
                Command::Eprt {
                    addr: parse_eprt_argument(&text(&params))?,
                }
            }
            "RETR" => Command::Retr {
                path: required_path(cmd_params)?,
            },
            "STOR" => Command::Stor {
                path: required_path(cmd_params)?,
            },
            "APPE" => Command::Appe {
                path: required_path(cmd_params)?,
            },
            "LIST" => {
                let line = parse_to_eol(cmd_params)?;
                // Options like `-la` are accepted and dropped; the rest
                // of the line is the path.
                let path = line
                    .split(|&b| b == b' ')
                    .filter(|s| !line.is_empty() && !s.starts_with(b"-"))
                    .map(|s| String::from_utf8_lossy(s).to_string())
                    .next();
                Command::List { path }
            }
            "NLST" => {
                let params = parse_to_eol(cmd_params)?;
                let path = if params.is_empty() { None } else { Some(text(&params)) };
                Command::Nlst { path }
            }
            "PWD" | "XPWD" => {
                expect_no_params(cmd_params)?;
                Command::Pwd
            }
            "CWD" | "XCWD" => Command::Cwd {
                path: required_path(cmd_params)?,
            },
            "CDUP" => {
                expect_no_params(cmd_params)?;
                Command::Cdup
            }
            "DELE" => Command::Dele {
                path: required_path(cmd_params)?,
            },
            "RMD" | "XRMD" => Command::Rmd {
                path: required_path(cmd_params)?,
            },
            "MKD" | "XMKD" => Command::Mkd {
                path: required_path(cmd_params)?,
            },
            "RNFR" => Command::Rnfr {
                path: required_path(cmd_params)?,
            },
            "RNTO" => Command::Rnto {
                path: required_path(cmd_params)?,
            },
            "SIZE" => Command::Size {
                path: required_path(cmd_params)?,
            },
            "MDTM" => Command::Mdtm {
                path: required_path(cmd_params)?,
            },
            "REST" => {
                let params = parse_to_eol(cmd_params)?;
                let offset = text(&params).parse::<u64>().map_err(|_| ParseError::InvalidCommand)?;
                Command::Rest { offset }
            }
            "ABOR" => {
                expect_no_params(cmd_params)?;
                Command::Abor
            }
            "ALLO" => Command::Allo,
            "OPTS" => {
                let params = parse_to_eol(cmd_params)?;
                match params.as_ref() {
                    b"UTF8 ON" | b"UTF8 on" | b"utf8 on" => Command::Opts { option: Opt::Utf8 { on: true } },
                    b"UTF8 OFF" | b"UTF8 off" | b"utf8 off" => Command::Opts { option: Opt::Utf8 { on: false } },
                    _ => return Err(ParseError::InvalidCommand),
                }
            }
            _ => {
                return Err(ParseError::UnknownCommand { command: cmd_token });
            }
        };

        Ok(cmd)
    }
}

// A path argument must be present and non-empty, but is otherwise taken
// verbatim, embedded spaces included.
fn required_path<T: AsRef<[u8]> + Into<Bytes>>(params: T) -> Result<String> {
    let path = parse_to_eol(params)?;
    if path.is_empty() {
        return Err(ParseError::InvalidCommand);
    }
    Ok(text(&path))
}

fn expect_no_params<T: AsRef<[u8]> + Into<Bytes>>(params: T) -> Result<()> {
    if parse_to_eol(params)?.is_empty() {
        Ok(())
    } else {
        Err(ParseError::InvalidCommand)
    }
}

fn text(bytes: &Bytes) -> String {
    String::from_utf8_lossy(bytes).to_string()
}

/// Try to parse a buffer of bytes, up to end of line, into a `Bytes`.
fn parse_to_eol<T: AsRef<[u8]> + Into<Bytes>>(bytes: T) -> Result<Bytes> {
    let mut pos: usize = 0;
    let mut bytes: Bytes = bytes.into();
    let mut iter = bytes.as_ref().iter();

    loop {
        let b = match iter.next() {
            Some(b) => b,
            _ => return Err(ParseError::InvalidEol),
        };

        if *b == b'\r' {
            match iter.next() {
                Some(b'\n') => return Ok(bytes.split_to(pos)),
                _ => return Err(ParseError::InvalidEol),
            }
        }

        if *b == b'\n' {
            return Ok(bytes.split_to(pos));
        }

        if !is_valid_token_char(*b) {
            return Err(ParseError::InvalidToken { token: *b });
        }

        pos += 1;
    }
}

// PORT h1,h2,h3,h4,p1,p2 where the port is p1 * 256 + p2.
fn parse_port_argument(arg: &str) -> Result<SocketAddrV4> {
    let bytes: Vec<u8> = arg.split(',').map(|s| s.parse::<u8>()).collect::<std::result::Result<_, _>>().map_err(|_| ParseError::InvalidCommand)?;
    if bytes.len() != 6 {
        return Err(ParseError::InvalidCommand);
    }
    let ip = std::net::Ipv4Addr::new(bytes[0], bytes[1], bytes[2], bytes[3]);
    let port = u16::from(bytes[4]) * 256 + u16::from(bytes[5]);
    Ok(SocketAddrV4::new(ip, port))
}

// EPRT |proto|addr|port| with 1 = IPv4 and 2 = IPv6. The first byte is
// the delimiter.
fn parse_eprt_argument(arg: &str) -> Result<SocketAddr> {
    let delim = arg.chars().next().ok_or(ParseError::InvalidCommand)?;
    let parts: Vec<&str> = arg.split(delim).collect();
    // "|1|h|p|" splits into ["", "1", "h", "p", ""].
    if parts.len() != 5 || !parts[0].is_empty() || !parts[4].is_empty() {
        return Err(ParseError::InvalidCommand);
    }
    let ip: IpAddr = match parts[1] {
        "1" => IpAddr::V4(parts[2].parse().map_err(|_| ParseError::InvalidCommand)?),
        "2" => IpAddr::V6(parts[2].parse().map_err(|_| ParseError::InvalidCommand)?),
        _ => return Err(ParseError::InvalidCommand),
    };
    let port: u16 = parts[3].parse().map_err(|_| ParseError::InvalidCommand)?;
    Ok(SocketAddr::new(ip, port))
}

fn normalize(token: &[u8]) -> Result<String> {
    Ok(str::from_utf8(token).map(|t| t.to_uppercase())?)
}

fn is_valid_token_char(b: u8) -> bool {
    b > 0x1F && b < 0x7F
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_user_cmd_crnl() {
        let input = "USER Dolores\r\n";
        assert_eq!(Command::parse(input).unwrap(), Command::User { username: "Dolores".into() });
    }

    #[test]
    fn parse_user_cmd_mixed_case() {
        let input = "uSeR Dolores\r\n";
        assert_eq!(Command::parse(input).unwrap(), Command::User { username: "Dolores".into() });
    }

    #[test]
    // Not all clients include the (actually mandatory) '\r'
    fn parse_user_cmd_nl() {
        let input = "USER Dolores\n";
        assert_eq!(Command::parse(input).unwrap(), Command::User { username: "Dolores".into() });
    }

    #[test]
    // Although we accept requests ending in only '\n', we won't accept
    // requests ending only in '\r'
    fn parse_user_cmd_cr() {
        let input = "USER Dolores\r";
        assert_eq!(Command::parse(input), Err(ParseError::InvalidEol));
    }

    #[test]
    fn parse_user_cmd_no_eol() {
        let input = "USER Dolores";
        assert_eq!(Command::parse(input), Err(ParseError::InvalidEol));
    }

    #[test]
    // Only one space is skipped after the verb, so arguments can start
    // with a space.
    fn parse_user_cmd_double_space() {
        let input = "USER  Dolores\r\n";
        assert_eq!(Command::parse(input).unwrap(), Command::User { username: " Dolores".into() });
    }

    #[test]
    fn parse_user_cmd_whitespace() {
        let input = "USER Dolores Abernathy\r\n";
        assert_eq!(
            Command::parse(input).unwrap(),
            Command::User {
                username: "Dolores Abernathy".into()
            }
        );
    }

    #[test]
    fn parse_pass_cmd_whitespace() {
        let input = "PASS s3cr#t p@S$w0rd\r\n";
        assert_eq!(
            Command::parse(input).unwrap(),
            Command::Pass {
                password: "s3cr#t p@S$w0rd".into()
            }
        );
    }

    #[test]
    fn parse_unknown_command() {
        let input = "MLSD\r\n";
        assert_eq!(Command::parse(input), Err(ParseError::UnknownCommand { command: "MLSD".into() }));
    }

    #[test]
    fn parse_type() {
        assert_eq!(Command::parse("TYPE A\r\n").unwrap(), Command::Type { param: TransferType::Ascii });
        assert_eq!(Command::parse("TYPE I\r\n").unwrap(), Command::Type { param: TransferType::Image });
        assert_eq!(Command::parse("TYPE i\r\n").unwrap(), Command::Type { param: TransferType::Image });
        assert_eq!(Command::parse("TYPE E\r\n"), Err(ParseError::InvalidCommand));
        assert_eq!(Command::parse("TYPE\r\n"), Err(ParseError::InvalidCommand));
    }

    #[test]
    fn parse_stru() {
        assert_eq!(Command::parse("STRU F\r\n").unwrap(), Command::Stru { structure: StruParam::File });
        assert_eq!(Command::parse("STRU R\r\n").unwrap(), Command::Stru { structure: StruParam::Record });
        assert_eq!(Command::parse("STRU FSK\r\n"), Err(ParseError::InvalidCommand));
        assert_eq!(Command::parse("STRU\r\n"), Err(ParseError::InvalidCommand));
    }

    #[test]
    fn parse_mode() {
        assert_eq!(Command::parse("MODE S\r\n").unwrap(), Command::Mode { mode: ModeParam::Stream });
        assert_eq!(Command::parse("MODE B\r\n").unwrap(), Command::Mode { mode: ModeParam::Block });
        assert_eq!(Command::parse("MODE SKDJF\r\n"), Err(ParseError::InvalidCommand));
    }

    #[test]
    fn parse_noop() {
        assert_eq!(Command::parse("NOOP\r\n").unwrap(), Command::Noop);
        assert_eq!(Command::parse("NOOP bla\r\n"), Err(ParseError::InvalidCommand));
    }

    #[test]
    fn parse_pasv() {
        assert_eq!(Command::parse("PASV\r\n").unwrap(), Command::Pasv);
        assert_eq!(Command::parse("PASV bla\r\n"), Err(ParseError::InvalidCommand));
    }

    #[test]
    fn parse_port() {
        assert_eq!(Command::parse("PORT\r\n"), Err(ParseError::InvalidCommand));
        assert_eq!(
            Command::parse("PORT 127,0,0,1,217,4\r\n").unwrap(),
            Command::Port {
                addr: "127.0.0.1:55556".parse().unwrap()
            }
        );
        assert_eq!(Command::parse("PORT 127,0,0,1,217\r\n"), Err(ParseError::InvalidCommand));
        assert_eq!(Command::parse("PORT 356,0,0,1,217,4\r\n"), Err(ParseError::InvalidCommand));
    }

    #[test]
    fn parse_eprt() {
        assert_eq!(
            Command::parse("EPRT |1|132.235.1.2|6275|\r\n").unwrap(),
            Command::Eprt {
                addr: "132.235.1.2:6275".parse().unwrap()
            }
        );
        assert_eq!(
            Command::parse("EPRT |2|::1|6275|\r\n").unwrap(),
            Command::Eprt {
                addr: "[::1]:6275".parse().unwrap()
            }
        );
        assert_eq!(Command::parse("EPRT |3|foo|6275|\r\n"), Err(ParseError::InvalidCommand));
        assert_eq!(Command::parse("EPRT |1|132.235.1.2|\r\n"), Err(ParseError::InvalidCommand));
    }

    #[test]
    fn parse_list() {
        struct Test {
            input: &'static str,
            expected_path: Option<&'static str>,
        }

        let tests = [
            Test {
                input: "LIST\r\n",
                expected_path: None,
            },
            Test {
                input: "LIST tmp\r\n",
                expected_path: Some("tmp"),
            },
            Test {
                input: "LIST -la\r\n",
                expected_path: None,
            },
            Test {
                input: "LIST -la tmp\r\n",
                expected_path: Some("tmp"),
            },
        ];

        for test in tests.iter() {
            assert_eq!(
                Command::parse(test.input),
                Ok(Command::List {
                    path: test.expected_path.map(|s| s.to_string()),
                })
            );
        }
    }

    #[test]
    fn parse_pwd_aliases() {
        assert_eq!(Command::parse("PWD\r\n"), Ok(Command::Pwd));
        assert_eq!(Command::parse("XPWD\r\n"), Ok(Command::Pwd));
        assert_eq!(Command::parse("PWD bla\r\n"), Err(ParseError::InvalidCommand));
    }

    #[test]
    fn parse_cwd() {
        assert_eq!(Command::parse("CWD\r\n"), Err(ParseError::InvalidCommand));
        assert_eq!(Command::parse("CWD /tmp\r\n"), Ok(Command::Cwd { path: "/tmp".into() }));
        assert_eq!(Command::parse("CWD public\r\n"), Ok(Command::Cwd { path: "public".into() }));
    }

    #[test]
    fn parse_mkd_aliases() {
        assert_eq!(Command::parse("MKD bla\r\n"), Ok(Command::Mkd { path: "bla".into() }));
        assert_eq!(Command::parse("XMKD bla\r\n"), Ok(Command::Mkd { path: "bla".into() }));
        assert_eq!(Command::parse("MKD\r\n"), Err(ParseError::InvalidCommand));
    }

    #[test]
    fn parse_rnfr_rnto() {
        assert_eq!(Command::parse("RNFR dir/file\r\n"), Ok(Command::Rnfr { path: "dir/file".into() }));
        assert_eq!(
            Command::parse("RNTO name with spaces\r\n"),
            Ok(Command::Rnto {
                path: "name with spaces".into()
            })
        );
        assert_eq!(Command::parse("RNFR\r\n"), Err(ParseError::InvalidCommand));
    }

    #[test]
    fn parse_rest() {
        assert_eq!(Command::parse("REST\r\n"), Err(ParseError::InvalidCommand));
        assert_eq!(Command::parse("REST xxx\r\n"), Err(ParseError::InvalidCommand));
        assert_eq!(Command::parse("REST 1303\r\n"), Ok(Command::Rest { offset: 1303 }));
    }

    #[test]
    fn parse_opts() {
        assert_eq!(Command::parse("OPTS\r\n"), Err(ParseError::InvalidCommand));
        assert_eq!(Command::parse("OPTS bla\r\n"), Err(ParseError::InvalidCommand));
        assert_eq!(Command::parse("OPTS UTF8 ON\r\n"), Ok(Command::Opts { option: Opt::Utf8 { on: true } }));
        assert_eq!(Command::parse("OPTS UTF8 OFF\r\n"), Ok(Command::Opts { option: Opt::Utf8 { on: false } }));
    }

    #[test]
    fn parse_size_and_mdtm() {
        assert_eq!(Command::parse("SIZE file.txt\r\n"), Ok(Command::Size { path: "file.txt".into() }));
        assert_eq!(Command::parse("MDTM file.txt\r\n"), Ok(Command::Mdtm { path: "file.txt".into() }));
        assert_eq!(Command::parse("MDTM\r\n"), Err(ParseError::InvalidCommand));
    }
}
