//! Minimal synchronous SMTP client session (RFC 5321).
//!
//! The session walks a fixed sequence of states; each command checks the
//! current state first, so a call out of order fails with
//! [`SmtpError::OutOfOrder`] before anything is written to the socket.
//!
//! ```text
//! Connected ─greeting─▶ Greeted ─EHLO/HELO─▶ Ready ─MAIL─▶ SenderSet
//!   ─RCPT─▶ RecipientSet ─DATA─▶ DataOpen ─message─▶ DataSent ─QUIT─▶ Closed
//! ```

use std::io::{self, BufRead, BufReader, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::SmtpError;
use crate::smtp::data::encode_data;

/// Where an SMTP session currently is in the dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// TCP connection established, greeting not read yet.
    Connected,
    /// `220` greeting received.
    Greeted,
    /// `EHLO`/`HELO` accepted.
    Ready,
    /// `MAIL FROM` accepted.
    SenderSet,
    /// `RCPT TO` accepted.
    RecipientSet,
    /// `DATA` accepted with `354`, message not sent yet.
    DataOpen,
    /// Message accepted by the server.
    DataSent,
    /// `QUIT` sent or connection shut down.
    Closed,
}

/// A complete (possibly multi-line) server reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub code: u16,
    pub lines: Vec<String>,
}

impl Reply {
    /// Reply text with all lines joined by a space.
    pub fn message(&self) -> String {
        self.lines.join(" ")
    }
}

/// Absolute deadline shared by connect and every read/write of a session.
#[derive(Debug, Clone, Copy)]
struct Deadline(Instant);

impl Deadline {
    fn after(timeout: Duration) -> Self {
        Self(Instant::now() + timeout)
    }

    fn remaining(&self) -> io::Result<Duration> {
        let now = Instant::now();
        if now >= self.0 {
            Err(deadline_exceeded())
        } else {
            Ok(self.0 - now)
        }
    }
}

fn deadline_exceeded() -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, "SMTP deadline exceeded")
}

/// Longest reply line accepted; RFC 5321 allows 512 octets.
const MAX_REPLY_LINE: usize = 4096;

/// Bytes handed to one `write` call, so the write timeout is re-armed often.
const WRITE_CHUNK: usize = 8192;

/// Socket timeouts surface as `WouldBlock` on Unix; report them uniformly.
fn normalize_timeout(e: io::Error) -> io::Error {
    match e.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => deadline_exceeded(),
        _ => e,
    }
}

/// One SMTP client connection.
pub struct SmtpClient {
    reader: BufReader<TcpStream>,
    state: SessionState,
    deadline: Deadline,
}

impl SmtpClient {
    /// Connect to `host:port`. `timeout` bounds the connection attempt and the
    /// whole dialogue that follows.
    pub fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self, SmtpError> {
        let deadline = Deadline::after(timeout);
        let mut last_error = None;

        let target = host.to_string();
        let addrs = resolve_within(move || (target.as_str(), port).to_socket_addrs(), deadline)?;

        for addr in addrs {
            match TcpStream::connect_timeout(&addr, deadline.remaining()?) {
                Ok(stream) => {
                    debug!(%addr, "Connected to SMTP server");
                    return Ok(Self {
                        reader: BufReader::new(stream),
                        state: SessionState::Connected,
                        deadline,
                    });
                }
                Err(e) => {
                    debug!(%addr, error = %e, "Connection attempt failed");
                    last_error = Some(e);
                }
            }
        }

        let error = last_error.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no addresses found for {host}"),
            )
        });
        Err(normalize_timeout(error).into())
    }

    /// Current dialogue state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Read the server greeting (`220`).
    pub fn read_greeting(&mut self) -> Result<Reply, SmtpError> {
        self.expect_state(SessionState::Connected, "greeting")?;
        let reply = accept(self.read_reply()?, &[220])?;
        self.state = SessionState::Greeted;
        Ok(reply)
    }

    /// Introduce the client with `EHLO`, falling back to `HELO` when the
    /// server rejects `EHLO` with a permanent error.
    pub fn hello(&mut self, name: &str) -> Result<Reply, SmtpError> {
        self.expect_state(SessionState::Greeted, "EHLO")?;
        check_argument(name)?;
        let mut reply = self.command(&format!("EHLO {name}"))?;
        if (500..600).contains(&reply.code) {
            debug!(code = reply.code, "EHLO rejected, falling back to HELO");
            reply = self.command(&format!("HELO {name}"))?;
        }
        let reply = accept(reply, &[250])?;
        self.state = SessionState::Ready;
        Ok(reply)
    }

    /// `MAIL FROM:<sender>`.
    pub fn mail_from(&mut self, sender: &str) -> Result<Reply, SmtpError> {
        self.expect_state(SessionState::Ready, "MAIL FROM")?;
        check_argument(sender)?;
        let reply = accept(self.command(&format!("MAIL FROM:<{sender}>"))?, &[250])?;
        self.state = SessionState::SenderSet;
        Ok(reply)
    }

    /// `RCPT TO:<recipient>`. `251` (user not local, will forward) counts as success.
    pub fn rcpt_to(&mut self, recipient: &str) -> Result<Reply, SmtpError> {
        self.expect_state(SessionState::SenderSet, "RCPT TO")?;
        check_argument(recipient)?;
        let reply = accept(
            self.command(&format!("RCPT TO:<{recipient}>"))?,
            &[250, 251],
        )?;
        self.state = SessionState::RecipientSet;
        Ok(reply)
    }

    /// `DATA`, expecting `354`.
    pub fn data(&mut self) -> Result<Reply, SmtpError> {
        self.expect_state(SessionState::RecipientSet, "DATA")?;
        let reply = accept(self.command("DATA")?, &[354])?;
        self.state = SessionState::DataOpen;
        Ok(reply)
    }

    /// Send the message body, dot-stuffed and terminated, and wait for `250`.
    pub fn send_message(&mut self, message: &[u8]) -> Result<Reply, SmtpError> {
        self.expect_state(SessionState::DataOpen, "message")?;
        self.write_all(&encode_data(message))?;
        let reply = self.read_reply()?;
        // Any reply ends the DATA section, so QUIT is allowed afterwards.
        self.state = SessionState::DataSent;
        accept(reply, &[250])
    }

    /// Send `QUIT` and shut the connection down.
    ///
    /// The session is `Closed` afterwards whatever the outcome. Inside an open
    /// DATA section `QUIT` would become message text, so the connection is
    /// only shut down and an out-of-order error is returned.
    pub fn quit(&mut self) -> Result<Reply, SmtpError> {
        let previous = self.state;
        if previous == SessionState::Closed {
            return Err(SmtpError::OutOfOrder {
                command: "QUIT",
                state: previous,
            });
        }
        self.state = SessionState::Closed;

        let result = if previous == SessionState::DataOpen {
            Err(SmtpError::OutOfOrder {
                command: "QUIT",
                state: previous,
            })
        } else {
            self.command("QUIT").and_then(|reply| accept(reply, &[221]))
        };

        if let Err(e) = self.reader.get_ref().shutdown(Shutdown::Both) {
            debug!(error = %e, "Socket shutdown failed");
        }
        result
    }

    fn expect_state(&self, expected: SessionState, command: &'static str) -> Result<(), SmtpError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SmtpError::OutOfOrder {
                command,
                state: self.state,
            })
        }
    }

    fn command(&mut self, line: &str) -> Result<Reply, SmtpError> {
        debug!(command = line, "SMTP >");
        self.write_all(format!("{line}\r\n").as_bytes())?;
        self.read_reply()
    }

    fn write_all(&mut self, mut bytes: &[u8]) -> Result<(), SmtpError> {
        let stream = self.reader.get_mut();
        while !bytes.is_empty() {
            stream.set_write_timeout(Some(self.deadline.remaining()?))?;
            let chunk = &bytes[..bytes.len().min(WRITE_CHUNK)];
            match stream.write(chunk) {
                Ok(0) => return Err(io::Error::from(io::ErrorKind::WriteZero).into()),
                Ok(n) => bytes = &bytes[n..],
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(normalize_timeout(e).into()),
            }
        }
        stream.flush().map_err(normalize_timeout)?;
        Ok(())
    }

    /// Read one line including its `\n`.
    ///
    /// The read timeout is re-armed from the deadline before every fill of
    /// the buffer, so a peer trickling bytes cannot outlive the deadline.
    fn read_line(&mut self) -> Result<Vec<u8>, SmtpError> {
        let mut line = Vec::new();
        loop {
            let remaining = self.deadline.remaining()?;
            self.reader.get_ref().set_read_timeout(Some(remaining))?;

            let available = match self.reader.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(normalize_timeout(e).into()),
            };
            if available.is_empty() {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed by server",
                )
                .into());
            }

            let (used, done) = match available.iter().position(|&b| b == b'\n') {
                Some(pos) => (pos + 1, true),
                None => (available.len(), false),
            };
            line.extend_from_slice(&available[..used]);
            self.reader.consume(used);

            if done {
                return Ok(line);
            }
            if line.len() > MAX_REPLY_LINE {
                return Err(SmtpError::MalformedReply(format!(
                    "reply line longer than {MAX_REPLY_LINE} bytes"
                )));
            }
        }
    }

    fn read_reply(&mut self) -> Result<Reply, SmtpError> {
        let mut lines = Vec::new();
        loop {
            let buf = self.read_line()?;
            let text = String::from_utf8_lossy(&buf);
            let line = text.trim_end_matches(['\r', '\n']);
            let (code, more, message) = parse_reply_line(line)
                .ok_or_else(|| SmtpError::MalformedReply(line.to_string()))?;
            lines.push(message.to_string());

            if !more {
                debug!(code, "SMTP <");
                return Ok(Reply { code, lines });
            }
        }
    }
}

/// Run a blocking name lookup on a helper thread and wait for it no longer
/// than the deadline allows. A lookup that outlives the deadline is left to
/// finish on its own.
fn resolve_within<F>(lookup: F, deadline: Deadline) -> io::Result<Vec<SocketAddr>>
where
    F: FnOnce() -> io::Result<std::vec::IntoIter<SocketAddr>> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("smtp-resolve".to_string())
        .spawn(move || {
            // The receiver is gone when the deadline already passed.
            let _ = tx.send(lookup().map(Iterator::collect::<Vec<_>>));
        })?;

    match rx.recv_timeout(deadline.remaining()?) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(deadline_exceeded()),
        Err(RecvTimeoutError::Disconnected) => {
            Err(io::Error::other("name resolution thread exited"))
        }
    }
}

/// Split `"250-text"` / `"250 text"` / `"250"` into `(code, continues, text)`.
fn parse_reply_line(line: &str) -> Option<(u16, bool, &str)> {
    let digits = line.get(..3)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let code = digits.parse().ok()?;
    match line.as_bytes().get(3) {
        None => Some((code, false, "")),
        Some(b'-') => Some((code, true, &line[4..])),
        Some(b' ') => Some((code, false, &line[4..])),
        Some(_) => None,
    }
}

fn accept(reply: Reply, codes: &[u16]) -> Result<Reply, SmtpError> {
    if codes.contains(&reply.code) {
        Ok(reply)
    } else {
        Err(SmtpError::Rejected {
            code: reply.code,
            message: reply.message(),
        })
    }
}

/// Command arguments must not smuggle extra command lines.
fn check_argument(arg: &str) -> Result<(), SmtpError> {
    if arg.contains(['\r', '\n']) {
        Err(SmtpError::InvalidAddress(arg.to_string()))
    } else {
        Ok(())
    }
}
