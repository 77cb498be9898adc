//! Helpers shared by the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use clamaction::error::{DeliveryError, SmtpError, SmtpStep};
use clamaction::smtp::Transport;

pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Replies of the scripted SMTP server.
#[derive(Debug, Clone, Copy)]
pub struct Script {
    pub greeting: &'static str,
    pub ehlo: &'static str,
    pub rcpt: &'static str,
    pub data_end: &'static str,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            greeting: "220 mx.test ESMTP",
            ehlo: "250-mx.test\r\n250 SIZE 1000000",
            rcpt: "250 OK",
            data_end: "250 OK queued",
        }
    }
}

/// What the client sent during one session.
#[derive(Debug, Default)]
pub struct Session {
    /// Command lines without their CRLF.
    pub commands: Vec<String>,
    /// DATA payload as received, before the terminating `.` line.
    pub data: Vec<u8>,
}

/// Start a one-connection SMTP server on 127.0.0.1. Returns its port and a
/// handle yielding the recorded session.
pub fn spawn_server(script: Script) -> (u16, JoinHandle<Session>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut writer = stream;
        let mut session = Session::default();

        write!(writer, "{}\r\n", script.greeting).unwrap();

        loop {
            let mut line = String::new();
            match reader.read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let command = line.trim_end().to_string();
            let upper = command.to_ascii_uppercase();
            session.commands.push(command);

            let reply = if upper.starts_with("EHLO") {
                script.ehlo
            } else if upper.starts_with("HELO") {
                "250 mx.test"
            } else if upper.starts_with("MAIL FROM") {
                "250 OK"
            } else if upper.starts_with("RCPT TO") {
                script.rcpt
            } else if upper == "DATA" {
                write!(writer, "354 End data with <CR><LF>.<CR><LF>\r\n").unwrap();
                loop {
                    let mut buf = Vec::new();
                    if reader.read_until(b'\n', &mut buf).unwrap() == 0 || buf == b".\r\n" {
                        break;
                    }
                    session.data.extend_from_slice(&buf);
                }
                script.data_end
            } else if upper == "QUIT" {
                let _ = write!(writer, "221 Bye\r\n");
                break;
            } else {
                "500 Unknown command"
            };
            write!(writer, "{reply}\r\n").unwrap();
        }

        session
    });

    (port, handle)
}

/// A port nothing listens on.
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// One delivery seen by [`RecordingTransport`].
#[derive(Debug, Clone)]
pub struct Sent {
    pub sender: String,
    pub recipient: String,
    pub message: Vec<u8>,
}

impl Sent {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.message).into_owned()
    }
}

/// Records deliveries; recipients in `reject` fail at `RCPT TO`.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    pub sent: RefCell<Vec<Sent>>,
    pub attempts: RefCell<Vec<String>>,
    pub reject: Vec<String>,
}

impl RecordingTransport {
    pub fn rejecting(recipients: &[&str]) -> Self {
        Self {
            reject: recipients.iter().map(|r| r.to_string()).collect(),
            ..Self::default()
        }
    }
}

impl Transport for RecordingTransport {
    fn send(&self, sender: &str, recipient: &str, message: &[u8]) -> Result<(), DeliveryError> {
        self.attempts.borrow_mut().push(recipient.to_string());
        if self.reject.iter().any(|r| r == recipient) {
            return Err(DeliveryError {
                step: SmtpStep::RcptTo,
                source: SmtpError::Rejected {
                    code: 550,
                    message: "No such user".to_string(),
                },
            });
        }
        self.sent.borrow_mut().push(Sent {
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            message: message.to_vec(),
        });
        Ok(())
    }
}
