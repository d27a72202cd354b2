//! # Buffered Connections
//!
//! Non-blocking connection wrapper for the TCP server: a compacting read
//! buffer that accumulates wire traffic until the dispatcher can cut
//! complete messages out of it, and a write buffer for replies the socket
//! was not ready to take.

use std::io::{self, Read, Write};

use mio::net::TcpStream;

const READ_BUFFER_LIMIT: usize = 1024 * 1024;

pub struct Connection {
    stream: TcpStream,
    read_buf: Vec<u8>,
    read_pos: usize,
    write_buf: Vec<u8>,
    closed: bool,
}

impl Connection {
    pub fn new(stream: TcpStream) -> Self {
        let _ = stream.set_nodelay(true);
        Connection {
            stream,
            read_buf: Vec::with_capacity(4096),
            read_pos: 0,
            write_buf: Vec::new(),
            closed: false,
        }
    }

    pub fn stream_mut(&mut self) -> &mut TcpStream {
        &mut self.stream
    }

    /// Peer closed its end (or the buffer limit was hit).
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Unconsumed bytes received so far.
    pub fn readable(&self) -> &[u8] {
        &self.read_buf[self.read_pos..]
    }

    /// Marks `n` buffered bytes as consumed.
    pub fn consume(&mut self, n: usize) {
        self.read_pos = (self.read_pos + n).min(self.read_buf.len());
        if self.read_pos == self.read_buf.len() {
            self.read_buf.clear();
            self.read_pos = 0;
        } else if self.read_pos > READ_BUFFER_LIMIT / 2 {
            self.read_buf.drain(..self.read_pos);
            self.read_pos = 0;
        }
    }

    /// Pulls everything currently available off the socket into the read
    /// buffer. Returns the number of unconsumed buffered bytes.
    pub fn fill(&mut self) -> io::Result<usize> {
        let mut chunk = [0u8; 4096];
        loop {
            match self.stream.read(&mut chunk) {
                Ok(0) => {
                    self.closed = true;
                    break;
                }
                Ok(n) => {
                    self.read_buf.extend_from_slice(&chunk[..n]);
                    if self.read_buf.len() - self.read_pos > READ_BUFFER_LIMIT {
                        self.closed = true;
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::ConnectionReset => {
                    self.closed = true;
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(self.read_buf.len() - self.read_pos)
    }

    /// Queues outbound bytes and tries to flush immediately.
    pub fn queue_write(&mut self, data: &[u8]) -> io::Result<()> {
        self.write_buf.extend_from_slice(data);
        self.flush()
    }

    /// Writes as much of the pending output as the socket will take.
    pub fn flush(&mut self) -> io::Result<()> {
        let mut written = 0;
        while written < self.write_buf.len() {
            match self.stream.write(&self.write_buf[written..]) {
                Ok(0) => {
                    self.closed = true;
                    break;
                }
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        self.write_buf.drain(..written);
        Ok(())
    }

    pub fn write_pending(&self) -> usize {
        self.write_buf.len()
    }
}
