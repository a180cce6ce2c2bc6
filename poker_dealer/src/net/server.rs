//! TCP transport. One `mio` poll loop runs on the dealer's thread and
//! only turns over while the dealer is waiting on a registration or a
//! reply.

use log::{debug, info, warn};
use mio::{
    Events, Interest, Poll, Token,
    net::{TcpListener, TcpStream},
};
use std::{
    collections::{HashMap, VecDeque},
    io::{self, Read, Write},
    net::SocketAddr,
    time::{Duration, Instant},
};

use super::{
    errors::{Result, TransportError},
    messages::{ClientMessage, ServerMessage},
    transport::{Inbound, Transport},
    utils::{encode_frame, split_frame},
};
use crate::game::entities::{Player, Username};

const SERVER: Token = Token(0);
const READ_CHUNK: usize = 4096;
const MAX_EVENTS: usize = 128;

struct Connection {
    stream: TcpStream,
    addr: SocketAddr,
    name: Option<Username>,
    inbox: Vec<u8>,
    outbox: Vec<u8>,
}

impl Connection {
    fn label(&self) -> String {
        match &self.name {
            Some(name) => name.to_string(),
            None => self.addr.to_string(),
        }
    }

    /// Write as much of the outbox as the socket takes. Returns whether
    /// anything is left over.
    fn flush(&mut self) -> io::Result<bool> {
        while !self.outbox.is_empty() {
            match self.stream.write(&self.outbox) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => {
                    self.outbox.drain(..n);
                }
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => return Ok(true),
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error) => return Err(error),
            }
        }
        Ok(false)
    }

    /// Drain the socket into the inbox. Returns whether the peer hung up.
    fn fill(&mut self) -> io::Result<bool> {
        let mut chunk = [0; READ_CHUNK];
        loop {
            match self.stream.read(&mut chunk) {
                Ok(0) => return Ok(true),
                Ok(n) => self.inbox.extend_from_slice(&chunk[..n]),
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => return Ok(false),
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error) => return Err(error),
            }
        }
    }
}

/// Dealer side of the TCP protocol.
///
/// Registered players are addressed in seat order. A connection that
/// hasn't registered only ever receives a direct `REGISTERED` or
/// `REJECTED` reply.
pub struct TcpTransport {
    poll: Poll,
    events: Events,
    listener: TcpListener,
    connections: HashMap<Token, Connection>,
    next_token: usize,
    queue: VecDeque<(Token, Inbound)>,
    pending: Option<Token>,
    seated: Vec<Token>,
}

impl TcpTransport {
    /// Listen on `addr`. Port 0 picks a free port, see
    /// [`Self::local_addr`].
    ///
    /// # Errors
    ///
    /// Fails if the address can't be bound.
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let poll = Poll::new()?;
        let mut listener = TcpListener::bind(addr)?;
        poll.registry()
            .register(&mut listener, SERVER, Interest::READABLE)?;
        info!("listening on {}", listener.local_addr()?);
        Ok(Self {
            poll,
            events: Events::with_capacity(MAX_EVENTS),
            listener,
            connections: HashMap::new(),
            next_token: SERVER.0 + 1,
            queue: VecDeque::new(),
            pending: None,
            seated: Vec::new(),
        })
    }

    /// # Errors
    ///
    /// Fails if the listener's address can't be read.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Registered players whose connection is still open.
    #[must_use]
    pub fn num_connected(&self) -> usize {
        self.seated
            .iter()
            .filter(|token| self.connections.contains_key(token))
            .count()
    }

    /// Keep the poll loop turning until every queued frame is written or
    /// `timeout` runs out. Call before dropping the transport so the last
    /// broadcasts aren't lost.
    ///
    /// # Errors
    ///
    /// Fails if polling fails.
    pub fn flush(&mut self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while self.connections.values().any(|c| !c.outbox.is_empty()) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!("gave up flushing with frames still queued");
                break;
            }
            self.poll_once(Some(remaining))?;
        }
        Ok(())
    }

    fn accept_connections(&mut self) -> Result<()> {
        loop {
            match self.listener.accept() {
                Ok((mut stream, addr)) => {
                    let token = Token(self.next_token);
                    self.next_token += 1;
                    self.poll
                        .registry()
                        .register(&mut stream, token, Interest::READABLE)?;
                    debug!("{addr} connected");
                    self.connections.insert(
                        token,
                        Connection {
                            stream,
                            addr,
                            name: None,
                            inbox: Vec::new(),
                            outbox: Vec::new(),
                        },
                    );
                }
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(error) => return Err(error.into()),
            }
        }
    }

    fn drop_connection(&mut self, token: Token) {
        let Some(mut connection) = self.connections.remove(&token) else {
            return;
        };
        if let Err(error) = self.poll.registry().deregister(&mut connection.stream) {
            debug!("deregistering {}: {error}", connection.label());
        }
        if self.pending == Some(token) {
            self.pending = None;
        }
        self.queue
            .push_back((token, Inbound::Disconnected(connection.label())));
    }

    /// Decode every whole frame a connection has buffered.
    fn read_connection(&mut self, token: Token) {
        let Some(connection) = self.connections.get_mut(&token) else {
            return;
        };
        let hung_up = match connection.fill() {
            Ok(hung_up) => hung_up,
            Err(error) => {
                warn!("reading from {}: {error}", connection.label());
                true
            }
        };

        loop {
            match split_frame(&mut connection.inbox) {
                Ok(Some(payload)) => {
                    let inbound = match serde_json::from_slice::<ClientMessage>(&payload) {
                        Ok(ClientMessage::Register { name }) => Inbound::Register { name },
                        Ok(ClientMessage::Move(reply)) => Inbound::Move(reply),
                        Err(error) => Inbound::Malformed(error.to_string()),
                    };
                    self.queue.push_back((token, inbound));
                }
                Ok(None) => break,
                Err(error) => {
                    // The stream can't be resynchronized past a bad prefix.
                    self.queue
                        .push_back((token, Inbound::Malformed(error.to_string())));
                    self.drop_connection(token);
                    return;
                }
            }
        }

        if hung_up {
            self.drop_connection(token);
        }
    }

    fn write_connection(&mut self, token: Token) -> Result<()> {
        let Some(connection) = self.connections.get_mut(&token) else {
            return Ok(());
        };
        match connection.flush() {
            Ok(true) => Ok(()),
            Ok(false) => {
                self.poll.registry().reregister(
                    &mut connection.stream,
                    token,
                    Interest::READABLE,
                )?;
                Ok(())
            }
            Err(error) => {
                warn!("writing to {}: {error}", connection.label());
                self.drop_connection(token);
                Ok(())
            }
        }
    }

    /// Queue a frame for one connection and push out what the socket
    /// takes right away.
    fn send_frame(&mut self, token: Token, frame: &[u8]) -> Result<()> {
        let Some(connection) = self.connections.get_mut(&token) else {
            return Ok(());
        };
        connection.outbox.extend_from_slice(frame);
        match connection.flush() {
            Ok(false) => Ok(()),
            Ok(true) => {
                self.poll.registry().reregister(
                    &mut connection.stream,
                    token,
                    Interest::READABLE | Interest::WRITABLE,
                )?;
                Ok(())
            }
            Err(error) => {
                warn!("writing to {}: {error}", connection.label());
                self.drop_connection(token);
                Ok(())
            }
        }
    }

    /// Run the poll loop once, waiting at most `timeout`.
    fn poll_once(&mut self, timeout: Option<Duration>) -> Result<()> {
        if let Err(error) = self.poll.poll(&mut self.events, timeout) {
            if error.kind() == io::ErrorKind::Interrupted {
                return Ok(());
            }
            return Err(error.into());
        }

        let ready: Vec<(Token, bool, bool)> = self
            .events
            .iter()
            .map(|event| {
                (
                    event.token(),
                    event.is_readable() || event.is_read_closed() || event.is_error(),
                    event.is_writable(),
                )
            })
            .collect();
        for (token, readable, writable) in ready {
            if token == SERVER {
                self.accept_connections()?;
                continue;
            }
            if writable {
                self.write_connection(token)?;
            }
            if readable {
                self.read_connection(token);
            }
        }
        Ok(())
    }

    fn is_seated(&self, token: Token) -> bool {
        self.seated.contains(&token)
    }

    fn take_pending(&mut self) -> Result<Token> {
        self.pending.take().ok_or(TransportError::NoPendingRegistration)
    }
}

impl Transport for TcpTransport {
    fn accept_registration(&mut self) -> Result<Inbound> {
        loop {
            while let Some((token, inbound)) = self.queue.pop_front() {
                if self.is_seated(token) {
                    match inbound {
                        Inbound::Disconnected(name) => info!("{name} left while registration is open"),
                        other => warn!("ignoring message from a seated player: {other:?}"),
                    }
                    continue;
                }
                if !matches!(inbound, Inbound::Disconnected(_)) {
                    self.pending = Some(token);
                }
                return Ok(inbound);
            }
            self.poll_once(None)?;
        }
    }

    fn confirm_registration(&mut self, player: &Player) -> Result<()> {
        let token = self.take_pending()?;
        let frame = encode_frame(&ServerMessage::Registered {
            name: player.name.clone(),
            chips: player.chips,
            key: player.token().clone(),
        })?;
        if let Some(connection) = self.connections.get_mut(&token) {
            connection.name = Some(player.name.clone());
        }
        self.seated.push(token);
        self.send_frame(token, &frame)
    }

    fn reject_registration(&mut self, reason: &str) -> Result<()> {
        let token = self.take_pending()?;
        let frame = encode_frame(&ServerMessage::Rejected {
            reason: reason.to_string(),
        })?;
        self.send_frame(token, &frame)?;
        if let Some(mut connection) = self.connections.remove(&token) {
            if let Err(error) = self.poll.registry().deregister(&mut connection.stream) {
                debug!("deregistering {}: {error}", connection.label());
            }
        }
        // Whatever the rejected peer already sent is moot.
        self.queue.retain(|(from, _)| *from != token);
        Ok(())
    }

    fn broadcast(&mut self, msg: &ServerMessage) -> Result<()> {
        let frame = encode_frame(msg)?;
        for token in self.seated.clone() {
            self.send_frame(token, &frame)?;
        }
        Ok(())
    }

    fn recv(&mut self, timeout: Option<Duration>) -> Result<Option<Inbound>> {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        loop {
            if let Some((token, inbound)) = self.queue.pop_front() {
                let is_register = matches!(inbound, Inbound::Register { .. });
                if is_register && self.is_seated(token) {
                    warn!("ignoring a second registration from a seated player");
                    continue;
                }
                // Only a registration from an unseated peer can be answered.
                self.pending = is_register.then_some(token);
                return Ok(Some(inbound));
            }
            if self.num_connected() == 0 {
                return Err(TransportError::Closed);
            }
            let wait = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Ok(None);
                    }
                    Some(remaining)
                }
                None => None,
            };
            self.poll_once(wait)?;
        }
    }
}
