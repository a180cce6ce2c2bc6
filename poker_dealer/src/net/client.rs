//! A low-level TCP dealer client.
//!
//! This client is blocking and so is primarily used by bots and tests
//! rather than as an interactive client.

use anyhow::{Error, bail};
use log::debug;
use std::{
    net::{SocketAddr, TcpStream},
    thread,
    time::Duration,
};

use super::{
    messages::{ClientMessage, MoveReply, ServerMessage},
    utils,
};
use crate::{
    bot::Strategy,
    game::entities::{AuthToken, Chips, Move, Username},
};

/// Default timeout for the registration handshake.
pub const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for writing to the dealer.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// A registered seat at a remote dealer.
pub struct Client {
    /// The name the dealer gave this seat.
    pub name: Username,
    /// Starting stack as reported at registration.
    pub chips: Chips,
    key: AuthToken,
    /// The underlying TCP stream.
    pub stream: TcpStream,
}

impl Client {
    /// Connect to a dealer and register, asking for `name`.
    ///
    /// Tries three times with shrinking connect timeouts (1s, 500ms,
    /// 100ms) in case the dealer is still starting up.
    ///
    /// # Errors
    ///
    /// Returns an error if unable to connect or if the dealer turns the
    /// registration down.
    pub fn connect(addr: &SocketAddr, name: Option<&str>) -> Result<Self, Error> {
        let mut connect_timeouts = vec![
            Duration::from_secs(1),
            Duration::from_millis(500),
            Duration::from_millis(100),
        ];
        while let Some(connect_timeout) = connect_timeouts.pop() {
            match TcpStream::connect_timeout(addr, connect_timeout) {
                Ok(mut stream) => {
                    stream.set_read_timeout(Some(READ_TIMEOUT))?;
                    stream.set_write_timeout(Some(WRITE_TIMEOUT))?;
                    let msg = ClientMessage::Register {
                        name: name.map(str::to_string),
                    };
                    utils::write_prefixed(&mut stream, &msg)?;
                    return match utils::read_prefixed::<ServerMessage, TcpStream>(&mut stream)? {
                        ServerMessage::Registered { name, chips, key } => Ok(Self {
                            name,
                            chips,
                            key,
                            stream,
                        }),
                        ServerMessage::Rejected { reason } => bail!("registration rejected: {reason}"),
                        response => bail!("invalid server response: {response}"),
                    };
                }
                _ => thread::sleep(connect_timeout),
            }
        }
        let who = name.unwrap_or("an unnamed player");
        bail!("couldn't connect to {addr} as {who}")
    }

    /// The token that proves replies come from this seat.
    #[must_use]
    pub fn key(&self) -> &AuthToken {
        &self.key
    }

    /// Wait at most `timeout` for each message, forever if `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket option can't be set.
    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<(), Error> {
        self.stream.set_read_timeout(timeout)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if nothing valid could be read.
    pub fn recv(&mut self) -> Result<ServerMessage, Error> {
        match utils::read_prefixed::<ServerMessage, TcpStream>(&mut self.stream) {
            Ok(ServerMessage::Rejected { reason }) => bail!(reason),
            Ok(msg) => Ok(msg),
            Err(error) => bail!(error),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the message cannot be sent to the dealer.
    pub fn send_move(&mut self, requested: Move) -> Result<(), Error> {
        let msg = ClientMessage::Move(MoveReply::new(
            self.name.clone(),
            self.key.clone(),
            requested,
        ));
        utils::write_prefixed(&mut self.stream, &msg)?;
        Ok(())
    }

    /// Play with `strategy` until the tournament ends. Returns the
    /// announced winner.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails before the tournament is
    /// over.
    pub fn play<S: Strategy + ?Sized>(
        &mut self,
        strategy: &mut S,
    ) -> Result<Option<Username>, Error> {
        self.set_read_timeout(None)?;
        strategy.observe(&ServerMessage::Registered {
            name: self.name.clone(),
            chips: self.chips,
            key: self.key.clone(),
        });
        loop {
            let msg = self.recv()?;
            strategy.observe(&msg);
            match msg {
                ServerMessage::MoveRequest(request) if request.name == self.name => {
                    match strategy.decide(&request) {
                        Some(requested) => self.send_move(requested)?,
                        None => debug!("{} passes on answering", self.name),
                    }
                }
                ServerMessage::TournamentOver { winner } => return Ok(winner),
                _ => {}
            }
        }
    }
}
