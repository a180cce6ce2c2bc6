//! In-process transport where every seat is a [`Strategy`] that answers
//! synchronously. Used for tests, benchmarks and local bot tournaments.

use log::debug;
use std::{collections::VecDeque, time::Duration};

use super::{
    errors::{Result, TransportError},
    messages::{MoveReply, ServerMessage},
    transport::{Inbound, Transport},
};
use crate::{
    bot::Strategy,
    game::entities::{AuthToken, Player, Username},
};

struct LocalSeat {
    name: Username,
    key: AuthToken,
    strategy: Box<dyn Strategy>,
}

enum Arrival {
    Bot {
        name: Option<String>,
        strategy: Box<dyn Strategy>,
    },
    Raw(Inbound),
}

pub struct LocalTransport {
    arrivals: VecDeque<Arrival>,
    pending: Option<Box<dyn Strategy>>,
    seats: Vec<LocalSeat>,
    inbox: VecDeque<Inbound>,
    sent: Vec<ServerMessage>,
    rejections: Vec<String>,
}

impl LocalTransport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            arrivals: VecDeque::new(),
            pending: None,
            seats: Vec::new(),
            inbox: VecDeque::new(),
            sent: Vec::new(),
            rejections: Vec::new(),
        }
    }

    /// Queue a bot to register under `name`.
    pub fn join<S: Strategy + 'static>(&mut self, name: Option<&str>, strategy: S) -> &mut Self {
        self.arrivals.push_back(Arrival::Bot {
            name: name.map(str::to_string),
            strategy: Box::new(strategy),
        });
        self
    }

    /// Queue something other than a bot for the registration phase.
    pub fn push_arrival(&mut self, inbound: Inbound) -> &mut Self {
        self.arrivals.push_back(Arrival::Raw(inbound));
        self
    }

    /// Put a message in the dealer's inbox ahead of any bot replies.
    pub fn push_inbound(&mut self, inbound: Inbound) -> &mut Self {
        self.inbox.push_back(inbound);
        self
    }

    /// Every broadcast so far, oldest first.
    #[must_use]
    pub fn sent(&self) -> &[ServerMessage] {
        &self.sent
    }

    /// Reasons given for every rejected registration.
    #[must_use]
    pub fn rejections(&self) -> &[String] {
        &self.rejections
    }

    #[must_use]
    pub fn num_seated(&self) -> usize {
        self.seats.len()
    }
}

impl Default for LocalTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for LocalTransport {
    fn accept_registration(&mut self) -> Result<Inbound> {
        match self.arrivals.pop_front() {
            Some(Arrival::Bot { name, strategy }) => {
                self.pending = Some(strategy);
                Ok(Inbound::Register { name })
            }
            Some(Arrival::Raw(inbound)) => Ok(inbound),
            None => Err(TransportError::Closed),
        }
    }

    fn confirm_registration(&mut self, player: &Player) -> Result<()> {
        let mut strategy = self
            .pending
            .take()
            .ok_or(TransportError::NoPendingRegistration)?;
        strategy.observe(&ServerMessage::Registered {
            name: player.name.clone(),
            chips: player.chips,
            key: player.token().clone(),
        });
        self.seats.push(LocalSeat {
            name: player.name.clone(),
            key: player.token().clone(),
            strategy,
        });
        Ok(())
    }

    fn reject_registration(&mut self, reason: &str) -> Result<()> {
        // Raw arrivals have no strategy to drop.
        self.pending = None;
        self.rejections.push(reason.to_string());
        Ok(())
    }

    fn broadcast(&mut self, msg: &ServerMessage) -> Result<()> {
        for seat in &mut self.seats {
            seat.strategy.observe(msg);
            let ServerMessage::MoveRequest(request) = msg else {
                continue;
            };
            if request.name != seat.name {
                continue;
            }
            match seat.strategy.decide(request) {
                Some(requested) => self.inbox.push_back(Inbound::Move(MoveReply::new(
                    seat.name.clone(),
                    seat.key.clone(),
                    requested,
                ))),
                None => debug!("{} stays silent", seat.name),
            }
        }
        self.sent.push(msg.clone());
        Ok(())
    }

    fn recv(&mut self, timeout: Option<Duration>) -> Result<Option<Inbound>> {
        match (self.inbox.pop_front(), timeout) {
            (Some(inbound), _) => Ok(Some(inbound)),
            // Nobody is left to answer, so any wait runs out.
            (None, Some(_)) => Ok(None),
            (None, None) => Err(TransportError::Closed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bot::Scripted,
        game::entities::{Chips, Move},
        net::{
            messages::{MoveKind, MoveRequest},
            transport::await_reply,
        },
    };

    fn player(name: &str, seat: usize) -> Player {
        Player::new(Username::new(name), AuthToken::generate(), seat, 100)
    }

    fn request(name: &str, to_call: Chips) -> ServerMessage {
        ServerMessage::MoveRequest(MoveRequest {
            name: Username::new(name),
            pot: 0,
            to_call,
            last_bet: to_call,
            min_raise: 10,
            chips: 100,
        })
    }

    fn seated(bots: Vec<(&str, Scripted)>) -> (LocalTransport, Vec<Player>) {
        let mut transport = LocalTransport::new();
        for (name, bot) in &bots {
            transport.join(Some(*name), bot.clone());
        }
        let mut players = Vec::new();
        for (seat, (name, _)) in bots.iter().enumerate() {
            let inbound = transport.accept_registration().unwrap();
            assert_eq!(
                inbound,
                Inbound::Register {
                    name: Some(name.to_string())
                }
            );
            let p = player(name, seat);
            transport.confirm_registration(&p).unwrap();
            players.push(p);
        }
        (transport, players)
    }

    #[test]
    fn test_registration_runs_dry() {
        let (mut transport, _) = seated(vec![("a", Scripted::calling())]);
        assert_eq!(transport.num_seated(), 1);
        assert!(matches!(
            transport.accept_registration(),
            Err(TransportError::Closed)
        ));
        assert!(matches!(
            transport.confirm_registration(&player("b", 1)),
            Err(TransportError::NoPendingRegistration)
        ));
    }

    #[test]
    fn test_only_addressed_seat_answers() {
        let (mut transport, players) = seated(vec![
            ("a", Scripted::new([Move::Raise(30)])),
            ("b", Scripted::calling()),
        ]);
        transport.broadcast(&request("a", 0)).unwrap();
        let reply = await_reply(&mut transport, None, |r| r.name == players[0].name)
            .unwrap()
            .unwrap();
        assert_eq!(reply.action, MoveKind::RaiseTo);
        assert_eq!(reply.chips, 30);
        assert!(players[0].is_authenticated_by(&reply.key));
        assert_eq!(transport.sent().len(), 1);
    }

    #[test]
    fn test_await_reply_discards_unexpected_messages() {
        let (mut transport, players) = seated(vec![("a", Scripted::calling())]);
        transport
            .push_inbound(Inbound::Malformed("garbage".to_string()))
            .push_inbound(Inbound::Disconnected("peer".to_string()))
            .push_inbound(Inbound::Move(MoveReply::new(
                Username::new("someone"),
                AuthToken::generate(),
                Move::AllIn,
            )))
            .push_inbound(Inbound::Register { name: None });
        transport.broadcast(&request("a", 10)).unwrap();

        let reply = await_reply(&mut transport, None, |r| r.name == players[0].name)
            .unwrap()
            .unwrap();
        assert_eq!(reply.to_move(), Move::Call);
        assert_eq!(transport.rejections().len(), 1);
    }

    #[test]
    fn test_await_reply_times_out_on_silence() {
        let (mut transport, _) = seated(vec![("a", Scripted::silent())]);
        transport.broadcast(&request("a", 10)).unwrap();
        let reply = await_reply(&mut transport, Some(Duration::from_millis(5)), |_| true).unwrap();
        assert!(reply.is_none());
    }

    #[test]
    fn test_await_reply_without_timeout_on_silence_is_closed() {
        let (mut transport, _) = seated(vec![("a", Scripted::silent())]);
        transport.broadcast(&request("a", 10)).unwrap();
        assert!(matches!(
            await_reply(&mut transport, None, |_| true),
            Err(TransportError::Closed)
        ));
    }
}
