//! Per-connection state machine.
//!
//! `Unauthenticated → Authenticated → Closed`, with `Unauthenticated → Closed`
//! for clients that leave before authenticating. [`Connection::on_event`] is a
//! pure decision function: it never performs I/O, it only tells the gateway
//! which effect to run. The state itself changes through
//! [`Connection::authenticate`] and [`Connection::close`].

use super::{
    entity::Identity,
    error::ValueObjectError,
    value_object::{ConnectionId, MessageContent, RoomName},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Unauthenticated,
    Authenticated(Identity),
    Closed,
}

/// Inbound transport events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Authenticate { token: Option<String> },
    SendMessage { content: String },
    Heartbeat,
}

/// Why an event was refused without touching shared state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refusal {
    MissingCredential,
    AlreadyAuthenticated,
    NotAuthenticated,
    InvalidContent(ValueObjectError),
}

/// Effect the gateway must run for an inbound event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Run the authentication handshake with this credential
    Authenticate { token: String },
    /// Persist the message, acknowledge the author, fan out to peers
    Send {
        author: Identity,
        content: MessageContent,
    },
    /// Answer the liveness probe
    Heartbeat,
    /// Error notice only; the connection stays as it is
    Refuse(Refusal),
    /// Error notice followed by a forced close
    Terminate(Refusal),
    /// Nothing to do (connection already closed)
    Ignore,
}

/// One live transport-level session, bound to a single room for its lifetime
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    room: RoomName,
    state: ConnectionState,
}

impl Connection {
    pub fn new(room: RoomName) -> Self {
        Self {
            id: ConnectionId::generate(),
            room,
            state: ConnectionState::Unauthenticated,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn room(&self) -> &RoomName {
        &self.room
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn identity(&self) -> Option<&Identity> {
        match &self.state {
            ConnectionState::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, ConnectionState::Closed)
    }

    /// Decide what an inbound event means in the current state
    pub fn on_event(&self, event: InboundEvent) -> Transition {
        match (&self.state, event) {
            (ConnectionState::Closed, _) => Transition::Ignore,
            (_, InboundEvent::Heartbeat) => Transition::Heartbeat,
            (ConnectionState::Unauthenticated, InboundEvent::Authenticate { token }) => {
                match token.filter(|t| !t.trim().is_empty()) {
                    Some(token) => Transition::Authenticate { token },
                    None => Transition::Terminate(Refusal::MissingCredential),
                }
            }
            (ConnectionState::Authenticated(_), InboundEvent::Authenticate { .. }) => {
                Transition::Refuse(Refusal::AlreadyAuthenticated)
            }
            (ConnectionState::Unauthenticated, InboundEvent::SendMessage { .. }) => {
                Transition::Refuse(Refusal::NotAuthenticated)
            }
            (ConnectionState::Authenticated(identity), InboundEvent::SendMessage { content }) => {
                match MessageContent::new(content) {
                    Ok(content) => Transition::Send {
                        author: identity.clone(),
                        content,
                    },
                    Err(e) => Transition::Refuse(Refusal::InvalidContent(e)),
                }
            }
        }
    }

    /// `Unauthenticated → Authenticated`; any other source state is refused
    pub fn authenticate(&mut self, identity: Identity) -> bool {
        if self.state != ConnectionState::Unauthenticated {
            return false;
        }
        self.state = ConnectionState::Authenticated(identity);
        true
    }

    /// `* → Closed`
    ///
    /// Returns the identity when the connection was authenticated, i.e. when
    /// registry cleanup is needed. Closing twice returns `None` the second time.
    pub fn close(&mut self) -> Option<Identity> {
        match std::mem::replace(&mut self.state, ConnectionState::Closed) {
            ConnectionState::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }
}
