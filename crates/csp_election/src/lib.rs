//! Bully-style leader election over the hub transport (§4.8).
//!
//! One client in a space is elected "leader" and holds the sole authority
//! to run entity scripts, so a script attached to a shared entity doesn't
//! execute once per connected client. [`LeaderElection`] runs the protocol;
//! [`ClientProxy`] tracks what it knows about each peer.

mod election;
mod error;
mod message;
mod proxy;

pub use election::{LeaderElection, ElectionState, DEFAULT_ELECTION_TIMEOUT, DEFAULT_HEARTBEAT_INTERVAL};
pub use error::ElectionError;
pub use message::{
    ClientElectionMessage, ClientElectionMessageType, RemoteRunScriptMessage,
    CLIENT_ELECTION_CHANNEL, REMOTE_RUN_SCRIPT_CHANNEL,
};
pub use proxy::ClientProxy;
