//! Error types for the turn engine.
//!
//! Three failure kinds reach the agent retry loop: a malformed response
//! ([`ResponseError`]), an action that breaks a game rule ([`RuleViolation`]),
//! and a transport failure talking to the agent ([`GatewayError`]). All three
//! fold into [`TurnError`], whose display text is fed back to the agent on the
//! next attempt. None of them abort a game.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::game::{ActionKind, NodeId, Phase};

/// A syntactically valid action that breaks a game rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    /// The action references a node id that is not on the map.
    #[error("node `{node_id}` does not exist")]
    UnknownNode {
        /// The missing node id.
        node_id: NodeId,
    },
    /// Unit counts must be positive.
    #[error("{action} must move, deploy or evolve at least one unit")]
    ZeroUnits {
        /// The offending action type.
        action: ActionKind,
    },
    /// The action type is not allowed in the current phase.
    #[error("{action} is not allowed during the {phase} phase")]
    PhaseForbids {
        /// The offending action type.
        action: ActionKind,
        /// The phase the engine is in.
        phase: Phase,
    },
    /// The acting faction does not own the node.
    #[error("node `{node_id}` is not owned by the acting faction")]
    NotOwned {
        /// The node in question.
        node_id: NodeId,
    },
    /// Units can only be deployed at a command node.
    #[error("node `{node_id}` is not a command node")]
    NotCommandNode {
        /// The node in question.
        node_id: NodeId,
    },
    /// The faction cannot pay for the action.
    #[error("insufficient QR: {needed} required, {available} available")]
    InsufficientQr {
        /// QR the action costs.
        needed: u64,
        /// QR the faction holds.
        available: u32,
    },
    /// A deploy would push the node above its capacity.
    #[error("node `{node_id}` can hold {free} more units, {requested} requested")]
    CapacityExceeded {
        /// The node in question.
        node_id: NodeId,
        /// Units requested.
        requested: u32,
        /// Free capacity at the node.
        free: u32,
    },
    /// The destination of a move is already full.
    #[error("node `{node_id}` is at capacity and cannot receive units")]
    DestinationFull {
        /// The node in question.
        node_id: NodeId,
    },
    /// The source node does not hold enough units.
    #[error("node `{node_id}` holds {available} units, {requested} requested")]
    InsufficientUnits {
        /// The node in question.
        node_id: NodeId,
        /// Units requested.
        requested: u32,
        /// Units present.
        available: u32,
    },
    /// The two nodes share no edge.
    #[error("nodes `{from}` and `{to}` are not connected")]
    NotAdjacent {
        /// Source node.
        from: NodeId,
        /// Destination node.
        to: NodeId,
    },
    /// Moving into an enemy node is an attack, not a move.
    #[error("node `{node_id}` is held by the enemy; use ATTACK_NODE")]
    HostileDestination {
        /// The node in question.
        node_id: NodeId,
    },
    /// A faction cannot attack its own node.
    #[error("node `{node_id}` is already owned by the acting faction")]
    FriendlyTarget {
        /// The node in question.
        node_id: NodeId,
    },
    /// The node has no fabrication hub.
    #[error("node `{node_id}` has no fabrication hub")]
    NoFabricationHub {
        /// The node in question.
        node_id: NodeId,
    },
    /// The hub is already running.
    #[error("the fabrication hub at `{node_id}` is already active")]
    HubAlreadyActive {
        /// The node in question.
        node_id: NodeId,
    },
    /// Evolution needs an active hub.
    #[error("the fabrication hub at `{node_id}` is not active")]
    HubInactive {
        /// The node in question.
        node_id: NodeId,
    },
    /// The node garrison is below the hub minimum.
    #[error("node `{node_id}` needs a garrison of {required} to activate its hub, has {present}")]
    GarrisonTooSmall {
        /// The node in question.
        node_id: NodeId,
        /// Minimum garrison.
        required: u32,
        /// Current garrison.
        present: u32,
    },
    /// The node has no supply line to a friendly command node.
    #[error("node `{node_id}` is not connected to a friendly command node")]
    Disconnected {
        /// The node in question.
        node_id: NodeId,
    },
    /// Not enough standard units to evolve.
    #[error("node `{node_id}` has {available} standard units, {requested} requested for evolution")]
    InsufficientStandardUnits {
        /// The node in question.
        node_id: NodeId,
        /// Units requested.
        requested: u32,
        /// Standard units present.
        available: u32,
    },
}

/// The agent's output could not be read as an action batch.
#[derive(Debug, Error)]
pub enum ResponseError {
    /// The response was empty after trimming and fence stripping.
    #[error("response is empty")]
    Empty,
    /// The response was not valid JSON or did not match the expected shape.
    #[error("response is not a valid action batch: {0}")]
    Schema(#[from] serde_json::Error),
}

/// The agent could not be reached or did not answer in time.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The call did not finish within the configured timeout.
    #[error("agent did not answer within {0:?}")]
    Timeout(Duration),
    /// The agent process could not be started or its pipes failed.
    #[error("agent transport failed: {0}")]
    Io(#[from] io::Error),
    /// The agent process exited unsuccessfully.
    #[error("agent exited with status {code:?}")]
    Exit {
        /// Exit code, if the process was not killed by a signal.
        code: Option<i32>,
    },
    /// Any other transport problem.
    #[error("agent transport failed: {0}")]
    Transport(String),
}

/// Why one attempt of an agent sub-turn was rejected.
#[derive(Debug, Error)]
pub enum TurnError {
    /// The agent could not be reached.
    #[error("gateway failure: {0}")]
    Gateway(#[from] GatewayError),
    /// The response was malformed.
    #[error("malformed response: {0}")]
    Malformed(#[from] ResponseError),
    /// One action of the batch broke a rule.
    #[error("action #{index} ({action}) rejected: {violation}")]
    Rule {
        /// 1-based position of the action in the batch.
        index: usize,
        /// The action type.
        action: ActionKind,
        /// The broken rule.
        violation: RuleViolation,
    },
    /// The prompt could not be built.
    #[error("failed to encode the game state: {0}")]
    Encode(serde_json::Error),
}

/// Failure to load an engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file is not valid configuration JSON.
    #[error("failed to parse engine config: {0}")]
    Parse(#[from] serde_json::Error),
    /// The file could not be read.
    #[error("failed to read engine config from {path:?}: {source}")]
    Read {
        /// The file path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// A value is out of range.
    #[error("invalid engine config: {0}")]
    Invalid(String),
}

/// A map template failed its construction checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    /// Two nodes share an id.
    #[error("duplicate node id `{0}`")]
    DuplicateNode(NodeId),
    /// An edge references a node that is not in the template.
    #[error("edge references unknown node `{0}`")]
    DanglingEdge(NodeId),
    /// A faction has no command node or more than one.
    #[error("expected exactly one command node per faction, found {found} for {faction}")]
    CommandNodes {
        /// Faction name.
        faction: String,
        /// Command nodes found.
        found: usize,
    },
    /// The knowledge-junction threshold would let both factions qualify together.
    #[error("required KJ count {required} must exceed half of the {total} junctions on the map")]
    AmbiguousThreshold {
        /// Required connected KJs.
        required: u32,
        /// KJs on the map.
        total: u32,
    },
    /// A starting garrison does not fit in its node.
    #[error("starting garrison at `{0}` exceeds its capacity")]
    Overfilled(NodeId),
}

/// Failure to save or load a game.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// File I/O failed.
    #[error("failed to access {path:?}: {source}")]
    Io {
        /// The file path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The file is not a serialized game.
    #[error("failed to decode saved game: {0}")]
    Decode(#[from] serde_json::Error),
    /// The decoded game breaks engine invariants.
    #[error("saved game is inconsistent: {0}")]
    Inconsistent(String),
}

/// A user intent that cannot be honored in the current session state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Maps can only be selected before a game starts.
    #[error("the map cannot be changed while a game is running")]
    GameInProgress,
    /// There is no game to pause or resume.
    #[error("no game has been started")]
    NoGame,
    /// The map template failed to build.
    #[error(transparent)]
    Map(#[from] MapError),
}
