use std::fmt;

use rkyv::{Archive, rancor};

pub const FRAME_LOG_MAGIC: u32 = 0x4455_454C;
pub const FRAME_LOG_VERSION: u32 = 1;

#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
    serde::Serialize,
    serde::Deserialize,
)]
#[rkyv(compare(PartialEq), derive(Debug))]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for PlayerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(
    Debug,
    Clone,
    PartialEq,
    Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
    serde::Serialize,
    serde::Deserialize,
)]
#[rkyv(derive(Debug))]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandKind {
    Fire,
    SetHeading {
        heading: f32,
    },
    Stop,
    /// Round-trip probe; echoed back inside a frame and never simulated.
    Heartbeat {
        seq: u32,
        #[serde(rename = "sentAtMs")]
        sent_at_ms: u64,
    },
}

#[derive(
    Debug,
    Clone,
    PartialEq,
    Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
    serde::Serialize,
    serde::Deserialize,
)]
#[rkyv(derive(Debug))]
pub struct FrameCommand {
    #[serde(rename = "actingId")]
    pub actor: PlayerId,
    #[serde(flatten)]
    pub kind: CommandKind,
}

impl FrameCommand {
    pub fn new(actor: impl Into<PlayerId>, kind: CommandKind) -> Self {
        Self {
            actor: actor.into(),
            kind,
        }
    }

    pub fn fire(actor: impl Into<PlayerId>) -> Self {
        Self::new(actor, CommandKind::Fire)
    }

    pub fn set_heading(actor: impl Into<PlayerId>, heading: f32) -> Self {
        Self::new(actor, CommandKind::SetHeading { heading })
    }

    pub fn stop(actor: impl Into<PlayerId>) -> Self {
        Self::new(actor, CommandKind::Stop)
    }

    pub fn is_heartbeat(&self) -> bool {
        matches!(self.kind, CommandKind::Heartbeat { .. })
    }
}

#[derive(
    Debug,
    Clone,
    PartialEq,
    Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
    serde::Serialize,
    serde::Deserialize,
)]
#[rkyv(derive(Debug))]
pub struct Frame {
    pub id: u32,
    pub commands: Vec<FrameCommand>,
}

impl Frame {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            commands: Vec::new(),
        }
    }

    pub fn with_commands(id: u32, commands: Vec<FrameCommand>) -> Self {
        Self { id, commands }
    }

    pub fn push(&mut self, command: FrameCommand) {
        self.commands.push(command);
    }
}

/// How the transport obtained a frame. Replayed frames are part of a
/// reconnect backlog; live frames are fresh relay broadcasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum Delivery {
    #[default]
    Live,
    Replay,
}

impl Delivery {
    pub fn is_replay(self) -> bool {
        matches!(self, Self::Replay)
    }
}

/// A recorded frame stream, replayable through the lockstep scheduler.
#[derive(Debug, Clone, PartialEq, Archive, rkyv::Serialize, rkyv::Deserialize)]
#[rkyv(derive(Debug))]
pub struct FrameLog {
    pub magic: u32,
    pub version: u32,
    pub tick_rate: u32,
    pub frames: Vec<Frame>,
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("serialization failed: {0}")]
    Serialize(rancor::Error),
    #[error("deserialization failed: {0}")]
    Deserialize(rancor::Error),
    #[error("not a frame log (magic {found:#010x})")]
    BadMagic { found: u32 },
    #[error("unsupported frame log version {found}")]
    BadVersion { found: u32 },
}

impl FrameLog {
    pub fn new(tick_rate: u32) -> Self {
        Self {
            magic: FRAME_LOG_MAGIC,
            version: FRAME_LOG_VERSION,
            tick_rate,
            frames: Vec::new(),
        }
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn last_frame_id(&self) -> Option<u32> {
        self.frames.last().map(|f| f.id)
    }

    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        rkyv::to_bytes::<rancor::Error>(self)
            .map(|aligned| aligned.into_vec())
            .map_err(CodecError::Serialize)
    }

    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        let log =
            rkyv::from_bytes::<Self, rancor::Error>(data).map_err(CodecError::Deserialize)?;
        if log.magic != FRAME_LOG_MAGIC {
            return Err(CodecError::BadMagic { found: log.magic });
        }
        if log.version != FRAME_LOG_VERSION {
            return Err(CodecError::BadVersion { found: log.version });
        }
        Ok(log)
    }
}
