use chrono::{DateTime, Local};

use crate::client::{FetchFailure, VoiceAlertReply};
use crate::snapshot::Snapshot;

/// Per-tick sequence number; strictly increasing in issue order.
pub type TickSeq = u64;

#[derive(Debug, Clone)]
pub enum Event {
    Timer(TimerEvent),
    Fetch(FetchEvent),
    Ui(UiEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Snapshot refresh period elapsed.
    Refresh,
    /// Summary reload period elapsed.
    Summary,
}

#[derive(Debug, Clone)]
pub enum FetchEvent {
    SnapshotReady {
        seq: TickSeq,
        snapshot: Box<Snapshot>,
        received_at: DateTime<Local>,
    },
    SnapshotFailed {
        seq: TickSeq,
        failure: FetchFailure,
    },
    SummaryLoaded {
        summary: Option<String>,
    },
    SummaryFailed {
        failure: FetchFailure,
    },
    VoiceAlertReplied {
        reply: VoiceAlertReply,
    },
    VoiceAlertFailed {
        failure: FetchFailure,
    },
    AudioFailed {
        error: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    SetAutoRefresh(bool),
    ToggleAutoRefresh,
    RefreshNow,
    VoiceAlert,
    Quit,
}

/// Side effects requested by the reducer; executed by the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    FetchSnapshot { seq: TickSeq },
    FetchSummary,
    RequestVoiceAlert,
    /// Fetch the server-relative audio artifact and play it.
    PlayAudio { path: String },
    SetRefreshTimer { running: bool },
    /// User-visible notice, the terminal counterpart of an alert box.
    Notify { msg: String },
    Render,
    Shutdown,
}
