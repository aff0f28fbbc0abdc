use std::{sync::Arc, time::Duration};

use time::OffsetDateTime;
use tokio::{
    select,
    sync::{
        broadcast::{self, error::RecvError},
        mpsc, oneshot, watch,
    },
    task::{JoinError, JoinHandle, JoinSet},
};
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::{
    api::{ApiError, CtfBackend, SubmissionReceipt},
    models::CtfId,
    session::{Role, SessionEvent, SessionStore},
    status::{AvailabilityPolicy, DerivedStatus},
    utils::{formatting::format_utc, Clock},
};

use super::{
    fetch::{fetch_board_data, fetch_ctf},
    timers::{TimerEvent, ViewTimers},
    BoardData, BoardEntry, BoardQuery, CtfBoard, RefreshTicket,
};

const COMMAND_QUEUE_SIZE: usize = 32;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardSettings {
    pub policy: AvailabilityPolicy,
    pub clock_tick: Duration,
    pub poll_interval: Duration,
    pub auto_refresh: bool,
    pub query: BoardQuery,
}

/// What the board looks like after the latest change.
#[derive(Clone, Debug)]
pub struct BoardSnapshot {
    pub now: OffsetDateTime,
    pub entries: Vec<BoardEntry>,
    pub total: usize,
    pub loaded: bool,
    pub refreshing: bool,
    pub auto_refresh: bool,
    pub applied_generation: u64,
    pub last_error: Option<String>,
    pub signed_out: bool,
}

#[derive(thiserror::Error, Debug)]
pub enum ActionError {
    #[error("CTF {0} is not on the board")]
    UnknownCtf(CtfId),
    #[error("CTF {0} has already been joined")]
    AlreadyJoined(CtfId),
    #[error("CTF {id} cannot be joined while it is {status}")]
    JoinNotAllowed { id: CtfId, status: DerivedStatus },
    #[error("Join CTF {0} before submitting flags")]
    NotJoined(CtfId),
    #[error("Flags for CTF {id} cannot be submitted while it is {status}")]
    SubmissionNotAllowed { id: CtfId, status: DerivedStatus },
    #[error("The flag is empty")]
    EmptyFlag,
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("The board view has been closed")]
    ViewClosed,
}

enum BoardCommand {
    Refresh {
        respond_to: oneshot::Sender<u64>,
    },
    SetQuery {
        query: BoardQuery,
        respond_to: oneshot::Sender<u64>,
    },
    SetAutoRefresh {
        enabled: bool,
        respond_to: oneshot::Sender<()>,
    },
    Snapshot {
        respond_to: oneshot::Sender<Arc<BoardSnapshot>>,
    },
    Open {
        id: CtfId,
        respond_to: oneshot::Sender<Result<BoardEntry, ActionError>>,
    },
    Join {
        id: CtfId,
        respond_to: oneshot::Sender<Result<(), ActionError>>,
    },
    SubmitFlag {
        id: CtfId,
        flag: String,
        respond_to: oneshot::Sender<Result<SubmissionReceipt, ActionError>>,
    },
}

/// Talks to a running board view.
#[derive(Clone)]
pub struct BoardHandle {
    commands: mpsc::Sender<BoardCommand>,
}

impl BoardHandle {
    async fn call<R>(
        &self,
        command: impl FnOnce(oneshot::Sender<R>) -> BoardCommand,
    ) -> Result<R, ActionError> {
        let (respond_to, response) = oneshot::channel();

        self.commands
            .send(command(respond_to))
            .await
            .map_err(|_| ActionError::ViewClosed)?;

        response.await.map_err(|_| ActionError::ViewClosed)
    }

    /// Starts a refresh and returns its generation.
    pub async fn refresh(&self) -> Result<u64, ActionError> {
        self.call(|respond_to| BoardCommand::Refresh { respond_to })
            .await
    }

    /// Changes the filters and refetches. Returns the generation of the refetch.
    pub async fn set_query(&self, query: BoardQuery) -> Result<u64, ActionError> {
        self.call(|respond_to| BoardCommand::SetQuery { query, respond_to })
            .await
    }

    pub async fn set_auto_refresh(&self, enabled: bool) -> Result<(), ActionError> {
        self.call(|respond_to| BoardCommand::SetAutoRefresh {
            enabled,
            respond_to,
        })
        .await
    }

    pub async fn snapshot(&self) -> Result<Arc<BoardSnapshot>, ActionError> {
        self.call(|respond_to| BoardCommand::Snapshot { respond_to })
            .await
    }

    /// Fetches a CTF afresh, e.g. when a member continues into it.
    pub async fn open(&self, id: CtfId) -> Result<BoardEntry, ActionError> {
        self.call(|respond_to| BoardCommand::Open { id, respond_to })
            .await?
    }

    pub async fn join(&self, id: CtfId) -> Result<(), ActionError> {
        self.call(|respond_to| BoardCommand::Join { id, respond_to })
            .await?
    }

    pub async fn submit_flag(
        &self,
        id: CtfId,
        flag: String,
    ) -> Result<SubmissionReceipt, ActionError> {
        self.call(|respond_to| BoardCommand::SubmitFlag {
            id,
            flag,
            respond_to,
        })
        .await?
    }
}

/// A running CTF board. Owns the view task, and with it the view's timers and
/// in-flight fetches; all of them stop when the view is deactivated or dropped.
pub struct BoardView {
    handle: BoardHandle,
    snapshots: watch::Receiver<Arc<BoardSnapshot>>,
    task: Option<JoinHandle<()>>,
}

impl BoardView {
    pub fn activate(
        settings: BoardSettings,
        backend: Arc<dyn CtfBackend>,
        clock: Arc<dyn Clock>,
        session: &SessionStore,
    ) -> BoardView {
        let (command_sender, command_receiver) = mpsc::channel(COMMAND_QUEUE_SIZE);

        let board = CtfBoard::new(settings.policy, settings.query, clock.now());
        let timers = ViewTimers::start(
            settings.clock_tick,
            settings.poll_interval,
            settings.auto_refresh,
        );

        let task = BoardTask {
            board,
            backend,
            clock,
            timers,
            fetches: JoinSet::new(),
            last_error: None,
            signed_out: false,
            snapshots: watch::channel(Arc::new(empty_snapshot())).0,
        };
        task.snapshots.send_replace(Arc::new(task.snapshot()));
        let snapshots = task.snapshots.subscribe();

        let session_events = session.subscribe();
        let task = tokio::spawn(
            task.run(command_receiver, session_events)
                .instrument(info_span!("board_view")),
        );

        BoardView {
            handle: BoardHandle {
                commands: command_sender,
            },
            snapshots,
            task: Some(task),
        }
    }

    pub fn handle(&self) -> BoardHandle {
        self.handle.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<BoardSnapshot>> {
        self.snapshots.clone()
    }

    pub async fn deactivate(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            match task.await {
                Err(err) if err.is_panic() => error!("Board view panicked: {err}"),
                _ => {}
            }
        }

        info!("Board view deactivated");
    }
}

impl Drop for BoardView {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

type RefreshResult = (RefreshTicket, Result<BoardData, ApiError>);

struct BoardTask {
    board: CtfBoard,
    backend: Arc<dyn CtfBackend>,
    clock: Arc<dyn Clock>,
    timers: ViewTimers,
    fetches: JoinSet<RefreshResult>,
    last_error: Option<String>,
    signed_out: bool,
    snapshots: watch::Sender<Arc<BoardSnapshot>>,
}

fn empty_snapshot() -> BoardSnapshot {
    BoardSnapshot {
        now: OffsetDateTime::UNIX_EPOCH,
        entries: Vec::new(),
        total: 0,
        loaded: false,
        refreshing: false,
        auto_refresh: false,
        applied_generation: 0,
        last_error: None,
        signed_out: false,
    }
}

impl BoardTask {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<BoardCommand>,
        mut session_events: broadcast::Receiver<SessionEvent>,
    ) {
        info!("Board view activated at {} UTC", format_utc(self.board.now()));

        self.start_refresh();
        self.publish();

        loop {
            select! {
                event = self.timers.next() => match event {
                    TimerEvent::ClockTick => {
                        self.board.set_now(self.clock.now());
                        debug!("Clock tick, reclassifying {} CTFs", self.board.total());
                        self.publish();
                    }
                    TimerEvent::Poll => {
                        self.start_refresh();
                        self.publish();
                    }
                },

                Some(result) = self.fetches.join_next(), if !self.fetches.is_empty() => {
                    self.finish_refresh(result);
                    self.publish();
                }

                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => {
                        info!("All board handles are gone");
                        break;
                    }
                },

                event = session_events.recv() => match event {
                    Ok(SessionEvent::SignedOut(Role::Student)) => {
                        warn!("Student session ended, closing the board");
                        self.signed_out = true;
                        self.publish();
                        break;
                    }
                    Ok(SessionEvent::SignedOut(Role::Admin)) => {}
                    Err(RecvError::Lagged(count)) => {
                        warn!("Missed {count} session events");
                    }
                    Err(RecvError::Closed) => {
                        info!("Session store is gone, closing the board");
                        break;
                    }
                },
            }
        }
    }

    fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            now: self.board.now(),
            entries: self.board.entries(),
            total: self.board.total(),
            loaded: self.board.is_loaded(),
            refreshing: !self.fetches.is_empty(),
            auto_refresh: self.timers.auto_refresh(),
            applied_generation: self.board.applied_generation(),
            last_error: self.last_error.clone(),
            signed_out: self.signed_out,
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(Arc::new(self.snapshot()));
    }

    fn start_refresh(&mut self) -> u64 {
        let ticket = self.board.begin_refresh();
        let generation = ticket.generation;
        let backend = self.backend.clone();

        debug!("Starting refresh {generation}");

        self.fetches.spawn(
            async move {
                let result = fetch_board_data(backend.as_ref(), &ticket.query).await;
                (ticket, result)
            }
            .instrument(info_span!("refresh", generation)),
        );

        generation
    }

    fn finish_refresh(&mut self, result: Result<RefreshResult, JoinError>) {
        match result {
            Ok((ticket, Ok(data))) => {
                if self.board.apply_refresh(&ticket, data) {
                    self.last_error = None;
                } else {
                    debug!("Discarding stale refresh {}", ticket.generation);
                }
            }

            Ok((ticket, Err(ApiError::Unauthorized))) => {
                // The client already expired the session; the sign-out event closes the view.
                warn!("Refresh {} was rejected as unauthorized", ticket.generation);
            }

            Ok((ticket, Err(err))) => {
                if self.board.is_current(&ticket) {
                    warn!("Could not load CTFs: {err}");
                    self.last_error = Some(format!("Failed to load CTFs: {err}"));
                } else {
                    debug!("Ignoring failure of stale refresh {}: {err}", ticket.generation);
                }
            }

            Err(err) => error!("Refresh task failed: {err}"),
        }
    }

    async fn handle_command(&mut self, command: BoardCommand) {
        use BoardCommand::*;

        match command {
            Refresh { respond_to } => {
                let generation = self.start_refresh();
                self.publish();
                let _ = respond_to.send(generation);
            }

            SetQuery { query, respond_to } => {
                info!("Board query changed to {query:?}");
                self.board.set_query(query);
                let generation = self.start_refresh();
                self.publish();
                let _ = respond_to.send(generation);
            }

            SetAutoRefresh {
                enabled,
                respond_to,
            } => {
                info!("Auto refresh {}", if enabled { "enabled" } else { "disabled" });
                self.timers.set_auto_refresh(enabled);
                self.publish();
                let _ = respond_to.send(());
            }

            Snapshot { respond_to } => {
                let _ = respond_to.send(Arc::new(self.snapshot()));
            }

            Open { id, respond_to } => {
                let _ = respond_to.send(self.open(&id).await);
            }

            Join { id, respond_to } => {
                let _ = respond_to.send(self.join(&id).await);
            }

            SubmitFlag {
                id,
                flag,
                respond_to,
            } => {
                let _ = respond_to.send(self.submit_flag(&id, &flag).await);
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn open(&mut self, id: &CtfId) -> Result<BoardEntry, ActionError> {
        let (ctf, joined) = fetch_ctf(self.backend.as_ref(), id).await?;

        if joined && !self.board.is_joined(id) {
            self.board.mark_joined(id);
            self.publish();
        }

        Ok(BoardEntry::evaluate(
            ctf,
            joined,
            self.board.now(),
            self.board.policy(),
        ))
    }

    #[tracing::instrument(skip(self))]
    async fn join(&mut self, id: &CtfId) -> Result<(), ActionError> {
        let entry = self
            .board
            .entry(id)
            .ok_or_else(|| ActionError::UnknownCtf(id.clone()))?;

        if entry.joined {
            return Err(ActionError::AlreadyJoined(id.clone()));
        }

        if !entry.affordances.can_join {
            return Err(ActionError::JoinNotAllowed {
                id: id.clone(),
                status: entry.availability.status,
            });
        }

        self.backend.join_ctf(id).await?;

        info!("Joined CTF {id}");
        self.board.mark_joined(id);
        self.publish();

        Ok(())
    }

    #[tracing::instrument(skip(self, flag))]
    async fn submit_flag(
        &mut self,
        id: &CtfId,
        flag: &str,
    ) -> Result<SubmissionReceipt, ActionError> {
        let entry = self
            .board
            .entry(id)
            .ok_or_else(|| ActionError::UnknownCtf(id.clone()))?;

        if !entry.joined {
            return Err(ActionError::NotJoined(id.clone()));
        }

        if !entry.affordances.can_submit_flag {
            return Err(ActionError::SubmissionNotAllowed {
                id: id.clone(),
                status: entry.availability.status,
            });
        }

        let flag = flag.trim();
        if flag.is_empty() {
            return Err(ActionError::EmptyFlag);
        }

        let receipt = self.backend.submit_flag(id, flag).await?;
        info!("Submitted a flag for CTF {id}");

        Ok(receipt)
    }
}
