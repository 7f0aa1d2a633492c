//! Engine worker thread and the request loop it runs.

use super::protocol::{MoveRequest, Request, Response};
use crate::core::Move;
use crate::engine::{EngineFacade, Primitives};
use crate::error::{EngineError, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, unbounded};
use log::{debug, error, info, warn};
use std::any::Any;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Controlling-side handle to a worker thread hosting one engine.
///
/// Dropping the handle closes the worker's inbox, cancels a running analysis
/// and joins the thread.
pub struct Worker {
    requests: Option<Sender<Request>>,
    responses: Receiver<Response>,
    thread: Option<JoinHandle<()>>,
}

impl Worker {
    /// Start the worker. `load` runs on the new thread and builds the engine
    /// there; the first response is `Ready`, or a single `Error` if loading
    /// failed.
    pub fn spawn<P, L>(load: L) -> Result<Worker>
    where
        P: Primitives + 'static,
        L: FnOnce() -> Result<EngineFacade<P>> + Send + 'static,
    {
        let (request_tx, request_rx) = unbounded();
        let (response_tx, response_rx) = unbounded();

        let thread = thread::Builder::new()
            .name("engine-worker".to_string())
            .spawn(move || run(load, request_rx, response_tx))
            .map_err(|e| EngineError::EngineInternal(format!("failed to spawn worker: {e}")))?;

        Ok(Worker {
            requests: Some(request_tx),
            responses: response_rx,
            thread: Some(thread),
        })
    }

    pub fn send(&self, request: Request) -> Result<()> {
        let requests = self.requests.as_ref().ok_or(EngineError::WorkerUnavailable)?;
        requests
            .send(request)
            .map_err(|_| EngineError::WorkerUnavailable)
    }

    /// Next response, blocking until one arrives
    pub fn recv(&self) -> Result<Response> {
        self.responses
            .recv()
            .map_err(|_| EngineError::WorkerUnavailable)
    }

    /// Next response, or `None` if none arrived within `timeout`
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<Response>> {
        match self.responses.recv_timeout(timeout) {
            Ok(response) => Ok(Some(response)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(EngineError::WorkerUnavailable),
        }
    }

    /// Raw response channel, for `select!` or iteration
    pub fn responses(&self) -> &Receiver<Response> {
        &self.responses
    }

    /// Close the inbox. The worker finishes what it already received and
    /// exits; responses stay readable until then.
    pub fn close(&mut self) {
        self.requests.take();
    }

    /// Close the inbox and wait for the thread to exit.
    pub fn join(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.close();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("engine worker thread panicked");
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run<P, L>(load: L, inbox: Receiver<Request>, outbox: Sender<Response>)
where
    P: Primitives,
    L: FnOnce() -> Result<EngineFacade<P>>,
{
    debug!("engine worker loading");
    let facade = match panic::catch_unwind(AssertUnwindSafe(load)) {
        Ok(Ok(facade)) => facade,
        Ok(Err(e)) => {
            error!("engine failed to load: {e}");
            drop(inbox);
            let _ = outbox.send(Response::Error(e.to_string()));
            return;
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!("engine panicked while loading: {message}");
            drop(inbox);
            let _ = outbox.send(Response::Error(message));
            return;
        }
    };

    facade.init_play_engine();
    let bridge = Bridge {
        facade,
        inbox,
        outbox,
        deferred: RefCell::new(VecDeque::new()),
    };
    bridge.reply(Response::Ready);
    info!("engine worker ready");
    bridge.serve();
    info!("engine worker stopped");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Worker-side state: the engine and both channel ends
struct Bridge<P: Primitives> {
    facade: EngineFacade<P>,
    inbox: Receiver<Request>,
    outbox: Sender<Response>,
    /// Requests that arrived during an analysis, handled once it returns
    deferred: RefCell<VecDeque<Request>>,
}

impl<P: Primitives> Bridge<P> {
    fn serve(&self) {
        loop {
            let next = self.deferred.borrow_mut().pop_front();
            let request = match next {
                Some(request) => request,
                None => match self.inbox.recv() {
                    Ok(request) => request,
                    Err(_) => break,
                },
            };
            self.dispatch(request);
        }
    }

    fn reply(&self, response: Response) {
        if self.outbox.send(response).is_err() {
            debug!("controller hung up, response dropped");
        }
    }

    fn dispatch(&self, request: Request) {
        let kind = request.kind();
        debug!("handling {kind}");
        match panic::catch_unwind(AssertUnwindSafe(|| self.handle(request))) {
            Ok(Ok(Some(response))) => self.reply(response),
            Ok(Ok(None)) => {}
            Ok(Err(e)) => {
                warn!("{kind} failed: {e}");
                self.reply(Response::Error(e.to_string()));
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!("{kind} panicked: {message}");
                self.reply(Response::Error(format!("{kind} panicked: {message}")));
            }
        }
    }

    /// Run one request to completion. Analysis streams its own responses and
    /// yields `None`.
    fn handle(&self, request: Request) -> Result<Option<Response>> {
        let facade = &self.facade;
        let response = match request {
            Request::Set(fen) => {
                facade.set_board(&fen)?;
                Response::Set(fen)
            }
            Request::Move(mv) => {
                let mv = self.resolve(mv)?;
                facade.make_move(mv)?;
                Response::Move(mv)
            }
            Request::Search(time_ms) => Response::Search(facade.best_move(time_ms)),
            Request::InitPlay => {
                facade.init_play_engine();
                Response::InitPlay
            }
            Request::StartAnalysis => {
                self.analyse()?;
                return Ok(None);
            }
            Request::StopAnalysis => {
                facade.stop_analysis()?;
                Response::StopAnalysis
            }
            Request::Undo => {
                facade.undo_move()?;
                Response::Undo
            }
            Request::Board => Response::Board(facade.board_fen()),
            Request::LegalMoves => Response::LegalMoves(facade.legal_moves()?),
            Request::Status => Response::Status(facade.status()?),
            Request::Figurine(mv) => Response::Figurine(facade.figurine(mv)),
        };
        Ok(Some(response))
    }

    fn resolve(&self, mv: MoveRequest) -> Result<Move> {
        match mv {
            MoveRequest::Bits(mv) => Ok(mv),
            MoveRequest::Text(text) => self
                .facade
                .move_from_str(&text)?
                .ok_or_else(|| EngineError::IllegalMove(format!("no legal move {text:?}"))),
        }
    }

    fn analyse(&self) -> Result<()> {
        self.facade.start_analysis(|snapshot| {
            self.reply(Response::Analysis(snapshot));
            self.poll_inbox();
        })
    }

    /// Inbox check from inside the analysis callback. Stop requests act at
    /// once, a nested start hits the single-flight guard, and the rest wait.
    fn poll_inbox(&self) {
        loop {
            match self.inbox.try_recv() {
                Ok(Request::StopAnalysis) => match self.facade.stop_analysis() {
                    Ok(()) => self.reply(Response::StopAnalysis),
                    Err(e) => self.reply(Response::Error(e.to_string())),
                },
                Ok(Request::StartAnalysis) => {
                    if let Err(e) = self.facade.start_analysis(|_| {}) {
                        self.reply(Response::Error(e.to_string()));
                    }
                }
                Ok(request) => {
                    debug!("deferring {} until analysis ends", request.kind());
                    self.deferred.borrow_mut().push_back(request);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    info!("controller hung up, stopping analysis");
                    if let Err(e) = self.facade.stop_analysis() {
                        warn!("failed to stop analysis: {e}");
                    }
                    break;
                }
            }
        }
    }
}
