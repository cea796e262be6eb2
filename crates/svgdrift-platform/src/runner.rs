use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use svgdrift_core::{AnimationExecutor, Container, Engine, EngineState, EngineStats};
use tracing::{info, warn};

use crate::Result;

pub enum RunnerCommand {
    Start,
    Stop,
    /// Stop and remove every live particle at once
    Clear,
    Status(Sender<RunnerStatus>),
    /// Stop spawning, let live particles expire, then exit
    Shutdown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunnerStatus {
    pub state: EngineState,
    pub active: usize,
    pub stats: EngineStats,
    /// Engine clock
    pub elapsed: Duration,
    pub fault: Option<String>,
}

/// Owns an [`Engine`] on its own thread and maps wall-clock time onto
/// the engine timeline.
pub struct Runner<C: Container + 'static, A: AnimationExecutor + 'static> {
    command_sender: Sender<RunnerCommand>,
    handle: JoinHandle<Engine<C, A>>,
}

impl<C: Container + 'static, A: AnimationExecutor + 'static> Runner<C, A> {
    pub fn spawn(engine: Engine<C, A>) -> Result<Self> {
        let (command_sender, command_receiver) =
            crossbeam_channel::unbounded::<RunnerCommand>();
        let handle = std::thread::Builder::new()
            .name("svgdrift-runner".into())
            .spawn(move || run_engine(engine, command_receiver))?;
        Ok(Self {
            command_sender,
            handle,
        })
    }

    pub fn start(&self) -> Result<()> {
        self.send(RunnerCommand::Start)
    }

    pub fn stop(&self) -> Result<()> {
        self.send(RunnerCommand::Stop)
    }

    pub fn clear(&self) -> Result<()> {
        self.send(RunnerCommand::Clear)
    }

    pub fn status(&self) -> Result<RunnerStatus> {
        let (reply_sender, reply_receiver) = crossbeam_channel::bounded(1);
        self.send(RunnerCommand::Status(reply_sender))?;
        Ok(reply_receiver.recv()?)
    }

    /// Waits until every live particle has been removed and hands the
    /// engine back.
    pub fn shutdown(self) -> Result<Engine<C, A>> {
        self.send(RunnerCommand::Shutdown)?;
        self.handle
            .join()
            .map_err(|_| "svgdrift runner thread panicked".into())
    }

    fn send(&self, command: RunnerCommand) -> Result<()> {
        self.command_sender
            .send(command)
            .map_err(|_| "svgdrift runner thread has exited".into())
    }
}

fn run_engine<C: Container, A: AnimationExecutor>(
    mut engine: Engine<C, A>,
    commands: Receiver<RunnerCommand>,
) -> Engine<C, A> {
    let origin = Instant::now();
    let mut draining = false;
    let mut disconnected = false;

    loop {
        if let Err(err) = engine.advance_to(origin.elapsed()) {
            warn!("runner: engine fault: {err}");
        }
        if draining && engine.is_idle() {
            break;
        }

        let wait = engine
            .next_deadline()
            .map(|deadline| deadline.saturating_sub(origin.elapsed()));

        if disconnected {
            // Nobody can send Shutdown any more; finish what is live
            match wait {
                Some(wait) => std::thread::sleep(wait),
                None => break,
            }
            continue;
        }

        let command = match wait {
            Some(wait) => match commands.recv_timeout(wait) {
                Ok(command) => Some(command),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => {
                    disconnected = true;
                    None
                }
            },
            None => match commands.recv() {
                Ok(command) => Some(command),
                Err(_) => {
                    disconnected = true;
                    None
                }
            },
        };
        if disconnected {
            warn!("runner: command channel closed, stopping engine");
            engine.stop();
            continue;
        }

        match command {
            Some(RunnerCommand::Start) => {
                if let Err(err) = engine.start() {
                    warn!("runner: cannot start engine: {err}");
                }
            }
            Some(RunnerCommand::Stop) => engine.stop(),
            Some(RunnerCommand::Clear) => engine.stop_and_clear(),
            Some(RunnerCommand::Status(reply)) => {
                let _ = reply.send(RunnerStatus {
                    state: engine.state(),
                    active: engine.active_count(),
                    stats: engine.stats(),
                    elapsed: engine.now(),
                    fault: engine.fault().map(str::to_owned),
                });
            }
            Some(RunnerCommand::Shutdown) => {
                info!(
                    "runner: shutdown requested, draining {} particle(s)",
                    engine.active_count()
                );
                engine.stop();
                draining = true;
            }
            None => {}
        }
    }

    info!("runner: exiting after {:?}", origin.elapsed());
    engine
}
