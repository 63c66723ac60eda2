use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};

use crate::command::{self, EncodeCommand};
use crate::config::ToolPaths;
use crate::error::StartError;
use crate::fstools::remove_artifact;
use crate::job_state::JobState;
use crate::output_path::allocate;
use crate::probe::MediaProbe;
use crate::progress::{DiagnosticLines, ProgressSample, ProgressTracker};
use crate::request::{resolve, ConversionRequest};

/// Diagnostic lines kept around to explain a failed encode.
const TAIL_LINES: usize = 8;
/// How often to look for the exit status once the encoder closed stderr.
const EXIT_POLL: Duration = Duration::from_millis(20);

#[derive(Clone, Debug, PartialEq)]
pub enum JobEvent {
    Progress(ProgressSample),
    Succeeded { output: PathBuf },
    Failed { code: Option<i32> },
    Cancelled,
}

impl JobEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobEvent::Progress(_))
    }
}

/// What the caller gets back from a successful start.
pub struct JobHandle {
    pub output: PathBuf,
    pub command: EncodeCommand,
    pub duration: f64,
    pub events: Receiver<JobEvent>,
}

struct JobSlot {
    state: JobState,
    child: Option<Child>,
}

/// Runs at most one encoder process at a time.
///
/// All state changes go through the single `JobSlot` lock: `start` and
/// `cancel` from the caller's side, and the supervisor thread when the
/// encoder exits. The child is reaped only while that lock is held, so a
/// cancel can never signal a process that is already gone.
pub struct JobController {
    tools: ToolPaths,
    slot: Arc<Mutex<JobSlot>>,
}

impl JobController {
    pub fn new(tools: ToolPaths) -> Self {
        JobController {
            tools,
            slot: Arc::new(Mutex::new(JobSlot {
                state: JobState::Idle,
                child: None,
            })),
        }
    }

    pub fn state(&self) -> JobState {
        lock(&self.slot).state
    }

    pub fn start(&self, request: &ConversionRequest) -> Result<JobHandle, StartError> {
        let mut slot = lock(&self.slot);
        if slot.state.is_active() {
            return Err(StartError::Busy);
        }

        let spec = resolve(request)?;
        let output = allocate(&spec.input, &spec.destination, spec.codec.extension());
        let command = command::build(&spec, &output);
        debug_assert_eq!(command.output(), Some(output.as_os_str()));

        let tracker = ProgressTracker::new(
            MediaProbe::new(&self.tools.probe)
                .probe_duration(&spec.input)
                .map_err(|e| warn!("duration unavailable, progress will be approximate: {e}"))
                .ok(),
        );
        let duration = tracker.duration();

        info!("converting {:?} -> {:?} ({})", spec.input, output, spec.codec);
        debug!("{:?} {}", self.tools.encoder, command);

        let mut encoder = Command::new(&self.tools.encoder);
        encoder
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            // keep terminal Ctrl-C away from the encoder; stopping goes through cancel()
            use std::os::unix::process::CommandExt;
            encoder.process_group(0);
        }
        let mut child = encoder
            .spawn()
            .map_err(|source| StartError::Launch { encoder: self.tools.encoder.clone(), source })?;

        let stderr = child.stderr.take();
        let log = if spec.log_file { open_log(&output) } else { None };

        slot.state = JobState::Running;
        slot.child = Some(child);
        drop(slot);

        let (tx, rx) = mpsc::channel();
        let shared = Arc::clone(&self.slot);
        let target = output.clone();
        thread::spawn(move || supervise(&shared, target, stderr, tracker, log, tx));

        Ok(JobHandle { output, command, duration, events: rx })
    }

    /// Asks a running encoder to stop. Returns false when there was nothing to cancel.
    pub fn cancel(&self) -> bool {
        let mut slot = lock(&self.slot);
        if slot.state != JobState::Running {
            return false;
        }
        slot.state = JobState::Cancelling;
        if let Some(child) = slot.child.as_mut() {
            info!("stopping encoder ({})", child.id());
            terminate(child);
        }
        true
    }
}

fn lock(slot: &Mutex<JobSlot>) -> MutexGuard<'_, JobSlot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

fn open_log(output: &Path) -> Option<File> {
    let path = output.with_extension("log");
    match File::create(&path) {
        Ok(file) => {
            info!("writing encoder log to {:?}", path);
            Some(file)
        },
        Err(err) => {
            warn!("unable to create log file {:?}: {}", path, err);
            None
        },
    }
}

#[cfg(unix)]
fn terminate(child: &mut Child) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    if let Err(err) = kill(Pid::from_raw(child.id() as i32), Signal::SIGTERM) {
        warn!("SIGTERM failed ({err}); killing encoder ({})", child.id());
        let _ = child.kill();
    }
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) {
    if let Err(err) = child.kill() {
        warn!("error stopping encoder process ({}) {err:?}", child.id());
    }
}

fn supervise(
    slot: &Mutex<JobSlot>,
    output: PathBuf,
    stderr: Option<ChildStderr>,
    mut tracker: ProgressTracker,
    mut log: Option<File>,
    tx: Sender<JobEvent>,
) {
    let mut tail: VecDeque<String> = VecDeque::with_capacity(TAIL_LINES);

    if let Some(stderr) = stderr {
        for line in DiagnosticLines::new(BufReader::new(stderr)) {
            let log_failed = match log.as_mut() {
                Some(file) => writeln!(file, "{line}").is_err(),
                None => false,
            };
            if log_failed {
                warn!("encoder log write failed; no further lines will be logged");
                log = None;
            }

            if let Some(sample) = tracker.observe_line(&line) {
                let _ = tx.send(JobEvent::Progress(sample));
            } else {
                if tail.len() == TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
        }
    }

    let (mut slot, status) = wait_for_exit(slot);
    let cancelled = slot.state == JobState::Cancelling;

    match status {
        Some(status) if status.success() && !cancelled => {
            let _ = tx.send(JobEvent::Progress(ProgressSample::complete(tracker.duration())));
            slot.state = JobState::Succeeded;
            info!("conversion complete: {:?}", output);
            let _ = tx.send(JobEvent::Succeeded { output });
        },
        _ if cancelled => {
            remove_artifact(&output);
            slot.state = JobState::Idle;
            info!("conversion cancelled");
            let _ = tx.send(JobEvent::Cancelled);
        },
        status => {
            remove_artifact(&output);
            let code = status.and_then(|s| s.code());
            warn!("encoder exited with {:?}", code);
            for line in &tail {
                warn!("  {line}");
            }
            slot.state = JobState::Failed;
            let _ = tx.send(JobEvent::Failed { code });
        },
    }
}

/// Reaps the encoder and hands back the slot still locked.
fn wait_for_exit(slot: &Mutex<JobSlot>) -> (MutexGuard<'_, JobSlot>, Option<ExitStatus>) {
    loop {
        let mut guard = lock(slot);
        let status = match guard.child.as_mut() {
            None => Some(None),
            Some(child) => match child.try_wait() {
                Ok(Some(status)) => Some(Some(status)),
                Ok(None) => None,
                Err(err) => {
                    warn!("error waiting for encoder: {err}");
                    Some(None)
                },
            },
        };
        if let Some(status) = status {
            guard.child = None;
            return (guard, status);
        }
        drop(guard);
        thread::sleep(EXIT_POLL);
    }
}
