pub mod codecs;
pub mod command;
pub mod config;
pub mod error;
pub mod fstools;
pub mod job_state;
pub mod options;
pub mod output_path;
pub mod probe;
pub mod progress;
pub mod request;
pub mod transcoder;
#[cfg(all(test, unix))]
mod testutil;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use env_logger::Env;
use human_repr::{HumanCount, HumanDuration};
use kdam::{term, tqdm, BarExt};
use log::{info, warn};
use rustop::opts;

use codecs::CodecProfile;
use config::ToolPaths;
use error::ValidationError;
use fstools::file_size;
use options::{AspectClass, FrameRate, SizeSelection, FRAME_RATE_CHOICES};
use probe::{MediaProbe, ProbeResult};
use progress::Eta;
use request::{ConversionRequest, DestinationPolicy};
use transcoder::{JobController, JobEvent, JobHandle};

/// Bar resolution; progress fractions are scaled to this many steps.
const BAR_STEPS: usize = 1000;

fn main() -> ExitCode {
    let (args, _rest) = opts! {
        synopsis "Convert a video into an edit-friendly QuickTime file using ffmpeg";
        opt dest:Option<String>, desc:"Destination folder.";
        opt beside:bool=false, desc:"Write the result next to the input file.";
        opt fps:String=String::from("Original"), desc:"Frame rate. [Original, 23.976, 24, 29.97, 30, 60]";
        opt aspect:String=String::from("original"), desc:"Resolution class. [original, horizontal, vertical, square]";
        opt preset:usize=0, desc:"Resolution preset within the class. [0, 1, 2]";
        opt codec:String=String::from("prores"), desc:"Codec profile. [prores, dnxhd, cineform]";
        opt log:bool=false, desc:"Write the encoder output to a .log file beside the result.";
        opt probe:bool=false, desc:"Print what ffprobe reports about the input and exit.";
        opt ffmpeg:Option<String>, desc:"ffmpeg binary to use.";
        opt ffprobe:Option<String>, desc:"ffprobe binary to use.";
        opt verbose:bool=false, desc:"Log job details.";
        param infile:Option<String>, desc:"Input video file";
    }.parse_or_exit();

    let default_filter = if args.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    let mut tools = ToolPaths::discover();
    if let Some(ffmpeg) = args.ffmpeg {
        tools = tools.with_encoder(PathBuf::from(ffmpeg));
    }
    if let Some(ffprobe) = args.ffprobe {
        tools = tools.with_probe(PathBuf::from(ffprobe));
    }

    let choices = Choices {
        infile: args.infile.as_deref(),
        dest: args.dest.as_deref(),
        beside: args.beside,
        fps: &args.fps,
        aspect: &args.aspect,
        preset: args.preset,
        codec: &args.codec,
        log_file: args.log,
    };
    let request = match build_request(&choices) {
        Ok(request) => request,
        Err(err) => {
            println!("{err}");
            return ExitCode::FAILURE;
        },
    };

    if let Some(input) = &request.input {
        let probed = MediaProbe::new(&tools.probe).probe(input);
        if args.probe {
            print_probe(input, &probed);
            return ExitCode::SUCCESS;
        }
        warn_about_originals(&request, &probed);
    }

    let stop = Arc::new(AtomicBool::new(false));
    for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        if let Err(err) = signal_hook::flag::register(signal, Arc::clone(&stop)) {
            warn!("unable to install handler for signal {signal}: {err}");
        }
    }

    let controller = JobController::new(tools);
    let handle = match controller.start(&request) {
        Ok(handle) => handle,
        Err(err) => {
            println!("{err}");
            return ExitCode::FAILURE;
        },
    };

    info!("ffmpeg {}", handle.command);
    info!("source duration {}", seconds(handle.duration).human_duration());

    match report(&controller, &handle, &stop) {
        JobEvent::Succeeded { output } => {
            let size = file_size(&output).unwrap_or(0);
            println!("Conversion complete: {} ({})", output.display(), size.human_count_bytes());
            ExitCode::SUCCESS
        },
        JobEvent::Failed { code } => {
            match code {
                Some(code) => println!("Conversion failed: ffmpeg exited with {code}."),
                None => println!("Conversion failed: ffmpeg did not exit normally."),
            }
            ExitCode::FAILURE
        },
        _ => {
            println!("Conversion stopped.");
            ExitCode::FAILURE
        },
    }
}

fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::MAX)
}

/// Raw option values as typed on the command line.
struct Choices<'a> {
    infile: Option<&'a str>,
    dest: Option<&'a str>,
    beside: bool,
    fps: &'a str,
    aspect: &'a str,
    preset: usize,
    codec: &'a str,
    log_file: bool,
}

fn build_request(choices: &Choices) -> Result<ConversionRequest, ValidationError> {
    let size = if choices.aspect.eq_ignore_ascii_case("original") {
        SizeSelection::Original
    } else {
        SizeSelection::with_aspect(choices.aspect.parse::<AspectClass>()?).select_preset(choices.preset)?
    };
    let destination_policy = if choices.beside { DestinationPolicy::BesideSource } else { DestinationPolicy::SeparateFolder };
    Ok(ConversionRequest {
        input: choices.infile.map(PathBuf::from),
        destination: choices.dest.map(PathBuf::from),
        destination_policy,
        frame_rate: FrameRate::parse(choices.fps)?,
        size,
        codec: choices.codec.parse::<CodecProfile>()?,
        log_file: choices.log_file,
    })
}

fn print_probe(input: &Path, probed: &ProbeResult) {
    fn or_unknown<T: ToString>(value: Option<T>) -> String {
        value.map(|v| v.to_string()).unwrap_or_else(|| String::from("unknown"))
    }

    println!("{}", input.display());
    println!("  resolution: {}", or_unknown(probed.resolution));
    println!("  frame rate: {}", or_unknown(probed.frame_rate.map(|r| format!("{r:.3}"))));
    println!("  duration:   {}", or_unknown(probed.duration.map(|d| seconds(d).human_duration())));
    println!("  frame rates offered: {}", FRAME_RATE_CHOICES.join(", "));
    let codecs: Vec<String> = CodecProfile::ALL.iter().map(|c| c.to_string()).collect();
    println!("  codecs offered: {}", codecs.join(", "));
}

fn warn_about_originals(request: &ConversionRequest, probed: &ProbeResult) {
    if request.frame_rate == FrameRate::Original && probed.frame_rate.is_none() {
        warn!("could not read the source frame rate; \"Original\" is left to ffmpeg");
    }
    if request.size == SizeSelection::Original && probed.resolution.is_none() {
        warn!("could not read the source resolution; \"Original\" is left to ffmpeg");
    }
}

/// Draws progress until the job reaches a terminal event, cancelling on Ctrl-C.
fn report(controller: &JobController, handle: &JobHandle, stop: &AtomicBool) -> JobEvent {
    term::init(false);
    let mut pbar = tqdm!(
        total = BAR_STEPS,
        desc = format!("converting {}", handle.output.file_name().map(|n| n.to_string_lossy()).unwrap_or_default()),
        position = 0,
        force_refresh = true
    );
    let mut cancel_sent = false;

    let terminal = loop {
        if !cancel_sent && stop.load(Ordering::Relaxed) {
            info!("interrupt received; cancelling");
            if controller.cancel() {
                pbar.set_postfix("stopping");
            }
            cancel_sent = true;
        }

        match handle.events.recv_timeout(Duration::from_millis(100)) {
            Ok(event) if event.is_terminal() => break event,
            Ok(JobEvent::Progress(sample)) => {
                let position = seconds(sample.elapsed).human_duration();
                pbar.set_postfix(match sample.eta {
                    Eta::Calculating => format!("at {position}, eta calculating"),
                    Eta::Remaining(eta) => format!("at {position}, eta {}", eta.human_duration()),
                });
                let _ = pbar.update_to((sample.fraction * BAR_STEPS as f64) as usize);
            },
            Ok(_) => continue,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break JobEvent::Failed { code: None },
        }
    };

    eprintln!();
    terminal
}
