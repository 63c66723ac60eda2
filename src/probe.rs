use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{debug, warn};
use serde::Deserialize;

use crate::error::ProbeError;
use crate::options::Resolution;

/// What the probe could find out about a source file. `None` means unknown.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProbeResult {
    pub resolution: Option<Resolution>,
    pub frame_rate: Option<f64>,
    pub duration: Option<f64>,
}

#[derive(Deserialize, Debug)]
struct FFProbeJsonOutput {
    #[serde(default)]
    streams: Vec<FFProbeJsonStream>,
}

#[derive(Deserialize, Debug)]
struct FFProbeJsonStream {
    width: Option<u32>,
    height: Option<u32>,
}

pub struct MediaProbe {
    tool: PathBuf,
}

impl MediaProbe {
    pub fn new(tool: impl Into<PathBuf>) -> Self {
        MediaProbe { tool: tool.into() }
    }

    /// Runs each query separately; one failing never hides the others.
    pub fn probe(&self, path: &Path) -> ProbeResult {
        ProbeResult {
            resolution: self.probe_resolution(path).map_err(|e| warn!("resolution unavailable: {e}")).ok(),
            frame_rate: self.probe_frame_rate(path).map_err(|e| warn!("frame rate unavailable: {e}")).ok(),
            duration: self.probe_duration(path).map_err(|e| warn!("duration unavailable: {e}")).ok(),
        }
    }

    pub fn probe_resolution(&self, path: &Path) -> Result<Resolution, ProbeError> {
        let output = self.run(&["-select_streams", "v:0", "-show_entries", "stream=width,height", "-of", "json"], path)?;
        parse_resolution(&output)
    }

    pub fn probe_frame_rate(&self, path: &Path) -> Result<f64, ProbeError> {
        let output = self.run(&[
            "-select_streams", "v:0",
            "-show_entries", "stream=r_frame_rate",
            "-of", "default=noprint_wrappers=1:nokey=1",
        ], path)?;
        parse_frame_rate(&output)
    }

    pub fn probe_duration(&self, path: &Path) -> Result<f64, ProbeError> {
        let output = self.run(&["-show_entries", "format=duration", "-of", "default=noprint_wrappers=1:nokey=1"], path)?;
        parse_duration(&output)
    }

    fn run(&self, args: &[&str], path: &Path) -> Result<String, ProbeError> {
        debug!("{:?} -v error {} {:?}", self.tool, args.join(" "), path);
        let output = Command::new(&self.tool)
            .args(["-v", "error"])
            .args(args)
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ProbeError::Launch { tool: self.tool.clone(), source })?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(ProbeError::Unsuccessful { tool: self.tool.clone(), path: path.to_path_buf() })
        }
    }
}

fn parse_resolution(output: &str) -> Result<Resolution, ProbeError> {
    let deserialized = serde_json::from_str::<FFProbeJsonOutput>(output)?;
    match deserialized.streams.first() {
        Some(FFProbeJsonStream { width: Some(width), height: Some(height) }) if *width > 0 && *height > 0 => {
            Ok(Resolution::new(*width, *height))
        },
        _ => Err(ProbeError::Unparseable(String::from(output.trim()))),
    }
}

/// Reduces `num/den` to a real; a zero denominator means the numerator alone.
fn parse_frame_rate(output: &str) -> Result<f64, ProbeError> {
    let line = first_line(output);
    let unparseable = || ProbeError::Unparseable(String::from(line));
    let (num, den) = match line.split_once('/') {
        Some((num, den)) => (num, den),
        None => (line, "1"),
    };
    let num = num.trim().parse::<f64>().map_err(|_| unparseable())?;
    let den = den.trim().parse::<f64>().map_err(|_| unparseable())?;
    let rate = if den == 0.0 { num } else { num / den };
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(unparseable())
    }
}

fn parse_duration(output: &str) -> Result<f64, ProbeError> {
    let line = first_line(output);
    match line.parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds > 0.0 => Ok(seconds),
        _ => Err(ProbeError::Unparseable(String::from(line))),
    }
}

fn first_line(output: &str) -> &str {
    output.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("25/1\n").unwrap(), 25.0);
        assert!((parse_frame_rate("24000/1001").unwrap() - 23.976).abs() < 0.001);
        assert_eq!(parse_frame_rate("30/0").unwrap(), 30.0);
        assert_eq!(parse_frame_rate("60").unwrap(), 60.0);
        assert!(parse_frame_rate("0/0").is_err());
        assert!(parse_frame_rate("N/A").is_err());
        assert!(parse_frame_rate("").is_err());
    }

    #[test]
    fn test_parse_resolution() {
        let json = r#"{"programs": [], "streams": [{"width": 1920, "height": 1080}]}"#;
        assert_eq!(parse_resolution(json).unwrap(), Resolution::new(1920, 1080));
        assert!(parse_resolution(r#"{"streams": []}"#).is_err());
        assert!(parse_resolution(r#"{}"#).is_err());
        assert!(parse_resolution("garbage").is_err());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("10.000000\n").unwrap(), 10.0);
        assert!(parse_duration("N/A").is_err());
        assert!(parse_duration("0").is_err());
    }

    #[test]
    fn test_missing_probe_binary() {
        let probe = MediaProbe::new("/nonexistent/ffprobe");
        assert_eq!(probe.probe(Path::new("clip.mp4")), ProbeResult::default());
    }

    #[cfg(unix)]
    #[test]
    fn test_queries_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let tool = crate::testutil::fake_tool(dir.path(), "ffprobe", r#"
case "$*" in
  *stream=width,height*) exit 1 ;;
  *r_frame_rate*) echo "30000/1001" ;;
  *format=duration*) echo "12.5" ;;
esac"#);
        let result = MediaProbe::new(tool).probe(Path::new("clip.mp4"));
        assert_eq!(result.resolution, None);
        assert!((result.frame_rate.unwrap() - 29.97).abs() < 0.001);
        assert_eq!(result.duration, Some(12.5));
    }

    #[cfg(unix)]
    #[test]
    fn test_probe_reads_json_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let tool = crate::testutil::fake_tool(dir.path(), "ffprobe", r#"
case "$*" in
  *stream=width,height*) echo '{"streams": [{"width": 1080, "height": 1920}]}' ;;
  *) exit 1 ;;
esac"#);
        let result = MediaProbe::new(tool).probe(Path::new("clip.mp4"));
        assert_eq!(result.resolution, Some(Resolution::new(1080, 1920)));
        assert_eq!(result.frame_rate, None);
        assert_eq!(result.duration, None);
    }
}
