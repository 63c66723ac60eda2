use std::ffi::{OsStr, OsString};
use std::fmt::Display;
use std::path::Path;

use crate::options::FrameRate;
use crate::request::JobSpec;

/// The full argument vector for one encoder run, minus the binary itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodeCommand {
    args: Vec<OsString>,
}

impl EncodeCommand {
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    pub fn output(&self) -> Option<&OsStr> {
        self.args.last().map(OsString::as_os_str)
    }
}

impl Display for EncodeCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.args.iter().map(|a| format!("{:?}", a)).collect();
        write!(f, "{}", parts.join(" "))
    }
}

pub fn build(spec: &JobSpec, target: &Path) -> EncodeCommand {
    fn os(s: &str) -> OsString { OsString::from(s) }

    let mut args = vec![
        os("-y"),
        os("-i"), spec.input.clone().into_os_string(),
    ];

    args.extend(spec.codec.parameters().into_iter().map(OsString::from));

    if let FrameRate::Explicit(rate) = &spec.frame_rate {
        args.push(os("-r"));
        args.push(os(rate));
    }

    if let Some(resolution) = spec.resolution {
        args.push(os("-s"));
        args.push(OsString::from(resolution.to_string()));
    }

    args.push(target.as_os_str().to_os_string());
    EncodeCommand { args }
}
