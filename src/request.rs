use std::path::PathBuf;

use crate::codecs::CodecProfile;
use crate::error::ValidationError;
use crate::fstools::{classify_file, DirEntryCategory};
use crate::options::{FrameRate, Resolution, SizeSelection};

/// Where the converted file goes when no destination folder is given.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DestinationPolicy {
    #[default]
    SeparateFolder,
    BesideSource,
}

/// Raw user choices, exactly as collected by the front end.
#[derive(Clone, Debug, Default)]
pub struct ConversionRequest {
    pub input: Option<PathBuf>,
    pub destination: Option<PathBuf>,
    pub destination_policy: DestinationPolicy,
    pub frame_rate: FrameRate,
    pub size: SizeSelection,
    pub codec: CodecProfile,
    pub log_file: bool,
}

/// A validated request. Nothing in here changes once resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct JobSpec {
    pub input: PathBuf,
    pub destination: PathBuf,
    pub frame_rate: FrameRate,
    pub resolution: Option<Resolution>,
    pub codec: CodecProfile,
    pub log_file: bool,
}

fn non_empty(path: &Option<PathBuf>) -> Option<&PathBuf> {
    path.as_ref().filter(|p| !p.as_os_str().is_empty())
}

pub fn resolve(request: &ConversionRequest) -> Result<JobSpec, ValidationError> {
    let input = non_empty(&request.input).ok_or(ValidationError::MissingInput)?;
    match classify_file(input) {
        DirEntryCategory::RegularFile => (),
        DirEntryCategory::DoesNotExist => return Err(ValidationError::InputNotFound(input.clone())),
        _ => return Err(ValidationError::InputNotAFile(input.clone())),
    }

    let destination = match (non_empty(&request.destination), request.destination_policy) {
        (Some(dest), _) => dest.clone(),
        (None, DestinationPolicy::BesideSource) => match input.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        },
        (None, DestinationPolicy::SeparateFolder) => return Err(ValidationError::MissingDestination),
    };
    if classify_file(&destination) != DirEntryCategory::Directory {
        return Err(ValidationError::DestinationNotADirectory(destination));
    }

    if let FrameRate::Explicit(rate) = &request.frame_rate {
        // re-check: a request may be built without going through FrameRate::parse
        FrameRate::parse(rate)?;
    }

    Ok(JobSpec {
        input: input.clone(),
        destination,
        frame_rate: request.frame_rate.clone(),
        resolution: request.size.resolution(),
        codec: request.codec,
        log_file: request.log_file,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::AspectClass;
    use std::fs;

    fn request_in(dir: &tempfile::TempDir) -> ConversionRequest {
        let input = dir.path().join("clip.mp4");
        fs::write(&input, b"video").unwrap();
        ConversionRequest {
            input: Some(input),
            destination: Some(dir.path().to_path_buf()),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_input() {
        let request = ConversionRequest::default();
        assert!(matches!(resolve(&request), Err(ValidationError::MissingInput)));
        let request = ConversionRequest { input: Some(PathBuf::new()), ..Default::default() };
        assert!(matches!(resolve(&request), Err(ValidationError::MissingInput)));
    }

    #[test]
    fn test_missing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let request = ConversionRequest { destination: None, ..request_in(&dir) };
        assert!(matches!(resolve(&request), Err(ValidationError::MissingDestination)));
    }

    #[test]
    fn test_beside_source() {
        let dir = tempfile::tempdir().unwrap();
        let request = ConversionRequest {
            destination: None,
            destination_policy: DestinationPolicy::BesideSource,
            ..request_in(&dir)
        };
        assert_eq!(resolve(&request).unwrap().destination, dir.path());
    }

    #[test]
    fn test_input_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let request = ConversionRequest {
            input: Some(dir.path().join("gone.mp4")),
            ..request_in(&dir)
        };
        assert!(matches!(resolve(&request), Err(ValidationError::InputNotFound(_))));
    }

    #[test]
    fn test_destination_must_be_directory() {
        let dir = tempfile::tempdir().unwrap();
        let request = request_in(&dir);
        let request = ConversionRequest { destination: request.input.clone(), ..request };
        assert!(matches!(resolve(&request), Err(ValidationError::DestinationNotADirectory(_))));
    }

    #[test]
    fn test_rejects_bad_explicit_rate() {
        let dir = tempfile::tempdir().unwrap();
        let request = ConversionRequest {
            frame_rate: FrameRate::Explicit(String::from("abc")),
            ..request_in(&dir)
        };
        assert!(matches!(resolve(&request), Err(ValidationError::InvalidFrameRate(_))));
    }

    #[test]
    fn test_resolves_size_and_codec() {
        let dir = tempfile::tempdir().unwrap();
        let request = ConversionRequest {
            size: SizeSelection::with_aspect(AspectClass::Square),
            codec: CodecProfile::DNxHD,
            log_file: true,
            ..request_in(&dir)
        };
        let spec = resolve(&request).unwrap();
        assert_eq!(spec.resolution, Some(Resolution::new(1080, 1080)));
        assert_eq!(spec.codec, CodecProfile::DNxHD);
        assert_eq!(spec.frame_rate, FrameRate::Original);
        assert!(spec.log_file);
    }
}
