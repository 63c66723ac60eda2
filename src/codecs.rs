use std::fmt::Display;
use std::str::FromStr;

use crate::error::ValidationError;

/// Intermediate codec families the converter can produce.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CodecProfile {
    #[default]
    ProRes,
    DNxHD,
    Cineform,
}

/// Fixed encoder settings for one codec profile.
#[derive(Debug, PartialEq, Eq)]
pub struct ProfileSettings {
    pub video: &'static [&'static str],
    pub pixel_format: Option<&'static str>,
    pub audio_codec: &'static str,
    pub extension: &'static str,
}

const PRORES: ProfileSettings = ProfileSettings {
    video: &["-c:v", "prores_ks", "-profile:v", "3"],
    pixel_format: Some("yuv422p10le"),
    audio_codec: "pcm_s16le",
    extension: "mov",
};

const DNXHD: ProfileSettings = ProfileSettings {
    video: &["-c:v", "dnxhd", "-b:v", "36M"],
    pixel_format: Some("yuv422p"),
    audio_codec: "pcm_s16le",
    extension: "mov",
};

const CINEFORM: ProfileSettings = ProfileSettings {
    video: &["-c:v", "cfhd", "-qscale:v", "3"],
    pixel_format: None,
    audio_codec: "pcm_s16le",
    extension: "mov",
};

impl CodecProfile {
    pub const ALL: [CodecProfile; 3] = [CodecProfile::ProRes, CodecProfile::DNxHD, CodecProfile::Cineform];

    pub fn settings(self) -> &'static ProfileSettings {
        match self {
            CodecProfile::ProRes => &PRORES,
            CodecProfile::DNxHD => &DNXHD,
            CodecProfile::Cineform => &CINEFORM,
        }
    }

    pub fn extension(self) -> &'static str {
        self.settings().extension
    }

    /// Encoder arguments for this profile: video codec, pixel format, audio codec.
    pub fn parameters(self) -> Vec<String> {
        let settings = self.settings();
        let mut params: Vec<String> = settings.video.iter().map(|s| String::from(*s)).collect();
        if let Some(pix_fmt) = settings.pixel_format {
            params.push(String::from("-pix_fmt"));
            params.push(String::from(pix_fmt));
        }
        params.push(String::from("-c:a"));
        params.push(String::from(settings.audio_codec));
        params
    }
}

impl FromStr for CodecProfile {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "prores" => Ok(CodecProfile::ProRes),
            "dnxhd" => Ok(CodecProfile::DNxHD),
            "cineform" | "cfhd" => Ok(CodecProfile::Cineform),
            _ => Err(ValidationError::UnknownCodec(String::from(s))),
        }
    }
}

impl Display for CodecProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecProfile::ProRes => write!(f, "ProRes"),
            CodecProfile::DNxHD => write!(f, "DNxHD"),
            CodecProfile::Cineform => write!(f, "Cineform"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!("ProRes".parse::<CodecProfile>().unwrap(), CodecProfile::ProRes);
        assert_eq!("dnxhd".parse::<CodecProfile>().unwrap(), CodecProfile::DNxHD);
        assert_eq!("CINEFORM".parse::<CodecProfile>().unwrap(), CodecProfile::Cineform);
        assert!("h264".parse::<CodecProfile>().is_err());
    }

    #[test]
    fn test_prores_parameters() {
        assert_eq!(CodecProfile::ProRes.parameters(), vec![
            "-c:v", "prores_ks", "-profile:v", "3",
            "-pix_fmt", "yuv422p10le",
            "-c:a", "pcm_s16le",
        ]);
    }

    #[test]
    fn test_cineform_has_no_pixel_format() {
        let params = CodecProfile::Cineform.parameters();
        assert!(!params.contains(&String::from("-pix_fmt")));
        assert_eq!(params.last().unwrap(), "pcm_s16le");
    }

    #[test]
    fn test_every_profile_writes_quicktime() {
        for profile in CodecProfile::ALL {
            assert_eq!(profile.extension(), "mov");
        }
    }
}
