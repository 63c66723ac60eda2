use std::fmt::Display;
use std::str::FromStr;

use crate::error::ValidationError;

/// Frame rates offered to the user, in display order.
pub const FRAME_RATE_CHOICES: [&str; 6] = ["Original", "23.976", "24", "29.97", "30", "60"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Resolution { width, height }
    }
}

impl Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum FrameRate {
    #[default]
    Original,
    /// Keeps the text the user picked so the encoder sees exactly that string.
    Explicit(String),
}

impl FrameRate {
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("original") {
            return Ok(FrameRate::Original);
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() && value > 0.0 => Ok(FrameRate::Explicit(String::from(trimmed))),
            _ => Err(ValidationError::InvalidFrameRate(String::from(text))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AspectClass {
    Horizontal,
    Vertical,
    Square,
}

const HORIZONTAL_PRESETS: [Resolution; 3] = [
    Resolution::new(1920, 1080),
    Resolution::new(1280, 720),
    Resolution::new(3840, 2160),
];

const VERTICAL_PRESETS: [Resolution; 3] = [
    Resolution::new(1080, 1920),
    Resolution::new(720, 1280),
    Resolution::new(2160, 3840),
];

const SQUARE_PRESETS: [Resolution; 3] = [
    Resolution::new(1080, 1080),
    Resolution::new(720, 720),
    Resolution::new(2160, 2160),
];

impl AspectClass {
    pub fn presets(self) -> &'static [Resolution; 3] {
        match self {
            AspectClass::Horizontal => &HORIZONTAL_PRESETS,
            AspectClass::Vertical => &VERTICAL_PRESETS,
            AspectClass::Square => &SQUARE_PRESETS,
        }
    }
}

impl FromStr for AspectClass {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "horizontal" | "landscape" => Ok(AspectClass::Horizontal),
            "vertical" | "portrait" => Ok(AspectClass::Vertical),
            "square" => Ok(AspectClass::Square),
            _ => Err(ValidationError::UnknownAspect(String::from(s))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SizeSelection {
    #[default]
    Original,
    Preset { aspect: AspectClass, index: usize },
}

impl SizeSelection {
    /// Switching aspect class always lands on that class's first preset.
    pub fn with_aspect(aspect: AspectClass) -> Self {
        SizeSelection::Preset { aspect, index: 0 }
    }

    pub fn select_preset(self, index: usize) -> Result<Self, ValidationError> {
        match self {
            SizeSelection::Original => Ok(SizeSelection::Original),
            SizeSelection::Preset { aspect, .. } => {
                if index < aspect.presets().len() {
                    Ok(SizeSelection::Preset { aspect, index })
                } else {
                    Err(ValidationError::InvalidPreset(index))
                }
            },
        }
    }

    pub fn resolution(self) -> Option<Resolution> {
        match self {
            SizeSelection::Original => None,
            SizeSelection::Preset { aspect, index } => aspect.presets().get(index).copied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_rate_parse() {
        assert_eq!(FrameRate::parse("Original").unwrap(), FrameRate::Original);
        assert_eq!(FrameRate::parse("original").unwrap(), FrameRate::Original);
        assert_eq!(FrameRate::parse("29.97").unwrap(), FrameRate::Explicit(String::from("29.97")));
        assert_eq!(FrameRate::parse(" 24 ").unwrap(), FrameRate::Explicit(String::from("24")));
        assert!(FrameRate::parse("0").is_err());
        assert!(FrameRate::parse("-30").is_err());
        assert!(FrameRate::parse("fast").is_err());
        assert!(FrameRate::parse("inf").is_err());
    }

    #[test]
    fn test_frame_rate_choices_all_parse() {
        for choice in FRAME_RATE_CHOICES {
            assert!(FrameRate::parse(choice).is_ok(), "{choice}");
        }
    }

    #[test]
    fn test_aspect_resets_to_first_preset() {
        let size = SizeSelection::with_aspect(AspectClass::Horizontal).select_preset(2).unwrap();
        assert_eq!(size.resolution(), Some(Resolution::new(3840, 2160)));
        let size = SizeSelection::with_aspect(AspectClass::Vertical);
        assert_eq!(size.resolution(), Some(Resolution::new(1080, 1920)));
    }

    #[test]
    fn test_preset_out_of_range() {
        assert!(SizeSelection::with_aspect(AspectClass::Square).select_preset(3).is_err());
        assert_eq!(SizeSelection::Original.select_preset(5).unwrap(), SizeSelection::Original);
    }

    #[test]
    fn test_resolution_display() {
        assert_eq!(format!("{}", Resolution::new(720, 720)), "720x720");
    }
}
