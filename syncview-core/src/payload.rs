//! Per-name image storage and the display mode that selects from it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ViewError;

/// A decoded image with known pixel dimensions.
pub trait Bitmap {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
}

/// Slot an image is stored under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Version {
    A,
    B,
    /// The only version of a name, used for either slot.
    Both,
}

impl Version {
    /// Whether storing under `self` invalidates pending work on `other`.
    pub fn overlaps(&self, other: &Version) -> bool {
        self == other || *self == Version::Both || *other == Version::Both
    }
}

impl FromStr for Version {
    type Err = ViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "a" | "A" => Ok(Version::A),
            "b" | "B" => Ok(Version::B),
            "both" => Ok(Version::Both),
            other => Err(ViewError::UnknownVersion(other.to_string())),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::A => write!(f, "a"),
            Version::B => write!(f, "b"),
            Version::Both => write!(f, "both"),
        }
    }
}

/// Which version(s) every surface of a group shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    A,
    B,
    /// Version A on the left half, version B on the right half.
    Split,
}

impl FromStr for DisplayMode {
    type Err = ViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "a" | "A" => Ok(DisplayMode::A),
            "b" | "B" => Ok(DisplayMode::B),
            "split" | "both" => Ok(DisplayMode::Split),
            other => Err(ViewError::UnknownDisplayMode(other.to_string())),
        }
    }
}

/// Images stored for one name.
#[derive(Clone, Debug, PartialEq)]
pub enum ImagePayload<B> {
    /// One image serving every version.
    Single(B),
    /// Alternative versions; either may still be loading.
    Pair { a: Option<B>, b: Option<B> },
}

impl<B> ImagePayload<B> {
    pub fn new(version: Version, bitmap: B) -> Self {
        match version {
            Version::Both => ImagePayload::Single(bitmap),
            Version::A => ImagePayload::Pair {
                a: Some(bitmap),
                b: None,
            },
            Version::B => ImagePayload::Pair {
                a: None,
                b: Some(bitmap),
            },
        }
    }

    /// Store `bitmap` under `version`.
    ///
    /// A single image is replaced outright by a versioned one and vice versa,
    /// so a name never holds both kinds at once.
    pub fn set(&mut self, version: Version, bitmap: B) {
        match (self, version) {
            (ImagePayload::Pair { a, .. }, Version::A) => *a = Some(bitmap),
            (ImagePayload::Pair { b, .. }, Version::B) => *b = Some(bitmap),
            (payload, version) => *payload = ImagePayload::new(version, bitmap),
        }
    }

    /// The image for `version`, falling back to the single image.
    pub fn resolve(&self, version: Version) -> Option<&B> {
        match (self, version) {
            (ImagePayload::Single(bitmap), _) => Some(bitmap),
            (ImagePayload::Pair { a, .. }, Version::A) => a.as_ref(),
            (ImagePayload::Pair { b, .. }, Version::B) => b.as_ref(),
            (ImagePayload::Pair { .. }, Version::Both) => None,
        }
    }

    /// Both versions, when both are present.
    pub fn pair(&self) -> Option<(&B, &B)> {
        match self {
            ImagePayload::Pair {
                a: Some(a),
                b: Some(b),
            } => Some((a, b)),
            _ => None,
        }
    }

    /// Image used for sizing decisions: A, else the single image, else B.
    pub fn primary(&self) -> Option<&B> {
        match self {
            ImagePayload::Single(bitmap) => Some(bitmap),
            ImagePayload::Pair { a, b } => a.as_ref().or(b.as_ref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_parses_known_names() {
        assert_eq!("a".parse::<Version>().unwrap(), Version::A);
        assert_eq!("b".parse::<Version>().unwrap(), Version::B);
        assert_eq!("both".parse::<Version>().unwrap(), Version::Both);
        assert_eq!(
            "c".parse::<Version>(),
            Err(ViewError::UnknownVersion("c".to_string()))
        );
    }

    #[test]
    fn display_mode_accepts_both_as_split() {
        assert_eq!("split".parse::<DisplayMode>().unwrap(), DisplayMode::Split);
        assert_eq!("both".parse::<DisplayMode>().unwrap(), DisplayMode::Split);
        assert!("ab".parse::<DisplayMode>().is_err());
    }

    #[test]
    fn single_serves_every_version() {
        let payload = ImagePayload::new(Version::Both, "img");

        assert_eq!(payload.resolve(Version::A), Some(&"img"));
        assert_eq!(payload.resolve(Version::B), Some(&"img"));
        assert_eq!(payload.pair(), None);
    }

    #[test]
    fn pair_fills_slots_independently() {
        let mut payload = ImagePayload::new(Version::A, "left");
        assert_eq!(payload.resolve(Version::B), None);
        assert_eq!(payload.pair(), None);

        payload.set(Version::B, "right");
        assert_eq!(payload.pair(), Some((&"left", &"right")));
    }

    #[test]
    fn setting_single_replaces_pair() {
        let mut payload = ImagePayload::new(Version::A, "left");
        payload.set(Version::B, "right");
        payload.set(Version::Both, "only");

        assert_eq!(payload, ImagePayload::Single("only"));
    }

    #[test]
    fn setting_version_replaces_single() {
        let mut payload = ImagePayload::new(Version::Both, "only");
        payload.set(Version::B, "right");

        assert_eq!(
            payload,
            ImagePayload::Pair {
                a: None,
                b: Some("right")
            }
        );
        assert_eq!(payload.primary(), Some(&"right"));
    }

    #[test]
    fn overlapping_versions() {
        assert!(Version::Both.overlaps(&Version::A));
        assert!(Version::B.overlaps(&Version::Both));
        assert!(Version::A.overlaps(&Version::A));
        assert!(!Version::A.overlaps(&Version::B));
    }
}
