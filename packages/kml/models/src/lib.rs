#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory KML document tree.
//!
//! Covers the subset of KML 2.2 the generator emits: a `Document` holding
//! shared `Style`/`StyleMap` definitions followed by `Folder`s of
//! `Placemark`s with `Point` or `LineString` geometry.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// KML 2.2 namespace URI.
pub const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";

/// Built-in "map note" icon.
pub const MAP_NOTE_ICON: &str = "http://www.earthpoint.us/Dots/GoogleEarth/pal3/icon62.png";

/// Icon used when a note icon cannot be applied or resolved.
pub const MAP_NOTE_FALLBACK_ICON: &str = "https://maps.google.com/mapfiles/kml/pal3/icon54.png";

/// Built-in "red x" icon.
pub const RED_X_ICON: &str = "http://maps.google.com/mapfiles/kml/pal3/icon56.png";

/// Stroke width applied to every colored path.
pub const LINE_WIDTH: f64 = 3.0;

/// Balloon template that shows only the placemark name.
pub const BALLOON_NAME_TEMPLATE: &str = "$[name]";

/// A lon/lat pair in WGS84 degrees. Always longitude first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Longitude in degrees.
    pub lon: f64,
    /// Latitude in degrees.
    pub lat: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// A KML color: eight hex digits in `aabbggrr` channel order.
///
/// Displays as lowercase hex (`ff0000ff`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KmlColor(u32);

impl KmlColor {
    /// Fully opaque white.
    pub const OPAQUE_WHITE: Self = Self(0xffff_ffff);

    /// Fully transparent white, used to hide labels.
    pub const TRANSPARENT_WHITE: Self = Self(0x00ff_ffff);

    /// Parses exactly eight hex digits (either case). Anything else is
    /// rejected, including signs and surrounding whitespace.
    #[must_use]
    pub fn parse_hex(s: &str) -> Option<Self> {
        if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(s, 16).ok().map(Self)
    }
}

impl fmt::Display for KmlColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

/// Color names accepted in `IconColor` / `LineStringColor` cells.
///
/// The KML values are the literal table used by the seed workbooks, not a
/// conversion of the RGB names.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum NamedColor {
    Red,
    Blue,
    Yellow,
    Purple,
    Green,
    Orange,
    White,
    Black,
}

impl NamedColor {
    #[must_use]
    pub const fn kml_color(self) -> KmlColor {
        KmlColor(match self {
            Self::Red => 0xff00_00ff,
            Self::Blue => 0xffff_0000,
            Self::Yellow => 0xff00_ffff,
            Self::Purple => 0xff80_0080,
            Self::Green => 0xff00_ff00,
            Self::Orange => 0xff00_8cff,
            Self::White => 0xffff_ffff,
            Self::Black => 0xff00_0000,
        })
    }
}

/// Whether a point's label is shown at rest or only under the pointer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LabelVisibility {
    #[default]
    AlwaysVisible,
    HoverReveal,
}

impl LabelVisibility {
    #[must_use]
    pub const fn is_hidden_by_default(self) -> bool {
        matches!(self, Self::HoverReveal)
    }
}

/// `<IconStyle>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IconStyle {
    pub color: Option<KmlColor>,
    pub href: Option<String>,
}

/// `<LabelStyle>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelStyle {
    pub color: Option<KmlColor>,
    pub scale: f64,
}

/// `<LineStyle>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    pub color: KmlColor,
    pub width: f64,
}

/// `<BalloonStyle>`. The text is written as CDATA.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalloonStyle {
    pub text: String,
}

/// `<Style>`, either inline in a placemark (no id) or shared at document
/// level (with id).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub id: Option<String>,
    pub icon: Option<IconStyle>,
    pub label: Option<LabelStyle>,
    pub line: Option<LineStyle>,
    pub balloon: Option<BalloonStyle>,
}

impl Style {
    /// Icon href carried by this style, trimmed, if non-empty.
    #[must_use]
    pub fn icon_href(&self) -> Option<&str> {
        self.icon
            .as_ref()
            .and_then(|icon| icon.href.as_deref())
            .map(str::trim)
            .filter(|href| !href.is_empty())
    }
}

/// Interaction state key inside a `<StyleMap>` pair.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StyleState {
    Normal,
    Highlight,
}

/// One `<Pair>` of a `<StyleMap>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StylePair {
    pub key: StyleState,
    /// Reference to a shared style, including the leading `#`.
    pub style_url: String,
}

/// `<StyleMap>`: maps interaction states to shared styles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleMap {
    pub id: String,
    pub pairs: Vec<StylePair>,
}

/// A document-level style definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StyleSelector {
    Style(Style),
    StyleMap(StyleMap),
}

impl StyleSelector {
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Style(style) => style.id.as_deref(),
            Self::StyleMap(map) => Some(&map.id),
        }
    }
}

/// Placemark geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Point(Coordinate),
    LineString(Vec<Coordinate>),
}

/// `<Placemark>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placemark {
    pub name: Option<String>,
    pub description: Option<String>,
    pub geometry: Geometry,
    /// Inline style. Removed when the placemark is bound to a style map.
    pub style: Option<Style>,
    /// Reference to a shared style or style map, including the leading `#`.
    pub style_url: Option<String>,
    /// Not rendered to KML. Read by the hover post-processor to choose the
    /// at-rest label style.
    pub label_visibility: LabelVisibility,
}

impl Placemark {
    /// A point placemark with no style.
    #[must_use]
    pub const fn point(coordinate: Coordinate) -> Self {
        Self {
            name: None,
            description: None,
            geometry: Geometry::Point(coordinate),
            style: None,
            style_url: None,
            label_visibility: LabelVisibility::AlwaysVisible,
        }
    }

    /// A line string placemark with no style.
    #[must_use]
    pub const fn line_string(coordinates: Vec<Coordinate>) -> Self {
        Self {
            name: None,
            description: None,
            geometry: Geometry::LineString(coordinates),
            style: None,
            style_url: None,
            label_visibility: LabelVisibility::AlwaysVisible,
        }
    }

    /// Icon href from the inline style, if any.
    #[must_use]
    pub fn inline_icon_href(&self) -> Option<&str> {
        self.style.as_ref().and_then(Style::icon_href)
    }
}

/// `<Folder>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub name: String,
    pub placemarks: Vec<Placemark>,
}

impl Folder {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            placemarks: Vec::new(),
        }
    }

    /// Matches the folder name after trimming, ignoring ASCII case.
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name.trim())
    }
}

/// `<Document>`. Shared styles are always written before the folders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub name: Option<String>,
    pub styles: Vec<StyleSelector>,
    pub folders: Vec<Folder>,
}

impl Document {
    /// First folder whose name matches, ignoring case and surrounding
    /// whitespace.
    #[must_use]
    pub fn folder(&self, name: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.is_named(name))
    }

    /// Looks up a shared `<Style>` by id (without `#`).
    #[must_use]
    pub fn style(&self, id: &str) -> Option<&Style> {
        self.styles.iter().find_map(|selector| match selector {
            StyleSelector::Style(style) if style.id.as_deref() == Some(id) => Some(style),
            _ => None,
        })
    }
}
