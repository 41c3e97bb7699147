//! Active-section tracking for navigation highlighting.
//!
//! [`SectionObserver`] reproduces intersection observation over a
//! viewport shrunk by a [`RootMargin`]. Sections report only when their
//! intersecting state changes; every intersecting report overwrites the
//! active section, so the last one in a batch wins.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{config::ScrollConfig, Result, ShowcaseError};

/// Section that is active before any intersection is reported.
pub const INITIAL_SECTION: &str = "home";

/// One side of a root margin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Length {
    Px(f32),
    Percent(f32),
}

impl Length {
    /// Absolute size against `reference` pixels.
    pub fn resolve(self, reference: f32) -> f32 {
        match self {
            Length::Px(value) => value,
            Length::Percent(value) => reference * value / 100.0,
        }
    }
}

impl FromStr for Length {
    type Err = ShowcaseError;

    fn from_str(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if let Some(number) = raw.strip_suffix("px") {
            parse_margin_number(number, raw).map(Length::Px)
        } else if let Some(number) = raw.strip_suffix('%') {
            parse_margin_number(number, raw).map(Length::Percent)
        } else if raw == "0" {
            Ok(Length::Px(0.0))
        } else {
            Err(ShowcaseError::msg(format!(
                "root margin `{raw}` must be in px or %"
            )))
        }
    }
}

fn parse_margin_number(number: &str, raw: &str) -> Result<f32> {
    let value: f32 = number
        .parse()
        .map_err(|_| ShowcaseError::msg(format!("root margin `{raw}` is not a number")))?;
    if !value.is_finite() {
        return Err(ShowcaseError::InvalidInput("root margin must be finite"));
    }
    Ok(value)
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Length::Px(value) => write!(f, "{value}px"),
            Length::Percent(value) => write!(f, "{value}%"),
        }
    }
}

/// Grows (positive) or shrinks (negative) the viewport before
/// intersection testing. Parsed from the CSS margin shorthand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RootMargin {
    pub top: Length,
    pub right: Length,
    pub bottom: Length,
    pub left: Length,
}

impl Default for RootMargin {
    fn default() -> Self {
        Self {
            top: Length::Px(0.0),
            right: Length::Px(0.0),
            bottom: Length::Px(0.0),
            left: Length::Px(0.0),
        }
    }
}

impl RootMargin {
    /// Applies the margin to `root`. Vertical percentages resolve against
    /// the root height and horizontal ones against its width.
    pub fn apply(&self, root: Rect) -> Rect {
        let top = self.top.resolve(root.height);
        let bottom = self.bottom.resolve(root.height);
        let left = self.left.resolve(root.width);
        let right = self.right.resolve(root.width);
        Rect::new(
            root.x - left,
            root.y - top,
            root.width + left + right,
            root.height + top + bottom,
        )
    }
}

impl FromStr for RootMargin {
    type Err = ShowcaseError;

    fn from_str(raw: &str) -> Result<Self> {
        let parts = raw
            .split_whitespace()
            .map(Length::from_str)
            .collect::<Result<Vec<_>>>()?;

        let (top, right, bottom, left) = match parts.as_slice() {
            [all] => (*all, *all, *all, *all),
            [vertical, horizontal] => (*vertical, *horizontal, *vertical, *horizontal),
            [top, horizontal, bottom] => (*top, *horizontal, *bottom, *horizontal),
            [top, right, bottom, left] => (*top, *right, *bottom, *left),
            _ => {
                return Err(ShowcaseError::InvalidInput(
                    "root margin takes one to four values",
                ))
            }
        };
        Ok(Self {
            top,
            right,
            bottom,
            left,
        })
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.top, self.right, self.bottom, self.left)
    }
}

/// Axis-aligned rectangle in document pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Overlap with `other`. Edge-adjacent rectangles yield a zero-area
    /// overlap; disjoint ones yield `None`.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if left > right || top > bottom {
            return None;
        }
        Some(Rect::new(left, top, right - left, bottom - top))
    }
}

/// Visible window onto the document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub scroll_x: f32,
    pub scroll_y: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }

    pub fn scrolled_to(mut self, scroll_y: f32) -> Self {
        self.scroll_y = scroll_y;
        self
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.scroll_x, self.scroll_y, self.width, self.height)
    }
}

/// A watched section and its layout box in document coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionBounds {
    pub id: String,
    pub rect: Rect,
}

impl SectionBounds {
    pub fn new(id: impl Into<String>, rect: Rect) -> Self {
        Self {
            id: id.into(),
            rect,
        }
    }
}

/// Change report for one watched section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntersectionEntry {
    pub id: String,
    pub is_intersecting: bool,
    pub intersection_ratio: f32,
}

#[derive(Debug, Clone)]
struct Target {
    bounds: SectionBounds,
    /// `None` until the first update after observation.
    intersecting: Option<bool>,
}

/// Reports which section dominates the viewport.
#[derive(Debug, Clone)]
pub struct SectionObserver {
    threshold: f32,
    margin: RootMargin,
    targets: Vec<Target>,
    connected: bool,
    active: String,
    entries: Vec<IntersectionEntry>,
}

impl SectionObserver {
    pub fn new(threshold: f32, margin: RootMargin) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
            margin,
            targets: Vec::new(),
            connected: false,
            active: INITIAL_SECTION.to_string(),
            entries: Vec::new(),
        }
    }

    pub fn from_config(config: &ScrollConfig) -> Result<Self> {
        let margin = config.root_margin.parse()?;
        Ok(Self::new(config.threshold, margin))
    }

    pub fn with_initial_section(mut self, id: impl Into<String>) -> Self {
        self.active = id.into();
        self
    }

    pub fn active_section(&self) -> &str {
        &self.active
    }

    pub fn root_margin(&self) -> RootMargin {
        self.margin
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn observed(&self) -> impl Iterator<Item = &str> {
        self.targets.iter().map(|target| target.bounds.id.as_str())
    }

    /// Entries reported by the most recent [`update`](Self::update).
    pub fn last_entries(&self) -> &[IntersectionEntry] {
        &self.entries
    }

    /// Replaces the watched set. The previous observation is disconnected
    /// first so no stale state carries over.
    pub fn observe(&mut self, sections: impl IntoIterator<Item = SectionBounds>) {
        self.disconnect();
        self.targets = sections
            .into_iter()
            .map(|bounds| Target {
                bounds,
                intersecting: None,
            })
            .collect();
        self.connected = !self.targets.is_empty();
        tracing::debug!(sections = self.targets.len(), "observing sections");
    }

    /// Moves a watched section after a layout change. Returns false if the
    /// section is not observed.
    pub fn set_bounds(&mut self, id: &str, rect: Rect) -> bool {
        match self.targets.iter_mut().find(|target| target.bounds.id == id) {
            Some(target) => {
                target.bounds.rect = rect;
                true
            }
            None => false,
        }
    }

    /// Tests every watched section against `viewport` and reports the
    /// ones whose intersecting state changed, in observation order. Returns
    /// the section written as active by this batch, if any.
    pub fn update(&mut self, viewport: &Viewport) -> Option<String> {
        self.entries.clear();
        if !self.connected {
            return None;
        }

        let root = self.margin.apply(viewport.rect());
        let mut written = None;
        for target in &mut self.targets {
            let (is_intersecting, ratio) = intersect(&target.bounds.rect, &root, self.threshold);
            if target.intersecting == Some(is_intersecting) {
                continue;
            }
            target.intersecting = Some(is_intersecting);
            self.entries.push(IntersectionEntry {
                id: target.bounds.id.clone(),
                is_intersecting,
                intersection_ratio: ratio,
            });
            if is_intersecting {
                written = Some(target.bounds.id.clone());
            }
        }

        if let Some(id) = &written {
            if *id != self.active {
                tracing::debug!(section = %id, "active section changed");
            }
            self.active = id.clone();
        }
        written
    }

    /// Stops observation. Safe to call repeatedly.
    pub fn disconnect(&mut self) {
        if self.connected {
            tracing::debug!("section observer disconnected");
        }
        self.targets.clear();
        self.entries.clear();
        self.connected = false;
    }
}

impl Drop for SectionObserver {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn intersect(target: &Rect, root: &Rect, threshold: f32) -> (bool, f32) {
    let Some(overlap) = target.intersection(root) else {
        return (false, 0.0);
    };
    let area = target.area();
    let ratio = if area <= f32::EPSILON {
        1.0
    } else {
        overlap.area() / area
    };
    let is_intersecting = if threshold <= 0.0 {
        true
    } else {
        ratio >= threshold
    };
    (is_intersecting, ratio)
}

/// Vertical scroll direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    Up,
    #[default]
    Down,
}

/// Derives the scroll direction from successive offsets.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScrollTracker {
    last_y: f32,
    direction: ScrollDirection,
}

impl ScrollTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn direction(&self) -> ScrollDirection {
        self.direction
    }

    /// Anything other than a strictly larger offset counts as upward.
    pub fn record(&mut self, scroll_y: f32) -> ScrollDirection {
        self.direction = if scroll_y > self.last_y {
            ScrollDirection::Down
        } else {
            ScrollDirection::Up
        };
        self.last_y = scroll_y;
        self.direction
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accent {
    Purple,
    Cyan,
    Pink,
}

/// Navigation metadata for a page section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionMeta {
    pub id: String,
    pub title: String,
    pub accent: Accent,
    pub nav_label: String,
}

impl SectionMeta {
    pub fn new(id: &str, title: &str, accent: Accent, nav_label: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            accent,
            nav_label: nav_label.to_string(),
        }
    }

    pub fn default_sections() -> Vec<SectionMeta> {
        vec![
            SectionMeta::new("home", "Home", Accent::Cyan, "Home"),
            SectionMeta::new("projects", "Projects", Accent::Pink, "Projects"),
            SectionMeta::new("blogs", "Writing", Accent::Cyan, "Writing"),
            SectionMeta::new("album", "Album", Accent::Pink, "Album"),
            SectionMeta::new("contact", "Contact", Accent::Purple, "Contact"),
        ]
    }
}
