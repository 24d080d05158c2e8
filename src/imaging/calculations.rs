//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FitError {
    #[error("fit must contain exactly 2 values, got {0}")]
    WrongArity(usize),
    #[error("fit values must be positive, got {0}")]
    NotPositive(String),
}

/// A bounding box as requested by the caller, before validation.
///
/// Validation is deferred to [`FitSpec::resolve`], which runs when the resize
/// job executes, so a malformed list is accepted at `resize()` time and only
/// rejected once the pipeline fires.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FitSpec {
    /// No constraint: keep the source size.
    #[default]
    Absent,
    /// Square bounding box.
    Square(u32),
    /// `[width, height]` bounding box. Any other length is invalid.
    List(Vec<u32>),
}

impl FitSpec {
    /// Normalize to a `(width, height)` box, `None` meaning unconstrained.
    pub fn resolve(&self) -> Result<Option<(u32, u32)>, FitError> {
        let (w, h) = match self {
            FitSpec::Absent => return Ok(None),
            FitSpec::Square(n) => (*n, *n),
            FitSpec::List(values) => match values.as_slice() {
                [w, h] => (*w, *h),
                other => return Err(FitError::WrongArity(other.len())),
            },
        };
        if w == 0 || h == 0 {
            return Err(FitError::NotPositive(self.to_string()));
        }
        Ok(Some((w, h)))
    }
}

impl From<u32> for FitSpec {
    fn from(n: u32) -> Self {
        FitSpec::Square(n)
    }
}

impl From<(u32, u32)> for FitSpec {
    fn from((w, h): (u32, u32)) -> Self {
        FitSpec::List(vec![w, h])
    }
}

impl From<[u32; 2]> for FitSpec {
    fn from([w, h]: [u32; 2]) -> Self {
        FitSpec::List(vec![w, h])
    }
}

impl From<Vec<u32>> for FitSpec {
    fn from(values: Vec<u32>) -> Self {
        FitSpec::List(values)
    }
}

impl<T: Into<FitSpec>> From<Option<T>> for FitSpec {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

impl fmt::Display for FitSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitSpec::Absent => f.write_str("none"),
            FitSpec::Square(n) => write!(f, "{n}"),
            FitSpec::List(values) => {
                let parts: Vec<String> = values.iter().map(u32::to_string).collect();
                f.write_str(&parts.join("x"))
            }
        }
    }
}

impl FromStr for FitSpec {
    type Err = String;

    /// Parses `none`, `800`, or `800x400`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("none") {
            return Ok(FitSpec::Absent);
        }
        let values = s
            .split(['x', 'X'])
            .map(|part| {
                part.trim()
                    .parse::<u32>()
                    .map_err(|_| format!("invalid fit '{s}': '{part}' is not an integer"))
            })
            .collect::<Result<Vec<u32>, String>>()?;
        match values.as_slice() {
            [n] => Ok(FitSpec::Square(*n)),
            _ => Ok(FitSpec::List(values)),
        }
    }
}

/// Calculate the size a source must be drawn at to fit inside a bounding box.
///
/// Aspect ratio is preserved and sources already inside the box are returned
/// unchanged (no upscaling). The binding dimension determines the scale;
/// each rounded side is clamped between 1 and its bound, so a very thin
/// source never rounds down to an empty side.
///
/// # Examples
/// ```
/// # use rastermill::imaging::{FitSpec, calculate_destination_size};
/// // Width binds: 1600x900 into an 800 square → 800x450
/// assert_eq!(calculate_destination_size((1600, 900), &FitSpec::Square(800)), Ok((800, 450)));
///
/// // Height binds: 1600x900 into 800x400 → 711x400
/// assert_eq!(calculate_destination_size((1600, 900), &(800, 400).into()), Ok((711, 400)));
///
/// // Already fits: unchanged
/// assert_eq!(calculate_destination_size((600, 400), &FitSpec::Square(800)), Ok((600, 400)));
/// ```
pub fn calculate_destination_size(
    source: (u32, u32),
    fit: &FitSpec,
) -> Result<(u32, u32), FitError> {
    let Some((fit_w, fit_h)) = fit.resolve()? else {
        return Ok(source);
    };
    let (src_w, src_h) = source;

    if src_w <= fit_w && src_h <= fit_h {
        return Ok(source);
    }

    let scale_w = fit_w as f64 / src_w as f64;
    let scale_h = fit_h as f64 / src_h as f64;
    let scale = scale_w.min(scale_h);

    let dest_w = (src_w as f64 * scale).round() as u32;
    let dest_h = (src_h as f64 * scale).round() as u32;

    Ok((dest_w.clamp(1, fit_w), dest_h.clamp(1, fit_h)))
}
