use crate::error::KnobError;
use crate::events::Direction;
use crate::geometry::{checked_inverse_lerp, lerp};
use crate::numeric::{MAX_FRACTION_DIGITS, parse_float, parse_int, to_fixed};
use serde::{Deserialize, Deserializer, Serialize, de};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use strum::{Display as StrumDisplay, EnumIter, EnumString, IntoStaticStr};

/// Largest value the knob stores. Keeps the arc short of a full turn.
pub const MAX_NORMALIZED: f64 = 0.999_999_99;

/// Highest precision the readout formats with.
pub const MAX_PRECISION: usize = MAX_FRACTION_DIGITS;

/// Attributes the knob reacts to. Declaration order is the order a
/// definition applies them in, so the range is known before `value`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumString,
    EnumIter,
    StrumDisplay,
    IntoStaticStr,
    SerializeDisplay,
    DeserializeFromStr,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Attribute {
    Min,
    Max,
    Precision,
    StrokeWidth,
    Offset,
    Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnobConfig {
    pub min: f64,
    pub max: f64,
    #[serde(deserialize_with = "bounded_precision")]
    pub precision: usize,
    pub stroke_width: f64,
    pub offset: f64,
}

impl Default for KnobConfig {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 0.99999,
            precision: 1,
            stroke_width: 5.0,
            offset: 0.0,
        }
    }
}

fn bounded_precision<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    let precision = usize::deserialize(deserializer)?;
    if precision > MAX_PRECISION {
        return Err(de::Error::custom(format!(
            "precision {precision} is above the maximum of {MAX_PRECISION}"
        )));
    }
    Ok(precision)
}

impl KnobConfig {
    /// Caps `precision` at [`MAX_PRECISION`].
    pub fn bounded(self) -> Self {
        Self {
            precision: self.precision.min(MAX_PRECISION),
            ..self
        }
    }

    /// Updates the field behind `attribute`. `value` is not a configuration
    /// field and is left to the caller.
    pub fn apply(&mut self, attribute: Attribute, raw: &str) -> Result<(), KnobError> {
        let field: &'static str = attribute.into();
        let malformed = || KnobError::MalformedNumericInput {
            field,
            input: raw.to_string(),
        };

        match attribute {
            Attribute::Min => self.min = parse_float(raw).ok_or_else(malformed)?,
            Attribute::Max => self.max = parse_float(raw).ok_or_else(malformed)?,
            Attribute::StrokeWidth => self.stroke_width = parse_float(raw).ok_or_else(malformed)?,
            Attribute::Offset => self.offset = parse_float(raw).ok_or_else(malformed)?,
            Attribute::Precision => {
                let precision = parse_int(raw)
                    .filter(|p| (0..=MAX_PRECISION as i64).contains(p))
                    .ok_or_else(malformed)?;
                self.precision = precision as usize;
            }
            Attribute::Value => {}
        }
        Ok(())
    }

    pub fn denormalize(&self, value: f64) -> f64 {
        lerp(self.min, self.max, value)
    }

    /// Maps an output value back onto `[0, 1]`.
    pub fn normalize(&self, output: f64) -> Result<f64, KnobError> {
        checked_inverse_lerp(self.min, self.max, output)
            .ok_or(KnobError::ConfigurationDegenerate(self.min))
    }

    pub fn format_output(&self, value: f64) -> String {
        to_fixed(self.denormalize(value), self.precision)
    }

    /// Clamps a typed output value into the configured range, whichever way
    /// round `min` and `max` are.
    pub fn clamp_output(&self, output: f64) -> f64 {
        let (low, high) = if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        };
        output.clamp(low, high)
    }
}

pub fn clamp_normalized(value: f64) -> f64 {
    value.clamp(0.0, MAX_NORMALIZED)
}

#[derive(Debug, Clone, Default)]
pub struct KnobState {
    pub value: Option<f64>,
    pub direction: Option<Direction>,
    pub config: KnobConfig,
    pub editing: bool,
    pub focus_within: bool,
}

impl KnobState {
    pub fn new(config: KnobConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn output(&self) -> Option<String> {
        self.value.map(|v| self.config.format_output(v))
    }
}
