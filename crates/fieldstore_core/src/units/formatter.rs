//! Numeric display formatting in a chosen display unit.
//!
//! # Responsibility
//! - Turn stored numbers into display strings and back.
//! - Pair a storage unit with a shared formatter for view/storage conversion.
//!
//! # Invariants
//! - Decimal digits stay within `0..=MAX_DECIMAL_DIGITS`.
//! - A formatter's display unit and its SI/US defaults share one dimension.
//! - Output is locale-invariant: `.` as decimal point, `,` for grouping.

use super::catalog::UnitCatalog;
use super::error::{FormatError, FormatResult, UnitError, UnitResult};
use super::index::{UnitIndex, UnitSystemIndex};
use super::unit::Unit;
use crate::text::LabelLookup;
use log::debug;
use parking_lot::RwLock;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub const MAX_DECIMAL_DIGITS: u8 = 15;

/// Formatter shared between a settings owner and its conversion handlers.
pub type SharedFormatter = Arc<RwLock<NumericFormatter>>;

/// Single-letter numeric format code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatCode {
    /// `n`: fixed point with thousands grouping.
    #[default]
    Number,
    /// `f`: fixed point without grouping.
    Fixed,
    /// `e`: scientific notation.
    Exponential,
    /// `p`: value times 100 with a trailing `%`.
    Percent,
}

impl FormatCode {
    pub fn parse(code: &str) -> FormatResult<Self> {
        match code.trim() {
            "n" | "N" => Ok(Self::Number),
            "f" | "F" => Ok(Self::Fixed),
            "e" | "E" => Ok(Self::Exponential),
            "p" | "P" => Ok(Self::Percent),
            other => Err(FormatError::UnsupportedFormatCode(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Number => "n",
            Self::Fixed => "f",
            Self::Exponential => "e",
            Self::Percent => "p",
        }
    }

    fn render(self, value: f64, digits: usize) -> String {
        match self {
            Self::Number => group_thousands(&format!("{value:.digits$}")),
            Self::Fixed => format!("{value:.digits$}"),
            Self::Exponential => format!("{value:.digits$e}"),
            Self::Percent => format!("{}%", group_thousands(&format!("{:.digits$}", value * 100.0))),
        }
    }

    fn read(self, text: &str) -> Option<f64> {
        let cleaned = text
            .trim()
            .chars()
            .filter(|ch| *ch != ',' && !ch.is_whitespace())
            .collect::<String>();
        match self {
            Self::Percent => {
                let digits = cleaned.strip_suffix('%').unwrap_or(cleaned.as_str());
                digits.parse::<f64>().ok().map(|value| value / 100.0)
            }
            _ => cleaned.parse::<f64>().ok(),
        }
    }
}

impl Display for FormatCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display settings for one kind of number.
#[derive(Debug, Clone)]
pub struct NumericFormatter {
    id: i32,
    name: String,
    display_unit: Arc<Unit>,
    format_code: FormatCode,
    decimal_digits: u8,
    default_si: Option<Arc<Unit>>,
    default_us: Option<Arc<Unit>>,
    is_standard: bool,
    label: Option<String>,
}

impl NumericFormatter {
    /// Creates a custom formatter.
    ///
    /// # Errors
    /// - Returns `BlankName` when `name` is empty after trimming.
    /// - Returns `DecimalDigitsOutOfRange` when `decimal_digits` exceeds
    ///   [`MAX_DECIMAL_DIGITS`].
    pub fn new(
        id: i32,
        name: impl Into<String>,
        display_unit: Arc<Unit>,
        format_code: FormatCode,
        decimal_digits: u8,
    ) -> FormatResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(FormatError::BlankName);
        }
        if decimal_digits > MAX_DECIMAL_DIGITS {
            return Err(FormatError::DecimalDigitsOutOfRange(decimal_digits));
        }
        Ok(Self {
            id,
            name,
            display_unit,
            format_code,
            decimal_digits,
            default_si: None,
            default_us: None,
            is_standard: false,
            label: None,
        })
    }

    /// Sets the display units restored by [`Self::reset_default`].
    pub fn with_defaults(mut self, si: Arc<Unit>, us: Arc<Unit>) -> FormatResult<Self> {
        self.ensure_same_dimension(&si)?;
        self.ensure_same_dimension(&us)?;
        self.default_si = Some(si);
        self.default_us = Some(us);
        Ok(self)
    }

    /// Overrides the catalog label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn shared(self) -> SharedFormatter {
        Arc::new(RwLock::new(self))
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_unit(&self) -> &Arc<Unit> {
        &self.display_unit
    }

    pub fn format_code(&self) -> FormatCode {
        self.format_code
    }

    pub fn decimal_digits(&self) -> u8 {
        self.decimal_digits
    }

    pub fn is_standard(&self) -> bool {
        self.is_standard
    }

    pub fn default_si_unit(&self) -> Option<&Arc<Unit>> {
        self.default_si.as_ref()
    }

    pub fn default_us_unit(&self) -> Option<&Arc<Unit>> {
        self.default_us.as_ref()
    }

    pub fn label(&self, labels: &dyn LabelLookup) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => labels.label(&self.name),
        }
    }

    pub fn short_label(&self, labels: &dyn LabelLookup) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => labels.short_label(&self.name),
        }
    }

    pub fn display_unit_label(&self, labels: &dyn LabelLookup) -> String {
        self.display_unit.label(labels)
    }

    /// Updates the number of decimals.
    ///
    /// Returns `false` and keeps the current value when `digits` is out of
    /// range.
    pub fn set_decimal_digits(&mut self, digits: u8) -> bool {
        if digits > MAX_DECIMAL_DIGITS {
            return false;
        }
        self.decimal_digits = digits;
        true
    }

    pub fn set_format_code(&mut self, format_code: FormatCode) {
        self.format_code = format_code;
    }

    /// Switches the display unit within the current dimension.
    pub fn set_display_unit(&mut self, unit: Arc<Unit>) -> UnitResult<()> {
        self.ensure_same_dimension(&unit)?;
        self.display_unit = unit;
        Ok(())
    }

    /// Restores the default display unit of `unit_system`.
    ///
    /// SI and US customary pick their configured default. Other systems, or
    /// a missing default, leave the display unit unchanged.
    pub fn reset_default(&mut self, unit_system: UnitSystemIndex) {
        let default = match unit_system {
            UnitSystemIndex::SI => self.default_si.clone(),
            UnitSystemIndex::US_CUSTOMARY => self.default_us.clone(),
            _ => None,
        };
        if let Some(unit) = default {
            self.display_unit = unit;
        }
    }

    /// Copies all settings from a formatter with the same name. The id is
    /// kept.
    pub fn initialize_from(&mut self, other: &NumericFormatter) -> FormatResult<()> {
        if other.name != self.name {
            return Err(FormatError::NameMismatch {
                expected: self.name.clone(),
                found: other.name.clone(),
            });
        }
        self.decimal_digits = other.decimal_digits;
        self.format_code = other.format_code;
        self.display_unit = Arc::clone(&other.display_unit);
        if other.default_si.is_some() {
            self.default_si = other.default_si.clone();
        }
        if other.default_us.is_some() {
            self.default_us = other.default_us.clone();
        }
        self.is_standard = other.is_standard;
        if other.label.is_some() {
            self.label = other.label.clone();
        }
        Ok(())
    }

    /// Converts `value` in `unit` into the display unit.
    pub fn double_from_double_unit(&self, value: f64, unit: &Unit) -> UnitResult<f64> {
        self.display_unit.convert_from(value, unit)
    }

    /// Converts a display-unit `value` into `unit`.
    pub fn double_unit_from_double(&self, unit: &Unit, value: f64) -> UnitResult<f64> {
        unit.convert_from(value, &self.display_unit)
    }

    /// Parses display text and converts it into `unit`.
    ///
    /// Unparsable text reads as `0.0`.
    pub fn double_unit_from_string(&self, unit: &Unit, text: &str) -> UnitResult<f64> {
        let value = match self.format_code.read(text) {
            Some(value) => value,
            None => {
                debug!(
                    "event=numeric_parse module=units status=fallback formatter={} chars={}",
                    self.name,
                    text.chars().count()
                );
                0.0
            }
        };
        self.double_unit_from_double(unit, value)
    }

    /// Formats `value`, expressed in `unit`, in the display unit.
    pub fn string_from_double_unit(&self, value: f64, unit: &Unit) -> UnitResult<String> {
        let display = self.double_from_double_unit(value, unit)?;
        Ok(self
            .format_code
            .render(display, usize::from(self.decimal_digits)))
    }

    fn ensure_same_dimension(&self, unit: &Unit) -> UnitResult<()> {
        if unit.dimension() != self.display_unit.dimension() {
            return Err(UnitError::IncompatibleDimensions {
                from: unit.dimension_name().to_string(),
                to: self.display_unit.dimension_name().to_string(),
            });
        }
        Ok(())
    }
}

/// Built-in formatters every application starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFormatter {
    None,
    Percent,
    Currency,
    Number,
    Unitless,
}

impl StandardFormatter {
    pub const ALL: [StandardFormatter; 5] = [
        Self::None,
        Self::Percent,
        Self::Currency,
        Self::Number,
        Self::Unitless,
    ];

    pub fn id(self) -> i32 {
        match self {
            Self::None => 0,
            Self::Percent => 1,
            Self::Currency => 2,
            Self::Number => 3,
            Self::Unitless => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Percent => "percent",
            Self::Currency => "currency",
            Self::Number => "number",
            Self::Unitless => "unitless",
        }
    }

    fn unit_and_digits(self) -> (UnitIndex, u8) {
        match self {
            Self::None | Self::Number => (UnitIndex::NONE, 0),
            Self::Percent => (UnitIndex::PERCENT_PERCENT, 1),
            Self::Currency => (UnitIndex::DOLLARS, 2),
            Self::Unitless => (UnitIndex::UNITLESS_UNIT, 0),
        }
    }

    /// Builds the formatter from a standard catalog.
    pub fn build(self, catalog: &UnitCatalog) -> FormatResult<NumericFormatter> {
        let (unit_index, digits) = self.unit_and_digits();
        let unit = catalog.require_unit(unit_index)?;
        let mut formatter = NumericFormatter::new(
            self.id(),
            self.name(),
            Arc::clone(&unit),
            FormatCode::Number,
            digits,
        )?
        .with_defaults(Arc::clone(&unit), unit)?;
        formatter.is_standard = true;
        Ok(formatter)
    }
}

/// Converts between a fixed storage unit and a formatter's view.
#[derive(Debug, Clone)]
pub struct ConversionHandler {
    storage_unit: Arc<Unit>,
    formatter: SharedFormatter,
}

impl ConversionHandler {
    /// # Errors
    /// - Returns `IncompatibleDimensions` when `storage_unit` and the
    ///   formatter's display unit differ in dimension.
    pub fn new(storage_unit: Arc<Unit>, formatter: SharedFormatter) -> UnitResult<Self> {
        {
            let guard = formatter.read();
            let display = guard.display_unit();
            if display.dimension() != storage_unit.dimension() {
                return Err(UnitError::IncompatibleDimensions {
                    from: storage_unit.dimension_name().to_string(),
                    to: display.dimension_name().to_string(),
                });
            }
        }
        Ok(Self {
            storage_unit,
            formatter,
        })
    }

    pub fn storage_unit(&self) -> &Arc<Unit> {
        &self.storage_unit
    }

    pub fn formatter(&self) -> &SharedFormatter {
        &self.formatter
    }

    /// Whether this handler reads settings from `formatter`.
    pub fn depends_on(&self, formatter: &SharedFormatter) -> bool {
        Arc::ptr_eq(&self.formatter, formatter)
    }

    pub fn storage_from_view(&self, value: f64) -> UnitResult<f64> {
        self.formatter
            .read()
            .double_unit_from_double(&self.storage_unit, value)
    }

    pub fn storage_from_view_str(&self, text: &str) -> UnitResult<f64> {
        self.formatter
            .read()
            .double_unit_from_string(&self.storage_unit, text)
    }

    pub fn storage_to_view_factor(&self) -> UnitResult<f64> {
        self.formatter
            .read()
            .display_unit()
            .convert_from(1.0, &self.storage_unit)
    }

    pub fn view_from_storage(&self, value: f64) -> UnitResult<f64> {
        self.formatter
            .read()
            .double_from_double_unit(value, &self.storage_unit)
    }

    pub fn view_string_from_storage(&self, value: f64) -> UnitResult<String> {
        self.formatter
            .read()
            .string_from_double_unit(value, &self.storage_unit)
    }
}

/// Inserts `,` every three integer digits of an already rendered number.
fn group_thousands(rendered: &str) -> String {
    let (sign, unsigned) = match rendered.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rendered),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(rendered.len() + integer.len() / 3);
    grouped.push_str(sign);
    for (position, digit) in integer.chars().enumerate() {
        if position > 0 && (integer.len() - position) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if let Some(fraction) = fraction {
        grouped.push('.');
        grouped.push_str(fraction);
    }
    grouped
}
