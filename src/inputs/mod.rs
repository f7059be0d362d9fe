//! Edit-in-place inputs.
//!
//! Every editable value on the dashboard is shown as plain text with an
//! "Edit" button. Pressing it switches the field into editing mode; pressing
//! "Save" validates the draft and, when it is acceptable, hands the parsed
//! value back to the caller so it can be sent to the device backend.
//!
//! The widgets here hold only that mode/value state. Rendering lives in
//! `ui::components::inputs`.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// 24-hour `HH:MM`. Hours 00-23, minutes 00-59.
static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([01]\d|2[0-3]):([0-5]\d)$").expect("time pattern is valid")
});

static COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("color pattern is valid"));

/// Validation failure. The `Display` text is shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("Must enter a number between {min} and {max}")]
    OutOfRange { min: f64, max: f64 },
    #[error("Must enter a number lower than {max}")]
    AboveMax { max: f64 },
    #[error("Must enter a number greater than {min}")]
    BelowMin { min: f64 },
    #[error("Must enter a number")]
    NotANumber,
    #[error("Must enter a valid 24h time")]
    InvalidTime,
    #[error("Must enter a color like #FFAA00")]
    InvalidColor,
    #[error("Must choose one of: {0}")]
    UnknownOption(String),
    #[error("Unknown parameter: {0}")]
    UnknownField(String),
    #[error("{0} cannot be changed from the dashboard")]
    NotEditable(String),
    #[error("Please wait for pending requests to finish")]
    Disabled,
}

/// Parses and checks a raw draft string.
pub trait Validator {
    type Value;

    fn validate(&self, raw: &str) -> Result<Self::Value, InputError>;
}

/// Accepts any text.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextRule;

impl Validator for TextRule {
    type Value = String;

    fn validate(&self, raw: &str) -> Result<String, InputError> {
        Ok(raw.to_string())
    }
}

/// Numeric input with optional inclusive bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NumberRule {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumberRule {
    pub fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    fn range_error(&self) -> InputError {
        match (self.min, self.max) {
            (Some(min), Some(max)) => InputError::OutOfRange { min, max },
            (None, Some(max)) => InputError::AboveMax { max },
            (Some(min), None) => InputError::BelowMin { min },
            (None, None) => InputError::NotANumber,
        }
    }
}

impl Validator for NumberRule {
    type Value = f64;

    fn validate(&self, raw: &str) -> Result<f64, InputError> {
        let number = raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| self.range_error())?;

        let above_min = self.min.is_none_or(|min| min <= number);
        let below_max = self.max.is_none_or(|max| number <= max);
        if above_min && below_max {
            Ok(number)
        } else {
            Err(self.range_error())
        }
    }
}

/// 24-hour clock time, `HH:MM`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimeRule;

impl Validator for TimeRule {
    type Value = String;

    fn validate(&self, raw: &str) -> Result<String, InputError> {
        let raw = raw.trim();
        if TIME_RE.is_match(raw) {
            Ok(raw.to_string())
        } else {
            Err(InputError::InvalidTime)
        }
    }
}

/// `#RRGGBB` color, normalised to upper case.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ColorRule;

impl Validator for ColorRule {
    type Value = String;

    fn validate(&self, raw: &str) -> Result<String, InputError> {
        let raw = raw.trim();
        if COLOR_RE.is_match(raw) {
            Ok(raw.to_ascii_uppercase())
        } else {
            Err(InputError::InvalidColor)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Viewing,
    Editing,
}

/// A value that is displayed as text until the user starts editing it.
#[derive(Debug, Clone, PartialEq)]
pub struct EditInPlace<R> {
    rule: R,
    value: String,
    mode: Mode,
    disabled: bool,
}

impl<R: Validator> EditInPlace<R> {
    pub fn new(rule: R, initial: impl Into<String>) -> Self {
        Self {
            rule,
            value: initial.into(),
            mode: Mode::Viewing,
            disabled: false,
        }
    }

    /// Start in editing mode (used when the page is rendered with an open editor).
    pub fn editing(mut self) -> Self {
        self.mode = Mode::Editing;
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_editing(&self) -> bool {
        self.mode == Mode::Editing
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn rule(&self) -> &R {
        &self.rule
    }

    /// Label of the toggle button for the current mode.
    pub fn button_label(&self) -> &'static str {
        match self.mode {
            Mode::Viewing => "Edit",
            Mode::Editing => "Save",
        }
    }

    /// Press the Edit/Save button.
    ///
    /// Entering edit mode returns `Ok(None)`. Leaving it returns the parsed
    /// draft, which becomes the displayed value. A rejected draft keeps the
    /// input in edit mode.
    pub fn toggle(&mut self, draft: &str) -> Result<Option<R::Value>, InputError> {
        if self.disabled {
            return Err(InputError::Disabled);
        }
        match self.mode {
            Mode::Viewing => {
                self.mode = Mode::Editing;
                Ok(None)
            }
            Mode::Editing => {
                let parsed = self.rule.validate(draft)?;
                self.value = draft.trim().to_string();
                self.mode = Mode::Viewing;
                Ok(Some(parsed))
            }
        }
    }
}

pub type TextInput = EditInPlace<TextRule>;
pub type NumberInput = EditInPlace<NumberRule>;
pub type TimeInput = EditInPlace<TimeRule>;
pub type ColorInput = EditInPlace<ColorRule>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectOption {
    pub label: &'static str,
    pub value: &'static str,
}

impl SelectOption {
    pub const fn new(label: &'static str, value: &'static str) -> Self {
        Self { label, value }
    }
}

/// Drop-down with a fixed option list.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub label: &'static str,
    pub options: &'static [SelectOption],
    value: String,
    disabled: bool,
}

impl Select {
    pub fn new(label: &'static str, options: &'static [SelectOption], value: &str) -> Self {
        Self {
            label,
            options,
            value: value.to_string(),
            disabled: false,
        }
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn is_selected(&self, option: &SelectOption) -> bool {
        option.value == self.value
    }

    pub fn choose(&mut self, value: &str) -> Result<&'static str, InputError> {
        if self.disabled {
            return Err(InputError::Disabled);
        }
        let option = find_option(self.options, value)?;
        self.value = option.value.to_string();
        Ok(option.value)
    }
}

/// Look up a raw value in an option list.
pub fn find_option(
    options: &'static [SelectOption],
    value: &str,
) -> Result<&'static SelectOption, InputError> {
    options.iter().find(|o| o.value == value).ok_or_else(|| {
        let values: Vec<&str> = options.iter().map(|o| o.value).collect();
        InputError::UnknownOption(values.join(", "))
    })
}
