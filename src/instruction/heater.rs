use core::str::FromStr;

use super::{owned_comment, with_comment};
use crate::{parser::Line, types::Heater, utils::Number, InvalidGCode, MachineState};

/// `M104`/`M140`/`M141`: set a heater's target temperature without waiting for it.
///
/// Auto-temperature (`F`, `B`) and indexed heaters or materials (`I`, `T`) are not modelled.
#[derive(Debug, PartialEq, Clone)]
pub struct SetHeaterTemperature {
    pub heater: Heater,
    pub temperature: f64,
    pub comment: Option<String>,
}

impl SetHeaterTemperature {
    pub fn new(heater: Heater, temperature: f64) -> Self {
        Self {
            heater,
            temperature,
            comment: None,
        }
    }

    pub fn hotend(temperature: f64) -> Self {
        Self::new(Heater::Hotend, temperature)
    }

    pub fn bed(temperature: f64) -> Self {
        Self::new(Heater::Bed, temperature)
    }

    pub fn chamber(temperature: f64) -> Self {
        Self::new(Heater::Chamber, temperature)
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    fn heater(line: &Line<'_>) -> Option<Heater> {
        Heater::ALL
            .into_iter()
            .find(|heater| line.code_is('M', heater.number()))
    }

    pub fn is_command(line: &Line<'_>) -> bool {
        Self::heater(line).is_some()
    }

    pub fn parse(line: &Line<'_>) -> Result<Self, InvalidGCode> {
        let heater = Self::heater(line).ok_or_else(|| {
            InvalidGCode::UnexpectedCode(line.code().unwrap_or_default().to_owned())
        })?;
        let args = line.arguments()?;
        if args.contains('F') || args.contains('B') {
            return Err(InvalidGCode::Unsupported("auto-temperature"));
        }
        if args.contains('I') || args.contains('T') {
            return Err(InvalidGCode::Unsupported("indexed heaters"));
        }
        let temperature = args.get('S').ok_or(InvalidGCode::MissingArgument('S'))?;
        Ok(Self {
            heater,
            temperature,
            comment: owned_comment(line),
        })
    }

    pub fn apply(&self, state: &mut MachineState) {
        state.set_temperature(self.heater, self.temperature);
    }

    pub fn render(&self, _state: &MachineState) -> String {
        with_comment(
            format!("{} S{}", self.heater.code(), Number(self.temperature)),
            self.comment.as_deref(),
        )
    }
}

impl FromStr for SetHeaterTemperature {
    type Err = InvalidGCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(&Line::split(s))
    }
}
