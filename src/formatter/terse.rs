use std::io;

use crate::formatter::{
    common::{
        color::{ColorSetting, SupportsColor, colors::*},
        failure_summary,
        fto::{UnitListing, UnitResult},
    },
    *,
};

/// Prints a dot per passing unit and one line per failing unit.
#[derive(Debug)]
pub struct TerseFormatter<W: io::Write> {
    target: W,
    color_setting: ColorSetting,
}

impl Default for TerseFormatter<io::Stdout> {
    fn default() -> Self {
        Self {
            target: io::stdout(),
            color_setting: Default::default(),
        }
    }
}

impl<W: io::Write> TerseFormatter<W> {
    pub fn with_target<WithTarget: io::Write>(
        self,
        with_target: WithTarget,
    ) -> TerseFormatter<WithTarget> {
        TerseFormatter {
            target: with_target,
            color_setting: self.color_setting,
        }
    }

    pub fn with_color_setting(self, color_setting: impl Into<ColorSetting>) -> Self {
        TerseFormatter {
            color_setting: color_setting.into(),
            ..self
        }
    }
}

impl<W: io::Write + SupportsColor> TerseFormatter<W> {
    /// Return whether this formatter will currently emit colored output.
    pub fn use_color(&self) -> bool {
        self.color_setting.use_color(&self.target)
    }
}

impl<'u, W: io::Write + SupportsColor> UnitFormatter<'u> for TerseFormatter<W> {
    type Error = io::Error;

    type UnitOutcome = UnitResult<'u>;
    fn fmt_unit_outcome(&mut self, data: Self::UnitOutcome) -> Result<(), Self::Error> {
        match (data.status.passed(), self.use_color()) {
            (true, false) => write!(self.target, ".")?,
            (true, true) => write!(self.target, "{GREEN}.{RESET}")?,
            (false, false) => {
                writeln!(self.target, "\n{}", failure_summary(data.key, &data.status))?
            }
            (false, true) => writeln!(
                self.target,
                "\n{RED}{}{RESET}",
                failure_summary(data.key, &data.status)
            )?,
        }
        self.target.flush()
    }

    type RunOutcomes = FmtRunOutcomes<'u>;
    fn fmt_run_outcomes(&mut self, data: Self::RunOutcomes) -> Result<(), Self::Error> {
        write!(self.target, "\nPassed {}/{} tests.", data.passed, data.expected)?;
        if data.filtered_out > 0 {
            write!(self.target, " {} filtered out.", data.filtered_out)?;
        }
        writeln!(self.target)?;
        writeln!(self.target)
    }

    type RunStart = ();
    type UnitStart = ();
}

impl<'u, W: io::Write> UnitListFormatter<'u> for TerseFormatter<W> {
    type Error = io::Error;

    type ListUnit = UnitListing<'u>;
    fn fmt_list_unit(&mut self, data: Self::ListUnit) -> Result<(), Self::Error> {
        writeln!(self.target, "{}: unit", data.key)
    }

    type EndListing = ();
}
