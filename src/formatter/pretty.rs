use std::io;

use crate::formatter::{
    common::{
        color::{ColorSetting, SupportsColor, colors::*},
        failure_summary,
        fto::{UnitListing, UnitResult},
    },
    *,
};

/// One line per unit, followed by a failure list and a summary line.
#[derive(Debug)]
pub struct PrettyFormatter<W: io::Write> {
    target: W,
    color_setting: ColorSetting,
}

impl Default for PrettyFormatter<io::Stdout> {
    fn default() -> Self {
        Self {
            target: io::stdout(),
            color_setting: Default::default(),
        }
    }
}

impl<W: io::Write> PrettyFormatter<W> {
    pub fn with_target<WithTarget: io::Write>(
        self,
        with_target: WithTarget,
    ) -> PrettyFormatter<WithTarget> {
        PrettyFormatter {
            target: with_target,
            color_setting: self.color_setting,
        }
    }

    pub fn with_color_setting(self, color_setting: impl Into<ColorSetting>) -> Self {
        PrettyFormatter {
            color_setting: color_setting.into(),
            ..self
        }
    }
}

impl<W: io::Write + SupportsColor> PrettyFormatter<W> {
    pub fn use_color(&self) -> bool {
        self.color_setting.use_color(&self.target)
    }

    fn paint(&self, color: &str, text: &str) -> String {
        match self.use_color() {
            true => format!("{color}{text}{RESET}"),
            false => text.to_owned(),
        }
    }
}

fn plural(count: usize, word: &str) -> String {
    match count {
        1 => format!("{count} {word}"),
        _ => format!("{count} {word}s"),
    }
}

impl<'u, W: io::Write + SupportsColor> UnitFormatter<'u> for PrettyFormatter<W> {
    type Error = io::Error;

    type RunStart = FmtRunStart;
    fn fmt_run_start(&mut self, data: Self::RunStart) -> Result<(), Self::Error> {
        writeln!(
            self.target,
            "\nrunning {} of {} on shard {}",
            plural(data.active, "unit"),
            data.total_units,
            data.shard
        )
    }

    type UnitOutcome = UnitResult<'u>;
    fn fmt_unit_outcome(&mut self, data: Self::UnitOutcome) -> Result<(), Self::Error> {
        let verdict = match &data.status {
            status if status.passed() => self.paint(GREEN, "ok"),
            status => format!("{} ({status})", self.paint(RED, "FAILED")),
        };
        writeln!(self.target, "unit {} ... {verdict}", data.key)
    }

    type RunOutcomes = FmtRunOutcomes<'u>;
    fn fmt_run_outcomes(&mut self, data: Self::RunOutcomes) -> Result<(), Self::Error> {
        if !data.failures.is_empty() {
            writeln!(self.target, "\nfailures:")?;
            for (key, status) in data.failures.iter() {
                writeln!(self.target, "    {}", failure_summary(key, status))?;
            }
        }

        let failed = data.failures.len();
        let timed_out = data
            .failures
            .iter()
            .filter(|(_, status)| status.timed_out())
            .count();
        let missing = data
            .expected
            .saturating_sub(data.passed + failed + data.filtered_out);
        let result = match data.passed == data.expected {
            true => self.paint(GREEN, "ok"),
            false => self.paint(RED, "FAILED"),
        };

        write!(
            self.target,
            "\nunit result: {result}. {} passed; {} failed; ",
            data.passed, failed
        )?;
        if timed_out > 0 {
            write!(self.target, "{timed_out} timed out; ")?;
        }
        if missing > 0 {
            let missing = self.paint(YELLOW, &format!("{missing} not run"));
            write!(self.target, "{missing}; ")?;
        }
        writeln!(
            self.target,
            "{} filtered out; finished in {:.2}s\n",
            data.filtered_out,
            data.duration.as_secs_f64()
        )
    }

    type UnitStart = ();
}

impl<'u, W: io::Write> UnitListFormatter<'u> for PrettyFormatter<W> {
    type Error = io::Error;

    type ListUnit = UnitListing<'u>;
    fn fmt_list_unit(&mut self, data: Self::ListUnit) -> Result<(), Self::Error> {
        writeln!(self.target, "{}: {}", data.key, plural(data.files, "file"))
    }

    type EndListing = FmtEndListing;
    fn fmt_end_listing(&mut self, data: Self::EndListing) -> Result<(), Self::Error> {
        write!(
            self.target,
            "\n{} on shard {}",
            plural(data.listed, "unit"),
            data.shard
        )?;
        if data.filtered_out > 0 {
            write!(self.target, " ({} filtered out)", data.filtered_out)?;
        }
        writeln!(self.target)
    }
}
