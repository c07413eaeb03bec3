use std::io;

use crate::formatter::{
    common::{
        color::{ColorSetting, SupportsColor},
        fto::{UnitListing, UnitResult},
    },
    pretty::PrettyFormatter,
    terse::TerseFormatter,
    *,
};

/// Output styles selectable from the command line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// A dot per passing unit, a line per failing unit.
    #[default]
    Terse,
    /// A line per unit with a summary at the end.
    Pretty,
}

/// The formatter picked by [`OutputFormat`].
#[derive(Debug)]
pub enum ConsoleFormatter<W: io::Write = io::Stdout> {
    Terse(TerseFormatter<W>),
    Pretty(PrettyFormatter<W>),
}

impl ConsoleFormatter<io::Stdout> {
    pub fn new(format: OutputFormat, color_setting: ColorSetting) -> Self {
        Self::with_target(format, color_setting, io::stdout())
    }
}

impl<W: io::Write> ConsoleFormatter<W> {
    pub fn with_target(format: OutputFormat, color_setting: ColorSetting, target: W) -> Self {
        match format {
            OutputFormat::Terse => Self::Terse(
                TerseFormatter::default()
                    .with_target(target)
                    .with_color_setting(color_setting),
            ),
            OutputFormat::Pretty => Self::Pretty(
                PrettyFormatter::default()
                    .with_target(target)
                    .with_color_setting(color_setting),
            ),
        }
    }
}

impl<'u, W: io::Write + SupportsColor> UnitFormatter<'u> for ConsoleFormatter<W> {
    type Error = io::Error;

    type RunStart = FmtRunStart;
    fn fmt_run_start(&mut self, data: Self::RunStart) -> Result<(), Self::Error> {
        match self {
            Self::Terse(f) => f.fmt_run_start(data.into()),
            Self::Pretty(f) => f.fmt_run_start(data),
        }
    }

    type UnitStart = ();

    type UnitOutcome = UnitResult<'u>;
    fn fmt_unit_outcome(&mut self, data: Self::UnitOutcome) -> Result<(), Self::Error> {
        match self {
            Self::Terse(f) => f.fmt_unit_outcome(data),
            Self::Pretty(f) => f.fmt_unit_outcome(data),
        }
    }

    type RunOutcomes = FmtRunOutcomes<'u>;
    fn fmt_run_outcomes(&mut self, data: Self::RunOutcomes) -> Result<(), Self::Error> {
        match self {
            Self::Terse(f) => f.fmt_run_outcomes(data),
            Self::Pretty(f) => f.fmt_run_outcomes(data),
        }
    }
}

impl<'u, W: io::Write> UnitListFormatter<'u> for ConsoleFormatter<W> {
    type Error = io::Error;

    type ListUnit = UnitListing<'u>;
    fn fmt_list_unit(&mut self, data: Self::ListUnit) -> Result<(), Self::Error> {
        match self {
            Self::Terse(f) => f.fmt_list_unit(data),
            Self::Pretty(f) => f.fmt_list_unit(data),
        }
    }

    type EndListing = FmtEndListing;
    fn fmt_end_listing(&mut self, data: Self::EndListing) -> Result<(), Self::Error> {
        match self {
            Self::Terse(f) => f.fmt_end_listing(data.into()),
            Self::Pretty(f) => f.fmt_end_listing(data),
        }
    }
}
