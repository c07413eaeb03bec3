use crate::formatter::*;

/// A formatter that produces no output.
///
/// `NoFormatter` implements both the run and the list formatter traits but
/// discards every event. Useful when the caller only wants the
/// [`ShardReport`](crate::report::ShardReport).
#[derive(Debug, Default, Clone)]
pub struct NoFormatter;

macro_rules! impl_unit_from {
    [$($name:ident$(<$($generic:tt),*>)?),* $(,)?] => {$(
        impl$(<$($generic),*>)? From<$name$(<$($generic),*>)?> for () {
            fn from(_: $name$(<$($generic),*>)?) -> () {}
        })*
    };
}

impl_unit_from![
    FmtRunStart,
    FmtUnitStart<'u>,
    FmtUnitOutcome<'u>,
    FmtRunOutcomes<'u>,
    FmtListUnit<'u>,
    FmtEndListing,
];

impl<'u> UnitFormatter<'u> for NoFormatter {
    type Error = ();
    type RunStart = ();
    type UnitStart = ();
    type UnitOutcome = ();
    type RunOutcomes = ();
}

impl<'u> UnitListFormatter<'u> for NoFormatter {
    type Error = ();
    type ListUnit = ();
    type EndListing = ();
}
