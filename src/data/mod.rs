pub mod aliases;
pub mod countries;
pub mod indicator;
pub mod integrate;
pub mod normalize;

pub use aliases::{AliasError, CountryAliases};
pub use indicator::{
    Indicator, IndicatorRecord, IntegratedRow, IntegratedTable, NormalizedSeries, RawObservation,
};
pub use integrate::integrate;
pub use normalize::{NormalizeReport, Normalizer};
