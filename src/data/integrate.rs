//! Full outer join of normalized series on `(country_code, year)`.
//!
//! Keys from any series appear in the output; indicators a key lacks stay
//! `None`. A key repeated inside one series overwrites the earlier value.

use std::collections::BTreeMap;

use crate::data::aliases::CountryAliases;
use crate::data::indicator::{IntegratedRow, IntegratedTable, NormalizedSeries};

pub fn integrate(series: &[NormalizedSeries], aliases: &CountryAliases) -> IntegratedTable {
    let mut rows: BTreeMap<(String, i32), IntegratedRow> = BTreeMap::new();

    for source in series {
        for record in &source.records {
            let row = rows
                .entry((record.country_code.clone(), record.year))
                .or_insert_with(|| {
                    IntegratedRow::empty(
                        record.country_code.clone(),
                        aliases.name(&record.country_code).map(str::to_string),
                        record.year,
                    )
                });
            row.set_value(source.indicator, record.value);
        }
    }

    IntegratedTable {
        rows: rows.into_values().collect(),
    }
}
