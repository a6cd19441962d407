//! Table rendering

use std::ops::Range;

use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};

/// Renders `rows` under `header` as an ASCII grid, right aligning the `numeric` columns.
pub(crate) fn grid<const N: usize>(
    header: [&str; N],
    rows: impl IntoIterator<Item = [String; N]>,
    numeric: Range<usize>,
) -> String {
    let mut builder = Builder::default();

    builder.push_record(header);

    for row in rows {
        builder.push_record(row);
    }

    let mut table = builder.build();

    table.with(Style::ascii());
    table.modify(Columns::new(numeric), Alignment::right());

    table.to_string()
}
