use comfy_table::{Cell, Table, presets::UTF8_FULL_CONDENSED};

/// Two-column table used for key/value status output.
pub fn key_value_table<'a>(rows: impl IntoIterator<Item = (&'a str, String)>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["Check", "Result"]);
    for (key, value) in rows {
        table.add_row(vec![Cell::new(key), Cell::new(value)]);
    }
    table
}

pub fn print_table(table: Table) {
    println!("{table}");
}
