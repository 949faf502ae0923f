use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use trialctl::results::{ResultStore, Sample, NFE};

pub fn print_store_summary(store: &ResultStore) {
    let keys = store.keys();
    if keys.is_empty() {
        println!("⚠️  The result store is empty.");
        return;
    }

    println!("\n=== RESULT STORE ===");
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Algorithm").add_attribute(Attribute::Bold),
            Cell::new("Problem").add_attribute(Attribute::Bold),
            Cell::new("Result Sets").add_attribute(Attribute::Bold),
            Cell::new("Series").add_attribute(Attribute::Bold),
            Cell::new("Final NFE").add_attribute(Attribute::Bold),
        ]);

    for key in &keys {
        let Ok(sets) = store.get(key) else {
            continue;
        };

        let series = sets.last().map_or(0, |s| s.keys().count());
        let final_nfe = sets
            .last()
            .and_then(|s| s.last(NFE))
            .and_then(Sample::as_real)
            .map_or_else(|| "-".to_string(), |v| format!("{}", v));

        table.add_row(vec![
            Cell::new(key.algorithm()).fg(Color::Cyan),
            Cell::new(key.problem()),
            Cell::new(sets.len()).set_alignment(CellAlignment::Right),
            Cell::new(series).set_alignment(CellAlignment::Right),
            Cell::new(final_nfe).set_alignment(CellAlignment::Right),
        ]);
    }

    println!("{}", table);
    println!("Total: {} result sets", store.len());
}
