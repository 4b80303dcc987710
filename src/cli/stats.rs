//! Stats command implementation

use anyhow::Result;

use crate::store::WarehouseStore;

pub fn run(store: &WarehouseStore) -> Result<()> {
    let counts = store.table_counts()?;

    println!("{:<12} {:>10}", "Table", "Rows");
    println!("{}", "-".repeat(23));
    for (table, count) in counts {
        println!("{:<12} {:>10}", table, count);
    }

    let unmatched: i64 = store.connection().query_row(
        "SELECT COUNT(*) FROM songplays WHERE song_id IS NULL",
        [],
        |row| row.get(0),
    )?;
    println!("\n{} songplays without a matched song", unmatched);

    Ok(())
}
