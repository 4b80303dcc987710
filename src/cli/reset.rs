use anyhow::Result;

use crate::store::WarehouseStore;

pub fn run(store: &WarehouseStore) -> Result<()> {
    store.reset()?;
    println!("Dropped and recreated songplays, users, songs, artists, time");
    Ok(())
}
