//! Driver listing handler

use crate::error::Result;
use crate::output::OutputWriter;
use serde_json::json;
use tensorspec_core::kvstore::KVSTORE_DRIVERS;
use tensorspec_core::DriverKind;

/// List the registered drivers and kvstore drivers
pub fn handle_drivers(output: &mut OutputWriter) -> Result<()> {
    if !output.is_human() {
        let drivers: Vec<_> = DriverKind::ALL
            .iter()
            .map(|kind| json!({"name": kind.as_str(), "chunked": kind.is_chunked()}))
            .collect();
        return output.data(&json!({"drivers": drivers, "kvstore_drivers": KVSTORE_DRIVERS}));
    }

    output.section("Drivers")?;
    let rows = DriverKind::ALL
        .iter()
        .map(|kind| {
            let chunked = if kind.is_chunked() { "yes" } else { "no" };
            vec![kind.as_str().to_string(), chunked.to_string()]
        })
        .collect();
    output.table(&["DRIVER", "CHUNKED"], rows)?;

    output.section("Kvstore drivers")?;
    for driver in KVSTORE_DRIVERS {
        output.writeln(driver)?;
    }
    Ok(())
}
