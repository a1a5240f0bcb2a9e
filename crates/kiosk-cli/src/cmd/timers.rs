use crate::output::{print_json, Table};
use anyhow::Context;
use kiosk_core::config::Settings;
use kiosk_core::timer::TimerTable;
use std::collections::BTreeMap;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let settings = Settings::load(root).context("failed to load settings")?;
    let table = TimerTable::new(settings.timers);

    if json {
        let map: BTreeMap<&str, _> = table.iter().collect();
        return print_json(&map);
    }

    let mut out = Table::new(&["TIMER", "PATTERN", "VALUE"]);
    for (name, t) in table.iter() {
        out.row([
            name.to_string(),
            t.pattern.to_string(),
            format!("{:.2}s", t.value as f64 / 1000.0),
        ]);
    }
    out.print();
    Ok(())
}
