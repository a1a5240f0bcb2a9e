use crate::output::{display_value, print_json, Table};
use clap::Subcommand;
use kiosk_core::session::SessionStore;
use std::path::Path;

#[derive(Subcommand, Debug)]
pub enum SessionSubcommand {
    /// Print the session document sent with every handshake
    Show,
    /// Delete the session document; the next handshake starts unregistered
    Clear,
}

pub fn run(root: &Path, subcommand: SessionSubcommand, json: bool) -> anyhow::Result<()> {
    let store = SessionStore::at_root(root);
    match subcommand {
        SessionSubcommand::Show => show(&store, json),
        SessionSubcommand::Clear => {
            store.clear()?;
            if !json {
                println!("Session cleared: {}", store.path().display());
            }
            Ok(())
        }
    }
}

fn show(store: &SessionStore, json: bool) -> anyhow::Result<()> {
    let doc = store.read();
    if json {
        return print_json(&doc);
    }
    if doc.is_empty() {
        println!("No session document at {}", store.path().display());
        return Ok(());
    }
    let mut table = Table::new(&["KEY", "VALUE"]);
    for (key, value) in &doc {
        table.row([key.clone(), display_value(value)]);
    }
    table.print();
    Ok(())
}
