use crate::output::{print_json, print_table};
use sdk_hooks::{IoStreams, SdkCliConfig};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct HookEntry<'a> {
    key: &'static str,
    name: &'a str,
    available: bool,
    command: &'a str,
}

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let io = IoStreams::stdout();
    let config = super::runtime()?.block_on(super::load_config(root, &io))?;
    let entries = entries(&config);

    if json {
        return print_json(&entries);
    }

    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|e| {
            vec![
                e.key.to_string(),
                if e.available { "yes" } else { "no" }.to_string(),
                e.command.to_string(),
            ]
        })
        .collect();
    print_table(&["HOOK", "AVAILABLE", "COMMAND"], &rows);
    Ok(())
}

fn entries(config: &SdkCliConfig) -> Vec<HookEntry<'_>> {
    config
        .hooks
        .iter()
        .map(|(key, script)| HookEntry {
            key,
            name: &script.name,
            available: script.is_available(),
            command: script.command.trim(),
        })
        .collect()
}
