use crate::output::print_json;
use sdk_hooks::{get_hook_executor, IoStreams, Protocol};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct ProtocolOutput<'a> {
    protocol: Protocol,
    supported: &'a [Protocol],
}

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let io = IoStreams::stdout();
    let config = super::runtime()?.block_on(super::load_config(root, &io))?;
    let protocol = get_hook_executor(io, &config).protocol();
    let supported = &config.config.supported_protocols.0;

    if json {
        return print_json(&ProtocolOutput {
            protocol,
            supported,
        });
    }

    println!("{protocol}");
    for unknown in supported.iter().filter(|p| !p.is_valid()) {
        tracing::warn!("ignoring unsupported protocol '{unknown}'");
    }
    Ok(())
}
