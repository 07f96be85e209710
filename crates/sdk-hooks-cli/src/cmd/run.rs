use crate::output::print_json;
use anyhow::Context;
use sdk_hooks::{get_hook_executor, HookExecOpts, HookInput, IoStreams, Protocol, SdkHooks};
use serde::Serialize;
use std::path::Path;

pub struct RunRequest {
    pub hook: String,
    pub args: Vec<(String, String)>,
    pub env: Vec<(String, String)>,
    pub stdin: bool,
}

#[derive(Serialize)]
struct RunOutput<'a> {
    hook: &'a str,
    protocol: String,
    response: String,
}

pub fn run(root: &Path, req: RunRequest, json: bool) -> anyhow::Result<()> {
    super::runtime()?.block_on(run_hook(root, req, json))
}

async fn run_hook(root: &Path, req: RunRequest, json: bool) -> anyhow::Result<()> {
    let io = IoStreams::stdout();
    let config = super::load_config(root, &io).await?;
    let script = config
        .hooks
        .get(&req.hook)
        .cloned()
        .with_context(|| format!("unknown hook '{}' (known: {})", req.hook, known_hooks()))?;

    let executor = get_hook_executor(io, &config);
    let protocol = executor.protocol();

    // Hook stderr is always shown. Under the message-boundary protocol stdout
    // outside the payload is diagnostics too, so it goes to stderr as well.
    let mut stderr = std::io::stderr();
    let mut diagnostics = std::io::stderr();
    let mut opts = HookExecOpts {
        hook: script,
        directory: Some(config.working_directory.clone()),
        args: req.args.into_iter().collect(),
        env: req.env.into_iter().collect(),
        stdin: req.stdin.then_some(HookInput::Inherit),
        stderr: Some(&mut stderr),
        ..Default::default()
    };
    if protocol == Protocol::MessageBoundaries {
        opts.stdout = Some(&mut diagnostics);
    }
    let response = executor.execute(opts).await?;

    if json {
        return print_json(&RunOutput {
            hook: &req.hook,
            protocol: protocol.to_string(),
            response,
        });
    }
    if !response.is_empty() {
        println!("{response}");
    }
    Ok(())
}

fn known_hooks() -> String {
    SdkHooks::default()
        .iter()
        .map(|(key, _)| key)
        .collect::<Vec<_>>()
        .join(", ")
}
