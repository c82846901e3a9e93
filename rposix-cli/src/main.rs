use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use rposix_core::{
    BindingConfig, BindingConfigBuilder, OperationRegistry, ProcessHost, Variant,
};

use probe_args::{parse_arg, ProbeArg};

mod probe_args;

/// Invoke a POSIX binding operation against the live OS.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// TOML binding configuration
    #[clap(short, long)]
    config: Option<PathBuf>,
    /// Log every call at trace level
    #[clap(short, long)]
    trace: bool,
    /// List the available operations and exit
    #[clap(short, long)]
    list: bool,
    /// Operation name, e.g. `getcwd` or `_getaddrinfo`
    op: Option<String>,
    /// Arguments: nil, integers, :SYMBOL, buf:N, or strings
    #[clap(allow_hyphen_values = true)]
    args: Vec<String>,
}

fn load_config(args: &Args) -> Result<BindingConfig> {
    let config = match &args.config {
        Some(path) => BindingConfig::from_toml_file(path)?,
        None => BindingConfig::default(),
    };
    Ok(BindingConfigBuilder::new()
        .with_logger_config(config.logger)
        .with_trace_calls(config.trace_calls || args.trace)
        .with_log_os_errors(config.log_os_errors)
        .get())
}

fn list(registry: &OperationRegistry) {
    for desc in registry.operations() {
        println!(
            "{:<14} {} {:<13} {}",
            desc.name,
            desc.arity,
            desc.policy.to_string(),
            desc.signatures()
        );
    }
}

fn probe(registry: &OperationRegistry, op: &str, raw: &[String]) -> Result<()> {
    let args = raw
        .iter()
        .map(|s| parse_arg(s))
        .collect::<Result<Vec<ProbeArg>>>()?;
    let values: Vec<Variant> = args.iter().map(ProbeArg::variant).collect();

    let mut host = ProcessHost::new();
    let result = registry
        .call(&mut host, op, &values)
        .with_context(|| format!("{op}({})", raw.join(", ")))?;
    println!("{}", result);

    for (index, arg) in args.iter().enumerate() {
        if let ProbeArg::Buffer(buf) = arg {
            println!("  arg {}: {}", index, hex::encode(buf.to_vec()));
        }
    }
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    env_logger::Builder::new()
        .filter_level(config.logger.level_filter)
        .parse_default_env()
        .init();
    log::debug!("binding config: {:?}", config);

    let registry = OperationRegistry::new(config)?;
    if args.list {
        list(&registry);
        return Ok(());
    }
    let Some(op) = args.op.as_deref() else {
        bail!("no operation given; use --list to see them");
    };
    probe(&registry, op, &args.args)
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("posix-call: {:#}", e);
        std::process::exit(1);
    }
}
