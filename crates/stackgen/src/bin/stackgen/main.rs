mod cli;

use stackgen::backend::Stack;
use stackgen::builder::Builder;
use stackgen::config::Configuration;
use stackgen::diagnostics::Diagnostics;
use std::io::Write;

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("STACKGEN_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err,);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::Synth(synth_cli) => synth(synth_cli),
        cli::Command::Name(name_cli) => name(name_cli),
        cli::Command::Dev(dev_cli) => dev(dev_cli),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

pub fn synth(cli: cli::SynthCommand) -> anyhow::Result<()> {
    let config = load(&cli.input)?;

    let mut stack = Stack::new(&config.context.region)?;
    let mut diagnostics = Diagnostics::new();
    let report =
        Builder::new(&config.context, &mut stack).build(&config.aws_resources, &mut diagnostics);

    for outcome in report.failed() {
        if let Err(err) = &outcome.result {
            eprintln!("skipped '{}': {err} (at {})", outcome.name, err.stage());
        }
    }
    for export in report.failed_exports() {
        if let Err(err) = &export.result {
            eprintln!("no output for '{}': {err}", export.name);
        }
    }

    output(&cli.output, &stack)?;
    Ok(())
}

fn load(input: &cli::InputArgs) -> anyhow::Result<Configuration> {
    if input.is_stdin() {
        return Ok(Configuration::from_reader(std::io::stdin())?);
    }

    Ok(Configuration::load_file(&input.file)?)
}

fn output(output: &cli::OutputArgs, stack: &Stack) -> anyhow::Result<()> {
    let mut writer: Box<dyn Write> = match &output.file {
        Some(path) => Box::new(std::fs::File::create(path)?),
        None => Box::new(std::io::stdout()),
    };

    match output.format {
        cli::OutputFormat::Json => serde_json::to_writer_pretty(&mut writer, stack)?,
        cli::OutputFormat::Yaml => serde_yaml::to_writer(&mut writer, stack)?,
        cli::OutputFormat::Hcl => writer.write_all(stack.to_hcl()?.as_bytes())?,
    };
    writeln!(writer)?;

    Ok(())
}

pub fn name(cli: cli::NameCommand) -> anyhow::Result<()> {
    let config = load(&cli.input)?;
    println!("{}", config.context.generate_name(&cli.base_name));
    Ok(())
}

/// (stackgen-)developer utilities
///
/// A quick way to expose internal structures for debugging purposes
pub fn dev(cli: cli::DevCommand) -> anyhow::Result<()> {
    use cli::DevSubCommand::*;

    match cli.command {
        Declarations => {
            let config = load(&cli.input)?;
            println!("{config:#?}");
        }
        Types => {
            let stack = Stack::new("us-east-1")?;
            for (resource_type, entry) in stack.catalog().iter() {
                let data = if entry.data_source { " (data)" } else { "" };
                println!("{resource_type} -> {}{data}", entry.terraform_type);
            }
        }
        References => {
            let config = load(&cli.input)?;
            for declaration in &config.aws_resources {
                let references = stackgen::resolve::references(&declaration.args);
                println!("{} -> [{}]", declaration.name, references.join(", "));
            }
        }
    }

    Ok(())
}
