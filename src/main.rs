//! LC-3 Emulator - CLI Entry Point
//!
//! Exactly one program source is accepted:
//! - `lc3-emu -f <path>` - image file of decimal words
//! - `lc3-emu -p <text>` - image text, possibly spanning lines
//! - `lc3-emu -r <text>` - a single line of raw words

use anyhow::Context;
use clap::builder::NonEmptyStringValueParser;
use clap::{ArgGroup, Parser};
use lc3::{load_image_file, parse_words, Machine, MachineSnapshot, Word};

#[derive(Parser)]
#[command(name = "lc3-emu")]
#[command(version)]
#[command(about = "A 16-bit LC-3 emulator core")]
#[command(group(ArgGroup::new("source").required(true).args(["file", "program", "raw"])))]
struct Cli {
    /// Path to program to run
    #[arg(short, long, value_parser = NonEmptyStringValueParser::new())]
    file: Option<String>,

    /// Program to run
    #[arg(short, long, value_parser = NonEmptyStringValueParser::new())]
    program: Option<String>,

    /// Provide raw instructions to run
    #[arg(short, long, value_parser = NonEmptyStringValueParser::new())]
    raw: Option<String>,

    /// Maximum number of instructions to execute (0 runs until a fault)
    #[arg(long, default_value = "100000")]
    max_steps: u64,

    /// Log every executed instruction
    #[arg(short, long)]
    trace: bool,

    /// Print the final state as JSON
    #[arg(long)]
    json: bool,
}

/// Errors are reported here rather than by returning `anyhow::Result`, so the
/// message keeps the `[!]:` prefix.
fn main() {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if cli.trace {
        logger.filter_level(log::LevelFilter::Trace);
    }
    logger.init();

    if let Err(e) = run(&cli) {
        eprintln!("[!]: {:#}", e);
        std::process::exit(1);
    }
}

fn read_program(cli: &Cli) -> anyhow::Result<Vec<Word>> {
    let words = if let Some(path) = &cli.file {
        load_image_file(path).with_context(|| format!("failed to load {}", path))?
    } else if let Some(text) = &cli.program {
        parse_words(text)?
    } else if let Some(text) = &cli.raw {
        parse_words(text)?
    } else {
        anyhow::bail!("missing -p, -f, or -r flag");
    };

    Ok(words)
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let program = read_program(cli)?;

    let mut machine = Machine::new();
    machine.load_image(&program)?;

    let outcome = if cli.max_steps == 0 {
        machine.run()
    } else {
        machine.run_limited(cli.max_steps)
    };

    // Print what the machine reached even when execution faulted.
    print_state(&machine.snapshot(), cli.json)?;
    let executed = outcome.with_context(|| format!("fault at PC={:#06x}", machine.regs.pc()))?;
    log::info!("executed {} instructions", executed);

    Ok(())
}

fn print_state(snapshot: &MachineSnapshot, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
        return Ok(());
    }

    for (i, value) in snapshot.registers.iter().enumerate() {
        println!("R{}   {:#06x} ({})", i, value, *value as i16);
    }
    println!("PC   {:#06x}", snapshot.pc);
    match snapshot.cond {
        Some(flag) => println!("COND {:?}", flag),
        None => println!("COND invalid"),
    }
    println!("Steps: {}", snapshot.steps);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_one_source() {
        assert!(Cli::try_parse_from(["lc3-emu"]).is_err());
        assert!(Cli::try_parse_from(["lc3-emu", "-r", "5121", "-p", "5121"]).is_err());

        let cli = Cli::try_parse_from(["lc3-emu", "-r", "5121 0"]).unwrap();
        assert_eq!(read_program(&cli).unwrap(), vec![5121, 0]);
    }

    #[test]
    fn test_empty_source_rejected() {
        for flag in ["-f", "-p", "-r"] {
            assert!(Cli::try_parse_from(["lc3-emu", flag, ""]).is_err(), "{}", flag);
        }
    }
}
