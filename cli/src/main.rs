//! Runs a chip8 rom inside of the terminal.
use std::{env, path::PathBuf};

use anyhow::{anyhow, bail, Context};
use chip::{
    chip8::ChipSet,
    resources::{Rom, RomArchives},
    Runner, RunnerConfig,
};
use log::LevelFilter;

mod terminal;

use terminal::{Speaker, TerminalDisplay, TerminalGuard, TerminalKeyboard};

/// The tone played while the sound timer runs, in hertz.
const PITCH: u16 = 392;

static USAGE: &str = r#"
usage: chip8 [OPTIONS] FILE

options:
    --hz N              Steps per second, 0 runs unthrottled (default 500)
    --cycles N          Stop after N steps
    --trace             Log the machine state before every step
    --pitch N           Tone frequency in hertz (default 392)
    --log-level LEVEL   off, error, warn, info, debug or trace (default warn)
    --rom NAME          Treat FILE as a zip archive and run the entry NAME
    -h, --help          Print this message

keys:
    1 2 3 4             1 2 3 C
    q w e r      =>     4 5 6 D
    a s d f             7 8 9 E
    z x c v             A 0 B F

    Esc quits.
"#;

#[derive(Debug, PartialEq)]
struct Args {
    path: PathBuf,
    rom_name: Option<String>,
    config: RunnerConfig,
    log_level: LevelFilter,
    pitch: u16,
}

fn main() -> anyhow::Result<()> {
    let args = match parse_args(env::args().skip(1))? {
        Some(args) => args,
        None => {
            println!("{}", USAGE);
            return Ok(());
        }
    };

    simple_logger::SimpleLogger::new()
        .with_level(args.log_level)
        .init()?;

    let rom = load_rom(&args)?;
    let mut chip = ChipSet::new(rom, Speaker::open(args.pitch));
    let mut runner = Runner::new(TerminalDisplay::new(), TerminalKeyboard::new(), args.config);

    let result = {
        let _guard = TerminalGuard::enter().context("unable to prepare the terminal")?;
        runner.run(&mut chip)
    };

    match result {
        Ok(cycles) => {
            log::info!("stopped after {} cycles", cycles);
            Ok(())
        }
        Err(err) => Err(err).with_context(|| format!("'{}' failed:\n{}", chip.get_name(), chip)),
    }
}

fn load_rom(args: &Args) -> anyhow::Result<Rom> {
    match &args.rom_name {
        Some(name) => {
            let mut archive = RomArchives::open(&args.path)
                .with_context(|| format!("unable to open the archive {}", args.path.display()))?;
            archive.get_file_data(name).with_context(|| {
                format!(
                    "unable to load '{}', available roms are: {}",
                    name,
                    archive.file_names().join(", ")
                )
            })
        }
        None => Rom::from_file(&args.path)
            .with_context(|| format!("unable to load the rom {}", args.path.display())),
    }
}

/// Will parse the command line, returns none if the usage was requested.
fn parse_args<I>(mut args: I) -> anyhow::Result<Option<Args>>
where
    I: Iterator<Item = String>,
{
    let mut path = None;
    let mut rom_name = None;
    let mut config = RunnerConfig::default();
    let mut log_level = LevelFilter::Warn;
    let mut pitch = PITCH;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--hz" => {
                config.hertz = value(&mut args, &arg)?
                    .parse()
                    .context("--hz expects a number")?
            }
            "--cycles" => {
                config.max_cycles = Some(
                    value(&mut args, &arg)?
                        .parse()
                        .context("--cycles expects a number")?,
                )
            }
            "--trace" => config.trace = true,
            "--pitch" => {
                pitch = value(&mut args, &arg)?
                    .parse()
                    .context("--pitch expects a number")?;
                if pitch == 0 {
                    bail!("--pitch has to be above 0");
                }
            }
            "--log-level" => {
                let level = value(&mut args, &arg)?;
                log_level = level
                    .parse()
                    .map_err(|_| anyhow!("unknown log level '{}'", level))?;
            }
            "--rom" => rom_name = Some(value(&mut args, &arg)?),
            option if option.starts_with('-') => bail!("unknown option '{}'", option),
            _ if path.is_some() => bail!("only a single rom file can be run"),
            _ => path = Some(PathBuf::from(&arg)),
        }
    }

    // the trace is written with the info level
    if config.trace && log_level < LevelFilter::Info {
        log_level = LevelFilter::Info;
    }

    let path = path.ok_or_else(|| anyhow!("no rom file given, see --help"))?;
    Ok(Some(Args {
        path,
        rom_name,
        config,
        log_level,
        pitch,
    }))
}

/// Consumes the value of an option.
fn value<I>(args: &mut I, option: &str) -> anyhow::Result<String>
where
    I: Iterator<Item = String>,
{
    args.next()
        .ok_or_else(|| anyhow!("{} expects a value", option))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> anyhow::Result<Option<Args>> {
        parse_args(line.split_whitespace().map(String::from))
    }

    #[test]
    fn test_defaults() {
        let args = parse("pong.ch8").unwrap().unwrap();
        assert_eq!(
            args,
            Args {
                path: PathBuf::from("pong.ch8"),
                rom_name: None,
                config: RunnerConfig::default(),
                log_level: LevelFilter::Warn,
                pitch: 392,
            }
        );
    }

    #[test]
    fn test_all_options() {
        let args = parse("--hz 0 --cycles 300 --log-level debug --pitch 440 --rom PONG games.zip")
            .unwrap()
            .unwrap();

        assert_eq!(args.path, PathBuf::from("games.zip"));
        assert_eq!(args.rom_name.as_deref(), Some("PONG"));
        assert_eq!(args.config.hertz, 0);
        assert_eq!(args.config.max_cycles, Some(300));
        assert!(!args.config.trace);
        assert_eq!(args.log_level, LevelFilter::Debug);
        assert_eq!(args.pitch, 440);
    }

    #[test]
    fn test_huge_rate() {
        let args = parse("--hz 4294967296 pong.ch8").unwrap().unwrap();
        assert_eq!(args.config.hertz, 1 << 32);
        assert_eq!(args.config.interval(), Some(std::time::Duration::ZERO));
    }

    #[test]
    fn test_trace_raises_level() {
        let args = parse("--trace maze.ch8").unwrap().unwrap();
        assert!(args.config.trace);
        assert_eq!(args.log_level, LevelFilter::Info);

        let args = parse("--log-level trace --trace maze.ch8").unwrap().unwrap();
        assert_eq!(args.log_level, LevelFilter::Trace);
    }

    #[test]
    fn test_help() {
        assert!(parse("--help").unwrap().is_none());
        assert!(parse("pong.ch8 -h").unwrap().is_none());
    }

    #[test]
    fn test_errors() {
        assert!(parse("").is_err());
        assert!(parse("--hz").is_err());
        assert!(parse("--hz fast pong.ch8").is_err());
        assert!(parse("--log-level loud pong.ch8").is_err());
        assert!(parse("--fullscreen pong.ch8").is_err());
        assert!(parse("--pitch 0 pong.ch8").is_err());
        assert!(parse("--pitch 70000 pong.ch8").is_err());
        assert!(parse("pong.ch8 maze.ch8").is_err());
    }
}
