// Entry point for the ledger binary: builds the configuration, then either runs
// the scripted demo or reads shell commands from stdin against one session.
use clap::Parser;
use log::{error, LevelFilter};
use std::io::{self, BufRead, Write};
use std::process;
use utxo_ledger::{Command, Config, Opt, Result, Session, ShellCommand};

fn main() {
    // Info by default, RUST_LOG still wins
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let opt = Opt::parse();
    if let Err(e) = run(opt) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn load_config(opt: &Opt) -> Result<Config> {
    let config = match &opt.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let mut config = config.apply_env()?;
    if let Some(difficulty) = opt.difficulty {
        config.difficulty = difficulty;
    }
    if let Some(block_reward) = opt.block_reward {
        config.block_reward = block_reward;
    }
    config.validate()?;
    Ok(config)
}

fn run(opt: Opt) -> Result<()> {
    let config = load_config(&opt)?;
    let mut session = Session::new(config);

    match opt.command {
        Command::Demo => {
            let stdout = io::stdout();
            session.run_demo(&mut stdout.lock())?;
        }
        Command::Shell => run_shell(&mut session)?,
    }
    Ok(())
}

fn run_shell(session: &mut Session) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut lines = stdin.lock().lines();

    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;
        let Some(line) = lines.next() else {
            break;
        };

        let command = match ShellCommand::parse_line(&line?) {
            None => continue,
            Some(Ok(command)) => command,
            Some(Err(e)) => {
                // clap renders usage and help text itself
                writeln!(stdout, "{e}")?;
                continue;
            }
        };
        if command == ShellCommand::Exit {
            break;
        }

        // A failed command is reported and the session carries on
        match session.execute(command) {
            Ok(output) if output.is_empty() => {}
            Ok(output) => writeln!(stdout, "{output}")?,
            Err(e) => error!("{e}"),
        }
    }
    Ok(())
}
