mod replay;

use std::env;
use std::io;
use std::process;

use replay::{ReplayOptions, USAGE};

fn main() -> io::Result<()> {
    let options = ReplayOptions::parse(env::args().skip(1)).unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!("{USAGE}");
        process::exit(2);
    });

    let stdout = io::stdout();
    let mut writer = stdout.lock();
    replay::run(&options, &mut writer)?;
    Ok(())
}
