//! Print the source files that an ELF binary was built from.
//!
//! ```text
//! dwsrc files -p <executable> [-d] [-j]
//! ```
//!
//! Logging is written to standard error and is controlled by `RUST_LOG`.

use std::env;
use std::io::{self, BufWriter, Write};
use std::process;

use log::{debug, LevelFilter};

fn print_usage(opts: &getopts::Options) -> ! {
    let brief = format!(
        "Usage: {} files -p <executable> [options]",
        env::args().next().unwrap_or_else(|| "dwsrc".to_string())
    );
    write!(&mut io::stderr(), "{}", opts.usage(&brief)).ok();
    process::exit(1);
}

fn main() {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Warn)
        .parse_default_env()
        .init();

    let mut opts = getopts::Options::new();
    opts.optopt(
        "p",
        "executable",
        "path to the executable to read",
        "PATH",
    );
    opts.optflag(
        "d",
        "join-dirs",
        "prefix relative file names with their directory. Without this, \
         files with the same name in different directories print once",
    );
    opts.optflag("j", "parallel", "decode compilation units in parallel");
    opts.optflag("h", "help", "print this help");

    let matches = match opts.parse(env::args().skip(1)) {
        Ok(m) => m,
        Err(e) => {
            writeln!(&mut io::stderr(), "{}\n", e).ok();
            print_usage(&opts);
        }
    };
    if matches.opt_present("h") {
        print_usage(&opts);
    }
    match matches.free.first().map(String::as_str) {
        Some("files") if matches.free.len() == 1 => {}
        _ => print_usage(&opts),
    }
    let path = match matches.opt_str("p") {
        Some(path) => path,
        None => {
            writeln!(&mut io::stderr(), "Missing required option: -p/--executable\n").ok();
            print_usage(&opts);
        }
    };

    let options = dwsrc::ExtractOptions {
        join_directories: matches.opt_present("d"),
        parallel: matches.opt_present("j"),
    };
    debug!("reading {} with {:?}", path, options);

    let files = match dwsrc::source_files_with(&path, &options) {
        Ok(files) => files,
        Err(err) => {
            println!("Error: {}", err);
            process::exit(1);
        }
    };

    let stdout = io::stdout();
    let mut w = BufWriter::new(stdout.lock());
    for file in &files {
        if writeln!(w, "{}", file).is_err() {
            process::exit(1);
        }
    }
    if w.flush().is_err() {
        process::exit(1);
    }
}
