use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use dialoguer::Confirm;
use indoc::indoc;
use log::LevelFilter;
use netlog::{NetLog, NetLogParser, write_sources};

const HELP: &str = indoc! {"
    Commands:
        (help|?): show this help text
        (parse|p) <file>: parse a capture file
        (show|s) <arg>: inspect events of the parsed capture (`show help` lists options)
        (extract|e) <arg>: run an extraction over the parsed capture (`extract help` lists options)
        (quit|q): exit"
};

const SHOW_HELP: &str = indoc! {"
    Options:
        range: event id range
        id <number>: print the event with the given id
        all: dump every event, this can output lots of data
        next: print the next event and advance the print cursor
        prev: print the previous event and move the print cursor back
        set <number>: set the print cursor"
};

const EXTRACT_HELP: &str = indoc! {"
    Options:
        dns: print all DNS queries
        url: print all URL requests
        red: print all redirections
        con: print all opened connections
        src <dir>: save all resources under the given directory. The capture must
          have been taken with --net-log-capture-mode=Everything for the resource
          bytes to be present."
};

struct NetlogShell {
    netlog: Option<NetLog>,
    // Print cursor driven by `show next/prev/set`. Session state of this
    // shell, deliberately not part of the graph itself.
    cursor: usize,
    confirm_overwrite: bool,
}

impl NetlogShell {
    fn from_cli_matches(matches: &ArgMatches) -> Self {
        NetlogShell {
            netlog: None,
            cursor: 0,
            confirm_overwrite: !matches.get_flag("no-confirm-overwrite"),
        }
    }

    /// Executes one command line. Returns `false` when the shell should exit.
    fn handle_command(&mut self, command: &str) -> bool {
        let pieces: Vec<&str> = command.split_whitespace().collect();

        match pieces.as_slice() {
            [] => {}
            ["help" | "?", ..] => println!("{HELP}"),
            ["parse" | "p", path, ..] => self.parse_capture(path),
            ["parse" | "p"] => println!("usage: parse <file>"),
            ["show" | "s", args @ ..] => self.handle_show(args),
            ["extract" | "e", args @ ..] => self.handle_extract(args),
            ["quit" | "q", ..] => return false,
            [other, ..] => println!("invalid command {other:?} (try `help`)"),
        }

        true
    }

    fn parse_capture(&mut self, path: &str) {
        match NetLogParser::new().parse_path(path) {
            Ok(netlog) => {
                println!("File parsed. Found {} events.", netlog.len());
                self.netlog = Some(netlog);
                self.cursor = 0;
            }
            Err(e) => eprintln!("{e}"),
        }
    }

    /// The parsed graph, or `None` after printing a hint.
    fn parsed(&self) -> Option<&NetLog> {
        if self.netlog.is_none() {
            println!("no capture parsed yet (use `parse <file>`)");
        }
        self.netlog.as_ref()
    }

    fn print_event_at_cursor(&self) {
        let Some(netlog) = self.netlog.as_ref() else {
            return;
        };
        match netlog.event(self.cursor as u32) {
            Some(event) => println!("{event}"),
            None => println!("no event with id {}", self.cursor),
        }
    }

    fn handle_show(&mut self, args: &[&str]) {
        match args {
            ["range", ..] => {
                if let Some(netlog) = self.parsed() {
                    println!("IDs range from 1 to {}", netlog.len());
                }
            }
            ["id", value, ..] => {
                let Some(netlog) = self.parsed() else { return };
                match value.parse::<u32>() {
                    Ok(id) => match netlog.event(id) {
                        Some(event) => println!("{event}"),
                        None => println!("IDs range from 1 to {}", netlog.len()),
                    },
                    Err(e) => println!("{e}"),
                }
            }
            ["all", ..] => {
                if let Some(netlog) = self.parsed() {
                    for event in netlog.events() {
                        println!("{event}");
                    }
                }
            }
            ["next", ..] => {
                let Some(len) = self.parsed().map(NetLog::len) else {
                    return;
                };
                self.cursor = if self.cursor >= len { 1 } else { self.cursor + 1 };
                self.print_event_at_cursor();
            }
            ["prev", ..] => {
                let Some(len) = self.parsed().map(NetLog::len) else {
                    return;
                };
                self.cursor = if self.cursor <= 1 { len } else { self.cursor - 1 };
                self.print_event_at_cursor();
            }
            ["set", value, ..] => match value.parse() {
                Ok(position) => self.cursor = position,
                Err(e) => println!("{e}"),
            },
            _ => println!("{SHOW_HELP}"),
        }
    }

    fn handle_extract(&mut self, args: &[&str]) {
        match args {
            ["dns", ..] => {
                if let Some(netlog) = self.parsed() {
                    for query in netlog.find_dns_queries() {
                        println!("{query:?}");
                    }
                }
            }
            ["url", ..] => {
                if let Some(netlog) = self.parsed() {
                    for request in netlog.find_url_requests() {
                        println!("{request:?}");
                    }
                }
            }
            ["red", ..] => {
                if let Some(netlog) = self.parsed() {
                    for redirection in netlog.find_redirections() {
                        println!("{redirection:?}");
                    }
                }
            }
            ["con", ..] => {
                if let Some(netlog) = self.parsed() {
                    for connection in netlog.find_opened_sockets() {
                        println!("{connection:?}");
                    }
                }
            }
            ["src"] => println!("usage: extract src <dir>"),
            ["src", dir, ..] => self.extract_sources(dir),
            _ => println!("{EXTRACT_HELP}"),
        }
    }

    fn extract_sources(&self, dir: &str) {
        let Some(netlog) = self.parsed() else { return };
        let sources = netlog.find_sources();

        let prompt_before_overwrite = self.confirm_overwrite;
        let confirm = |path: &Path| {
            if !prompt_before_overwrite {
                return true;
            }
            Confirm::new()
                .with_prompt(format!("Overwrite existing file {}?", path.display()))
                .default(false)
                .interact()
                .unwrap_or(false)
        };

        match write_sources(&sources, dir, confirm) {
            Ok(report) => println!("Wrote {} out of {} files.", report.written, report.total),
            Err(e) => eprintln!("{e}"),
        }
    }
}

fn try_to_initialize_logging(matches: &ArgMatches) {
    let level = match matches.get_count("verbose") {
        0 => return,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        3 => LevelFilter::Trace,
        _ => {
            eprintln!("using more than -vvv does not affect verbosity level");
            LevelFilter::Trace
        }
    };

    if let Err(e) = simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    ) {
        eprintln!("Failed to initialize logging: {e}");
    }
}

fn main() -> Result<()> {
    let matches = Command::new("NetLog Shell")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Omer B. <omerbenamram@gmail.com>")
        .about("Interactive analyzer for Chromium NetLog captures")
        .arg(Arg::new("INPUT").help("Capture file to parse at startup"))
        .arg(
            Arg::new("verbose")
                .short('v')
                .action(ArgAction::Count)
                .help("-v - info, -vv - debug, -vvv - trace"),
        )
        .arg(
            Arg::new("no-confirm-overwrite")
                .long("no-confirm-overwrite")
                .action(ArgAction::SetTrue)
                .help(
                    "When set, `extract src` will not ask for confirmation before \
                     overwriting files, useful for automation",
                ),
        )
        .get_matches();

    try_to_initialize_logging(&matches);

    let mut shell = NetlogShell::from_cli_matches(&matches);
    if let Some(path) = matches.get_one::<String>("INPUT") {
        shell.parse_capture(path);
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    write!(stdout, "netlog> ")?;
    stdout.flush()?;

    for line in stdin.lock().lines() {
        if !shell.handle_command(line?.trim()) {
            break;
        }
        write!(stdout, "netlog> ")?;
        stdout.flush()?;
    }

    Ok(())
}
