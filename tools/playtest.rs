/// Playtest — play a story directory in the terminal.
///
/// Usage: playtest <content_dir> [--seed <n>] [--dev]
///
/// Commands:
///   <n>            — pick the n-th enabled option
///   pick <id>      — pick an option by id
///   effects <n>    — describe what the n-th enabled option would do
///   eval <expr>    — evaluate an expression against the preview
///   status         — show the status bar
///   options        — list every option with its locks
///   help           — list commands
///   quit           — exit

use choice_engine::core::session::{Phase, RenderBlock, Session};
use choice_engine::schema::element::{Element, OptionDef};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let content_dir = PathBuf::from(&args[1]);
    let mut seed: u64 = 42;
    let mut dev = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().unwrap_or(42);
            }
            "--dev" => dev = true,
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let mut session = match Session::builder()
        .seed(seed)
        .dev(dev)
        .content_dir(content_dir.clone())
        .build() {
        Ok(session) => session,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    println!("Loaded story from {}", content_dir.display());
    println!("Seed: {}", seed);
    println!("Type 'help' for commands.\n");

    session.start();
    print_blocks(&session.take_blocks());
    print_choices(&session);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("playtest> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (cmd, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();

        match cmd.to_lowercase().as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => print_help(),
            "pick" => {
                if rest.is_empty() {
                    println!("Usage: pick <id>");
                    continue;
                }
                pick(&mut session, rest);
            }
            "effects" => match nth_enabled(&session, rest) {
                Some(id) => match session.option_effects(&id) {
                    Some(effects) if effects.tags.is_empty() && effects.lines.is_empty() => {
                        println!("  (no visible effects)");
                    }
                    Some(effects) => {
                        if !effects.tags.is_empty() {
                            println!("  tags: {}", effects.tags.join(", "));
                        }
                        for line in &effects.lines {
                            println!("  {}", line.text);
                        }
                    }
                    None => println!("Unknown option: {}", id),
                },
                None => println!("Usage: effects <n>"),
            },
            "eval" => {
                if rest.is_empty() {
                    println!("Usage: eval <expr>");
                    continue;
                }
                println!("  = {}", session.evaluate(rest));
            }
            "status" => print_status(&mut session),
            "options" => {
                for option in session.options() {
                    let mut locks: Vec<_> = option.lock_reasons.iter().collect();
                    locks.sort();
                    println!(
                        "  {:<14} {:<24} active={} visible={} locks={:?}",
                        option.id,
                        option.label(),
                        option.active,
                        option.visible,
                        locks
                    );
                }
            }
            _ => match nth_enabled(&session, line) {
                Some(id) => pick(&mut session, &id),
                None => println!("Unknown command: {} (type 'help')", line),
            },
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}

fn print_usage() {
    println!("Usage: playtest <content_dir> [--seed <n>] [--dev]");
    println!();
    println!("Plays the story in the given directory. The directory holds");
    println!("intro, custom, resource, scenes, endings and setting documents");
    println!("as .json or .ron files. --dev shows hidden options and resources.");
}

fn print_help() {
    println!("Commands:");
    println!("  <n>            — pick the n-th enabled option");
    println!("  pick <id>      — pick an option by id");
    println!("  effects <n>    — describe what the n-th enabled option would do");
    println!("  eval <expr>    — evaluate an expression against the preview");
    println!("  status         — show the status bar");
    println!("  options        — list every option with its locks");
    println!("  help           — show this help");
    println!("  quit           — exit");
}

fn pick(session: &mut Session, id: &str) {
    if let Err(e) = session.activate(id) {
        println!("  {}", e);
        return;
    }
    print_blocks(&session.take_blocks());
    if session.phase() == Phase::Summary {
        if let Some(summary) = session.summary() {
            println!("{}", summary.to_text());
        }
        println!("The story is over. Type 'quit' to exit.");
        return;
    }
    print_choices(session);
}

/// Id of the 1-based n-th enabled option.
fn nth_enabled(session: &Session, arg: &str) -> Option<String> {
    let n: usize = arg.parse().ok()?;
    session
        .enabled_options()
        .nth(n.checked_sub(1)?)
        .map(|o| o.id.clone())
}

fn print_blocks(blocks: &[RenderBlock]) {
    for block in blocks {
        if let Some(heading) = &block.heading {
            println!("\n== {} ==", heading);
        }
        if let Some(description) = &block.description {
            println!("{}", description);
        }
        if let Some(rules) = &block.rules {
            println!("({})", rules);
        }
        for element in &block.elements {
            print_element(element);
        }
    }
    println!();
}

fn print_element(element: &Element) {
    match element {
        Element::Textbox { title, text, .. } => {
            if let Some(title) = title {
                println!("[{}]", title);
            }
            if let Some(text) = text {
                println!("{}", text);
            }
        }
        Element::Titlebox { title: Some(title), .. } => println!("\n-- {} --", title),
        Element::Line => println!("----------------------------------------"),
        Element::Button(def) => print_option(def),
        Element::Choice(group) => group.elements.iter().for_each(print_option),
        _ => {}
    }
}

fn print_option(def: &OptionDef) {
    let title = def.title.as_deref().unwrap_or("(untitled)");
    match &def.text {
        Some(text) => println!("  * {}: {}", title, text),
        None => println!("  * {}", title),
    }
}

fn print_choices(session: &Session) {
    for (n, option) in session.enabled_options().enumerate() {
        let marker = if option.active { "[x]" } else if option.is_toggle() { "[ ]" } else { "   " };
        match &option.condition_text {
            Some(hint) => println!("{:>3}. {} {} ({})", n + 1, marker, option.label(), hint),
            None => println!("{:>3}. {} {}", n + 1, marker, option.label()),
        }
    }
}

fn print_status(session: &mut Session) {
    let status = session.status();
    for line in &status.resources {
        println!("  {}", line.text);
    }
    if !status.items.is_empty() {
        let items: Vec<String> = status
            .items
            .iter()
            .map(|(item, count)| format!("{} x{}", item, count))
            .collect();
        println!("  items: {}", items.join(", "));
    }
}
