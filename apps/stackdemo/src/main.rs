//! Stack demo entry point

use stackdemo::{logger, DemoConfig};

fn usage() {
    eprintln!("Usage: stackdemo [--level LEVEL] [--frame BYTES] [--depth N]... [--dump]");
}

fn main() {
    let mut config = DemoConfig::default();
    let mut depths = Vec::new();
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        let parsed = match arg.as_str() {
            "--level" => args
                .next()
                .and_then(|s| logger::parse_level(&s))
                .map(|level| config.level = level),
            "--frame" => args
                .next()
                .and_then(|s| s.parse().ok())
                .map(|n| config.frame_size = n),
            "--depth" => args
                .next()
                .and_then(|s| s.parse().ok())
                .map(|n| depths.push(n)),
            "--dump" => Some(config.dump = true),
            "-h" | "--help" => {
                usage();
                return;
            }
            _ => None,
        };
        if parsed.is_none() {
            eprintln!("Bad argument: {}", arg);
            usage();
            std::process::exit(2);
        }
    }
    if !depths.is_empty() {
        config.depths = depths;
    }

    std::process::exit(stackdemo::run(&config));
}
