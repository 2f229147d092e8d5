//! Heapviz entry point

use heapviz::{VizConfig, USAGE};

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        println!("{}", USAGE);
        return;
    }

    let config = match VizConfig::from_args(args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };

    std::process::exit(heapviz::run(config));
}
