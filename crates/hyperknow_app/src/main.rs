mod app;
mod cli;
mod effects;
mod logging;
mod render;
mod session;

fn main() {
    let invocation = match cli::parse_args(std::env::args().skip(1)) {
        Ok(invocation) => invocation,
        Err(message) => {
            eprintln!("{message}");
            eprintln!("{}", cli::USAGE);
            std::process::exit(2);
        }
    };

    logging::initialize(logging::LogDestination::File);

    if let Err(err) = app::run(invocation) {
        eprintln!("hyperknow: {err}");
        std::process::exit(1);
    }
}
