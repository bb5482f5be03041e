fn main() {
    if let Err(err) = step_diagram::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
