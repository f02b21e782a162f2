fn main() {
    if let Err(err) = gail::cli::main() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
