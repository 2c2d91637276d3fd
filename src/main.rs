fn main() {
    if let Err(e) = h5conv::cli::run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
