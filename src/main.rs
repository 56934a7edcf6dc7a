fn main() {
    if let Err(err) = cutplan::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
