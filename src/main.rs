fn main() {
    if let Err(err) = query_filter::run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
