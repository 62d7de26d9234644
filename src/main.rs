fn main() {
    if let Err(err) = csv_inventory::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
