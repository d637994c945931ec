fn main() {
    if let Err(err) = vocable_lib::run() {
        log::error!("Vocable exited with error: {err:#}");
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
