fn main() {
    if let Err(e) = ripples::core::Runner::run() {
        eprintln!("Ripples failed to start: {}", e);
        std::process::exit(1);
    }
}
