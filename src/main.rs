fn main() {
    if let Err(e) = docchat_lib::run() {
        log::error!("docchat failed: {:?}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
