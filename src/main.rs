use std::process::exit;

fn main() {
    if let Err(e) = company_directory::app::run_cli() {
        eprintln!("error: {e}");
        exit(1);
    }
}
