fn main() {
    if let Err(err) = intelligent_cd_mcp::cli::main() {
        eprintln!("❌ {err}");
        std::process::exit(1);
    }
}
