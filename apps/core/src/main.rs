fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match searchtabs_core::runtime::parse_cli_args(&args) {
        Ok(options) => options,
        Err(error) => {
            eprintln!("[searchtabs-core] {error}");
            eprintln!("{}", searchtabs_core::runtime::USAGE);
            std::process::exit(2);
        }
    };

    if let Err(error) = searchtabs_core::runtime::run_with_options(options) {
        eprintln!("[searchtabs-core] session failed: {error}");
        std::process::exit(1);
    }
}
